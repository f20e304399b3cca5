// ==========================================
// 表格数据导入 - 资源仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 资源索引查询、按路径加载/创建、保存
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod asset_store;
pub mod error;
pub mod memory_asset_store;
pub mod sqlite_asset_store;

// 重导出核心仓储
pub use asset_store::{AssetIndex, AssetStore};
pub use error::{StoreError, StoreResult};
pub use memory_asset_store::MemoryAssetStore;
pub use sqlite_asset_store::SqliteAssetStore;
