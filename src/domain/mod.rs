// ==========================================
// 表格数据导入 - 领域模型层
// ==========================================
// 职责: 导入数据包 / 数据行 / 单元格字段 / 资源句柄
// 红线: 不含数据访问逻辑，不含读取与映射逻辑
// ==========================================

pub mod asset;
pub mod bundle;
pub mod field;
pub mod row;

// 重导出核心类型
pub use asset::{asset_name_from_path, AssetHandle, AssetKind, StoredAsset};
pub use bundle::ImportBundle;
pub use field::{Field, FieldParseError};
pub use row::Row;
