// ==========================================
// 表格数据导入 - 核心库
// ==========================================
// 技术栈: Rust + calamine/csv + SQLite
// 系统定位: 半结构化表格 → 校验 → 强类型记录 → 游戏内容资源
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 数据包/数据行/字段
pub mod domain;

// 数据仓储层 - 资源索引与持久化
pub mod repository;

// 导入层 - 读取/校验/映射/编排
pub mod importer;

// 配置层 - 导入规则配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{AssetHandle, AssetKind, Field, ImportBundle, Row, StoredAsset};

// 导入
pub use importer::{
    AcceptAll, ColumnBinding, FieldMapper, ImportError, ImportPipeline, ImportReport,
    ImportResult, ImportStatus, RecordImporter, RowValidator, TableReader, TableRecord,
    UniversalReader, ValidationChain, ValidationSession,
};

// 仓储
pub use repository::{AssetIndex, AssetStore, MemoryAssetStore, SqliteAssetStore, StoreError};

// 配置
pub use config::{ConfigManager, ImportConfig};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "sheet-importer";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
