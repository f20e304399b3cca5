// ==========================================
// 表格数据导入 - 导入层
// ==========================================
// 职责: 源表格 → ImportBundle → 校验 → 强类型记录 → 目标资源
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod error;
pub mod file_reader;
pub mod importer_trait;
pub mod paths;
pub mod pipeline;
pub mod record_mapper;
pub mod sheet_classifier;
pub mod validation;

// 重导出核心类型
pub use error::{ImportError, ImportResult, KeyValueKind};
pub use file_reader::{CsvReader, ExcelReader, UniversalReader};
pub use paths::{destination_path, is_importable};
pub use pipeline::{ImportPipeline, ImportReport, ImportStatus};
pub use record_mapper::{
    ColumnBinding, ColumnSetter, Conversion, FieldMapper, MappingOutcome, TableRecord,
};
pub use sheet_classifier::{build_bundle, classify, RawRow, RowKind};
pub use validation::{ChainState, ResourceVerdict, ValidationChain, ValidationSession};

// 重导出 Trait 接口
pub use importer_trait::{AcceptAll, RecordImporter, RowValidator, TableReader};
