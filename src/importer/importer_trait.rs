// ==========================================
// 表格数据导入 - 导入 Trait
// ==========================================
// 职责: 定义读取器 / 用户校验器 / 用户导入器接口（不包含实现）
// ==========================================

use crate::domain::{ImportBundle, Row, StoredAsset};
use crate::importer::error::ImportResult;
use crate::importer::record_mapper::{Conversion, TableRecord};
use crate::importer::validation::ValidationSession;
use std::path::Path;

// ==========================================
// TableReader Trait
// ==========================================
// 用途: 外部表格源 → ImportBundle
// 实现者: ExcelReader, CsvReader, UniversalReader
pub trait TableReader {
    /// 读取源文件并组装 ImportBundle
    ///
    /// # 返回
    /// - Ok(ImportBundle): 元数据/变量/字段名/数据行
    /// - Err(SourceUnreadable): 文件无法打开
    /// - Err(MalformedSource): 没有工作表，或有数据行却没有字段名声明行
    /// - Err(DuplicateMetaOrVarKey): 元数据/变量键重复
    fn read_asset(&self, path: &Path) -> ImportResult<ImportBundle>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 用户自定义的逐行业务规则
// 约定: 通过 row.set_error_message(..) 标记失败；不得修改字段值
pub trait RowValidator {
    fn validate(&self, row: &mut Row, session: &mut ValidationSession<'_>);
}

/// 无规则校验器：所有行直接通过
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl RowValidator for AcceptAll {
    fn validate(&self, _row: &mut Row, _session: &mut ValidationSession<'_>) {}
}

impl<F> RowValidator for F
where
    F: Fn(&mut Row, &mut ValidationSession<'_>),
{
    fn validate(&self, row: &mut Row, session: &mut ValidationSession<'_>) {
        self(row, session)
    }
}

// ==========================================
// RecordImporter Trait
// ==========================================
// 用途: 把映射出的记录写入目标资源，并提供具名自定义转换
pub trait RecordImporter {
    /// 每个数据行映射出的记录类型
    type Record: TableRecord;

    /// 落地的资源类型
    type Asset: StoredAsset;

    /// 按名称查找自定义转换；未声明返回 None（字段保持默认值）
    fn conversion(&self, _name: &str) -> Option<Conversion<'_, Self::Record>> {
        None
    }

    /// 把本次导入的记录写入资源
    fn store(&self, asset: &mut Self::Asset, bundle: &ImportBundle, records: Vec<Self::Record>);
}
