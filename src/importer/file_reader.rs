// ==========================================
// 表格数据导入 - 文件读取器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 说明: 单元格一律转为字符串后交给行分类器
// ==========================================

use crate::domain::ImportBundle;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::TableReader;
use crate::importer::sheet_classifier::{build_bundle, RawRow};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info};

const EXCEL_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::SourceUnreadable(format!(
            "文件不存在: {}",
            path.display()
        )));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvReader;

impl CsvReader {
    /// 读取全部原始行（不把首行当表头）
    pub fn read_raw_rows(&self, path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(path)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_path(path)?;

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 1);
            rows.push(RawRow::new(line, record.iter()));
        }

        Ok(rows)
    }
}

impl TableReader for CsvReader {
    fn read_asset(&self, path: &Path) -> ImportResult<ImportBundle> {
        let ext = extension_of(path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let rows = self.read_raw_rows(path)?;
        debug!(path = %path.display(), rows = rows.len(), "CSV 读取完成");

        build_bundle(&rows)
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelReader;

impl ExcelReader {
    /// 读取第一个工作表的全部原始行
    ///
    /// 行号为 1 起始的工作表行号；列下标为工作表绝对列
    pub fn read_raw_rows(&self, path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(path)?;

        // 按扩展名分派 xlsx (zip) 与 xls (BIFF)
        let mut workbook = open_workbook_auto(path)?;

        let sheet_names = workbook.sheet_names();
        let Some(sheet_name) = sheet_names.first().cloned() else {
            return Err(ImportError::MalformedSource(
                "Excel 文件无工作表".to_string(),
            ));
        };

        let range = workbook.worksheet_range(&sheet_name)?;

        // Range 从首个非空单元格开始，需还原为绝对坐标
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        let mut rows = Vec::new();
        for (offset, data_row) in range.rows().enumerate() {
            let mut cells = vec![String::new(); start_col as usize];
            cells.extend(data_row.iter().map(cell_to_string));
            rows.push(RawRow {
                line: start_row as usize + offset + 1,
                cells,
            });
        }

        Ok(rows)
    }
}

/// 任意单元格类型统一转为字符串
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

impl TableReader for ExcelReader {
    fn read_asset(&self, path: &Path) -> ImportResult<ImportBundle> {
        let ext = extension_of(path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let rows = self.read_raw_rows(path)?;
        debug!(path = %path.display(), rows = rows.len(), "Excel 读取完成");

        build_bundle(&rows)
    }
}

// ==========================================
// 通用读取器（根据扩展名自动选择）
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct UniversalReader;

impl TableReader for UniversalReader {
    fn read_asset(&self, path: &Path) -> ImportResult<ImportBundle> {
        let ext = extension_of(path);

        let bundle = match ext.as_str() {
            "csv" => CsvReader.read_asset(path)?,
            "xlsx" | "xls" => ExcelReader.read_asset(path)?,
            _ => return Err(ImportError::UnsupportedFormat(ext)),
        };

        info!(
            path = %path.display(),
            fields = bundle.field_names.len(),
            rows = bundle.rows.len(),
            meta = bundle.meta.len(),
            vars = bundle.vars.len(),
            "源文件读取完成"
        );
        Ok(bundle)
    }
}
