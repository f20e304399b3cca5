// ==========================================
// 表格数据导入 - 行分类器
// ==========================================
// 职责: 把读取器给出的原始行（已统一为字符串）分类并组装为 ImportBundle
// 规则（按行首个非空单元格判定，互斥）:
//   [ → 字段名声明行（只认第一行）
//   # → 元数据行
//   $ → 变量行
//   全空 → 跳过
//   其它 → 数据行，按列位置与字段名拼接
// ==========================================

use crate::domain::ImportBundle;
use crate::importer::error::{ImportError, ImportResult, KeyValueKind};
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, warn};

const FIELD_NAME_MARKER: char = '[';
const META_MARKER: char = '#';
const VAR_MARKER: char = '$';

/// 读取器产出的原始行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    // 1 起始的源行号
    pub line: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new<S: Into<String>>(line: usize, cells: impl IntoIterator<Item = S>) -> Self {
        Self {
            line,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// 首个非空单元格（下标, 去掉前导空白后的值）
    fn first_non_blank(&self) -> Option<(usize, &str)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(idx, c)| (idx, c.trim_start()))
            .find(|(_, c)| !c.trim().is_empty())
    }
}

/// 行分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    FieldNames,
    Meta,
    Var,
    Empty,
    Data,
}

/// 判定一行的类型
pub fn classify(row: &RawRow) -> RowKind {
    match row.first_non_blank() {
        None => RowKind::Empty,
        Some((_, cell)) if cell.starts_with(FIELD_NAME_MARKER) => RowKind::FieldNames,
        Some((_, cell)) if cell.starts_with(META_MARKER) => RowKind::Meta,
        Some((_, cell)) if cell.starts_with(VAR_MARKER) => RowKind::Var,
        Some(_) => RowKind::Data,
    }
}

/// 组装 ImportBundle
///
/// 先整表定位字段名声明行，保证任何数据行构造前字段名已就绪
pub fn build_bundle(rows: &[RawRow]) -> ImportResult<ImportBundle> {
    let mut bundle = ImportBundle::new();

    if let Some(header) = rows.iter().find(|r| classify(r) == RowKind::FieldNames) {
        bundle.field_names = parse_field_names(header)?;
        debug!(
            line = header.line,
            fields = bundle.field_names.len(),
            "字段名声明行"
        );
    }

    let mut header_seen = false;
    for row in rows {
        match classify(row) {
            RowKind::FieldNames => {
                if header_seen {
                    debug!(line = row.line, "忽略多余的字段名声明行");
                }
                header_seen = true;
            }
            RowKind::Meta => insert_key_value(&mut bundle.meta, row, META_MARKER, KeyValueKind::Meta)?,
            RowKind::Var => insert_key_value(&mut bundle.vars, row, VAR_MARKER, KeyValueKind::Var)?,
            RowKind::Empty => {}
            RowKind::Data => {
                if bundle.field_names.is_empty() {
                    return Err(ImportError::MalformedSource(format!(
                        "第 {} 行为数据行，但表中没有字段名声明行",
                        row.line
                    )));
                }
                bundle.push_cells(row.line, row.cells.as_slice());
            }
        }
    }

    Ok(bundle)
}

/// 每个单元格去掉一个前导 `[` 与一个尾随 `]`；尾部空名丢弃
///
/// 非空字段名必须唯一，否则同名列会在拼行时互相覆盖
fn parse_field_names(row: &RawRow) -> ImportResult<Vec<String>> {
    let mut names: Vec<String> = row
        .cells
        .iter()
        .map(|cell| {
            let cell = cell.trim();
            let cell = cell.strip_prefix(FIELD_NAME_MARKER).unwrap_or(cell);
            let cell = cell.strip_suffix(']').unwrap_or(cell);
            cell.trim().to_string()
        })
        .collect();

    while names.last().is_some_and(|n| n.is_empty()) {
        names.pop();
    }

    let mut seen = HashSet::new();
    if let Some(dup) = names.iter().find(|n| !n.is_empty() && !seen.insert(n.as_str())) {
        return Err(ImportError::MalformedSource(format!(
            "第 {} 行字段名重复: {}",
            row.line, dup
        )));
    }
    Ok(names)
}

fn insert_key_value(
    target: &mut IndexMap<String, String>,
    row: &RawRow,
    marker: char,
    kind: KeyValueKind,
) -> ImportResult<()> {
    let Some((idx, cell)) = row.first_non_blank() else {
        return Ok(());
    };

    let key = cell.strip_prefix(marker).unwrap_or(cell).trim();
    if key.is_empty() {
        warn!(line = row.line, %kind, "键为空，忽略该行");
        return Ok(());
    }

    let value = row.cells.get(idx + 1).cloned().unwrap_or_default();

    match target.entry(key.to_string()) {
        Entry::Occupied(_) => Err(ImportError::DuplicateMetaOrVarKey {
            kind,
            key: key.to_string(),
            line: row.line,
        }),
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
    }
}
