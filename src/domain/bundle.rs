// ==========================================
// 表格数据导入 - 导入数据包
// ==========================================
// 职责: 一个源表格解析后的规范表示（元数据/变量/字段名/数据行）
// 流转: 读取器产出 → 校验链发布已校验行 → 映射引擎消费
// ==========================================

use crate::domain::row::Row;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportBundle {
    // #元数据（按源顺序，键唯一）
    pub meta: IndexMap<String, String>,

    // $变量（按源顺序，键唯一）
    pub vars: IndexMap<String, String>,

    // 字段名顺序 = 单元格列位置
    pub field_names: Vec<String>,

    // 读取器产出的全部数据行
    pub rows: Vec<Row>,

    // 校验全部通过后才发布；任一行失败则保持 None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validated_rows: Option<Vec<Row>>,
}

impl ImportBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_names<S: Into<String>>(field_names: impl IntoIterator<Item = S>) -> Self {
        Self {
            field_names: field_names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// 按字段名顺序把单元格拼成一行；多余单元格丢弃，缺失单元格补空串
    pub fn push_cells<S: AsRef<str>>(&mut self, line_number: usize, cells: &[S]) {
        let mut row = Row::new(line_number);
        for (idx, name) in self.field_names.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let value = cells.get(idx).map(|c| c.as_ref()).unwrap_or("");
            row.insert(name.clone(), value);
        }
        self.rows.push(row);
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_names.iter().any(|f| f == name)
    }

    /// 已发布的校验通过行
    pub fn validated_rows(&self) -> Option<&[Row]> {
        self.validated_rows.as_deref()
    }

    pub fn is_validated(&self) -> bool {
        self.validated_rows.is_some()
    }

    pub(crate) fn publish_validated(&mut self, rows: Vec<Row>) {
        self.validated_rows = Some(rows);
    }

    pub(crate) fn clear_validated(&mut self) {
        self.validated_rows = None;
    }
}
