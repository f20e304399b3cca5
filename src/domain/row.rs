// ==========================================
// 表格数据导入 - 数据行
// ==========================================
// 职责: 一条数据行的字段集合 + 校验结论
// 红线: 行号仅用于诊断信息，不参与业务判断
// ==========================================

use crate::domain::asset::AssetHandle;
use crate::domain::field::{Field, FieldParseError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub line_number: usize,
    valid: bool,
    error_message: String,

    // 字段名 → 单元格
    pub fields: HashMap<String, Field>,

    // 资源名 → 校验阶段解析出的资源句柄
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    resources: HashMap<String, AssetHandle>,
}

impl Row {
    pub fn new(line_number: usize) -> Self {
        Self {
            line_number,
            valid: true,
            error_message: String::new(),
            fields: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    /// 按字段名与单元格值构造（测试与读取器共用）
    pub fn with_fields<K, V>(line_number: usize, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Field>,
    {
        let mut row = Self::new(line_number);
        for (name, value) in fields {
            row.fields.insert(name.into(), value.into());
        }
        row
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// 标记该行无效并记录错误（附带行号）
    pub fn set_error_message(&mut self, message: impl AsRef<str>) {
        self.valid = false;
        self.error_message = format!("error line: {}: {}", self.line_number, message.as_ref());
    }

    /// 清除校验结论，重新校验前调用
    pub(crate) fn reset_verdict(&mut self) {
        self.valid = true;
        self.error_message.clear();
    }

    pub fn get(&self, field_name: &str) -> Option<&Field> {
        self.fields.get(field_name)
    }

    pub fn insert(&mut self, field_name: impl Into<String>, field: impl Into<Field>) {
        self.fields.insert(field_name.into(), field.into());
    }

    /// 字段缺失或为空串均视为空
    pub fn is_empty(&self, field_name: &str) -> bool {
        self.fields.get(field_name).map_or(true, Field::is_empty)
    }

    pub fn as_int(&self, field_name: &str) -> Result<i32, FieldParseError> {
        self.field_or_empty(field_name).as_int()
    }

    pub fn as_float(&self, field_name: &str) -> Result<f32, FieldParseError> {
        self.field_or_empty(field_name).as_float()
    }

    pub fn as_double(&self, field_name: &str) -> Result<f64, FieldParseError> {
        self.field_or_empty(field_name).as_double()
    }

    pub fn as_bool(&self, field_name: &str) -> Result<bool, FieldParseError> {
        self.field_or_empty(field_name).as_bool()
    }

    /// 校验阶段解析出的资源
    pub fn resource(&self, name: &str) -> Option<&AssetHandle> {
        self.resources.get(name)
    }

    pub(crate) fn attach_resource(&mut self, name: &str, handle: AssetHandle) {
        self.resources
            .entry(name.to_string())
            .or_insert(handle);
    }

    fn field_or_empty(&self, field_name: &str) -> std::borrow::Cow<'_, Field> {
        match self.fields.get(field_name) {
            Some(field) => std::borrow::Cow::Borrowed(field),
            None => std::borrow::Cow::Owned(Field::default()),
        }
    }
}

impl Index<&str> for Row {
    type Output = Field;

    /// 字段不存在时 panic，与 `HashMap` 下标语义一致
    fn index(&self, field_name: &str) -> &Field {
        &self.fields[field_name]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_error_message() {
        let mut row = Row::new(1);
        row.set_error_message("foo bar baz");

        assert!(!row.is_valid());
        assert_eq!(row.error_message(), "error line: 1: foo bar baz");
    }

    #[test]
    fn test_new_row_is_valid() {
        let row = Row::new(3);
        assert!(row.is_valid());
        assert_eq!(row.error_message(), "");
    }

    #[test]
    fn test_typed_accessors() {
        let row = Row::with_fields(2, [("Hp", "12"), ("Speed", "1.5"), ("Boss", "true")]);

        assert_eq!(row.as_int("Hp"), Ok(12));
        assert!((row.as_float("Speed").unwrap() - 1.5).abs() < f32::EPSILON);
        assert_eq!(row.as_bool("Boss"), Ok(true));
        assert_eq!(row["Hp"].value(), "12");
    }

    #[test]
    fn test_is_empty_missing_field() {
        let row = Row::with_fields(2, [("Name", "")]);

        assert!(row.is_empty("Name"));
        assert!(row.is_empty("Missing"));
        assert!(row.as_int("Missing").is_err());
    }

    #[test]
    fn test_attach_resource_keeps_first() {
        let mut row = Row::new(1);
        let first = AssetHandle {
            asset_id: "a".to_string(),
            asset_type: "Sprite".to_string(),
            name: "sword".to_string(),
            path: "Assets/Resources/sword.asset".to_string(),
        };
        let second = AssetHandle {
            asset_id: "b".to_string(),
            ..first.clone()
        };

        row.attach_resource("sword", first.clone());
        row.attach_resource("sword", second);

        assert_eq!(row.resource("sword"), Some(&first));
    }
}
