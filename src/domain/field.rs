// ==========================================
// 表格数据导入 - 单元格字段
// ==========================================
// 职责: 保存单元格原始字符串，按需转换为强类型值
// 红线: 创建后不可变；缺失单元格在读取阶段统一归一为空串
// ==========================================

use crate::domain::asset::AssetKind;
use crate::repository::AssetIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

// ==========================================
// FieldParseError - 字段转换失败
// ==========================================
// 用途: 由映射引擎补充行号/列名后转为 ImportError::FieldConversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldParseError {
    pub value: String,
    pub expected: &'static str,
}

impl fmt::Display for FieldParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "无法将 '{}' 解析为 {}", self.value, self.expected)
    }
}

impl std::error::Error for FieldParseError {}

// ==========================================
// Field - 单元格值
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Field {
    value: String,
}

impl Field {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// 原始字符串
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_value(self) -> String {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// 转换为 i32（允许首尾空白）
    pub fn as_int(&self) -> Result<i32, FieldParseError> {
        self.value
            .trim()
            .parse::<i32>()
            .map_err(|_| self.parse_error("int32"))
    }

    /// 转换为 f32
    pub fn as_float(&self) -> Result<f32, FieldParseError> {
        self.value
            .trim()
            .parse::<f32>()
            .map_err(|_| self.parse_error("float"))
    }

    /// 转换为 f64
    pub fn as_double(&self) -> Result<f64, FieldParseError> {
        self.value
            .trim()
            .parse::<f64>()
            .map_err(|_| self.parse_error("double"))
    }

    /// 转换为 bool
    ///
    /// 仅接受 `true` / `false`（忽略大小写），与表格软件导出的 `TRUE` / `FALSE` 兼容
    pub fn as_bool(&self) -> Result<bool, FieldParseError> {
        let trimmed = self.value.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(self.parse_error("bool"))
        }
    }

    /// 以字段值为资源名，检查指定类型的资源是否唯一存在
    ///
    /// 查询失败按"不存在"处理，不向上传播
    ///
    /// 每次调用都直接查询索引，不经过会话缓存；校验器内应使用
    /// `ValidationSession::is_valid_resource`，以保证同一会话内重复引用得到相同结论
    pub fn is_valid_resource<K: AssetKind, I: AssetIndex + ?Sized>(&self, index: &I) -> bool {
        if self.is_empty() {
            return false;
        }

        match index.find_assets(K::ASSET_TYPE, &self.value) {
            Ok(handles) => handles.len() == 1,
            Err(e) => {
                warn!(
                    asset_type = K::ASSET_TYPE,
                    name = %self.value,
                    error = %e,
                    "资源索引查询失败，按不存在处理"
                );
                false
            }
        }
    }

    fn parse_error(&self, expected: &'static str) -> FieldParseError {
        FieldParseError {
            value: self.value.clone(),
            expected,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryAssetStore;

    struct Sprite;

    impl AssetKind for Sprite {
        const ASSET_TYPE: &'static str = "Sprite";
    }

    #[test]
    fn test_as_int() {
        assert_eq!(Field::new("42").as_int(), Ok(42));
        assert_eq!(Field::new(" -7 ").as_int(), Ok(-7));
        assert!(Field::new("4.2").as_int().is_err());
        assert!(Field::new("").as_int().is_err());
    }

    #[test]
    fn test_as_float_and_double() {
        let f = Field::new("3.14");
        assert!((f.as_float().unwrap() - 3.14_f32).abs() < 1e-6);
        assert!((f.as_double().unwrap() - 3.14).abs() < 1e-12);
        assert!(Field::new("abc").as_double().is_err());
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(Field::new("true").as_bool(), Ok(true));
        assert_eq!(Field::new("TRUE").as_bool(), Ok(true));
        assert_eq!(Field::new("False").as_bool(), Ok(false));

        let err = Field::new("yes").as_bool().unwrap_err();
        assert_eq!(err.expected, "bool");
        assert_eq!(err.value, "yes");
    }

    #[test]
    fn test_is_empty() {
        assert!(Field::default().is_empty());
        assert!(Field::new("").is_empty());
        assert!(!Field::new("foo").is_empty());
        assert!(!Field::new(" ").is_empty());
    }

    #[test]
    fn test_is_valid_resource() {
        let store = MemoryAssetStore::new();
        store.register("Sprite", "Assets/Resources/Sprites/sword.asset").unwrap();

        assert!(Field::new("sword").is_valid_resource::<Sprite, _>(&store));
        assert!(!Field::new("shield").is_valid_resource::<Sprite, _>(&store));
        assert!(!Field::new("").is_valid_resource::<Sprite, _>(&store));
    }

    #[test]
    fn test_is_valid_resource_queries_every_time() {
        let store = MemoryAssetStore::new();
        store.register("Sprite", "Assets/Resources/Sprites/sword.asset").unwrap();

        let field = Field::new("sword");
        field.is_valid_resource::<Sprite, _>(&store);
        field.is_valid_resource::<Sprite, _>(&store);

        // 不经过会话缓存
        assert_eq!(store.query_count(), 2);
    }
}
