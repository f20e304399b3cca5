// ==========================================
// 表格数据导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级校验失败不走错误类型，而是写入 Row 的错误信息并由校验链汇总
// ==========================================

use crate::repository::StoreError;
use std::fmt;
use thiserror::Error;

/// 键值行类型（# 元数据 / $ 变量）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValueKind {
    Meta,
    Var,
}

impl fmt::Display for KeyValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValueKind::Meta => f.write_str("元数据"),
            KeyValueKind::Var => f.write_str("变量"),
        }
    }
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 读取阶段（致命，整个会话中止）=====
    #[error("源文件无法读取: {0}")]
    SourceUnreadable(String),

    #[error("源文件格式错误: {0}")]
    MalformedSource(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("{kind}键重复 (行 {line}): {key}")]
    DuplicateMetaOrVarKey {
        kind: KeyValueKind,
        key: String,
        line: usize,
    },

    // ===== 校验阶段 =====
    #[error("数据校验失败，共 {} 行错误", errors.len())]
    ValidationFailed { errors: Vec<String> },

    // ===== 映射阶段（按行汇总，不中止其它行）=====
    #[error("类型转换失败 (行 {line}, 字段 {column}): {message}")]
    FieldConversion {
        line: usize,
        column: String,
        message: String,
    },

    // ===== 持久化 =====
    #[error("资源仓储错误: {0}")]
    Store(#[from] StoreError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 映射阶段的行级错误
    pub fn is_row_level(&self) -> bool {
        matches!(self, ImportError::FieldConversion { .. })
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::SourceUnreadable(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            ImportError::SourceUnreadable(err.to_string())
        } else {
            ImportError::MalformedSource(err.to_string())
        }
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        match err {
            calamine::Error::Io(e)
            | calamine::Error::Xlsx(calamine::XlsxError::Io(e))
            | calamine::Error::Xls(calamine::XlsError::Io(e)) => {
                ImportError::SourceUnreadable(e.to_string())
            }
            other => ImportError::MalformedSource(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_message() {
        let err = ImportError::DuplicateMetaOrVarKey {
            kind: KeyValueKind::Meta,
            key: "author".to_string(),
            line: 3,
        };
        assert_eq!(err.to_string(), "元数据键重复 (行 3): author");
    }

    #[test]
    fn test_io_error_is_unreadable() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(
            ImportError::from(io),
            ImportError::SourceUnreadable(_)
        ));
    }

    #[test]
    fn test_workbook_error_mapping() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            ImportError::from(calamine::Error::Io(io)),
            ImportError::SourceUnreadable(_)
        ));
        assert!(matches!(
            ImportError::from(calamine::Error::Msg("Cannot detect file format")),
            ImportError::MalformedSource(_)
        ));
    }

    #[test]
    fn test_row_level() {
        let err = ImportError::FieldConversion {
            line: 2,
            column: "Hp".to_string(),
            message: "bad".to_string(),
        };
        assert!(err.is_row_level());
        assert!(!ImportError::MalformedSource("x".to_string()).is_row_level());
    }
}
