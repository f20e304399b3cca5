// ==========================================
// 表格数据导入 - 资源仓储错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 资源仓储错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    // ===== 资源错误 =====
    #[error("资源未找到: {path}")]
    NotFound { path: String },

    #[error("资源类型不匹配 (path={path}): 期望 {expected}，实际 {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    // ===== 序列化错误 =====
    #[error("资源内容序列化失败: {0}")]
    Serialization(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                StoreError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) => StoreError::DatabaseQueryError(msg),
            _ => StoreError::DatabaseQueryError(err.to_string()),
        }
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result 类型别名
pub type StoreResult<T> = Result<T, StoreError>;
