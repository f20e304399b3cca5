// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// RUST_LOG 控制级别；SHEET_IMPORTER_LOG_FORMAT=json 切换为 JSON 行输出
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 选择输出格式的环境变量
pub const LOG_FORMAT_ENV: &str = "SHEET_IMPORTER_LOG_FORMAT";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// 解析格式名（忽略大小写）；无法识别时回退为文本
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

fn env_filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=sheet_importer=trace
/// - SHEET_IMPORTER_LOG_FORMAT: `text`（默认）或 `json`
///
/// # 示例
/// ```no_run
/// use sheet_importer::logging;
/// logging::init();
/// ```
pub fn init() {
    match LogFormat::from_env() {
        LogFormat::Text => init_text(),
        LogFormat::Json => init_json(),
    }
}

fn init_text() {
    fmt()
        .with_env_filter(env_filter_or("info"))
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 以 JSON 行格式输出日志，附带当前 span（含 session_id）
pub fn init_json() {
    fmt()
        .json()
        .with_env_filter(env_filter_or("info"))
        .with_target(true)
        .with_current_span(true)
        .init();
}

/// 测试用：默认 debug 级别，输出交给测试框架捕获；可重复调用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter_or("debug"))
        .with_test_writer()
        .try_init();
}
