// ==========================================
// 表格数据导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入流程所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader {
    // ===== 源文件过滤 =====

    /// 可导入的源文件扩展名（不含点，小写）
    ///
    /// # 默认值
    /// - ["xlsx"]
    fn get_source_extensions(&self) -> Result<Vec<String>, Box<dyn Error>>;

    /// 临时文件标记（文件名包含该子串即跳过）
    ///
    /// # 默认值
    /// - "~$"
    fn get_temp_file_marker(&self) -> Result<String, Box<dyn Error>>;

    // ===== 目标路径规则 =====

    /// 源路径的工程根目录段
    ///
    /// # 默认值
    /// - "Assets"
    fn get_project_root(&self) -> Result<String, Box<dyn Error>>;

    /// 替换工程根下第一级目录的目标目录名
    ///
    /// # 默认值
    /// - "Resources"
    fn get_destination_root(&self) -> Result<String, Box<dyn Error>>;

    /// 持久化资源扩展名（不含点）
    ///
    /// # 默认值
    /// - "asset"
    fn get_asset_extension(&self) -> Result<String, Box<dyn Error>>;
}
