// ==========================================
// 表格数据导入 - 导入配置快照
// ==========================================
// 用途: 一次导入开始时从 ImportConfigReader 读取，之后不再回查数据库
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub source_extensions: Vec<String>,
    pub temp_file_marker: String,
    pub project_root: String,
    pub destination_root: String,
    pub asset_extension: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source_extensions: vec!["xlsx".to_string()],
            temp_file_marker: "~$".to_string(),
            project_root: "Assets".to_string(),
            destination_root: "Resources".to_string(),
            asset_extension: "asset".to_string(),
        }
    }
}

impl ImportConfig {
    pub fn load<R: ImportConfigReader + ?Sized>(reader: &R) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            source_extensions: reader.get_source_extensions()?,
            temp_file_marker: reader.get_temp_file_marker()?,
            project_root: reader.get_project_root()?,
            destination_root: reader.get_destination_root()?,
            asset_extension: reader.get_asset_extension()?,
        })
    }

    /// 额外接受 CSV 源文件
    pub fn with_csv(mut self) -> Self {
        if !self.source_extensions.iter().any(|e| e == "csv") {
            self.source_extensions.push("csv".to_string());
        }
        self
    }
}
