// ==========================================
// 表格数据导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{init_schema, open_sqlite_connection};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值（空白值视为未配置）
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Some(_) => {
                warn!(config_key = key, "配置值为空，使用默认值");
                Ok(default.to_string())
            }
            None => Ok(default.to_string()),
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 导入报告与排障时记录当时生效的配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_source_extensions(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::SOURCE_EXTENSIONS, "xlsx")?;

        let extensions: Vec<String> = value
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        if extensions.is_empty() {
            warn!(config_key = config_keys::SOURCE_EXTENSIONS, raw_value = %value, "扩展名配置格式错误，使用默认值");
            Ok(vec!["xlsx".to_string()])
        } else {
            Ok(extensions)
        }
    }

    fn get_temp_file_marker(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::TEMP_FILE_MARKER, "~$")
    }

    fn get_project_root(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::PROJECT_ROOT, "Assets")
    }

    fn get_destination_root(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::DESTINATION_ROOT, "Resources")
    }

    fn get_asset_extension(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::ASSET_EXTENSION, "asset")?;
        Ok(value.trim_start_matches('.').to_string())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 源文件过滤
    pub const SOURCE_EXTENSIONS: &str = "source_extensions";
    pub const TEMP_FILE_MARKER: &str = "temp_file_marker";

    // 目标路径
    pub const PROJECT_ROOT: &str = "project_root";
    pub const DESTINATION_ROOT: &str = "destination_root";
    pub const ASSET_EXTENSION: &str = "asset_extension";
}
