// ==========================================
// 表格数据导入 - 资源句柄与资源类型
// ==========================================
// 职责: 描述持久化层中的资源（类型 + 名称 + 路径）
// ==========================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 资源类型标记
///
/// 资源索引以 `ASSET_TYPE` + 资源名定位资源
pub trait AssetKind {
    const ASSET_TYPE: &'static str;
}

/// 可由资源仓储加载/创建/保存的资源
pub trait StoredAsset: AssetKind + Default + Serialize + DeserializeOwned {}

impl<T> StoredAsset for T where T: AssetKind + Default + Serialize + DeserializeOwned {}

// ==========================================
// AssetHandle - 资源句柄
// ==========================================
// 用途: 资源索引查询结果；校验阶段挂到 Row 上供映射阶段复用
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle {
    pub asset_id: String,
    pub asset_type: String,
    pub name: String,
    pub path: String,
}

/// 资源名 = 路径的文件名（不含扩展名）
pub fn asset_name_from_path(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}
