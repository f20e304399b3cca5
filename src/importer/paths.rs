// ==========================================
// 表格数据导入 - 路径规则
// ==========================================
// 职责: 源文件准入过滤 + 源路径 → 目标资源路径
// 规则: <工程根>/<第一级目录>/子目录/文件.xlsx
//     → <工程根>/<目标根>/子目录/文件.<资源扩展名>
// ==========================================

use crate::config::ImportConfig;
use std::path::Path;

/// 源文件是否应进入导入流程
///
/// 文件名须以已配置的扩展名结尾，且不含临时文件标记（如 Excel 的 `~$` 锁文件）
pub fn is_importable(path: &Path, config: &ImportConfig) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if !config.temp_file_marker.is_empty() && name.contains(&config.temp_file_marker) {
        return false;
    }

    let lower = name.to_lowercase();
    config
        .source_extensions
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}

/// 计算目标资源路径（统一使用 `/` 分隔）
///
/// 路径中没有文件名时返回 None
pub fn destination_path(source: &Path, config: &ImportConfig) -> Option<String> {
    let normalized = source.to_string_lossy().replace('\\', "/");

    let mut segments: Vec<&str> = normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    // 绝对路径时从工程根目录段开始截取
    if let Some(pos) = segments.iter().position(|s| *s == config.project_root) {
        segments.drain(..=pos);
    }

    let file_name = segments.pop()?;
    let stem = Path::new(file_name).file_stem()?.to_str()?;

    match segments.first_mut() {
        Some(first) => *first = config.destination_root.as_str(),
        None => segments.push(config.destination_root.as_str()),
    }

    let mut parts = Vec::with_capacity(segments.len() + 2);
    if !config.project_root.is_empty() {
        parts.push(config.project_root.clone());
    }
    parts.extend(segments.iter().map(|s| s.to_string()));
    parts.push(format!("{}.{}", stem, config.asset_extension));

    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_importable() {
        let config = ImportConfig::default();

        assert!(is_importable(Path::new("Assets/Data/items.xlsx"), &config));
        assert!(is_importable(Path::new("Assets/Data/ITEMS.XLSX"), &config));
        assert!(!is_importable(Path::new("Assets/Data/~$items.xlsx"), &config));
        assert!(!is_importable(Path::new("Assets/Data/items.csv"), &config));
        assert!(!is_importable(Path::new("Assets/Data/items.xlsx.bak"), &config));
    }

    #[test]
    fn test_csv_opt_in() {
        let config = ImportConfig::default().with_csv();
        assert!(is_importable(Path::new("monsters.csv"), &config));
    }

    #[test]
    fn test_destination_path() {
        let config = ImportConfig::default();

        assert_eq!(
            destination_path(Path::new("Assets/Data/Items/potions.xlsx"), &config).as_deref(),
            Some("Assets/Resources/Items/potions.asset")
        );
        assert_eq!(
            destination_path(Path::new("Assets\\Sheets\\monsters.xlsx"), &config).as_deref(),
            Some("Assets/Resources/monsters.asset")
        );
    }

    #[test]
    fn test_destination_path_absolute_source() {
        let config = ImportConfig::default();

        assert_eq!(
            destination_path(Path::new("/home/dev/game/Assets/Data/Items/potions.xlsx"), &config)
                .as_deref(),
            Some("Assets/Resources/Items/potions.asset")
        );
    }

    #[test]
    fn test_destination_path_without_folder() {
        let config = ImportConfig::default();

        assert_eq!(
            destination_path(Path::new("Assets/loot.xlsx"), &config).as_deref(),
            Some("Assets/Resources/loot.asset")
        );
        assert_eq!(destination_path(Path::new("Assets/"), &config), None);
    }
}
