// ==========================================
// 表格数据导入 - 命令行入口
// ==========================================
// 用法:
//   sheet-importer inspect <file>
//   sheet-importer destination <path> [db_path]
//   sheet-importer config [db_path]
//
// inspect: 读取源文件并以 JSON 打印 ImportBundle（不校验、不落地）
// destination: 打印准入判断与目标资源路径；给出 db_path 时从 config_kv 读取规则
// config: 打印生效的导入配置与 config_kv 快照（缺省使用用户数据目录下的资源库）
// ==========================================

use sheet_importer::config::{ConfigManager, ImportConfig};
use sheet_importer::db::default_db_path;
use sheet_importer::importer::{destination_path, is_importable, TableReader, UniversalReader};
use sheet_importer::logging;
use std::path::Path;

const USAGE: &str = "usage:\n  sheet-importer inspect <file>\n  sheet-importer destination <path> [db_path]\n  sheet-importer config [db_path]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    tracing::debug!(version = sheet_importer::VERSION, "sheet-importer 启动");

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_default();

    match command.as_str() {
        "inspect" => {
            let file = args.next().ok_or(USAGE)?;
            let bundle = UniversalReader.read_asset(Path::new(&file))?;
            println!("{}", serde_json::to_string_pretty(&bundle)?);
        }
        "destination" => {
            let path = args.next().ok_or(USAGE)?;
            let config = match args.next().filter(|s| !s.trim().is_empty()) {
                Some(db_path) => ImportConfig::load(&ConfigManager::new(&db_path)?)?,
                None => ImportConfig::default(),
            };

            let path = Path::new(&path);
            println!("importable={}", is_importable(path, &config));
            match destination_path(path, &config) {
                Some(destination) => println!("destination={}", destination),
                None => println!("destination="),
            }
        }
        "config" => {
            let db_path = match args.next() {
                Some(p) => p,
                None => {
                    let path = default_db_path();
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    path.to_string_lossy().into_owned()
                }
            };

            let manager = ConfigManager::new(&db_path)?;
            let config = ImportConfig::load(&manager)?;
            println!("db_path={}", db_path);
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("config_kv={}", manager.get_config_snapshot()?);
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}
