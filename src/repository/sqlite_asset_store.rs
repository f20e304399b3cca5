// ==========================================
// 表格数据导入 - SQLite 资源仓储实现
// ==========================================
// 职责: 实现资源查找/加载/保存（使用 rusqlite）
// 存储: asset 表，资源内容以 JSON 存于 payload 列
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::asset::{asset_name_from_path, AssetHandle, StoredAsset};
use crate::repository::asset_store::{AssetIndex, AssetStore};
use crate::repository::error::{StoreError, StoreResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// SqliteAssetStore
// ==========================================
pub struct SqliteAssetStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAssetStore {
    /// 打开（或创建）资源库
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| StoreError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享同一连接）
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> StoreResult<Self> {
        {
            let guard = lock(&conn)?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 内存库（测试用）
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 资源总数
    pub fn count(&self) -> StoreResult<usize> {
        let conn = lock(&self.conn)?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM asset", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn lock(conn: &Mutex<Connection>) -> StoreResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::LockError(e.to_string()))
}

fn row_to_handle(row: &rusqlite::Row<'_>) -> rusqlite::Result<AssetHandle> {
    Ok(AssetHandle {
        asset_id: row.get(0)?,
        asset_type: row.get(1)?,
        name: row.get(2)?,
        path: row.get(3)?,
    })
}

impl AssetIndex for SqliteAssetStore {
    fn find_assets(&self, asset_type: &str, name: &str) -> StoreResult<Vec<AssetHandle>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT asset_id, asset_type, name, path
            FROM asset
            WHERE asset_type = ?1 AND name = ?2
            ORDER BY path
            "#,
        )?;

        let handles = stmt
            .query_map(params![asset_type, name], row_to_handle)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(handles)
    }
}

impl AssetStore for SqliteAssetStore {
    fn load_or_create<A: StoredAsset>(&self, path: &str) -> StoreResult<(AssetHandle, A)> {
        let conn = lock(&self.conn)?;

        let existing = conn
            .query_row(
                "SELECT asset_id, asset_type, name, path, payload FROM asset WHERE path = ?1",
                params![path],
                |row| Ok((row_to_handle(row)?, row.get::<_, String>(4)?)),
            )
            .optional()?;

        if let Some((handle, payload)) = existing {
            if handle.asset_type != A::ASSET_TYPE {
                return Err(StoreError::TypeMismatch {
                    path: path.to_string(),
                    expected: A::ASSET_TYPE.to_string(),
                    actual: handle.asset_type,
                });
            }
            let asset: A = serde_json::from_str(&payload)?;
            debug!(path = %path, asset_id = %handle.asset_id, "加载已有资源");
            return Ok((handle, asset));
        }

        let asset = A::default();
        let handle = AssetHandle {
            asset_id: Uuid::new_v4().to_string(),
            asset_type: A::ASSET_TYPE.to_string(),
            name: asset_name_from_path(path),
            path: path.to_string(),
        };
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO asset (asset_id, asset_type, name, path, payload, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![
                handle.asset_id,
                handle.asset_type,
                handle.name,
                handle.path,
                serde_json::to_string(&asset)?,
                now,
            ],
        )?;

        debug!(path = %path, asset_id = %handle.asset_id, "创建新资源");
        Ok((handle, asset))
    }

    fn mark_dirty<A: StoredAsset>(&self, handle: &AssetHandle, asset: &A) -> StoreResult<()> {
        let conn = lock(&self.conn)?;
        let payload = serde_json::to_string(asset)?;

        let affected = conn.execute(
            "UPDATE asset SET payload = ?1, updated_at = ?2 WHERE asset_id = ?3",
            params![payload, Utc::now().to_rfc3339(), handle.asset_id],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound {
                path: handle.path.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::AssetKind;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct LootTable {
        entries: Vec<String>,
    }

    impl AssetKind for LootTable {
        const ASSET_TYPE: &'static str = "LootTable";
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Dialogue {
        lines: Vec<String>,
    }

    impl AssetKind for Dialogue {
        const ASSET_TYPE: &'static str = "Dialogue";
    }

    #[test]
    fn test_load_or_create_then_reload() {
        let store = SqliteAssetStore::open_in_memory().unwrap();
        let path = "Assets/Resources/Loot/goblin.asset";

        let (handle, mut table) = store.load_or_create::<LootTable>(path).unwrap();
        assert_eq!(handle.name, "goblin");
        assert!(table.entries.is_empty());

        table.entries.push("dagger".to_string());
        store.mark_dirty(&handle, &table).unwrap();

        let (again, reloaded) = store.load_or_create::<LootTable>(path).unwrap();
        assert_eq!(again.asset_id, handle.asset_id);
        assert_eq!(reloaded, table);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_find_assets_by_type_and_name() {
        let store = SqliteAssetStore::open_in_memory().unwrap();
        store
            .load_or_create::<LootTable>("Assets/Resources/A/goblin.asset")
            .unwrap();
        store
            .load_or_create::<LootTable>("Assets/Resources/B/goblin.asset")
            .unwrap();
        store
            .load_or_create::<Dialogue>("Assets/Resources/C/goblin.asset")
            .unwrap();

        assert_eq!(store.find_assets("LootTable", "goblin").unwrap().len(), 2);
        assert_eq!(store.find_assets("Dialogue", "goblin").unwrap().len(), 1);
        assert!(store.find_assets("LootTable", "orc").unwrap().is_empty());
    }

    #[test]
    fn test_load_with_wrong_type_fails() {
        let store = SqliteAssetStore::open_in_memory().unwrap();
        let path = "Assets/Resources/goblin.asset";
        store.load_or_create::<LootTable>(path).unwrap();

        let result = store.load_or_create::<Dialogue>(path);
        assert!(matches!(result, Err(StoreError::TypeMismatch { .. })));
    }

    #[test]
    fn test_mark_dirty_unknown_handle() {
        let store = SqliteAssetStore::open_in_memory().unwrap();
        let handle = AssetHandle {
            asset_id: "missing".to_string(),
            asset_type: "LootTable".to_string(),
            name: "x".to_string(),
            path: "x.asset".to_string(),
        };

        let result = store.mark_dirty(&handle, &LootTable::default());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
