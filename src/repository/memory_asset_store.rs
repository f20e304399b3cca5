// ==========================================
// 表格数据导入 - 内存资源仓储
// ==========================================
// 用途: 测试 / 预检（dry-run）场景，不落盘
// 语义与 SqliteAssetStore 保持一致
// ==========================================

use crate::domain::asset::{asset_name_from_path, AssetHandle, StoredAsset};
use crate::repository::asset_store::{AssetIndex, AssetStore};
use crate::repository::error::{StoreError, StoreResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug)]
struct StoredEntry {
    handle: AssetHandle,
    payload: String,
}

#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    // 路径 → 资源
    entries: Mutex<BTreeMap<String, StoredEntry>>,
    query_count: AtomicUsize,
    fail_queries: AtomicBool,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接登记一个资源（内容为空 JSON 对象）
    pub fn register(&self, asset_type: &str, path: &str) -> StoreResult<AssetHandle> {
        let handle = AssetHandle {
            asset_id: Uuid::new_v4().to_string(),
            asset_type: asset_type.to_string(),
            name: asset_name_from_path(path),
            path: path.to_string(),
        };

        self.lock()?.insert(
            path.to_string(),
            StoredEntry {
                handle: handle.clone(),
                payload: "{}".to_string(),
            },
        );
        Ok(handle)
    }

    /// find_assets 被调用的次数
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    /// 让后续 find_assets 全部失败（模拟底层索引故障）
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// 读取指定路径资源的内容
    pub fn get<A: StoredAsset>(&self, path: &str) -> StoreResult<Option<A>> {
        let entries = self.lock()?;
        match entries.get(path) {
            Some(entry) => Ok(Some(serde_json::from_str(&entry.payload)?)),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, StoredEntry>>> {
        self.entries
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))
    }
}

impl AssetIndex for MemoryAssetStore {
    fn find_assets(&self, asset_type: &str, name: &str) -> StoreResult<Vec<AssetHandle>> {
        self.query_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::DatabaseQueryError(
                "资源索引不可用".to_string(),
            ));
        }

        let entries = self.lock()?;
        Ok(entries
            .values()
            .filter(|e| e.handle.asset_type == asset_type && e.handle.name == name)
            .map(|e| e.handle.clone())
            .collect())
    }
}

impl AssetStore for MemoryAssetStore {
    fn load_or_create<A: StoredAsset>(&self, path: &str) -> StoreResult<(AssetHandle, A)> {
        let mut entries = self.lock()?;

        if let Some(entry) = entries.get(path) {
            if entry.handle.asset_type != A::ASSET_TYPE {
                return Err(StoreError::TypeMismatch {
                    path: path.to_string(),
                    expected: A::ASSET_TYPE.to_string(),
                    actual: entry.handle.asset_type.clone(),
                });
            }
            let asset: A = serde_json::from_str(&entry.payload)?;
            return Ok((entry.handle.clone(), asset));
        }

        let asset = A::default();
        let handle = AssetHandle {
            asset_id: Uuid::new_v4().to_string(),
            asset_type: A::ASSET_TYPE.to_string(),
            name: asset_name_from_path(path),
            path: path.to_string(),
        };
        entries.insert(
            path.to_string(),
            StoredEntry {
                handle: handle.clone(),
                payload: serde_json::to_string(&asset)?,
            },
        );

        Ok((handle, asset))
    }

    fn mark_dirty<A: StoredAsset>(&self, handle: &AssetHandle, asset: &A) -> StoreResult<()> {
        let mut entries = self.lock()?;
        let payload = serde_json::to_string(asset)?;

        match entries.get_mut(&handle.path) {
            Some(entry) if entry.handle.asset_id == handle.asset_id => {
                entry.payload = payload;
                Ok(())
            }
            _ => Err(StoreError::NotFound {
                path: handle.path.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::AssetKind;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Deck {
        cards: Vec<u32>,
    }

    impl AssetKind for Deck {
        const ASSET_TYPE: &'static str = "Deck";
    }

    #[test]
    fn test_register_and_find() {
        let store = MemoryAssetStore::new();
        store.register("Sprite", "Assets/Resources/a/sword.asset").unwrap();
        store.register("Sprite", "Assets/Resources/b/sword.asset").unwrap();

        assert_eq!(store.find_assets("Sprite", "sword").unwrap().len(), 2);
        assert!(store.find_assets("Sound", "sword").unwrap().is_empty());
        assert_eq!(store.query_count(), 2);
    }

    #[test]
    fn test_fail_queries() {
        let store = MemoryAssetStore::new();
        store.set_fail_queries(true);

        assert!(store.find_assets("Sprite", "sword").is_err());
    }

    #[test]
    fn test_round_trip_through_store() {
        let store = MemoryAssetStore::new();
        let (handle, mut deck) = store.load_or_create::<Deck>("decks/starter.asset").unwrap();
        deck.cards = vec![1, 2, 3];
        store.mark_dirty(&handle, &deck).unwrap();

        let loaded: Option<Deck> = store.get("decks/starter.asset").unwrap();
        assert_eq!(loaded, Some(deck));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let store = MemoryAssetStore::new();
        store.register("Sprite", "Assets/Resources/a/sword.asset").unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.entries.lock().unwrap();
            panic!("poison");
        }));

        assert!(matches!(store.len(), Err(StoreError::LockError(_))));
        assert!(store.is_empty().is_err());
        assert!(matches!(
            store.register("Sprite", "Assets/Resources/b/shield.asset"),
            Err(StoreError::LockError(_))
        ));
    }
}
