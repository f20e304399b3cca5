// ==========================================
// 表格数据导入 - 校验链
// ==========================================
// 职责: 逐行调用用户校验器 → 汇总错误 → 全部通过才发布到 ImportBundle
// 状态: Empty → Loaded → Passed | Failed
// 红线: 全有或全无；任一行失败则不发布任何行
// ==========================================

use crate::domain::{AssetHandle, AssetKind, ImportBundle, Row};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::RowValidator;
use crate::repository::AssetIndex;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 校验链状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Empty,
    Loaded,
    Passed,
    Failed,
}

// ==========================================
// ResourceVerdict - 资源引用检查结论（会话内缓存）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceVerdict {
    Found(AssetHandle),
    NotFound,
    Conflict,
}

impl ResourceVerdict {
    pub fn is_found(&self) -> bool {
        matches!(self, ResourceVerdict::Found(_))
    }

    pub fn handle(&self) -> Option<&AssetHandle> {
        match self {
            ResourceVerdict::Found(handle) => Some(handle),
            _ => None,
        }
    }
}

// ==========================================
// ValidationSession - 单次导入的校验上下文
// ==========================================
// 生命周期: 一次导入一个会话；资源缓存不跨会话复用
pub struct ValidationSession<'a> {
    session_id: String,
    index: &'a dyn AssetIndex,

    // (资源类型, 资源名) → 结论
    resource_cache: HashMap<(String, String), ResourceVerdict>,
}

impl<'a> ValidationSession<'a> {
    pub fn new(index: &'a dyn AssetIndex) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            index,
            resource_cache: HashMap::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 检查行引用的资源是否唯一存在
    ///
    /// - 唯一命中：资源句柄挂到行上，返回 true
    /// - 未命中 / 多个命中 / 查询失败：写入行错误信息，返回 false
    ///
    /// 同一 (类型, 名称) 在会话内只查询一次
    pub fn is_valid_resource<K: AssetKind>(&mut self, name: &str, row: &mut Row) -> bool {
        self.check_resource(K::ASSET_TYPE, name, row)
    }

    /// 以运行时类型名检查资源（类型名来自表格内容时使用）
    pub fn check_resource(&mut self, asset_type: &str, name: &str, row: &mut Row) -> bool {
        let verdict = self.resolve(asset_type, name);

        match verdict {
            ResourceVerdict::Found(handle) => {
                row.attach_resource(name, handle);
                true
            }
            ResourceVerdict::NotFound => {
                row.set_error_message(format!(
                    "resource of type {} with name {} was not found",
                    asset_type, name
                ));
                false
            }
            ResourceVerdict::Conflict => {
                row.set_error_message("conflict - more than one instance of resource exists");
                false
            }
        }
    }

    /// 会话内已缓存的结论
    pub fn cached_verdict(&self, asset_type: &str, name: &str) -> Option<&ResourceVerdict> {
        self.resource_cache
            .get(&(asset_type.to_string(), name.to_string()))
    }

    pub fn cached_lookups(&self) -> usize {
        self.resource_cache.len()
    }

    /// 清空资源缓存（开始新一次导入）
    pub fn clear(&mut self) {
        self.resource_cache.clear();
        self.session_id = Uuid::new_v4().to_string();
    }

    fn resolve(&mut self, asset_type: &str, name: &str) -> ResourceVerdict {
        let key = (asset_type.to_string(), name.to_string());
        if let Some(verdict) = self.resource_cache.get(&key) {
            return verdict.clone();
        }

        let verdict = match self.index.find_assets(asset_type, name) {
            Ok(mut handles) if handles.len() == 1 => ResourceVerdict::Found(handles.remove(0)),
            Ok(handles) if handles.is_empty() => ResourceVerdict::NotFound,
            Ok(handles) => {
                debug!(asset_type, name, count = handles.len(), "资源重名");
                ResourceVerdict::Conflict
            }
            Err(e) => {
                warn!(asset_type, name, error = %e, "资源索引查询失败，按不存在处理");
                ResourceVerdict::NotFound
            }
        };

        self.resource_cache.insert(key, verdict.clone());
        verdict
    }
}

// ==========================================
// ValidationChain - 校验链
// ==========================================
#[derive(Debug)]
pub struct ValidationChain {
    rows: Vec<Row>,
    errors: Vec<String>,
    state: ChainState,
}

impl Default for ValidationChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationChain {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            errors: Vec::new(),
            state: ChainState::Empty,
        }
    }

    /// 把数据包中的行原样挂入校验链
    pub fn add_rows(&mut self, bundle: &ImportBundle) {
        self.rows.extend(bundle.rows.iter().cloned());
        self.state = ChainState::Loaded;
        debug!(rows = self.rows.len(), "数据行已挂入校验链");
    }

    /// 按原始顺序逐行校验
    ///
    /// # 返回
    /// - true: 全部通过，已校验行发布到 bundle
    /// - false: 至少一行失败，bundle 不发布任何行，错误见 `errors()`
    ///
    /// 重复调用会从头重新执行全部校验（资源缓存除外）
    pub fn run<V: RowValidator + ?Sized>(
        &mut self,
        bundle: &mut ImportBundle,
        validator: &V,
        session: &mut ValidationSession<'_>,
    ) -> bool {
        self.errors.clear();
        bundle.clear_validated();

        for row in &mut self.rows {
            row.reset_verdict();
            validator.validate(row, session);

            if !row.is_valid() {
                warn!(line = row.line_number, error = %row.error_message(), "数据行校验失败");
                self.errors.push(row.error_message().to_string());
            }
        }

        if self.errors.is_empty() {
            bundle.publish_validated(self.rows.clone());
            self.state = ChainState::Passed;
        } else {
            self.state = ChainState::Failed;
        }

        info!(
            session_id = %session.session_id(),
            rows = self.rows.len(),
            failed = self.errors.len(),
            resources = session.cached_lookups(),
            "校验链执行完成"
        );

        self.state == ChainState::Passed
    }

    /// 与 `run` 相同，失败时转为 `ImportError::ValidationFailed`
    pub fn run_checked<V: RowValidator + ?Sized>(
        &mut self,
        bundle: &mut ImportBundle,
        validator: &V,
        session: &mut ValidationSession<'_>,
    ) -> ImportResult<()> {
        if self.run(bundle, validator, session) {
            Ok(())
        } else {
            Err(ImportError::ValidationFailed {
                errors: self.errors.clone(),
            })
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn state(&self) -> ChainState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::importer_trait::AcceptAll;
    use crate::repository::MemoryAssetStore;

    struct Sprite;

    impl AssetKind for Sprite {
        const ASSET_TYPE: &'static str = "Sprite";
    }

    fn foo_bar_baz() -> ImportBundle {
        let mut bundle = ImportBundle::with_field_names(["Foo", "Bar", "Baz"]);
        bundle.push_cells(2, &["1", "2", "3"]);
        bundle.push_cells(3, &["4", "5", "6"]);
        bundle
    }

    struct RejectFirst;

    impl RowValidator for RejectFirst {
        fn validate(&self, row: &mut Row, _session: &mut ValidationSession<'_>) {
            if row.line_number == 2 {
                row.set_error_message("bad baz");
            }
        }
    }

    struct RejectAll;

    impl RowValidator for RejectAll {
        fn validate(&self, row: &mut Row, _session: &mut ValidationSession<'_>) {
            let msg = format!("Foo={}", row["Foo"].value());
            row.set_error_message(msg);
        }
    }

    struct SpriteRef;

    impl RowValidator for SpriteRef {
        fn validate(&self, row: &mut Row, session: &mut ValidationSession<'_>) {
            let name = row["Foo"].value().to_string();
            session.is_valid_resource::<Sprite>(&name, row);
        }
    }

    #[test]
    fn test_all_pass_publishes_rows() {
        let store = MemoryAssetStore::new();
        let mut session = ValidationSession::new(&store);
        let mut bundle = foo_bar_baz();
        let mut chain = ValidationChain::new();
        assert_eq!(chain.state(), ChainState::Empty);

        chain.add_rows(&bundle);
        assert_eq!(chain.state(), ChainState::Loaded);

        assert!(chain.run(&mut bundle, &AcceptAll, &mut session));
        assert_eq!(chain.state(), ChainState::Passed);

        let published = bundle.validated_rows().unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].as_int("Baz"), Ok(3));
        assert_eq!(published[1].line_number, 3);
    }

    #[test]
    fn test_failure_publishes_nothing() {
        let store = MemoryAssetStore::new();
        let mut session = ValidationSession::new(&store);
        let mut bundle = foo_bar_baz();
        let mut chain = ValidationChain::new();
        chain.add_rows(&bundle);

        assert!(!chain.run(&mut bundle, &RejectFirst, &mut session));

        assert_eq!(chain.state(), ChainState::Failed);
        assert_eq!(chain.errors(), ["error line: 2: bad baz"]);
        assert!(bundle.validated_rows().is_none());
    }

    #[test]
    fn test_all_rows_visited_and_errors_ordered() {
        let store = MemoryAssetStore::new();
        let mut session = ValidationSession::new(&store);
        let mut bundle = foo_bar_baz();
        let mut chain = ValidationChain::new();
        chain.add_rows(&bundle);

        assert!(!chain.run(&mut bundle, &RejectAll, &mut session));
        assert_eq!(
            chain.errors(),
            ["error line: 2: Foo=1", "error line: 3: Foo=4"]
        );
    }

    #[test]
    fn test_rerun_executes_from_scratch() {
        let store = MemoryAssetStore::new();
        let mut session = ValidationSession::new(&store);
        let mut bundle = foo_bar_baz();
        let mut chain = ValidationChain::new();
        chain.add_rows(&bundle);

        assert!(!chain.run(&mut bundle, &RejectFirst, &mut session));
        assert!(chain.run(&mut bundle, &AcceptAll, &mut session));

        assert!(chain.errors().is_empty());
        assert!(chain.rows().iter().all(Row::is_valid));
        assert_eq!(bundle.validated_rows().map(<[Row]>::len), Some(2));
    }

    #[test]
    fn test_run_checked_error() {
        let store = MemoryAssetStore::new();
        let mut session = ValidationSession::new(&store);
        let mut bundle = foo_bar_baz();
        let mut chain = ValidationChain::new();
        chain.add_rows(&bundle);

        let err = chain
            .run_checked(&mut bundle, &RejectFirst, &mut session)
            .unwrap_err();
        assert!(matches!(err, ImportError::ValidationFailed { ref errors } if errors.len() == 1));
    }

    #[test]
    fn test_resource_found_attaches_handle() {
        let store = MemoryAssetStore::new();
        let handle = store.register("Sprite", "Assets/Resources/Sprites/1.asset").unwrap();
        let mut session = ValidationSession::new(&store);
        let mut row = Row::with_fields(2, [("Foo", "1")]);

        assert!(session.is_valid_resource::<Sprite>("1", &mut row));
        assert!(row.is_valid());
        assert_eq!(row.resource("1"), Some(&handle));
    }

    #[test]
    fn test_resource_not_found_message() {
        let store = MemoryAssetStore::new();
        let mut session = ValidationSession::new(&store);
        let mut row = Row::new(7);

        assert!(!session.is_valid_resource::<Sprite>("ghost", &mut row));
        assert_eq!(
            row.error_message(),
            "error line: 7: resource of type Sprite with name ghost was not found"
        );
    }

    #[test]
    fn test_resource_conflict_message() {
        let store = MemoryAssetStore::new();
        store.register("Sprite", "a/twin.asset").unwrap();
        store.register("Sprite", "b/twin.asset").unwrap();
        let mut session = ValidationSession::new(&store);
        let mut row = Row::new(4);

        assert!(!session.is_valid_resource::<Sprite>("twin", &mut row));
        assert_eq!(
            row.error_message(),
            "error line: 4: conflict - more than one instance of resource exists"
        );
        assert_eq!(
            session.cached_verdict("Sprite", "twin"),
            Some(&ResourceVerdict::Conflict)
        );
    }

    #[test]
    fn test_resource_cache_queries_once() {
        let store = MemoryAssetStore::new();
        store.register("Sprite", "Assets/Resources/1.asset").unwrap();
        let mut session = ValidationSession::new(&store);
        let mut bundle = ImportBundle::with_field_names(["Foo"]);
        bundle.push_cells(2, &["1"]);
        bundle.push_cells(3, &["1"]);
        bundle.push_cells(4, &["missing"]);
        bundle.push_cells(5, &["missing"]);
        let mut chain = ValidationChain::new();
        chain.add_rows(&bundle);

        assert!(!chain.run(&mut bundle, &SpriteRef, &mut session));

        // 两个不同的 (类型, 名称) → 两次底层查询
        assert_eq!(store.query_count(), 2);
        // 重复引用得到相同结论
        assert_eq!(chain.errors().len(), 2);
        assert!(chain.rows()[1].resource("1").is_some());

        // 重跑校验不再查询
        chain.run(&mut bundle, &SpriteRef, &mut session);
        assert_eq!(store.query_count(), 2);
    }

    #[test]
    fn test_query_failure_degrades_to_row_error() {
        let store = MemoryAssetStore::new();
        store.set_fail_queries(true);
        let mut session = ValidationSession::new(&store);
        let mut row = Row::new(9);

        assert!(!session.is_valid_resource::<Sprite>("sword", &mut row));
        assert!(!row.is_valid());
        assert_eq!(
            session.cached_verdict("Sprite", "sword"),
            Some(&ResourceVerdict::NotFound)
        );
    }

    #[test]
    fn test_clear_resets_cache() {
        let store = MemoryAssetStore::new();
        let mut session = ValidationSession::new(&store);
        let first_id = session.session_id().to_string();
        let mut row = Row::new(1);

        session.is_valid_resource::<Sprite>("a", &mut row);
        assert_eq!(session.cached_lookups(), 1);

        session.clear();
        assert_eq!(session.cached_lookups(), 0);
        assert_ne!(session.session_id(), first_id);
    }
}
