// ==========================================
// 表格数据导入 - 资源仓储 Trait
// ==========================================
// 职责: 定义持久化协作方接口（不包含实现）
// 红线: 仓储不含导入业务规则，只做资源查找/加载/保存
// ==========================================

use crate::domain::asset::{AssetHandle, StoredAsset};
use crate::repository::error::StoreResult;

// ==========================================
// AssetIndex Trait
// ==========================================
// 用途: 按类型 + 名称查找资源（校验阶段资源引用检查）
// 实现者: SqliteAssetStore, MemoryAssetStore
pub trait AssetIndex {
    /// 查找指定类型、指定名称的全部资源
    ///
    /// # 返回
    /// - Ok(Vec<AssetHandle>): 命中的资源（可能为 0 个或多个）
    /// - Err: 底层查询失败
    fn find_assets(&self, asset_type: &str, name: &str) -> StoreResult<Vec<AssetHandle>>;
}

// ==========================================
// AssetStore Trait
// ==========================================
// 用途: 导入结果落地
// 实现者: SqliteAssetStore, MemoryAssetStore
pub trait AssetStore: AssetIndex {
    /// 加载指定路径的资源；不存在则以默认值创建
    ///
    /// # 参数
    /// - path: 目标资源路径（已完成目录/扩展名重映射）
    ///
    /// # 返回
    /// - Ok((AssetHandle, A)): 资源句柄与资源内容
    /// - Err: 类型不匹配、反序列化失败、数据库错误
    fn load_or_create<A: StoredAsset>(&self, path: &str) -> StoreResult<(AssetHandle, A)>;

    /// 标记资源已修改并写回
    fn mark_dirty<A: StoredAsset>(&self, handle: &AssetHandle, asset: &A) -> StoreResult<()>;
}
