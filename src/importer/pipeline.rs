// ==========================================
// 表格数据导入 - 导入流程编排
// ==========================================
// 流程: 准入过滤 → 读取 → 校验链 → 字段映射 → 加载/创建目标资源 → 写入 → 标记保存
// 红线: 校验失败或全部行映射失败时不触碰仓储；映射阶段的孤立行错误不阻止其它记录落地
// ==========================================

use crate::config::ImportConfig;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_reader::UniversalReader;
use crate::importer::importer_trait::{RecordImporter, RowValidator, TableReader};
use crate::importer::paths::{destination_path, is_importable};
use crate::importer::record_mapper::FieldMapper;
use crate::importer::validation::{ValidationChain, ValidationSession};
use crate::repository::AssetStore;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn, Span};

/// 单个文件的导入结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// 已写入目标资源（可能伴随映射阶段的孤立行错误）
    Imported,
    /// 校验未通过或全部行映射失败，未写入任何内容
    Rejected,
    /// 文件未通过准入过滤
    Skipped,
}

// ==========================================
// ImportReport - 导入报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub session_id: String,
    pub source: String,
    pub destination: Option<String>,
    pub status: ImportStatus,

    pub total_rows: usize,
    pub records_written: usize,

    // 校验链汇总的行错误（按行顺序）
    pub validation_errors: Vec<String>,
    // 映射阶段被跳过行的错误
    pub mapping_errors: Vec<String>,

    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl ImportReport {
    fn new(session_id: String, source: &Path, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            source: source.to_string_lossy().into_owned(),
            destination: None,
            status: ImportStatus::Skipped,
            total_rows: 0,
            records_written: 0,
            validation_errors: Vec::new(),
            mapping_errors: Vec::new(),
            started_at,
            elapsed_ms: 0,
        }
    }

    pub fn is_imported(&self) -> bool {
        self.status == ImportStatus::Imported
    }

    fn finish(mut self, status: ImportStatus, start: Instant) -> Self {
        self.status = status;
        self.elapsed_ms = start.elapsed().as_millis() as u64;
        self
    }
}

// ==========================================
// ImportPipeline - 导入流程
// ==========================================
pub struct ImportPipeline<S: AssetStore, R: TableReader = UniversalReader> {
    store: S,
    reader: R,
    config: ImportConfig,
}

impl<S: AssetStore> ImportPipeline<S, UniversalReader> {
    /// 按扩展名自动选择读取器
    pub fn with_store(store: S, config: ImportConfig) -> Self {
        Self::new(store, UniversalReader, config)
    }
}

impl<S: AssetStore, R: TableReader> ImportPipeline<S, R> {
    pub fn new(store: S, reader: R, config: ImportConfig) -> Self {
        Self {
            store,
            reader,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 导入单个源文件
    ///
    /// # 返回
    /// - Ok(ImportReport): Imported / Rejected / Skipped
    /// - Err: 读取阶段致命错误，或仓储加载/保存失败
    #[instrument(skip(self, path, importer, validator), fields(path = %path.display(), session_id))]
    pub fn import_file<I, V>(
        &self,
        path: &Path,
        importer: &I,
        validator: &V,
    ) -> ImportResult<ImportReport>
    where
        I: RecordImporter,
        V: RowValidator + ?Sized,
    {
        let start = Instant::now();
        let started_at = Utc::now();
        let mut session = ValidationSession::new(&self.store);
        Span::current().record("session_id", session.session_id());

        let mut report = ImportReport::new(session.session_id().to_string(), path, started_at);

        // === 步骤 1: 准入过滤 ===
        if !is_importable(path, &self.config) {
            warn!("文件未通过准入过滤，跳过");
            return Ok(report.finish(ImportStatus::Skipped, start));
        }

        let destination = destination_path(path, &self.config).ok_or_else(|| {
            ImportError::Other(anyhow!("无法计算目标路径: {}", path.display()))
        })?;
        report.destination = Some(destination.clone());
        info!(destination = %destination, "开始导入");

        // === 步骤 2: 读取 ===
        debug!("步骤 2: 读取源文件");
        let mut bundle = self.reader.read_asset(path).map_err(|e| {
            error!(error = %e, "源文件读取失败");
            e
        })?;
        report.total_rows = bundle.rows.len();

        // === 步骤 3: 校验链 ===
        debug!("步骤 3: 校验");
        let mut chain = ValidationChain::new();
        chain.add_rows(&bundle);
        if !chain.run(&mut bundle, validator, &mut session) {
            report.validation_errors = chain.errors().to_vec();
            warn!(
                failed = report.validation_errors.len(),
                "校验未通过，拒绝导入"
            );
            return Ok(report.finish(ImportStatus::Rejected, start));
        }

        // === 步骤 4: 字段映射 ===
        debug!("步骤 4: 字段映射");
        let outcome = FieldMapper::new(importer).map_bundle(&bundle)?;
        report.mapping_errors = outcome.error_messages();
        report.records_written = outcome.records.len();

        // 全部行映射失败: 不写入，避免用空记录覆盖已有资源
        if outcome.records.is_empty() && !outcome.errors.is_empty() {
            warn!(
                failed = report.mapping_errors.len(),
                "所有行映射失败，拒绝导入"
            );
            return Ok(report.finish(ImportStatus::Rejected, start));
        }

        // === 步骤 5: 落地 ===
        debug!("步骤 5: 写入目标资源");
        let (handle, mut asset) = self
            .store
            .load_or_create::<I::Asset>(&destination)?;
        importer.store(&mut asset, &bundle, outcome.records);
        self.store.mark_dirty(&handle, &asset)?;

        let report = report.finish(ImportStatus::Imported, start);
        info!(
            asset_id = %handle.asset_id,
            total_rows = report.total_rows,
            records = report.records_written,
            mapping_errors = report.mapping_errors.len(),
            elapsed_ms = report.elapsed_ms,
            "导入完成"
        );

        Ok(report)
    }

    /// 批量导入多个文件（顺序执行，每个文件独立会话）
    ///
    /// 单个文件失败不影响其它文件
    pub fn import_batch<P, I, V>(
        &self,
        paths: &[P],
        importer: &I,
        validator: &V,
    ) -> Vec<ImportResult<ImportReport>>
    where
        P: AsRef<Path>,
        I: RecordImporter,
        V: RowValidator + ?Sized,
    {
        info!(count = paths.len(), "开始批量导入文件");

        let results: Vec<ImportResult<ImportReport>> = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let result = self.import_file(path, importer, validator);
                if let Err(e) = &result {
                    error!(file = %path.display(), error = %e, "文件导入失败");
                }
                result
            })
            .collect();

        info!(
            total = results.len(),
            imported = results
                .iter()
                .filter(|r| matches!(r, Ok(report) if report.is_imported()))
                .count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}
