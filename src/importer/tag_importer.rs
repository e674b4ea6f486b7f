// ==========================================
// TAG 进度跟踪系统 - 批量更新导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 解析 → 映射 → 对账 → 逐条落库（字段 + 状态一次写入）
// 红线: 单条落库失败只记入 failed_writes，不中断批次
// ==========================================

use crate::domain::import::{FailedWrite, TagImportReport};
use crate::domain::types::Discipline;
use crate::engine::reconciliation::ReconciliationEngine;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::tag_importer_trait::{FieldMapper, FileParser, RawRow, TagImporter};
use crate::repository::record_store::RecordStore;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// TagImporterImpl - 批量更新导入器
// ==========================================
pub struct TagImporterImpl<S>
where
    S: RecordStore,
{
    // 数据访问层
    store: Arc<S>,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    field_mapper: Box<dyn FieldMapper>,

    // 对账引擎
    reconciliation: ReconciliationEngine,
}

impl<S> TagImporterImpl<S>
where
    S: RecordStore,
{
    /// 创建新的导入器实例
    ///
    /// # 参数
    /// - store: 记录存储
    /// - file_parser: 文件解析器
    /// - field_mapper: 字段映射器
    /// - reconciliation: 对账引擎
    pub fn new(
        store: Arc<S>,
        file_parser: Box<dyn FileParser>,
        field_mapper: Box<dyn FieldMapper>,
        reconciliation: ReconciliationEngine,
    ) -> Self {
        Self {
            store,
            file_parser,
            field_mapper,
            reconciliation,
        }
    }
}

#[async_trait]
impl<S> TagImporter for TagImporterImpl<S>
where
    S: RecordStore + Send + Sync,
{
    #[instrument(skip(self, file_path), fields(discipline = %discipline))]
    async fn import_file(
        &self,
        discipline: Discipline,
        file_path: &Path,
    ) -> ImportResult<TagImportReport> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let rows = self
            .file_parser
            .parse_to_raw_records(file_path)
            .map_err(|e| {
                error!(error = %e, file = %file_path.display(), "文件解析失败");
                e
            })?;
        info!(total_rows = rows.len(), "文件解析完成");

        self.import_rows(discipline, rows, file_name).await
    }

    #[instrument(skip(self, rows), fields(discipline = %discipline, batch_id))]
    async fn import_rows(
        &self,
        discipline: Discipline,
        rows: Vec<RawRow>,
        file_name: Option<String>,
    ) -> ImportResult<TagImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, file = ?file_name, "开始导入批量更新");

        // === 步骤 2: 字段映射 ===
        debug!("步骤 2: 字段映射");
        if !rows.is_empty() {
            let mut headers: Vec<&str> = rows
                .iter()
                .flat_map(|row| row.keys().map(String::as_str))
                .collect();
            headers.sort_unstable();
            headers.dedup();
            if !self.field_mapper.has_key_column(&headers) {
                return Err(ImportError::MissingKeyColumn(headers.join(", ")));
            }
        }

        let total_rows = rows.len();
        let mut incoming = Vec::with_capacity(total_rows);
        let mut cell_issues = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let mapped = self.field_mapper.map_row(row, idx + 1);
            for issue in &mapped.issues {
                warn!(
                    row_number = issue.row_number,
                    column = %issue.column,
                    value = %issue.value,
                    "单元格无法解析，已忽略"
                );
            }
            cell_issues.extend(mapped.issues);
            incoming.push(mapped.incoming);
        }
        info!(rows = incoming.len(), cell_issues = cell_issues.len(), "字段映射完成");

        // === 步骤 3: 读取规范记录集 ===
        debug!("步骤 3: 读取规范记录集");
        let canonical = self.store.read_all(discipline).await?;

        // === 步骤 4: 对账 ===
        debug!("步骤 4: 对账");
        let outcome = self.reconciliation.merge(&incoming, &canonical);

        // === 步骤 5: 逐条落库 ===
        debug!("步骤 5: 落库");
        let mut persisted_count = 0;
        let mut failed_writes = Vec::new();
        for change in &outcome.changes {
            match self
                .store
                .write_row(discipline, &change.key, &change.fields, change.status)
                .await
            {
                Ok(()) => persisted_count += 1,
                Err(e) => {
                    warn!(key = %change.key, error = %e, "记录落库失败，继续处理后续记录");
                    failed_writes.push(FailedWrite {
                        key: change.key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            matched = outcome.matched_count,
            unmatched = outcome.unmatched_keys.len(),
            skipped = outcome.skipped_count,
            persisted = persisted_count,
            failed = failed_writes.len(),
            elapsed_ms = elapsed_ms,
            "批量更新导入完成"
        );

        Ok(TagImportReport {
            batch_id,
            discipline,
            file_name,
            total_rows,
            matched_count: outcome.matched_count,
            skipped_rows: outcome.skipped_rows(),
            unmatched_keys: outcome.unmatched_keys,
            skipped_count: outcome.skipped_count,
            persisted_count,
            failed_writes,
            cell_issues,
            warnings: outcome.warnings,
            imported_at: Utc::now(),
            elapsed_ms,
        })
    }

    async fn batch_import(
        &self,
        files: Vec<(Discipline, PathBuf)>,
    ) -> Vec<Result<TagImportReport, String>> {
        use futures::future::join_all;

        info!(count = files.len(), "开始批量导入文件");

        // 为每个文件创建导入任务
        let import_tasks = files.into_iter().map(|(discipline, path)| async move {
            let path_str = path.display().to_string();
            info!(file = %path_str, discipline = %discipline, "开始导入文件");
            match self.import_file(discipline, &path).await {
                Ok(report) => {
                    info!(
                        file = %path_str,
                        matched = report.matched_count,
                        "文件导入成功"
                    );
                    Ok(report)
                }
                Err(e) => {
                    error!(file = %path_str, error = %e, "文件导入失败");
                    Err(format!("文件 {} 导入失败: {}", path_str, e))
                }
            }
        });

        // 并发执行所有导入任务
        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{FieldPatch, RecordSet, TagRecord};
    use crate::domain::types::TagStatus;
    use crate::importer::field_mapper::FieldMapper as TagFieldMapper;
    use crate::importer::file_parser::UniversalFileParser;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 内存存储：可指定写入必定失败的 key
    struct MemoryStore {
        records: Mutex<Vec<TagRecord>>,
        failing_key: Option<String>,
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn read_all(&self, discipline: Discipline) -> RepositoryResult<RecordSet> {
            let records = self.records.lock().unwrap();
            Ok(RecordSet::new(
                records
                    .iter()
                    .filter(|r| r.discipline == discipline)
                    .cloned()
                    .collect(),
            ))
        }

        async fn write_row(
            &self,
            discipline: Discipline,
            key: &str,
            fields: &FieldPatch,
            status: TagStatus,
        ) -> RepositoryResult<()> {
            if self.failing_key.as_deref() == Some(key) {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            let record = records
                .iter_mut()
                .find(|r| r.discipline == discipline && r.key == key)
                .unwrap();
            record.apply_patch(fields).unwrap();
            record.status = status;
            Ok(())
        }

        async fn append_record(&self, record: &TagRecord) -> RepositoryResult<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn delete_record(&self, _discipline: Discipline, _key: &str) -> RepositoryResult<()> {
            Ok(())
        }
    }

    fn importer(failing_key: Option<&str>) -> (Arc<MemoryStore>, TagImporterImpl<MemoryStore>) {
        let store = Arc::new(MemoryStore {
            records: Mutex::new(vec![
                TagRecord::new("E-101", Discipline::Electrical),
                TagRecord::new("E-102", Discipline::Electrical),
            ]),
            failing_key: failing_key.map(str::to_string),
        });
        let importer = TagImporterImpl::new(
            store.clone(),
            Box::new(UniversalFileParser),
            Box::new(TagFieldMapper),
            ReconciliationEngine::default(),
        );
        (store, importer)
    }

    fn raw(cells: &[(&str, &str)]) -> RawRow {
        cells
            .iter()
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
    }

    #[tokio::test]
    async fn test_import_rows_partial_success() {
        let (store, importer) = importer(Some("E-102"));
        let rows = vec![
            raw(&[("TAG", "E-101"), ("DATA MONT", "05/10/2025")]),
            raw(&[("TAG", "E-102"), ("DATA INIC PROG", "01/10/2025")]),
            raw(&[("TAG", "E-999"), ("DATA INIC PROG", "01/10/2025")]),
            raw(&[("TAG", ""), ("DATA INIC PROG", "01/10/2025")]),
        ];

        let report = importer
            .import_rows(Discipline::Electrical, rows, None)
            .await
            .unwrap();

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.matched_count, 2);
        assert_eq!(report.unmatched_keys, vec!["E-999".to_string()]);
        assert_eq!(report.skipped_rows, vec![4]);
        assert_eq!(report.persisted_count, 1);
        assert_eq!(report.failed_writes.len(), 1);
        assert_eq!(report.failed_writes[0].key, "E-102");
        assert!(!report.is_clean());

        let set = store.read_all(Discipline::Electrical).await.unwrap();
        let e101 = set.find_unique("E-101").unwrap().unwrap();
        assert_eq!(e101.status, TagStatus::Completed);
        let e102 = set.find_unique("E-102").unwrap().unwrap();
        assert_eq!(e102.status, TagStatus::AwaitingSchedule);
    }

    #[tokio::test]
    async fn test_missing_key_column_is_fatal() {
        let (_, importer) = importer(None);
        let result = importer
            .import_rows(
                Discipline::Electrical,
                vec![raw(&[("DESCRICAO", "painel")])],
                None,
            )
            .await;
        assert!(matches!(result, Err(ImportError::MissingKeyColumn(_))));
    }

    #[tokio::test]
    async fn test_batch_import_isolates_file_failures() {
        let (_, importer) = importer(None);
        let results = importer
            .batch_import(vec![
                (Discipline::Electrical, PathBuf::from("missing.csv")),
                (Discipline::Structural, PathBuf::from("notes.txt")),
            ])
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_err()));
        assert!(results[0].as_ref().unwrap_err().contains("missing.csv"));
    }
}
