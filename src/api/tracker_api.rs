// ==========================================
// TAG 进度跟踪系统 - 跟踪 API
// ==========================================
// 职责: TAG 登记/查询/编辑/删除、批量导入、S 曲线、进度汇总、状态审计、导出、周历换算
// 红线:
// - status 只由状态引擎派生，随字段一次写入
// - 重复 key 一律报 DataIntegrity，不做首条命中
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::TrackerConfigReader;
use crate::domain::curve::CurveSet;
use crate::domain::import::{FailedWrite, TagImportReport};
use crate::domain::record::{FieldPatch, NewTag, TagRecord};
use crate::domain::types::{AxisGranularity, DateClass, Discipline, TagField, TagStatus};
use crate::engine::cell::{format_tag_date, is_populated, normalize_cell, parse_tag_date};
use crate::engine::progress_curve::ProgressCurveBuilder;
use crate::engine::reconciliation::ReconciliationEngine;
use crate::engine::status_engine::StatusEngine;
use crate::engine::week_calendar::{WeekCalendar, WeekRange};
use crate::i18n::status_label;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::table_writer::{ExportFile, TableWriter};
use crate::importer::tag_importer::TagImporterImpl;
use crate::importer::tag_importer_trait::TagImporter;
use crate::repository::record_store::RecordStore;

// ==========================================
// ProgressSummary - 进度汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: TagStatus,
    pub label: String, // 本地化文案
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub discipline: Discipline,
    pub total: usize,
    pub terminal_status: TagStatus,
    pub completed: usize,       // 处于终态的记录数
    pub percent_complete: f64,  // completed / total × 100，保留两位小数
    pub statuses: Vec<StatusCount>, // 按流水线顺序（初始态 → 终态）
}

// ==========================================
// StatusDriftReport - 状态漂移审计
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDrift {
    pub key: String,
    pub persisted: TagStatus,
    pub derived: TagStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDriftReport {
    pub discipline: Discipline,
    pub checked: usize,
    pub drifted: Vec<StatusDrift>,
    pub repaired: usize,
    pub duplicate_keys: Vec<String>, // 重复 key 无法定位单行，不修复
    pub failed_repairs: Vec<FailedWrite>,
}

// ==========================================
// TrackerApi
// ==========================================
pub struct TrackerApi<S>
where
    S: RecordStore,
{
    store: Arc<S>,
    config: Arc<dyn TrackerConfigReader>,
    status_engine: StatusEngine,
    importer: TagImporterImpl<S>,
    table_writer: TableWriter,
}

impl<S> TrackerApi<S>
where
    S: RecordStore,
{
    /// 使用内置流水线创建
    pub fn new(store: Arc<S>, config: Arc<dyn TrackerConfigReader>) -> Self {
        Self::with_status_engine(store, config, StatusEngine::new())
    }

    /// 使用自定义状态引擎创建
    pub fn with_status_engine(
        store: Arc<S>,
        config: Arc<dyn TrackerConfigReader>,
        status_engine: StatusEngine,
    ) -> Self {
        let importer = TagImporterImpl::new(
            store.clone(),
            Box::new(UniversalFileParser),
            Box::new(FieldMapper),
            ReconciliationEngine::new(status_engine.clone()),
        );
        Self {
            store,
            config,
            status_engine,
            importer,
            table_writer: TableWriter,
        }
    }

    // ==========================================
    // 记录维护
    // ==========================================

    /// 登记新 TAG（日期全空，状态 AwaitingSchedule）
    ///
    /// # 返回
    /// - Err(InvalidInput): TAG 号为空
    /// - Err(DataIntegrity): TAG 号已存在
    pub async fn register_tag(
        &self,
        discipline: Discipline,
        new_tag: NewTag,
    ) -> ApiResult<TagRecord> {
        let key = new_tag.key.trim().to_string();
        if !is_populated(Some(&key)) {
            return Err(ApiError::InvalidInput("TAG 号不能为空".to_string()));
        }

        let existing = self.store.read_all(discipline).await?.count_key(&key);
        if existing > 0 {
            return Err(ApiError::DataIntegrity {
                key,
                occurrences: existing + 1,
            });
        }

        let mut record = NewTag {
            key,
            description: normalize_cell(new_tag.description.as_deref()),
            area: normalize_cell(new_tag.area.as_deref()),
            reference_document: normalize_cell(new_tag.reference_document.as_deref()),
            note: normalize_cell(new_tag.note.as_deref()),
        }
        .into_record(discipline);
        self.status_engine.refresh(&mut record);

        self.store.append_record(&record).await?;
        info!(discipline = %discipline, key = %record.key, "登记 TAG");
        Ok(record)
    }

    /// 查询单个 TAG
    pub async fn get_tag(&self, discipline: Discipline, key: &str) -> ApiResult<TagRecord> {
        let key = key.trim();
        let set = self.store.read_all(discipline).await?;
        set.find_unique(key)?
            .cloned()
            .ok_or_else(|| Self::not_found(discipline, key))
    }

    /// 查询 TAG 列表（可按状态过滤）
    pub async fn list_tags(
        &self,
        discipline: Discipline,
        status: Option<TagStatus>,
    ) -> ApiResult<Vec<TagRecord>> {
        let set = self.store.read_all(discipline).await?;
        Ok(set
            .into_iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect())
    }

    /// 单条编辑：补丁字段 + 派生状态一次写入
    ///
    /// # 参数
    /// - patch: Some(v) 覆盖，None 或空白清空
    ///
    /// # 返回
    /// - Err(InvalidInput): 补丁为空、日期/周次无法解析
    /// - Err(NotFound): 无此 TAG
    /// - Err(DataIntegrity): TAG 号重复
    pub async fn edit_tag(
        &self,
        discipline: Discipline,
        key: &str,
        patch: FieldPatch,
    ) -> ApiResult<TagRecord> {
        if patch.is_empty() {
            return Err(ApiError::InvalidInput("补丁为空".to_string()));
        }
        let key = key.trim();
        let patch = Self::normalize_patch(patch)?;

        let set = self.store.read_all(discipline).await?;
        let mut record = set
            .find_unique(key)?
            .cloned()
            .ok_or_else(|| Self::not_found(discipline, key))?;

        let previous = record.status;
        record.apply_patch(&patch)?;
        self.status_engine.refresh(&mut record);

        self.store
            .write_row(discipline, key, &patch, record.status)
            .await?;
        info!(
            discipline = %discipline,
            key = %key,
            fields = patch.len(),
            from = %previous,
            to = %record.status,
            "编辑 TAG"
        );
        Ok(record)
    }

    /// 按 key 删除
    pub async fn delete_tag(&self, discipline: Discipline, key: &str) -> ApiResult<()> {
        let key = key.trim();
        self.store.delete_record(discipline, key).await?;
        info!(discipline = %discipline, key = %key, "删除 TAG");
        Ok(())
    }

    // ==========================================
    // 批量导入 / 导出
    // ==========================================

    /// 导入某专业的批量更新文件
    pub async fn import_updates(
        &self,
        discipline: Discipline,
        file_path: &Path,
    ) -> ApiResult<TagImportReport> {
        Ok(self.importer.import_file(discipline, file_path).await?)
    }

    /// 并发导入多个文件
    pub async fn import_batch(
        &self,
        files: Vec<(Discipline, PathBuf)>,
    ) -> Vec<Result<TagImportReport, String>> {
        self.importer.batch_import(files).await
    }

    /// 导出某专业记录集为 CSV
    pub async fn export_tags(
        &self,
        discipline: Discipline,
        title: Option<&str>,
    ) -> ApiResult<ExportFile> {
        let set = self.store.read_all(discipline).await?;
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| format!("TAGs_{}", discipline));
        Ok(self
            .table_writer
            .serialize_records(discipline, &set, &title)?)
    }

    // ==========================================
    // 报表
    // ==========================================

    /// 构建 S 曲线
    ///
    /// # 参数
    /// - disciplines: 参与计算的专业（空 = 全部专业）
    /// - classes / granularity: None 时使用配置默认值
    pub async fn build_progress_curve(
        &self,
        disciplines: &[Discipline],
        classes: Option<Vec<DateClass>>,
        granularity: Option<AxisGranularity>,
    ) -> ApiResult<CurveSet> {
        let classes = match classes {
            Some(classes) if !classes.is_empty() => classes,
            _ => self
                .config
                .get_curve_classes()
                .await
                .map_err(Self::config_error)?,
        };
        let granularity = match granularity {
            Some(granularity) => granularity,
            None => self
                .config
                .get_curve_granularity()
                .await
                .map_err(Self::config_error)?,
        };
        let calendar = self.calendar().await?;

        let disciplines: Vec<Discipline> = if disciplines.is_empty() {
            Discipline::ALL.to_vec()
        } else {
            disciplines.to_vec()
        };

        let mut records = Vec::new();
        for discipline in &disciplines {
            records.extend(self.store.read_all(*discipline).await?);
        }

        let curve = ProgressCurveBuilder::new(calendar).build(&records, &classes, granularity);
        debug!(
            disciplines = ?disciplines,
            records = records.len(),
            axis_len = curve.axis.len(),
            "S 曲线已生成"
        );
        Ok(curve)
    }

    /// 进度汇总（按派生状态计数）
    pub async fn progress_summary(&self, discipline: Discipline) -> ApiResult<ProgressSummary> {
        let set = self.store.read_all(discipline).await?;
        let pipeline = self.status_engine.pipeline(discipline);
        let terminal_status = pipeline.terminal_status();

        let derived: Vec<TagStatus> = set
            .iter()
            .map(|record| self.status_engine.derive(record))
            .collect();

        let statuses: Vec<StatusCount> = pipeline
            .statuses()
            .into_iter()
            .map(|status| StatusCount {
                status,
                label: status_label(status),
                count: derived.iter().filter(|s| **s == status).count(),
            })
            .collect();

        let total = set.len();
        let completed = derived.iter().filter(|s| **s == terminal_status).count();
        let percent_complete = if total == 0 {
            0.0
        } else {
            ((completed as f64 / total as f64) * 10_000.0).round() / 100.0
        };

        Ok(ProgressSummary {
            discipline,
            total,
            terminal_status,
            completed,
            percent_complete,
            statuses,
        })
    }

    /// 状态漂移审计
    ///
    /// # 参数
    /// - repair: true 时把派生状态写回（仅状态列）
    pub async fn audit_status(
        &self,
        discipline: Discipline,
        repair: bool,
    ) -> ApiResult<StatusDriftReport> {
        let set = self.store.read_all(discipline).await?;
        let duplicate_keys = set.duplicate_keys();

        let drifted: Vec<StatusDrift> = set
            .iter()
            .filter_map(|record| {
                let derived = self.status_engine.derive(record);
                (derived != record.status).then(|| StatusDrift {
                    key: record.key.clone(),
                    persisted: record.status,
                    derived,
                })
            })
            .collect();

        let mut repaired = 0;
        let mut failed_repairs = Vec::new();
        if repair {
            let empty = FieldPatch::new();
            for drift in drifted.iter().filter(|d| !duplicate_keys.contains(&d.key)) {
                match self
                    .store
                    .write_row(discipline, &drift.key, &empty, drift.derived)
                    .await
                {
                    Ok(()) => repaired += 1,
                    Err(e) => {
                        warn!(key = %drift.key, error = %e, "状态修复失败");
                        failed_repairs.push(FailedWrite {
                            key: drift.key.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            discipline = %discipline,
            checked = set.len(),
            drifted = drifted.len(),
            repaired = repaired,
            duplicates = duplicate_keys.len(),
            "状态审计完成"
        );

        Ok(StatusDriftReport {
            discipline,
            checked: set.len(),
            drifted,
            repaired,
            duplicate_keys,
            failed_repairs,
        })
    }

    // ==========================================
    // 周历
    // ==========================================

    /// 周次 → 周一至周五
    pub async fn week_to_range(&self, week: i64) -> ApiResult<WeekRange> {
        Ok(self.calendar().await?.week_to_range(week)?)
    }

    /// 日期文本（dd/mm/yyyy）→ 周次
    pub async fn date_to_week(&self, date: &str) -> ApiResult<i64> {
        let parsed = parse_tag_date(date)
            .ok_or_else(|| ApiError::InvalidInput(format!("无法解析日期: {}", date)))?;
        Ok(self.calendar().await?.date_to_week(parsed)?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    async fn calendar(&self) -> ApiResult<WeekCalendar> {
        let epoch = self
            .config
            .get_week_epoch()
            .await
            .map_err(Self::config_error)?;
        WeekCalendar::new(epoch).map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// 编辑补丁规范化: 空白 → 清空；日期统一为 dd/mm/yyyy；周次必须为整数
    fn normalize_patch(patch: FieldPatch) -> ApiResult<FieldPatch> {
        patch
            .into_iter()
            .map(|(field, value)| -> ApiResult<(TagField, Option<String>)> {
                let value = match (field, normalize_cell(value.as_deref())) {
                    (_, None) => None,
                    (TagField::Date(_), Some(text)) => {
                        Some(parse_tag_date(&text).map(format_tag_date).ok_or_else(|| {
                            ApiError::InvalidInput(format!("字段 {} 日期无法解析: {}", field, text))
                        })?)
                    }
                    (TagField::WeekNumber, Some(text)) => {
                        text.parse::<i64>().map_err(|_| {
                            ApiError::InvalidInput(format!("字段 {} 不是整数: {}", field, text))
                        })?;
                        Some(text)
                    }
                    (_, Some(text)) => Some(text),
                };
                Ok((field, value))
            })
            .collect()
    }

    fn not_found(discipline: Discipline, key: &str) -> ApiError {
        ApiError::NotFound(format!("TagRecord[{}](id={})不存在", discipline, key))
    }

    fn config_error(err: Box<dyn std::error::Error + Send + Sync>) -> ApiError {
        ApiError::ConfigError(err.to_string())
    }
}
