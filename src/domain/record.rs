// ==========================================
// TAG 进度跟踪系统 - TAG 记录领域模型
// ==========================================
// 职责: TagRecord / RecordSet / FieldPatch
// 红线: status 为派生值，只允许由状态引擎写入
// ==========================================

use crate::domain::types::{DateField, Discipline, TagField, TagStatus};
use crate::domain::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 字段补丁: Some(v) 覆盖，None 清空；未出现的字段保持不变
pub type FieldPatch = BTreeMap<TagField, Option<String>>;

// ==========================================
// TagRecord - 单个 TAG
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    // ===== 主键 =====
    pub key: String,            // TAG 号（专业内唯一）
    pub discipline: Discipline, // 所属专业（决定状态流水线）

    // ===== 日期字段（规范化文本，dd/mm/yyyy）=====
    pub scheduled_start: Option<String>,   // 计划开始
    pub scheduled_end: Option<String>,     // 计划结束
    pub baseline_planned: Option<String>,  // 基线计划
    pub actual_completion: Option<String>, // 实际完成
    pub fabrication_date: Option<String>,  // 预制（结构）
    pub paint_date: Option<String>,        // 涂装（结构）
    pub torque_date: Option<String>,       // 紧固（结构）

    // ===== 排期周 =====
    pub week_number: Option<i64>,

    // ===== 派生状态 =====
    pub status: TagStatus,

    // ===== 描述性字段（不参与计算）=====
    pub note: Option<String>,
    pub description: Option<String>,
    pub area: Option<String>,
    pub reference_document: Option<String>,
}

impl TagRecord {
    /// 新登记的 TAG：日期全空，状态为 AwaitingSchedule
    pub fn new(key: impl Into<String>, discipline: Discipline) -> Self {
        Self {
            key: key.into(),
            discipline,
            scheduled_start: None,
            scheduled_end: None,
            baseline_planned: None,
            actual_completion: None,
            fabrication_date: None,
            paint_date: None,
            torque_date: None,
            week_number: None,
            status: TagStatus::AwaitingSchedule,
            note: None,
            description: None,
            area: None,
            reference_document: None,
        }
    }

    pub fn date_text(&self, field: DateField) -> Option<&str> {
        match field {
            DateField::ScheduledStart => self.scheduled_start.as_deref(),
            DateField::ScheduledEnd => self.scheduled_end.as_deref(),
            DateField::BaselinePlanned => self.baseline_planned.as_deref(),
            DateField::ActualCompletion => self.actual_completion.as_deref(),
            DateField::FabricationDate => self.fabrication_date.as_deref(),
            DateField::PaintDate => self.paint_date.as_deref(),
            DateField::TorqueDate => self.torque_date.as_deref(),
        }
    }

    fn date_slot(&mut self, field: DateField) -> &mut Option<String> {
        match field {
            DateField::ScheduledStart => &mut self.scheduled_start,
            DateField::ScheduledEnd => &mut self.scheduled_end,
            DateField::BaselinePlanned => &mut self.baseline_planned,
            DateField::ActualCompletion => &mut self.actual_completion,
            DateField::FabricationDate => &mut self.fabrication_date,
            DateField::PaintDate => &mut self.paint_date,
            DateField::TorqueDate => &mut self.torque_date,
        }
    }

    /// 读取字段的文本表示（week_number 转为十进制文本）
    pub fn field_text(&self, field: TagField) -> Option<String> {
        match field {
            TagField::Date(d) => self.date_text(d).map(str::to_string),
            TagField::WeekNumber => self.week_number.map(|w| w.to_string()),
            TagField::Note => self.note.clone(),
            TagField::Description => self.description.clone(),
            TagField::Area => self.area.clone(),
            TagField::ReferenceDocument => self.reference_document.clone(),
        }
    }

    /// 绝对覆盖单个字段
    ///
    /// # 错误
    /// - week_number 不是整数 → InvalidArgument
    pub fn set_field(&mut self, field: TagField, value: Option<String>) -> DomainResult<()> {
        match field {
            TagField::Date(d) => *self.date_slot(d) = value,
            TagField::WeekNumber => {
                self.week_number = match value {
                    None => None,
                    Some(v) => Some(v.trim().parse::<i64>().map_err(|_| {
                        DomainError::InvalidArgument(format!("周次不是整数: {}", v))
                    })?),
                }
            }
            TagField::Note => self.note = value,
            TagField::Description => self.description = value,
            TagField::Area => self.area = value,
            TagField::ReferenceDocument => self.reference_document = value,
        }
        Ok(())
    }

    /// 按补丁覆盖字段（不重算状态）
    pub fn apply_patch(&mut self, patch: &FieldPatch) -> DomainResult<()> {
        for (field, value) in patch {
            self.set_field(*field, value.clone())?;
        }
        Ok(())
    }
}

// ==========================================
// NewTag - 登记参数
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTag {
    pub key: String,
    pub description: Option<String>,
    pub area: Option<String>,
    pub reference_document: Option<String>,
    pub note: Option<String>,
}

impl NewTag {
    pub fn into_record(self, discipline: Discipline) -> TagRecord {
        let mut record = TagRecord::new(self.key.trim(), discipline);
        record.description = self.description;
        record.area = self.area;
        record.reference_document = self.reference_document;
        record.note = self.note;
        record
    }
}

// ==========================================
// RecordSet - 单专业记录集
// ==========================================
// 不变式: key 唯一；重复 key 阻断单记录定位
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    pub records: Vec<TagRecord>,
}

impl RecordSet {
    pub fn new(records: Vec<TagRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TagRecord> {
        self.records.iter()
    }

    /// 统计 key 出现次数
    pub fn count_key(&self, key: &str) -> usize {
        self.records.iter().filter(|r| r.key == key).count()
    }

    /// 唯一定位下标
    ///
    /// # 返回
    /// - Ok(Some(idx)): 唯一命中
    /// - Ok(None): 未找到
    /// - Err(DataIntegrity): 重复 key，不做首条命中
    pub fn position_unique(&self, key: &str) -> DomainResult<Option<usize>> {
        let mut hits = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.key == key)
            .map(|(idx, _)| idx);

        let first = hits.next();
        let rest = hits.count();
        if rest > 0 {
            return Err(DomainError::DataIntegrity {
                key: key.to_string(),
                occurrences: rest + 1,
            });
        }
        Ok(first)
    }

    pub fn find_unique(&self, key: &str) -> DomainResult<Option<&TagRecord>> {
        Ok(self.position_unique(key)?.map(|idx| &self.records[idx]))
    }

    /// 所有出现多次的 key（按首次出现顺序）
    pub fn duplicate_keys(&self) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.key.as_str()).or_insert(0) += 1;
        }

        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .filter(|r| counts.get(r.key.as_str()).copied().unwrap_or(0) > 1)
            .filter(|r| seen.insert(r.key.clone()))
            .map(|r| r.key.clone())
            .collect()
    }
}

impl IntoIterator for RecordSet {
    type Item = TagRecord;
    type IntoIter = std::vec::IntoIter<TagRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a TagRecord;
    type IntoIter = std::slice::Iter<'a, TagRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
