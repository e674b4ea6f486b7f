// ==========================================
// TAG 进度跟踪系统 - 状态派生引擎
// ==========================================
// 职责: 根据已填写的日期字段派生 TAG 状态
// 规则: 按流水线优先级扫描，首个"有值"阶段胜出；均无值 → AwaitingSchedule
// 红线: 纯函数、全函数、确定性；流水线是数据，不按专业写分支
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::record::TagRecord;
use crate::domain::types::{DateField, Discipline, TagStatus};
use crate::engine::cell::is_populated;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ==========================================
// PipelineStage - 流水线阶段
// ==========================================
// fields 中任一字段有值即命中该阶段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub status: TagStatus,
    pub fields: Vec<DateField>,
}

impl PipelineStage {
    pub fn new(status: TagStatus, fields: Vec<DateField>) -> Self {
        Self { status, fields }
    }

    fn matches(&self, record: &TagRecord) -> bool {
        self.fields
            .iter()
            .any(|field| is_populated(record.date_text(*field)))
    }
}

// ==========================================
// Pipeline - 状态流水线
// ==========================================
// 顺序: 最高优先级（终态）在前
// 反序列化同样经过 Pipeline::new 校验
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PipelineSpec")]
pub struct Pipeline {
    stages: Vec<PipelineStage>,
}

/// 未校验的流水线配置
#[derive(Deserialize)]
struct PipelineSpec {
    stages: Vec<PipelineStage>,
}

impl TryFrom<PipelineSpec> for Pipeline {
    type Error = DomainError;

    fn try_from(spec: PipelineSpec) -> DomainResult<Self> {
        Pipeline::new(spec.stages)
    }
}

impl Pipeline {
    /// 创建并校验流水线
    ///
    /// # 错误（InvalidArgument）
    /// - 阶段列表为空
    /// - 某阶段未绑定日期字段
    /// - 出现 AwaitingSchedule 阶段（初始状态不由日期触发）
    /// - 状态重复
    pub fn new(stages: Vec<PipelineStage>) -> DomainResult<Self> {
        if stages.is_empty() {
            return Err(DomainError::InvalidArgument(
                "流水线至少需要一个阶段".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for stage in &stages {
            if stage.fields.is_empty() {
                return Err(DomainError::InvalidArgument(format!(
                    "流水线阶段 {} 未绑定日期字段",
                    stage.status
                )));
            }
            if stage.status == TagStatus::AwaitingSchedule {
                return Err(DomainError::InvalidArgument(
                    "AwaitingSchedule 为初始状态，不能作为流水线阶段".to_string(),
                ));
            }
            if !seen.insert(stage.status) {
                return Err(DomainError::InvalidArgument(format!(
                    "流水线阶段重复: {}",
                    stage.status
                )));
            }
        }

        Ok(Self { stages })
    }

    /// 3 段流水线（电气 / 仪表）
    pub fn three_stage() -> Self {
        Self {
            stages: vec![
                PipelineStage::new(TagStatus::Completed, vec![DateField::ActualCompletion]),
                PipelineStage::new(
                    TagStatus::Scheduled,
                    vec![DateField::ScheduledStart, DateField::ScheduledEnd],
                ),
            ],
        }
    }

    /// 5 段流水线（结构）
    pub fn structural() -> Self {
        Self {
            stages: vec![
                PipelineStage::new(TagStatus::Torqued, vec![DateField::TorqueDate]),
                PipelineStage::new(TagStatus::Assembled, vec![DateField::ActualCompletion]),
                PipelineStage::new(TagStatus::Painted, vec![DateField::PaintDate]),
                PipelineStage::new(TagStatus::Fabricated, vec![DateField::FabricationDate]),
                PipelineStage::new(TagStatus::Scheduled, vec![DateField::ScheduledStart]),
            ],
        }
    }

    /// 专业默认流水线
    pub fn for_discipline(discipline: Discipline) -> Self {
        match discipline {
            Discipline::Electrical | Discipline::Instrumentation => Self::three_stage(),
            Discipline::Structural => Self::structural(),
        }
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// 终态（优先级最高的阶段）
    pub fn terminal_status(&self) -> TagStatus {
        self.stages
            .first()
            .map_or(TagStatus::AwaitingSchedule, |stage| stage.status)
    }

    /// 该流水线的状态词汇（从初始态到终态）
    pub fn statuses(&self) -> Vec<TagStatus> {
        std::iter::once(TagStatus::AwaitingSchedule)
            .chain(self.stages.iter().rev().map(|s| s.status))
            .collect()
    }

    /// 派生状态
    pub fn derive_status(&self, record: &TagRecord) -> TagStatus {
        self.stages
            .iter()
            .find(|stage| stage.matches(record))
            .map(|stage| stage.status)
            .unwrap_or(TagStatus::AwaitingSchedule)
    }
}

/// 按给定流水线派生状态
pub fn derive_status(record: &TagRecord, pipeline: &Pipeline) -> TagStatus {
    pipeline.derive_status(record)
}

// ==========================================
// StatusEngine - 按专业选择流水线
// ==========================================
#[derive(Debug, Clone)]
pub struct StatusEngine {
    pipelines: BTreeMap<Discipline, Pipeline>,
}

impl Default for StatusEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusEngine {
    /// 使用内置流水线创建
    pub fn new() -> Self {
        let pipelines = Discipline::ALL
            .iter()
            .map(|d| (*d, Pipeline::for_discipline(*d)))
            .collect();
        Self { pipelines }
    }

    /// 覆盖某专业的流水线
    pub fn with_pipeline(mut self, discipline: Discipline, pipeline: Pipeline) -> Self {
        self.pipelines.insert(discipline, pipeline);
        self
    }

    pub fn pipeline(&self, discipline: Discipline) -> &Pipeline {
        // new() 为每个专业都注册了流水线
        &self.pipelines[&discipline]
    }

    /// 按记录所属专业派生状态
    pub fn derive(&self, record: &TagRecord) -> TagStatus {
        self.pipeline(record.discipline).derive_status(record)
    }

    /// 重算并回写 record.status，返回是否发生变化
    pub fn refresh(&self, record: &mut TagRecord) -> bool {
        let derived = self.derive(record);
        let changed = record.status != derived;
        record.status = derived;
        changed
    }
}
