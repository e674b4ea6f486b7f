// ==========================================
// TAG 进度跟踪系统 - 对账领域模型
// ==========================================
// 职责: 外部批量行 / 对账结果 / 告警
// ==========================================

use crate::domain::record::{FieldPatch, RecordSet};
use crate::domain::types::{TagField, TagStatus};
use serde::{Deserialize, Serialize};

// ==========================================
// IncomingRow - 外部批量更新行
// ==========================================
// 用途: 字段映射产物 → 对账引擎输入
// 约定: fields 只包含源文件中显式给出的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRow {
    pub row_number: usize,   // 源文件行号（数据行从 1 开始）
    pub key: Option<String>, // TAG 号（缺失/无法解析为 None）
    pub fields: FieldPatch,  // 显式字段
}

impl IncomingRow {
    pub fn new(row_number: usize, key: Option<String>, fields: FieldPatch) -> Self {
        Self {
            row_number,
            key,
            fields,
        }
    }
}

// ==========================================
// MergeWarning - 对账告警（非致命）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeWarning {
    /// 规范记录集中无此 key，未插入
    UnmatchedKey { row_number: usize, key: String },
    /// key 为空或无法解析，整行跳过
    MalformedRow { row_number: usize },
    /// 字段值非法（如周次非整数），整行跳过，该行任何字段都不写入
    InvalidField {
        row_number: usize,
        key: String,
        field: TagField,
        value: String,
    },
    /// 规范记录集中该 key 出现多次，无法唯一定位，整行跳过
    DuplicateKey {
        row_number: usize,
        key: String,
        occurrences: usize,
    },
}

impl MergeWarning {
    /// 该告警对应的行是否计入 skipped
    pub fn is_skip(&self) -> bool {
        !matches!(self, MergeWarning::UnmatchedKey { .. })
    }

    pub fn row_number(&self) -> usize {
        match self {
            MergeWarning::UnmatchedKey { row_number, .. }
            | MergeWarning::MalformedRow { row_number }
            | MergeWarning::InvalidField { row_number, .. }
            | MergeWarning::DuplicateKey { row_number, .. } => *row_number,
        }
    }
}

// ==========================================
// RecordChange - 单条记录的落库变更
// ==========================================
// 一个 key 一条，fields 为本批次写入后的最终值，status 随同一次写入落库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    pub key: String,
    pub fields: FieldPatch,
    pub status: TagStatus,
    pub previous_status: TagStatus,
}

// ==========================================
// MergeOutcome - 对账结果
// ==========================================
// 完整性: matched_count + unmatched_keys.len() + skipped_count == 输入行数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub updated: RecordSet,           // 对账后的规范记录集
    pub matched_count: usize,         // 命中行数（同 key 重复行各计一次）
    pub unmatched_keys: Vec<String>,  // 未命中 key（按输入顺序）
    pub skipped_count: usize,         // 缺失 key / 字段非法 / key 重复的行数
    pub changes: Vec<RecordChange>,   // 按首次命中顺序的落库变更
    pub warnings: Vec<MergeWarning>,  // 按输入顺序的告警
}

impl MergeOutcome {
    pub fn total_rows(&self) -> usize {
        self.matched_count + self.unmatched_keys.len() + self.skipped_count
    }

    /// 跳过行的行号
    pub fn skipped_rows(&self) -> Vec<usize> {
        self.warnings
            .iter()
            .filter(|w| w.is_skip())
            .map(MergeWarning::row_number)
            .collect()
    }
}
