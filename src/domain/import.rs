// ==========================================
// TAG 进度跟踪系统 - 批量导入领域模型
// ==========================================
// 用途: 导入管道中间产物与返回值
// 红线: 未命中 / 缺失 key / 写入失败必须原样返回给调用方，不得丢弃
// ==========================================

use crate::domain::reconcile::MergeWarning;
use crate::domain::types::Discipline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// CellIssue - 单元格级问题
// ==========================================
// 有值但无法解析的日期/周次单元格：该字段从补丁中剔除，整行仍参与对账
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellIssue {
    pub row_number: usize,
    pub key: Option<String>,
    pub column: String,
    pub value: String,
    pub message: String,
}

// ==========================================
// FailedWrite - 单条记录落库失败
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedWrite {
    pub key: String,
    pub reason: String,
}

// ==========================================
// TagImportReport - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagImportReport {
    pub batch_id: String,              // 批次 ID（UUID）
    pub discipline: Discipline,        // 目标专业
    pub file_name: Option<String>,     // 源文件名
    pub total_rows: usize,             // 数据行数
    pub matched_count: usize,          // 命中行数
    pub unmatched_keys: Vec<String>,   // 未命中 key
    pub skipped_count: usize,          // 跳过行数（见 MergeWarning）
    pub skipped_rows: Vec<usize>,      // 跳过行的行号
    pub persisted_count: usize,        // 成功落库记录数
    pub failed_writes: Vec<FailedWrite>, // 落库失败记录
    pub cell_issues: Vec<CellIssue>,   // 单元格问题
    pub warnings: Vec<MergeWarning>,   // 对账告警明细
    pub imported_at: DateTime<Utc>,    // 完成时间
    pub elapsed_ms: u64,               // 耗时（毫秒）
}

impl TagImportReport {
    /// 是否全部成功（无未命中、无跳过、无写入失败）
    pub fn is_clean(&self) -> bool {
        self.unmatched_keys.is_empty()
            && self.skipped_count == 0
            && self.failed_writes.is_empty()
            && self.cell_issues.is_empty()
    }
}
