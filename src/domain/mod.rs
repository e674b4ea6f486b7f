// ==========================================
// TAG 进度跟踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、核心错误
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod curve;
pub mod error;
pub mod import;
pub mod reconcile;
pub mod record;
pub mod types;

// 重导出核心类型
pub use curve::{CurvePoint, CurveSet};
pub use error::{DomainError, DomainResult};
pub use import::{CellIssue, FailedWrite, TagImportReport};
pub use reconcile::{IncomingRow, MergeOutcome, MergeWarning, RecordChange};
pub use record::{FieldPatch, NewTag, RecordSet, TagRecord};
pub use types::{AxisGranularity, DateClass, DateField, Discipline, TagField, TagStatus};
