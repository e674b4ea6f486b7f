// ==========================================
// TAG 进度跟踪系统 - 引擎层
// ==========================================
// 职责: 状态派生 / 项目周历 / 批量对账 / S 曲线
// 红线: 引擎层是纯函数，不拼 SQL，不做 I/O
// ==========================================

pub mod cell;
pub mod progress_curve;
pub mod reconciliation;
pub mod status_engine;
pub mod week_calendar;

// 重导出核心引擎
pub use cell::{format_tag_date, is_populated, normalize_cell, parse_tag_date, TAG_DATE_FORMAT};
pub use progress_curve::{class_date, ProgressCurveBuilder};
pub use reconciliation::ReconciliationEngine;
pub use status_engine::{derive_status, Pipeline, PipelineStage, StatusEngine};
pub use week_calendar::{WeekCalendar, WeekRange};
