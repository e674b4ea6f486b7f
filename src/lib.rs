// ==========================================
// TAG 进度跟踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 施工 TAG 进度跟踪（状态派生 / 批量对账 / S 曲线）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AxisGranularity, DateClass, DateField, Discipline, TagField, TagStatus};

// 领域实体
pub use domain::{
    CurvePoint, CurveSet, DomainError, FieldPatch, IncomingRow, MergeOutcome, NewTag, RecordSet,
    TagImportReport, TagRecord,
};

// 引擎
pub use engine::{
    Pipeline, ProgressCurveBuilder, ReconciliationEngine, StatusEngine, WeekCalendar, WeekRange,
};

// API
pub use api::{ApiError, ApiResult, TrackerApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "TAG 进度跟踪系统";
