// ==========================================
// TAG 进度跟踪系统 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod tracker_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, default_week_epoch, ConfigManager, DEFAULT_WEEK_EPOCH};
pub use tracker_config_trait::{ConfigResult, TrackerConfigReader};
