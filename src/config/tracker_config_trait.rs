// ==========================================
// TAG 进度跟踪系统 - 跟踪配置读取 Trait
// ==========================================
// 职责: 定义周历 / S 曲线所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{AxisGranularity, DateClass};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// TrackerConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait TrackerConfigReader: Send + Sync {
    /// 获取项目周历纪元（第 1 周周一）
    ///
    /// # 默认值
    /// - 29/09/2025
    async fn get_week_epoch(&self) -> ConfigResult<NaiveDate>;

    /// 获取 S 曲线默认横轴粒度
    ///
    /// # 默认值
    /// - DAILY
    async fn get_curve_granularity(&self) -> ConfigResult<AxisGranularity>;

    /// 获取 S 曲线默认口径
    ///
    /// # 默认值
    /// - PLANNED,SCHEDULED,ACTUAL
    async fn get_curve_classes(&self) -> ConfigResult<Vec<DateClass>>;
}
