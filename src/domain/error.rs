// ==========================================
// TAG 进度跟踪系统 - 核心错误类型
// ==========================================
// 工具: thiserror 派生宏
// 范围: 纯函数组件（状态引擎 / 周历 / 对账 / 曲线）
// ==========================================

use thiserror::Error;

/// 核心层错误类型
///
/// 对账中的行级问题（未匹配 / 缺失 key / 字段非法 / key 重复）不在此列，
/// 见 `domain::reconcile::MergeWarning`。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 重复 key 阻断单记录定位（不做首条命中）
    #[error("数据完整性错误: key={key} 出现 {occurrences} 次")]
    DataIntegrity { key: String, occurrences: usize },

    /// 非法参数（周次 < 1、日期早于纪元、流水线配置错误等）
    #[error("非法参数: {0}")]
    InvalidArgument(String),
}

/// Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
