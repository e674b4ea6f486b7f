// ==========================================
// TAG 进度跟踪系统 - 项目周历
// ==========================================
// 职责: 周次 ↔ 日历日期互换，以固定项目纪元（第 1 周周一）为锚点
// 规则:
// - week_to_range(n) = (epoch + (n-1)·7d, epoch + (n-1)·7d + 4d)，周一至周五
// - date_to_week(d)  = floor((d - epoch) / 7d) + 1
// 红线: n < 1 或 d 早于纪元一律报 InvalidArgument，不返回错误周次
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// 工作周（周一 ~ 周五，闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub week: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalendar {
    epoch: NaiveDate,
}

impl WeekCalendar {
    /// 创建周历
    ///
    /// # 错误
    /// - 纪元不是周一 → InvalidArgument
    pub fn new(epoch: NaiveDate) -> DomainResult<Self> {
        if epoch.weekday() != Weekday::Mon {
            return Err(DomainError::InvalidArgument(format!(
                "周历纪元必须是周一: {} 是 {:?}",
                epoch,
                epoch.weekday()
            )));
        }
        Ok(Self { epoch })
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// 第 n 周的周一
    pub fn week_start(&self, week: i64) -> DomainResult<NaiveDate> {
        if week < 1 {
            return Err(DomainError::InvalidArgument(format!(
                "周次必须 >= 1: {}",
                week
            )));
        }

        Duration::try_days((week - 1).saturating_mul(7))
            .and_then(|offset| self.epoch.checked_add_signed(offset))
            .ok_or_else(|| DomainError::InvalidArgument(format!("周次超出日期范围: {}", week)))
    }

    /// 周次 → 周一至周五
    pub fn week_to_range(&self, week: i64) -> DomainResult<WeekRange> {
        let start = self.week_start(week)?;
        let end = start
            .checked_add_signed(Duration::days(4))
            .ok_or_else(|| DomainError::InvalidArgument(format!("周次超出日期范围: {}", week)))?;
        Ok(WeekRange { week, start, end })
    }

    /// 日期 → 周次（周末归入当周）
    pub fn date_to_week(&self, date: NaiveDate) -> DomainResult<i64> {
        if date < self.epoch {
            return Err(DomainError::InvalidArgument(format!(
                "日期 {} 早于周历纪元 {}",
                date, self.epoch
            )));
        }
        let days = (date - self.epoch).num_days();
        Ok(days / 7 + 1)
    }

    /// 日期所在纪元对齐周的周一（纪元之前同样按 7 天对齐）
    pub fn align_to_week_start(&self, date: NaiveDate) -> NaiveDate {
        let days = (date - self.epoch).num_days();
        self.epoch + Duration::days(days.div_euclid(7) * 7)
    }
}
