// ==========================================
// TAG 进度跟踪系统 - S 曲线构建器
// ==========================================
// 职责: 按口径（计划/排期/实际）生成累计数量时间序列
// 算法: 每个口径的日期只排序一次，沿横轴推进游标
//       复杂度 O(n log n + 横轴长度)，不做逐点全量扫描
// 红线: 不做百分比归一化（调用方用 total_records 自行计算）
// ==========================================

use crate::domain::curve::{CurvePoint, CurveSet};
use crate::domain::record::TagRecord;
use crate::domain::types::{AxisGranularity, DateClass, DateField};
use crate::engine::cell::parse_tag_date;
use crate::engine::week_calendar::WeekCalendar;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// 记录在某口径下的日期
///
/// # 映射
/// - Planned   → baseline_planned
/// - Scheduled → scheduled_end，缺失时回退到 scheduled_start
/// - Actual    → actual_completion
///
/// 无值或无法解析的日期返回 None
pub fn class_date(record: &TagRecord, class: DateClass) -> Option<NaiveDate> {
    let parse = |field: DateField| record.date_text(field).and_then(parse_tag_date);
    match class {
        DateClass::Planned => parse(DateField::BaselinePlanned),
        DateClass::Scheduled => {
            parse(DateField::ScheduledEnd).or_else(|| parse(DateField::ScheduledStart))
        }
        DateClass::Actual => parse(DateField::ActualCompletion),
    }
}

// ==========================================
// ProgressCurveBuilder
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ProgressCurveBuilder {
    calendar: WeekCalendar,
}

impl ProgressCurveBuilder {
    /// # 参数
    /// - calendar: 周粒度横轴的对齐依据
    pub fn new(calendar: WeekCalendar) -> Self {
        Self { calendar }
    }

    /// 构建累计曲线
    ///
    /// # 参数
    /// - records: 参与计算的记录
    /// - classes: 请求的口径（重复项忽略）
    /// - granularity: 横轴粒度
    ///
    /// # 返回
    /// - 任一口径都没有有效日期 → 空 CurveSet（数据不足，不是错误）
    pub fn build(
        &self,
        records: &[TagRecord],
        classes: &[DateClass],
        granularity: AxisGranularity,
    ) -> CurveSet {
        let classes: BTreeSet<DateClass> = classes.iter().copied().collect();

        // === 步骤 1: 收集并排序各口径日期 ===
        let sorted: BTreeMap<DateClass, Vec<NaiveDate>> = classes
            .iter()
            .map(|class| {
                let mut dates: Vec<NaiveDate> = records
                    .iter()
                    .filter_map(|record| class_date(record, *class))
                    .collect();
                dates.sort_unstable();
                (*class, dates)
            })
            .collect();

        // === 步骤 2: 横轴范围 ===
        let axis_start = sorted.values().filter_map(|d| d.first()).min().copied();
        let axis_end = sorted.values().filter_map(|d| d.last()).max().copied();
        let (axis_start, axis_end) = match (axis_start, axis_end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                debug!(records = records.len(), "无有效日期，返回空曲线");
                return CurveSet::empty(granularity, records.len());
            }
        };

        let axis = self.axis(axis_start, axis_end, granularity);

        // === 步骤 3: 游标累计 ===
        let series = sorted
            .iter()
            .map(|(class, dates)| {
                let mut cursor = 0;
                let points = axis
                    .iter()
                    .map(|at| {
                        let cutoff = Self::cutoff(*at, granularity);
                        while cursor < dates.len() && dates[cursor] <= cutoff {
                            cursor += 1;
                        }
                        CurvePoint {
                            at: *at,
                            cumulative: cursor,
                        }
                    })
                    .collect();
                (*class, points)
            })
            .collect();

        debug!(
            records = records.len(),
            axis_len = axis.len(),
            granularity = %granularity,
            "曲线构建完成"
        );

        CurveSet {
            granularity,
            axis,
            series,
            total_records: records.len(),
        }
    }

    fn axis(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: AxisGranularity,
    ) -> Vec<NaiveDate> {
        match granularity {
            AxisGranularity::Daily => start.iter_days().take_while(|d| *d <= end).collect(),
            AxisGranularity::Weekly => {
                let first = self.calendar.align_to_week_start(start);
                first
                    .iter_weeks()
                    .take_while(|d| *d <= end)
                    .collect()
            }
        }
    }

    /// 横轴点的统计截止日（含）
    fn cutoff(at: NaiveDate, granularity: AxisGranularity) -> NaiveDate {
        match granularity {
            AxisGranularity::Daily => at,
            AxisGranularity::Weekly => at
                .checked_add_signed(Duration::days(6))
                .unwrap_or(NaiveDate::MAX),
        }
    }
}
