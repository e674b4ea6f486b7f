// ==========================================
// TAG 进度跟踪系统 - S 曲线领域模型
// ==========================================

use crate::domain::types::{AxisGranularity, DateClass};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 曲线上的一个点：截至 at（含）的累计数量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub at: NaiveDate,
    pub cumulative: usize,
}

// ==========================================
// CurveSet - 多口径累计曲线
// ==========================================
// 空集合表示"数据不足"，不是错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveSet {
    pub granularity: AxisGranularity,
    pub axis: Vec<NaiveDate>,
    pub series: BTreeMap<DateClass, Vec<CurvePoint>>,
    pub total_records: usize, // 参与计算的记录总数（调用方做百分比用）
}

impl CurveSet {
    pub fn empty(granularity: AxisGranularity, total_records: usize) -> Self {
        Self {
            granularity,
            axis: Vec::new(),
            series: BTreeMap::new(),
            total_records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }

    pub fn series(&self, class: DateClass) -> Option<&[CurvePoint]> {
        self.series.get(&class).map(Vec::as_slice)
    }

    /// 某口径的累计值序列
    pub fn counts(&self, class: DateClass) -> Vec<usize> {
        self.series(class)
            .map(|points| points.iter().map(|p| p.cumulative).collect())
            .unwrap_or_default()
    }
}
