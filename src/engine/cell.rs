// ==========================================
// TAG 进度跟踪系统 - 单元格取值判定
// ==========================================
// 职责: 统一的"是否有值"判定 + 日期文本解析/格式化
// 红线: 全系统只允许通过 is_populated 判断空值，不得另写空值名单
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};

/// 日期文本标准格式（dd/mm/yyyy）
pub const TAG_DATE_FORMAT: &str = "%d/%m/%Y";

/// 文本空值标记（大写比较）
const NULL_MARKERS: &[&str] = &["NULL", "NONE", "NAN", "NAT", "N/A", "NA", "#N/A"];

/// 表单中的日期格式提示文字（曾被原样保存进表格）
const FORMAT_HINTS: &[&str] = &["DD/MM/AAAA", "DD/MM/YYYY", "DD/MM/AA"];

/// 判断单元格是否有值
///
/// # 规则
/// 以下情况均视为"无值":
/// - None / 空串 / 纯空白
/// - 仅由横线组成（`-`、`--`、`–`、`—`）
/// - 文本空值标记（null / none / nan / nat / n/a，不区分大小写）
/// - 日期格式提示文字（DD/MM/AAAA 等）
///
/// 该函数是全函数，不会 panic。
pub fn is_populated(value: Option<&str>) -> bool {
    let trimmed = match value {
        Some(v) => v.trim(),
        None => return false,
    };

    if trimmed.is_empty() {
        return false;
    }

    if trimmed.chars().all(|c| matches!(c, '-' | '–' | '—')) {
        return false;
    }

    let upper = trimmed.to_uppercase();
    if NULL_MARKERS.contains(&upper.as_str()) {
        return false;
    }

    !FORMAT_HINTS.contains(&upper.as_str())
}

/// 规范化单元格文本: 无值 → None，有值 → 去首尾空白
pub fn normalize_cell(value: Option<&str>) -> Option<String> {
    if is_populated(value) {
        value.map(|v| v.trim().to_string())
    } else {
        None
    }
}

/// 解析日期文本
///
/// # 支持格式
/// - dd/mm/yyyy（标准格式，日/月允许一位）
/// - dd-mm-yyyy
/// - yyyy-mm-dd、yyyy-mm-dd hh:mm:ss（表格导出兼容）
///
/// # 返回
/// - None: 无值或无法解析
pub fn parse_tag_date(value: &str) -> Option<NaiveDate> {
    if !is_populated(Some(value)) {
        return None;
    }
    let trimmed = value.trim();

    NaiveDate::parse_from_str(trimmed, TAG_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d-%m-%Y"))
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%d/%m/%Y %H:%M:%S").map(|dt| dt.date())
        })
        .ok()
}

/// 格式化为标准日期文本（补零）
pub fn format_tag_date(date: NaiveDate) -> String {
    date.format(TAG_DATE_FORMAT).to_string()
}
