// ==========================================
// TAG 进度跟踪系统 - 领域类型定义
// ==========================================
// 职责: 专业 / 状态 / 日期字段 / 曲线口径等枚举
// 红线: 状态词汇对外稳定，序列化名称不得变更
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 专业 (Discipline)
// ==========================================
// 每个专业拥有独立的记录集与状态流水线
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discipline {
    Electrical,      // 电气
    Instrumentation, // 仪表
    Structural,      // 结构
}

impl Discipline {
    pub const ALL: [Discipline; 3] = [
        Discipline::Electrical,
        Discipline::Instrumentation,
        Discipline::Structural,
    ];

    /// 数据库存储编码
    pub fn code(&self) -> &'static str {
        match self {
            Discipline::Electrical => "ELECTRICAL",
            Discipline::Instrumentation => "INSTRUMENTATION",
            Discipline::Structural => "STRUCTURAL",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 兼容源表格中的葡语简称
        match s.trim().to_uppercase().as_str() {
            "ELECTRICAL" | "E" | "ELE" | "ELETRICA" | "ELÉTRICA" => Ok(Discipline::Electrical),
            "INSTRUMENTATION" | "I" | "INS" | "INSTRUMENTACAO" | "INSTRUMENTAÇÃO" => {
                Ok(Discipline::Instrumentation)
            }
            "STRUCTURAL" | "S" | "EST" | "ESTRUTURA" => Ok(Discipline::Structural),
            other => Err(format!("未知专业: {}", other)),
        }
    }
}

// ==========================================
// TAG 状态 (Lifecycle Status)
// ==========================================
// 3 段: AwaitingSchedule → Scheduled → Completed
// 5 段: AwaitingSchedule → Scheduled → Fabricated → Painted → Assembled → Torqued
// 序列化名称即对外词汇
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TagStatus {
    AwaitingSchedule, // 待排期（初始状态）
    Scheduled,        // 已排期
    Fabricated,       // 已预制
    Painted,          // 已涂装
    Assembled,        // 已安装
    Torqued,          // 已紧固
    Completed,        // 已完成
}

impl TagStatus {
    /// 对外稳定名称
    pub fn as_str(&self) -> &'static str {
        match self {
            TagStatus::AwaitingSchedule => "AwaitingSchedule",
            TagStatus::Scheduled => "Scheduled",
            TagStatus::Fabricated => "Fabricated",
            TagStatus::Painted => "Painted",
            TagStatus::Assembled => "Assembled",
            TagStatus::Torqued => "Torqued",
            TagStatus::Completed => "Completed",
        }
    }

    /// i18n 文案键
    pub fn label_key(&self) -> &'static str {
        match self {
            TagStatus::AwaitingSchedule => "status.awaiting_schedule",
            TagStatus::Scheduled => "status.scheduled",
            TagStatus::Fabricated => "status.fabricated",
            TagStatus::Painted => "status.painted",
            TagStatus::Assembled => "status.assembled",
            TagStatus::Torqued => "status.torqued",
            TagStatus::Completed => "status.completed",
        }
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TagStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "AwaitingSchedule" => Ok(TagStatus::AwaitingSchedule),
            "Scheduled" => Ok(TagStatus::Scheduled),
            "Fabricated" => Ok(TagStatus::Fabricated),
            "Painted" => Ok(TagStatus::Painted),
            "Assembled" => Ok(TagStatus::Assembled),
            "Torqued" => Ok(TagStatus::Torqued),
            "Completed" => Ok(TagStatus::Completed),
            other => Err(format!("未知状态: {}", other)),
        }
    }
}

// ==========================================
// 日期字段 (Date Field)
// ==========================================
// 后三项仅结构专业使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    ScheduledStart,   // 计划开始
    ScheduledEnd,     // 计划结束
    BaselinePlanned,  // 基线计划
    ActualCompletion, // 实际完成（安装）
    FabricationDate,  // 预制日期
    PaintDate,        // 涂装日期
    TorqueDate,       // 紧固日期
}

impl DateField {
    pub const ALL: [DateField; 7] = [
        DateField::ScheduledStart,
        DateField::ScheduledEnd,
        DateField::BaselinePlanned,
        DateField::ActualCompletion,
        DateField::FabricationDate,
        DateField::PaintDate,
        DateField::TorqueDate,
    ];

    pub fn column(&self) -> &'static str {
        TagField::Date(*self).column()
    }
}

// ==========================================
// 可修改字段 (Tag Field)
// ==========================================
// key / discipline / status 不在其中：主键不可改，状态只能派生
// 序列化为列名（可作为 JSON map 的 key）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagField {
    Date(DateField),
    WeekNumber,
    Note,
    Description,
    Area,
    ReferenceDocument,
}

impl TagField {
    pub const ALL: [TagField; 12] = [
        TagField::Date(DateField::ScheduledStart),
        TagField::Date(DateField::ScheduledEnd),
        TagField::Date(DateField::BaselinePlanned),
        TagField::Date(DateField::ActualCompletion),
        TagField::Date(DateField::FabricationDate),
        TagField::Date(DateField::PaintDate),
        TagField::Date(DateField::TorqueDate),
        TagField::WeekNumber,
        TagField::Note,
        TagField::Description,
        TagField::Area,
        TagField::ReferenceDocument,
    ];

    /// 标准列名（同时作为 tag_record 表列名）
    pub fn column(&self) -> &'static str {
        match self {
            TagField::Date(DateField::ScheduledStart) => "scheduled_start",
            TagField::Date(DateField::ScheduledEnd) => "scheduled_end",
            TagField::Date(DateField::BaselinePlanned) => "baseline_planned",
            TagField::Date(DateField::ActualCompletion) => "actual_completion",
            TagField::Date(DateField::FabricationDate) => "fabrication_date",
            TagField::Date(DateField::PaintDate) => "paint_date",
            TagField::Date(DateField::TorqueDate) => "torque_date",
            TagField::WeekNumber => "week_number",
            TagField::Note => "note",
            TagField::Description => "description",
            TagField::Area => "area",
            TagField::ReferenceDocument => "reference_document",
        }
    }

    pub fn from_column(column: &str) -> Option<TagField> {
        TagField::ALL
            .iter()
            .copied()
            .find(|f| f.column() == column)
    }

    pub fn is_date(&self) -> bool {
        matches!(self, TagField::Date(_))
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl FromStr for TagField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let column = s.trim().to_lowercase();
        TagField::from_column(&column).ok_or_else(|| format!("未知字段: {}", s.trim()))
    }
}

impl Serialize for TagField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column())
    }
}

impl<'de> Deserialize<'de> for TagField {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let column = String::deserialize(deserializer)?;
        column.parse().map_err(serde::de::Error::custom)
    }
}

// ==========================================
// 曲线口径 (Date Class)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateClass {
    Planned,   // 基线计划
    Scheduled, // 当前排期
    Actual,    // 实际完成
}

impl DateClass {
    pub const ALL: [DateClass; 3] = [DateClass::Planned, DateClass::Scheduled, DateClass::Actual];
}

impl fmt::Display for DateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateClass::Planned => write!(f, "PLANNED"),
            DateClass::Scheduled => write!(f, "SCHEDULED"),
            DateClass::Actual => write!(f, "ACTUAL"),
        }
    }
}

impl FromStr for DateClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PLANNED" | "PREVISTO" => Ok(DateClass::Planned),
            "SCHEDULED" | "PROGRAMADO" => Ok(DateClass::Scheduled),
            "ACTUAL" | "REALIZADO" => Ok(DateClass::Actual),
            other => Err(format!("未知曲线口径: {}", other)),
        }
    }
}

// ==========================================
// 横轴粒度 (Axis Granularity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AxisGranularity {
    Daily,  // 按天
    Weekly, // 按周（与项目周历对齐）
}

impl fmt::Display for AxisGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisGranularity::Daily => write!(f, "DAILY"),
            AxisGranularity::Weekly => write!(f, "WEEKLY"),
        }
    }
}

impl FromStr for AxisGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DAILY" | "D" => Ok(AxisGranularity::Daily),
            "WEEKLY" | "W" => Ok(AxisGranularity::Weekly),
            other => Err(format!("未知横轴粒度: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_vocabulary_is_stable() {
        assert_eq!(
            serde_json::to_string(&TagStatus::AwaitingSchedule).unwrap(),
            "\"AwaitingSchedule\""
        );
        assert_eq!(TagStatus::Torqued.to_string(), "Torqued");
        assert_eq!("Completed".parse::<TagStatus>(), Ok(TagStatus::Completed));
        assert!("MONTADO".parse::<TagStatus>().is_err());
    }

    #[test]
    fn test_discipline_aliases() {
        assert_eq!("ele".parse::<Discipline>(), Ok(Discipline::Electrical));
        assert_eq!("Instrumentação".parse::<Discipline>(), Ok(Discipline::Instrumentation));
        assert_eq!("STRUCTURAL".parse::<Discipline>(), Ok(Discipline::Structural));
        assert!("civil".parse::<Discipline>().is_err());
    }

    #[test]
    fn test_tag_field_column_roundtrip() {
        for field in TagField::ALL {
            assert_eq!(TagField::from_column(field.column()), Some(field));
        }
        assert_eq!(TagField::from_column("status"), None);
        assert_eq!(DateField::PaintDate.column(), "paint_date");
    }

    #[test]
    fn test_tag_field_serializes_as_map_key() {
        let mut patch = std::collections::BTreeMap::new();
        patch.insert(TagField::Date(DateField::ScheduledStart), Some("01/10/2025"));
        patch.insert(TagField::WeekNumber, None);

        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"scheduled_start":"01/10/2025","week_number":null}"#);
        assert_eq!("Paint_Date".parse::<TagField>(), Ok(TagField::Date(DateField::PaintDate)));
    }
}
