// ==========================================
// TAG 进度跟踪系统 - 字段映射器实现
// ==========================================
// 职责: 源表头 → 标准字段映射 + 单元格规范化
// 规则:
// - 表头匹配不区分大小写、忽略首尾空白/重音/下划线
// - 未识别的列（含 STATUS）一律忽略，状态只能派生
// - 空白单元格视为"未给出"，不进入补丁
// - 有值但无法解析的日期/周次 → CellIssue，该字段不进入补丁
// ==========================================

use crate::domain::import::CellIssue;
use crate::domain::reconcile::IncomingRow;
use crate::domain::record::FieldPatch;
use crate::domain::types::{DateField, TagField};
use crate::engine::cell::{format_tag_date, normalize_cell, parse_tag_date};
use crate::importer::tag_importer_trait::{FieldMapper as FieldMapperTrait, RawRow};

/// 映射结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRow {
    pub incoming: IncomingRow,
    pub issues: Vec<CellIssue>,
}

/// 标准化后的列归属
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Key,
    Field(TagField),
}

/// TAG 列别名（标准化形式）
const KEY_ALIASES: &[&str] = &["TAG", "KEY", "TAG KEY", "TAG NO"];

/// 字段别名（标准化形式）：源表格葡语表头 + snake_case 列名
const FIELD_ALIASES: &[(TagField, &[&str])] = &[
    (
        TagField::Date(DateField::ScheduledStart),
        &["DATA INIC PROG", "DATA INICIO PROG", "INICIO PROG", "SCHEDULED START"],
    ),
    (
        TagField::Date(DateField::ScheduledEnd),
        &["DATA FIM PROG", "FIM PROG", "SCHEDULED END"],
    ),
    (
        TagField::Date(DateField::BaselinePlanned),
        &["PREVISTO", "DATA PREVISTA", "BASELINE PLANNED"],
    ),
    (
        TagField::Date(DateField::ActualCompletion),
        &["DATA MONT", "DATA MONTAGEM", "ACTUAL COMPLETION"],
    ),
    (
        TagField::Date(DateField::FabricationDate),
        &["DATA FABRICACAO", "DATA FAB", "FABRICATION DATE"],
    ),
    (
        TagField::Date(DateField::PaintDate),
        &["DATA PINTURA", "PAINT DATE"],
    ),
    (
        TagField::Date(DateField::TorqueDate),
        &["DATA TORQUE", "TORQUE DATE"],
    ),
    (TagField::WeekNumber, &["SEMANA", "SEMANA PROG", "WEEK", "WEEK NUMBER"]),
    (TagField::Note, &["OBS", "OBSERVACAO", "OBSERVACOES", "NOTE"]),
    (TagField::Description, &["DESCRICAO", "DESCRIPTION"]),
    (TagField::Area, &["AREA"]),
    (
        TagField::ReferenceDocument,
        &["DOCUMENTO", "DOC", "DOCUMENTO REF", "REFERENCE DOCUMENT"],
    ),
];

/// 表头标准化: 去空白、大写、去重音、下划线/连续空白 → 单个空格
pub fn normalize_header(header: &str) -> String {
    let folded: String = header
        .trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ã' | 'â' | 'Á' | 'À' | 'Ã' | 'Â' => 'A',
            'é' | 'ê' | 'É' | 'Ê' => 'E',
            'í' | 'Í' => 'I',
            'ó' | 'õ' | 'ô' | 'Ó' | 'Õ' | 'Ô' => 'O',
            'ú' | 'Ú' => 'U',
            'ç' | 'Ç' => 'C',
            '_' | '.' => ' ',
            other => other.to_ascii_uppercase(),
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn resolve_column(header: &str) -> Option<Column> {
    let normalized = normalize_header(header);
    if KEY_ALIASES.contains(&normalized.as_str()) {
        return Some(Column::Key);
    }
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
        .map(|(field, _)| Column::Field(*field))
}

/// 周次文本 → 整数（兼容表格导出的 "3.0"；超出 i64 范围视为无法解析）
fn parse_week(value: &str) -> Option<i64> {
    if let Ok(week) = value.parse::<i64>() {
        return Some(week);
    }
    // i64::MAX 无法精确表示为 f64，上界取 2^63 开区间
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    value
        .parse::<f64>()
        .ok()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < UPPER)
        .map(|f| f as i64)
}

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn has_key_column(&self, headers: &[&str]) -> bool {
        headers
            .iter()
            .any(|h| resolve_column(h) == Some(Column::Key))
    }

    fn map_row(&self, row: &RawRow, row_number: usize) -> MappedRow {
        // 按表头排序，保证同一字段多列时结果确定（首个有值的列生效）
        let mut headers: Vec<&String> = row.keys().collect();
        headers.sort();

        let mut key: Option<String> = None;
        let mut cells: Vec<(TagField, &str, String)> = Vec::new();
        for header in headers {
            let value = match normalize_cell(row.get(header).map(String::as_str)) {
                Some(value) => value,
                None => continue,
            };
            match resolve_column(header) {
                Some(Column::Key) => {
                    if key.is_none() {
                        key = Some(value);
                    }
                }
                Some(Column::Field(field)) => {
                    if !cells.iter().any(|(f, _, _)| *f == field) {
                        cells.push((field, header.as_str(), value));
                    }
                }
                None => {}
            }
        }

        let mut fields = FieldPatch::new();
        let mut issues = Vec::new();
        for (field, header, value) in cells {
            let normalized = match field {
                TagField::Date(_) => parse_tag_date(&value)
                    .map(format_tag_date)
                    .ok_or_else(|| format!("无法解析为日期 (dd/mm/yyyy): {}", value)),
                TagField::WeekNumber => parse_week(&value)
                    .map(|w| w.to_string())
                    .ok_or_else(|| format!("无法解析为周次整数: {}", value)),
                _ => Ok(value.clone()),
            };

            match normalized {
                Ok(text) => {
                    fields.insert(field, Some(text));
                }
                Err(message) => issues.push(CellIssue {
                    row_number,
                    key: key.clone(),
                    column: header.to_string(),
                    value,
                    message,
                }),
            }
        }

        MappedRow {
            incoming: IncomingRow::new(row_number, key, fields),
            issues,
        }
    }
}
