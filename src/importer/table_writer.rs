// ==========================================
// TAG 进度跟踪系统 - 表格导出
// ==========================================
// 职责: 记录集 → CSV 文件字节
// 约定: 导出表头与导入别名一致，导出文件可直接回导
// ==========================================

use crate::domain::record::RecordSet;
use crate::domain::types::{DateField, Discipline};
use crate::importer::error::{ImportError, ImportResult};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

/// 导出文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct TableWriter;

impl TableWriter {
    /// 通用表格序列化
    ///
    /// # 参数
    /// - headers: 表头
    /// - rows: 数据行（列数需与表头一致）
    /// - title: 文件标题（生成文件名）
    pub fn serialize(
        &self,
        headers: &[&str],
        rows: &[Vec<String>],
        title: &str,
    ) -> ImportResult<ExportFile> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ImportError::CsvWriteError(e.to_string()))?;

        Ok(ExportFile {
            file_name: format!("{}.csv", file_stem(title)),
            content_type: "text/csv".to_string(),
            bytes,
        })
    }

    /// 记录集导出（结构专业附带预制/涂装/紧固列）
    pub fn serialize_records(
        &self,
        discipline: Discipline,
        records: &RecordSet,
        title: &str,
    ) -> ImportResult<ExportFile> {
        let mut columns: Vec<(&str, Option<DateField>)> = vec![
            ("DATA INIC PROG", Some(DateField::ScheduledStart)),
            ("DATA FIM PROG", Some(DateField::ScheduledEnd)),
            ("PREVISTO", Some(DateField::BaselinePlanned)),
            ("DATA MONT", Some(DateField::ActualCompletion)),
        ];
        if discipline == Discipline::Structural {
            columns.push(("DATA FABRICACAO", Some(DateField::FabricationDate)));
            columns.push(("DATA PINTURA", Some(DateField::PaintDate)));
            columns.push(("DATA TORQUE", Some(DateField::TorqueDate)));
        }

        let mut headers = vec!["TAG", "DESCRICAO", "AREA", "DOCUMENTO"];
        headers.extend(columns.iter().map(|(h, _)| *h));
        headers.extend(["SEMANA", "STATUS", "OBS"]);

        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| {
                let mut row = vec![
                    record.key.clone(),
                    record.description.clone().unwrap_or_default(),
                    record.area.clone().unwrap_or_default(),
                    record.reference_document.clone().unwrap_or_default(),
                ];
                row.extend(columns.iter().map(|(_, field)| {
                    field
                        .and_then(|f| record.date_text(f))
                        .unwrap_or_default()
                        .to_string()
                }));
                row.push(record.week_number.map(|w| w.to_string()).unwrap_or_default());
                row.push(record.status.as_str().to_string());
                row.push(record.note.clone().unwrap_or_default());
                row
            })
            .collect();

        self.serialize(&headers, &rows, title)
    }
}

/// 标题 → 安全文件名
fn file_stem(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "export".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::TagRecord;
    use crate::domain::types::TagStatus;

    #[test]
    fn test_serialize_records() {
        let mut record = TagRecord::new("E-101", Discipline::Electrical);
        record.scheduled_start = Some("01/10/2025".to_string());
        record.status = TagStatus::Scheduled;
        record.note = Some("painel, sala 2".to_string());
        let set = RecordSet::new(vec![record]);

        let file = TableWriter
            .serialize_records(Discipline::Electrical, &set, "Elétrica 2025/10")
            .unwrap();

        assert_eq!(file.file_name, "Elétrica_2025_10.csv");
        let text = String::from_utf8(file.bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("TAG,DESCRICAO,AREA,DOCUMENTO,DATA INIC PROG,DATA FIM PROG,PREVISTO,DATA MONT,SEMANA,STATUS,OBS")
        );
        assert_eq!(
            lines.next(),
            Some("E-101,,,,01/10/2025,,,,,Scheduled,\"painel, sala 2\"")
        );
    }

    #[test]
    fn test_structural_columns() {
        let file = TableWriter
            .serialize_records(Discipline::Structural, &RecordSet::default(), "")
            .unwrap();
        assert_eq!(file.file_name, "export.csv");
        let text = String::from_utf8(file.bytes).unwrap();
        assert!(text.contains("DATA TORQUE"));
    }
}
