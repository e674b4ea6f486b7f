// ==========================================
// TAG 进度跟踪系统 - TAG 记录仓储（SQLite）
// ==========================================
// 职责: 实现 RecordStore（tag_record 表）
// 约束: 表不对 (discipline, tag_key) 建唯一约束，重复 key 在写入前统计并报错
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::record::{FieldPatch, RecordSet, TagRecord};
use crate::domain::types::{Discipline, TagField, TagStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::RecordStore;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

const SELECT_COLUMNS: &str = r#"
    discipline, tag_key,
    scheduled_start, scheduled_end, baseline_planned, actual_completion,
    fabrication_date, paint_date, torque_date,
    week_number, status,
    note, description, area, reference_document
"#;

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 统计 key 行数并要求恰好一行
    fn ensure_single_row(
        conn: &Connection,
        discipline: Discipline,
        key: &str,
    ) -> RepositoryResult<()> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tag_record WHERE discipline = ?1 AND tag_key = ?2",
            params![discipline.code(), key],
            |row| row.get(0),
        )?;

        match count {
            0 => Err(RepositoryError::NotFound {
                entity: format!("TagRecord[{}]", discipline),
                id: key.to_string(),
            }),
            1 => Ok(()),
            n => Err(RepositoryError::DataIntegrity {
                key: key.to_string(),
                occurrences: n as usize,
            }),
        }
    }

    /// 补丁值 → SQL 值（week_number 为整数列）
    fn to_sql_value(field: TagField, value: &Option<String>) -> RepositoryResult<Value> {
        match (field, value) {
            (_, None) => Ok(Value::Null),
            (TagField::WeekNumber, Some(text)) => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| RepositoryError::FieldValueError {
                    field: field.column().to_string(),
                    message: format!("周次不是整数: {}", text),
                }),
            (_, Some(text)) => Ok(Value::Text(text.clone())),
        }
    }

    fn map_row(row: &Row) -> rusqlite::Result<TagRecord> {
        let discipline: String = row.get(0)?;
        let status: String = row.get(10)?;

        Ok(TagRecord {
            discipline: discipline
                .parse()
                .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, e.into()))?,
            key: row.get(1)?,
            scheduled_start: row.get(2)?,
            scheduled_end: row.get(3)?,
            baseline_planned: row.get(4)?,
            actual_completion: row.get(5)?,
            fabrication_date: row.get(6)?,
            paint_date: row.get(7)?,
            torque_date: row.get(8)?,
            week_number: row.get(9)?,
            status: status
                .parse()
                .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, e.into()))?,
            note: row.get(11)?,
            description: row.get(12)?,
            area: row.get(13)?,
            reference_document: row.get(14)?,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn read_all(&self, discipline: Discipline) -> RepositoryResult<RecordSet> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM tag_record WHERE discipline = ?1 ORDER BY rowid",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![discipline.code()], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(discipline = %discipline, count = records.len(), "读取记录集");
        Ok(RecordSet::new(records))
    }

    async fn write_row(
        &self,
        discipline: Discipline,
        key: &str,
        fields: &FieldPatch,
        status: TagStatus,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::ensure_single_row(&tx, discipline, key)?;

        // 列名来自 TagField::column()，不接受外部输入
        let mut assignments = Vec::with_capacity(fields.len() + 2);
        let mut values = Vec::with_capacity(fields.len() + 4);
        for (field, value) in fields {
            values.push(Self::to_sql_value(*field, value)?);
            assignments.push(format!("{} = ?{}", field.column(), values.len()));
        }
        values.push(Value::Text(status.as_str().to_string()));
        assignments.push(format!("status = ?{}", values.len()));
        values.push(Value::Text(Utc::now().to_rfc3339()));
        assignments.push(format!("updated_at = ?{}", values.len()));

        values.push(Value::Text(discipline.code().to_string()));
        let discipline_idx = values.len();
        values.push(Value::Text(key.to_string()));
        let key_idx = values.len();

        let sql = format!(
            "UPDATE tag_record SET {} WHERE discipline = ?{} AND tag_key = ?{}",
            assignments.join(", "),
            discipline_idx,
            key_idx
        );
        tx.execute(&sql, params_from_iter(values.iter()))?;
        tx.commit()?;

        debug!(discipline = %discipline, key = key, fields = fields.len(), status = %status, "写入记录");
        Ok(())
    }

    async fn append_record(&self, record: &TagRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO tag_record (
                discipline, tag_key,
                scheduled_start, scheduled_end, baseline_planned, actual_completion,
                fabrication_date, paint_date, torque_date,
                week_number, status,
                note, description, area, reference_document,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                record.discipline.code(),
                record.key,
                record.scheduled_start,
                record.scheduled_end,
                record.baseline_planned,
                record.actual_completion,
                record.fabrication_date,
                record.paint_date,
                record.torque_date,
                record.week_number,
                record.status.as_str(),
                record.note,
                record.description,
                record.area,
                record.reference_document,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn delete_record(&self, discipline: Discipline, key: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::ensure_single_row(&tx, discipline, key)?;
        tx.execute(
            "DELETE FROM tag_record WHERE discipline = ?1 AND tag_key = ?2",
            params![discipline.code(), key],
        )?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::types::DateField;

    fn store() -> SqliteRecordStore {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        SqliteRecordStore::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_append_and_read_all_keeps_order() {
        let store = store();
        store
            .append_record(&TagRecord::new("E-102", Discipline::Electrical))
            .await
            .unwrap();
        store
            .append_record(&TagRecord::new("E-101", Discipline::Electrical))
            .await
            .unwrap();
        store
            .append_record(&TagRecord::new("S-001", Discipline::Structural))
            .await
            .unwrap();

        let set = store.read_all(Discipline::Electrical).await.unwrap();
        let keys: Vec<&str> = set.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["E-102", "E-101"]);
        assert_eq!(store.read_all(Discipline::Structural).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_write_row_updates_fields_and_status_only() {
        let store = store();
        let mut record = TagRecord::new("E-101", Discipline::Electrical);
        record.note = Some("painel".to_string());
        store.append_record(&record).await.unwrap();

        let mut patch = FieldPatch::new();
        patch.insert(
            TagField::Date(DateField::ScheduledStart),
            Some("01/10/2025".to_string()),
        );
        patch.insert(TagField::WeekNumber, Some("1".to_string()));
        store
            .write_row(Discipline::Electrical, "E-101", &patch, TagStatus::Scheduled)
            .await
            .unwrap();

        let set = store.read_all(Discipline::Electrical).await.unwrap();
        let saved = set.find_unique("E-101").unwrap().unwrap();
        assert_eq!(saved.scheduled_start.as_deref(), Some("01/10/2025"));
        assert_eq!(saved.week_number, Some(1));
        assert_eq!(saved.status, TagStatus::Scheduled);
        assert_eq!(saved.note.as_deref(), Some("painel"));
    }

    #[tokio::test]
    async fn test_write_row_not_found_and_duplicate() {
        let store = store();
        let patch = FieldPatch::new();

        let missing = store
            .write_row(Discipline::Electrical, "E-404", &patch, TagStatus::Scheduled)
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));

        for _ in 0..2 {
            store
                .append_record(&TagRecord::new("E-101", Discipline::Electrical))
                .await
                .unwrap();
        }
        let duplicate = store
            .write_row(Discipline::Electrical, "E-101", &patch, TagStatus::Completed)
            .await;
        assert!(matches!(
            duplicate,
            Err(RepositoryError::DataIntegrity { occurrences: 2, .. })
        ));

        let set = store.read_all(Discipline::Electrical).await.unwrap();
        assert!(set.iter().all(|r| r.status == TagStatus::AwaitingSchedule));
    }

    #[tokio::test]
    async fn test_delete_record() {
        let store = store();
        store
            .append_record(&TagRecord::new("E-101", Discipline::Electrical))
            .await
            .unwrap();

        store
            .delete_record(Discipline::Electrical, "E-101")
            .await
            .unwrap();
        assert!(store.read_all(Discipline::Electrical).await.unwrap().is_empty());

        let again = store.delete_record(Discipline::Electrical, "E-101").await;
        assert!(matches!(again, Err(RepositoryError::NotFound { .. })));
    }
}
