// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、记录构造、夹具文件等功能
// ==========================================
#![allow(dead_code)]

use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use std::path::{Path, PathBuf};
use tag_tracker::domain::record::TagRecord;
use tag_tracker::domain::types::{DateField, Discipline, TagField};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = Connection::open(&db_path)?;
    tag_tracker::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 夹具文件路径（tests/fixtures/）
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 构造带日期的记录（状态未派生）
pub fn record_with_dates(
    key: &str,
    discipline: Discipline,
    dates: &[(DateField, &str)],
) -> TagRecord {
    let mut record = TagRecord::new(key, discipline);
    for (field, value) in dates {
        record
            .set_field(TagField::Date(*field), Some(value.to_string()))
            .unwrap();
    }
    record
}
