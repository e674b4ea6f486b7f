// ==========================================
// TAG 进度跟踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::tracker_config_trait::{ConfigResult, TrackerConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::types::{AxisGranularity, DateClass};
use crate::engine::cell::{format_tag_date, parse_tag_date};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 默认周历纪元（dd/mm/yyyy）
pub const DEFAULT_WEEK_EPOCH: &str = "29/09/2025";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 校验后写入跟踪配置（命令行 config set 入口）
    ///
    /// # 规则
    /// - week_epoch: dd/mm/yyyy 且为周一
    /// - curve_granularity: DAILY / WEEKLY
    /// - curve_classes: 逗号分隔，至少一个合法口径
    /// - 其他 key 拒绝写入
    pub fn set_tracker_config(&self, key: &str, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        let normalized = match key {
            config_keys::WEEK_EPOCH => {
                let date = parse_tag_date(value).ok_or_else(|| format!("无法解析日期: {}", value))?;
                if date.weekday() != Weekday::Mon {
                    return Err(format!("周历纪元必须是周一: {}", value).into());
                }
                format_tag_date(date)
            }
            config_keys::CURVE_GRANULARITY => value.parse::<AxisGranularity>()?.to_string(),
            config_keys::CURVE_CLASSES => {
                let classes = value
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.parse::<DateClass>())
                    .collect::<Result<Vec<_>, _>>()?;
                if classes.is_empty() {
                    return Err("曲线口径不能为空".into());
                }
                classes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            }
            other => return Err(format!("未知配置项: {}", other).into()),
        };
        self.set_global_config_value(key, &normalized)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// TrackerConfigReader 实现
// ==========================================
#[async_trait]
impl TrackerConfigReader for ConfigManager {
    async fn get_week_epoch(&self) -> ConfigResult<NaiveDate> {
        let value = self.get_config_or_default(config_keys::WEEK_EPOCH, DEFAULT_WEEK_EPOCH)?;
        match parse_tag_date(&value) {
            Some(date) => Ok(date),
            None => {
                warn!(config_key = config_keys::WEEK_EPOCH, value = %value, "配置值无法解析，使用默认值");
                Ok(default_week_epoch())
            }
        }
    }

    async fn get_curve_granularity(&self) -> ConfigResult<AxisGranularity> {
        let value = self.get_config_or_default(config_keys::CURVE_GRANULARITY, "DAILY")?;
        Ok(value.parse().unwrap_or(AxisGranularity::Daily))
    }

    async fn get_curve_classes(&self) -> ConfigResult<Vec<DateClass>> {
        let value =
            self.get_config_or_default(config_keys::CURVE_CLASSES, "PLANNED,SCHEDULED,ACTUAL")?;

        let classes: Vec<DateClass> = value
            .split(',')
            .filter_map(|s| s.parse::<DateClass>().ok())
            .collect();

        if classes.is_empty() {
            Ok(DateClass::ALL.to_vec())
        } else {
            Ok(classes)
        }
    }
}

/// 默认周历纪元
pub fn default_week_epoch() -> NaiveDate {
    // 2025-09-29 是合法日期
    NaiveDate::from_ymd_opt(2025, 9, 29).unwrap_or(NaiveDate::MIN)
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const WEEK_EPOCH: &str = "week_epoch"; // 周历纪元 (dd/mm/yyyy)
    pub const CURVE_GRANULARITY: &str = "curve_granularity"; // DAILY / WEEKLY
    pub const CURVE_CLASSES: &str = "curve_classes"; // 逗号分隔的口径列表
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults() {
        let config = manager();
        assert_eq!(
            config.get_week_epoch().await.unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 29).unwrap()
        );
        assert_eq!(
            config.get_curve_granularity().await.unwrap(),
            AxisGranularity::Daily
        );
        assert_eq!(config.get_curve_classes().await.unwrap(), DateClass::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_overrides_and_fallbacks() {
        let config = manager();
        config
            .set_global_config_value(config_keys::WEEK_EPOCH, "06/10/2025")
            .unwrap();
        config
            .set_global_config_value(config_keys::CURVE_GRANULARITY, "weekly")
            .unwrap();
        config
            .set_global_config_value(config_keys::CURVE_CLASSES, "actual, bogus")
            .unwrap();

        assert_eq!(
            config.get_week_epoch().await.unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()
        );
        assert_eq!(
            config.get_curve_granularity().await.unwrap(),
            AxisGranularity::Weekly
        );
        assert_eq!(config.get_curve_classes().await.unwrap(), vec![DateClass::Actual]);

        config
            .set_global_config_value(config_keys::WEEK_EPOCH, "DD/MM/AAAA")
            .unwrap();
        assert_eq!(config.get_week_epoch().await.unwrap(), default_week_epoch());

        let snapshot = config.get_config_snapshot().unwrap();
        assert!(snapshot.contains("curve_granularity"));
    }

    #[tokio::test]
    async fn test_set_tracker_config_validates_values() {
        let config = manager();

        config
            .set_tracker_config(config_keys::WEEK_EPOCH, "6/10/2025")
            .unwrap();
        assert_eq!(
            config.get_global_config_value(config_keys::WEEK_EPOCH).unwrap(),
            Some("06/10/2025".to_string())
        );
        assert!(config
            .set_tracker_config(config_keys::WEEK_EPOCH, "07/10/2025")
            .is_err());

        config
            .set_tracker_config(config_keys::CURVE_GRANULARITY, "w")
            .unwrap();
        assert_eq!(
            config.get_curve_granularity().await.unwrap(),
            AxisGranularity::Weekly
        );

        config
            .set_tracker_config(config_keys::CURVE_CLASSES, "realizado, planned")
            .unwrap();
        assert_eq!(
            config.get_curve_classes().await.unwrap(),
            vec![DateClass::Actual, DateClass::Planned]
        );
        assert!(config
            .set_tracker_config(config_keys::CURVE_CLASSES, "actual,bogus")
            .is_err());
        assert!(config.set_tracker_config("theme", "dark").is_err());
    }
}
