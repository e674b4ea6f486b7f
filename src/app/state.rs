// ==========================================
// TAG 进度跟踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::TrackerApi;
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version};
use crate::repository::tag_record_repo::SqliteRecordStore;

/// 应用状态
///
/// 同一数据库连接由记录存储与配置管理器共享
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 跟踪API
    pub tracker_api: Arc<TrackerApi<SqliteRecordStore>>,

    /// 配置管理器（config show / config set）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动创建并建表）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(version) => tracing::debug!(schema_version = ?version, "数据库结构就绪"),
            Err(e) => tracing::warn!("schema_version 读取失败(将继续启动): {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        let store = Arc::new(SqliteRecordStore::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let tracker_api = Arc::new(TrackerApi::new(store, config_manager.clone()));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            tracker_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// # 规则
/// 1. 环境变量 TAG_TRACKER_DB_PATH（非空）
/// 2. 用户数据目录/tag-tracker/tag_tracker.db
/// 3. 当前目录 ./tag_tracker.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("TAG_TRACKER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./tag_tracker.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("tag-tracker");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("tag_tracker.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[tokio::test]
    async fn test_app_state_initializes_fresh_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("tracker.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);

        let summary = state
            .tracker_api
            .progress_summary(crate::domain::types::Discipline::Electrical)
            .await
            .unwrap();
        assert_eq!(summary.total, 0);

        // 重复打开同一数据库不应失败
        AppState::new(db_path).unwrap();
    }
}
