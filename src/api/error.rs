// ==========================================
// TAG 进度跟踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户友好的错误消息
// ==========================================

use crate::domain::error::DomainError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 重复 key 阻断单记录定位
    #[error("数据完整性错误: key={key} 出现 {occurrences} 次")]
    DataIntegrity { key: String, occurrences: usize },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入 / 配置错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DataIntegrity { key, occurrences } => {
                ApiError::DataIntegrity { key, occurrences }
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 DomainError 转换
// ==========================================
impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::DataIntegrity { key, occurrences } => {
                ApiError::DataIntegrity { key, occurrences }
            }
            DomainError::InvalidArgument(msg) => ApiError::InvalidInput(msg),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
// 存储错误保持原有语义，其余归为导入失败
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(e) => e.into(),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "TagRecord[ELECTRICAL]".to_string(),
            id: "E-404".to_string(),
        };
        match ApiError::from(repo_err) {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ELECTRICAL"));
                assert!(msg.contains("E-404"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let repo_err = RepositoryError::DataIntegrity {
            key: "E-101".to_string(),
            occurrences: 2,
        };
        assert!(matches!(
            ApiError::from(repo_err),
            ApiError::DataIntegrity { occurrences: 2, .. }
        ));
    }

    #[test]
    fn test_import_error_conversion_keeps_integrity() {
        let err = ImportError::Repository(RepositoryError::DataIntegrity {
            key: "E-101".to_string(),
            occurrences: 3,
        });
        assert!(matches!(
            ApiError::from(err),
            ApiError::DataIntegrity { occurrences: 3, .. }
        ));

        let err = ImportError::UnsupportedFormat("txt".to_string());
        match ApiError::from(err) {
            ApiError::ImportError(msg) => assert!(msg.contains("txt")),
            other => panic!("Expected ImportError, got {:?}", other),
        }
    }
}
