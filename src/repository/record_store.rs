// ==========================================
// TAG 进度跟踪系统 - 记录存储 Trait
// ==========================================
// 职责: 定义 TAG 记录的数据访问接口（不包含业务逻辑）
// 红线: 存储不派生状态，status 由调用方算好后随字段一次写入
// ==========================================

use crate::domain::record::{FieldPatch, RecordSet, TagRecord};
use crate::domain::types::{Discipline, TagStatus};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// RecordStore Trait
// ==========================================
// 实现者: SqliteRecordStore（使用 rusqlite）
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 读取某专业的全部记录（按录入顺序）
    async fn read_all(&self, discipline: Discipline) -> RepositoryResult<RecordSet>;

    /// 单行原子写入：补丁字段 + 状态在同一条 UPDATE 中落库
    ///
    /// # 返回
    /// - Err(NotFound): 无此 key
    /// - Err(DataIntegrity): key 对应多行，不做任何修改
    async fn write_row(
        &self,
        discipline: Discipline,
        key: &str,
        fields: &FieldPatch,
        status: TagStatus,
    ) -> RepositoryResult<()>;

    /// 追加一条记录（不检查 key 唯一性）
    async fn append_record(&self, record: &TagRecord) -> RepositoryResult<()>;

    /// 按 key 删除
    ///
    /// # 返回
    /// - Err(NotFound): 无此 key
    /// - Err(DataIntegrity): key 对应多行，不做任何修改
    async fn delete_record(&self, discipline: Discipline, key: &str) -> RepositoryResult<()>;
}
