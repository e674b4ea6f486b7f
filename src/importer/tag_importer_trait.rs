// ==========================================
// TAG 进度跟踪系统 - 批量导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 解析 → 字段映射 → 对账 → 逐条落库
// ==========================================

use crate::domain::import::TagImportReport;
use crate::domain::types::Discipline;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::MappedRow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 原始行: 表头 → 单元格文本
pub type RawRow = HashMap<String, String>;

// ==========================================
// TagImporter Trait
// ==========================================
// 用途: 批量更新导入主接口
// 实现者: TagImporterImpl
#[async_trait]
pub trait TagImporter: Send + Sync {
    /// 从文件导入某专业的批量更新（.csv / .xlsx / .xls）
    ///
    /// # 返回
    /// - Ok(TagImportReport): 命中 / 未命中 / 跳过 / 写入失败明细
    /// - Err: 文件级致命错误（解析失败、缺少 TAG 列、读取记录集失败）
    async fn import_file(
        &self,
        discipline: Discipline,
        file_path: &Path,
    ) -> ImportResult<TagImportReport>;

    /// 导入已解析的原始行
    async fn import_rows(
        &self,
        discipline: Discipline,
        rows: Vec<RawRow>,
        file_name: Option<String>,
    ) -> ImportResult<TagImportReport>;

    /// 并发导入多个文件（每个文件对应一个专业）
    ///
    /// # 返回
    /// - 与输入顺序一致的结果列表；单个文件失败不影响其他文件
    async fn batch_import(
        &self,
        files: Vec<(Discipline, PathBuf)>,
    ) -> Vec<Result<TagImportReport, String>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行（跳过完全空白的行）
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 实现者: field_mapper::FieldMapper
pub trait FieldMapper: Send + Sync {
    /// 表头中是否存在 TAG 列
    fn has_key_column(&self, headers: &[&str]) -> bool;

    /// 原始行 → 对账输入行 + 单元格问题
    fn map_row(&self, row: &RawRow, row_number: usize) -> MappedRow;
}
