// ==========================================
// TAG 进度跟踪系统 - 导入层
// ==========================================
// 职责: 外部表格批量更新导入 + 记录集导出
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod table_writer;
pub mod tag_importer;
pub mod tag_importer_trait;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{normalize_header, FieldMapper as FieldMapperImpl, MappedRow};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use table_writer::{ExportFile, TableWriter};
pub use tag_importer::TagImporterImpl;

// 重导出 Trait 接口
pub use tag_importer_trait::{FieldMapper, FileParser, RawRow, TagImporter};
