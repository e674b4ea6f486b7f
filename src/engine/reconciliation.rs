// ==========================================
// TAG 进度跟踪系统 - 批量对账引擎
// ==========================================
// 职责: 将外部批量部分更新按 key 合并进规范记录集
// 规则:
// - key 为空/无法解析 → 跳过（MalformedRow）
// - key 在规范记录集中重复 → 跳过该行（DuplicateKey），其余 key 照常合并
// - key 精确命中 → 仅覆盖显式给出的字段，并用该专业流水线重算状态
// - 字段值非法 → 整行跳过（InvalidField），记录保持该行之前的值
// - key 未命中 → 记入 unmatched_keys，绝不插入
// - 同批次重复 key → 按输入顺序依次覆盖，最后一次出现的值生效
// 红线: 纯函数，不访问存储；所有写入均为绝对覆盖（幂等）；单行问题不中断整批
// ==========================================

use crate::domain::reconcile::{IncomingRow, MergeOutcome, MergeWarning, RecordChange};
use crate::domain::record::{FieldPatch, RecordSet, TagRecord};
use crate::domain::types::TagField;
use crate::engine::cell::normalize_cell;
use crate::engine::status_engine::StatusEngine;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

// ==========================================
// ReconciliationEngine
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    status_engine: StatusEngine,
}

impl ReconciliationEngine {
    pub fn new(status_engine: StatusEngine) -> Self {
        Self { status_engine }
    }

    /// 合并批量更新
    ///
    /// # 参数
    /// - incoming: 外部批量行（按输入顺序处理）
    /// - canonical: 规范记录集（不被修改）
    ///
    /// # 返回
    /// 更新后的记录集 + 命中/未命中/跳过统计 + 落库变更；
    /// 每一输入行恰好计入 matched / unmatched / skipped 之一
    pub fn merge(&self, incoming: &[IncomingRow], canonical: &RecordSet) -> MergeOutcome {
        // === 步骤 1: 建立唯一 key 索引 ===
        let duplicates: HashSet<String> = canonical.duplicate_keys().into_iter().collect();
        if !duplicates.is_empty() {
            warn!(keys = ?duplicates, "规范记录集存在重复 key，涉及这些 key 的行将被跳过");
        }

        let index: HashMap<&str, usize> = canonical
            .iter()
            .enumerate()
            .filter(|(_, record)| !duplicates.contains(&record.key))
            .map(|(idx, record)| (record.key.as_str(), idx))
            .collect();

        // === 步骤 2: 逐行合并 ===
        let mut updated = canonical.clone();
        let mut matched_count = 0;
        let mut skipped_count = 0;
        let mut unmatched_keys = Vec::new();
        let mut warnings = Vec::new();
        let mut changes: Vec<RecordChange> = Vec::new();
        let mut change_index: HashMap<String, usize> = HashMap::new();

        for row in incoming {
            let key = match normalize_cell(row.key.as_deref()) {
                Some(key) => key,
                None => {
                    debug!(row_number = row.row_number, "缺失 key，跳过该行");
                    skipped_count += 1;
                    warnings.push(MergeWarning::MalformedRow {
                        row_number: row.row_number,
                    });
                    continue;
                }
            };

            if duplicates.contains(&key) {
                let occurrences = canonical.count_key(&key);
                warn!(row_number = row.row_number, key = %key, occurrences, "key 重复，跳过该行");
                skipped_count += 1;
                warnings.push(MergeWarning::DuplicateKey {
                    row_number: row.row_number,
                    key,
                    occurrences,
                });
                continue;
            }

            let idx = match index.get(key.as_str()) {
                Some(idx) => *idx,
                None => {
                    debug!(row_number = row.row_number, key = %key, "key 未命中");
                    warnings.push(MergeWarning::UnmatchedKey {
                        row_number: row.row_number,
                        key: key.clone(),
                    });
                    unmatched_keys.push(key);
                    continue;
                }
            };

            // 先在副本上应用，整行合法才回写
            let mut candidate = updated.records[idx].clone();
            if let Err((field, value)) = apply_row(&mut candidate, &row.fields) {
                warn!(
                    row_number = row.row_number,
                    key = %key,
                    field = %field,
                    value = %value,
                    "字段值非法，跳过该行"
                );
                skipped_count += 1;
                warnings.push(MergeWarning::InvalidField {
                    row_number: row.row_number,
                    key,
                    field,
                    value,
                });
                continue;
            }
            candidate.status = self.status_engine.derive(&candidate);
            let status = candidate.status;
            updated.records[idx] = candidate;
            matched_count += 1;

            match change_index.get(&key) {
                Some(pos) => {
                    let change = &mut changes[*pos];
                    for (field, value) in &row.fields {
                        change.fields.insert(*field, value.clone());
                    }
                    change.status = status;
                }
                None => {
                    change_index.insert(key.clone(), changes.len());
                    changes.push(RecordChange {
                        key,
                        fields: row.fields.clone(),
                        status,
                        previous_status: canonical.records[idx].status,
                    });
                }
            }
        }

        info!(
            total = incoming.len(),
            matched = matched_count,
            unmatched = unmatched_keys.len(),
            skipped = skipped_count,
            changed_records = changes.len(),
            "批量对账完成"
        );

        MergeOutcome {
            updated,
            matched_count,
            unmatched_keys,
            skipped_count,
            changes,
            warnings,
        }
    }
}

/// 逐字段应用补丁，返回首个非法字段及其原值
fn apply_row(record: &mut TagRecord, patch: &FieldPatch) -> Result<(), (TagField, String)> {
    for (field, value) in patch {
        if record.set_field(*field, value.clone()).is_err() {
            return Err((*field, value.clone().unwrap_or_default()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{FieldPatch, TagRecord};
    use crate::domain::types::{DateField, Discipline, TagField, TagStatus};

    fn canonical() -> RecordSet {
        let mut e102 = TagRecord::new("E-102", Discipline::Electrical);
        e102.note = Some("painel".to_string());
        RecordSet::new(vec![TagRecord::new("E-101", Discipline::Electrical), e102])
    }

    fn row(row_number: usize, key: Option<&str>, fields: &[(TagField, &str)]) -> IncomingRow {
        let patch: FieldPatch = fields
            .iter()
            .map(|(f, v)| (*f, Some(v.to_string())))
            .collect();
        IncomingRow::new(row_number, key.map(str::to_string), patch)
    }

    const START: TagField = TagField::Date(DateField::ScheduledStart);
    const DONE: TagField = TagField::Date(DateField::ActualCompletion);

    #[test]
    fn test_matched_row_updates_status() {
        let engine = ReconciliationEngine::default();
        let outcome = engine.merge(&[row(1, Some("E-101"), &[(START, "01/10/2025")])], &canonical());

        assert_eq!(outcome.matched_count, 1);
        let record = outcome.updated.find_unique("E-101").unwrap().unwrap();
        assert_eq!(record.scheduled_start.as_deref(), Some("01/10/2025"));
        assert_eq!(record.status, TagStatus::Scheduled);

        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].previous_status, TagStatus::AwaitingSchedule);
        assert_eq!(outcome.changes[0].status, TagStatus::Scheduled);
    }

    #[test]
    fn test_unmatched_and_skipped_rows() {
        let engine = ReconciliationEngine::default();
        let batch = vec![
            row(1, Some("E-999"), &[(START, "01/10/2025")]),
            row(2, None, &[(START, "01/10/2025")]),
            row(3, Some("  -  "), &[(START, "01/10/2025")]),
        ];
        let outcome = engine.merge(&batch, &canonical());

        assert_eq!(outcome.matched_count, 0);
        assert_eq!(outcome.unmatched_keys, vec!["E-999".to_string()]);
        assert_eq!(outcome.skipped_count, 2);
        assert_eq!(outcome.skipped_rows(), vec![2, 3]);
        assert_eq!(outcome.updated, canonical());
        assert_eq!(outcome.total_rows(), batch.len());
    }

    #[test]
    fn test_duplicate_rows_last_wins() {
        let engine = ReconciliationEngine::default();
        let batch = vec![
            row(1, Some("E-101"), &[(START, "01/10/2025"), (TagField::Note, "a")]),
            row(2, Some("E-101"), &[(START, "08/10/2025")]),
        ];
        let outcome = engine.merge(&batch, &canonical());

        let record = outcome.updated.find_unique("E-101").unwrap().unwrap();
        assert_eq!(record.scheduled_start.as_deref(), Some("08/10/2025"));
        // 后一行未携带的字段保留前一行的值
        assert_eq!(record.note.as_deref(), Some("a"));
        assert_eq!(outcome.matched_count, 2);

        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(
            outcome.changes[0].fields.get(&START),
            Some(&Some("08/10/2025".to_string()))
        );
    }

    #[test]
    fn test_key_is_trimmed_but_case_sensitive() {
        let engine = ReconciliationEngine::default();
        let outcome = engine.merge(
            &[
                row(1, Some(" E-101 "), &[(DONE, "05/10/2025")]),
                row(2, Some("e-102"), &[(DONE, "05/10/2025")]),
            ],
            &canonical(),
        );

        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.unmatched_keys, vec!["e-102".to_string()]);
        let record = outcome.updated.find_unique("E-101").unwrap().unwrap();
        assert_eq!(record.status, TagStatus::Completed);
    }

    #[test]
    fn test_duplicate_canonical_key_only_skips_its_rows() {
        let engine = ReconciliationEngine::default();
        let mut set = canonical();
        set.records.push(TagRecord::new("E-101", Discipline::Electrical));

        let batch = vec![
            row(1, Some("E-101"), &[(START, "01/10/2025")]),
            row(2, Some("E-102"), &[(START, "01/10/2025")]),
        ];
        let outcome = engine.merge(&batch, &set);

        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.skipped_count, 1);
        assert_eq!(outcome.total_rows(), batch.len());
        assert_eq!(
            outcome.warnings,
            vec![MergeWarning::DuplicateKey {
                row_number: 1,
                key: "E-101".to_string(),
                occurrences: 2
            }]
        );
        // 重复 key 的记录一条都不改
        assert!(outcome
            .updated
            .iter()
            .filter(|r| r.key == "E-101")
            .all(|r| r.scheduled_start.is_none()));
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].key, "E-102");
    }

    #[test]
    fn test_invalid_week_number_skips_only_that_row() {
        let engine = ReconciliationEngine::default();
        let batch = vec![
            row(1, Some("E-101"), &[(START, "01/10/2025")]),
            row(
                2,
                Some("E-102"),
                &[(TagField::Note, "novo"), (TagField::WeekNumber, "semana 3")],
            ),
        ];
        let outcome = engine.merge(&batch, &canonical());

        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.skipped_count, 1);
        assert_eq!(outcome.total_rows(), batch.len());
        assert_eq!(outcome.skipped_rows(), vec![2]);
        assert_eq!(
            outcome.warnings,
            vec![MergeWarning::InvalidField {
                row_number: 2,
                key: "E-102".to_string(),
                field: TagField::WeekNumber,
                value: "semana 3".to_string()
            }]
        );

        let e101 = outcome.updated.find_unique("E-101").unwrap().unwrap();
        assert_eq!(e101.status, TagStatus::Scheduled);
        // 非法行整行不写入，合法字段也不例外
        let e102 = outcome.updated.find_unique("E-102").unwrap().unwrap();
        assert_eq!(e102, &canonical().records[1]);
        assert!(outcome.changes.iter().all(|c| c.key != "E-102"));
    }
}
