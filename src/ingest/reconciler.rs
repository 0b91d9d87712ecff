//! Rollover reconciler
//!
//! Deduplicates a freshly normalized batch and rotates the weekly sets.
//! The domain models discrete weekly upload cycles: each upload is "this
//! week's defect list" and everything previously tracked becomes historical
//! context, so a successful import replaces both sets wholesale instead of
//! merging into them.

use crate::model::{DefectRecord, OptionField};
use std::collections::HashSet;

/// Result of deduplicating one incoming batch.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Records that survived both dedup passes, in first-seen order
    pub accepted: Vec<DefectRecord>,
    /// Records dropped because their id already exists in a weekly set
    pub skipped_existing: usize,
    /// Later occurrences of an id repeated within the batch
    pub duplicate_in_file: usize,
}

impl ReconcileOutcome {
    /// Whether the import should perform a rollover at all.
    pub fn has_new_records(&self) -> bool {
        !self.accepted.is_empty()
    }
}

/// Deduplicate an incoming batch against itself and the active universe.
///
/// Within the batch the first occurrence of an incident id wins; across
/// batches the already-tracked record wins and the import never updates it.
pub fn reconcile(batch: Vec<DefectRecord>, existing_ids: &HashSet<String>) -> ReconcileOutcome {
    let mut seen_in_file = HashSet::new();
    let mut accepted = Vec::new();
    let mut skipped_existing = 0;
    let mut duplicate_in_file = 0;

    for record in batch {
        if !seen_in_file.insert(record.incident_id.clone()) {
            duplicate_in_file += 1;
            continue;
        }
        if existing_ids.contains(&record.incident_id) {
            skipped_existing += 1;
            continue;
        }
        accepted.push(record);
    }

    ReconcileOutcome {
        accepted,
        skipped_existing,
        duplicate_in_file,
    }
}

/// The two weekly sets after a rollover.
#[derive(Debug, Clone)]
pub struct Rollover {
    pub current: Vec<DefectRecord>,
    pub last: Vec<DefectRecord>,
}

/// Demote the entire prior universe and install the accepted batch.
///
/// The former current week is placed ahead of the former last week in the
/// demoted set, so "last week" always reads newest-first across exactly one
/// rollover's worth of history.
pub fn roll_over(
    accepted: Vec<DefectRecord>,
    current: Vec<DefectRecord>,
    last: Vec<DefectRecord>,
) -> Rollover {
    let mut demoted = current;
    demoted.extend(last);

    Rollover {
        current: accepted,
        last: demoted,
    }
}

/// Append new distinct values from a batch to an option list.
///
/// Insertion order is preserved: existing entries keep their positions and
/// fresh values are appended in the order they first appear in the batch.
/// Empty values never enter a list.
pub fn extend_options(
    existing: &[String],
    records: &[DefectRecord],
    field: OptionField,
) -> Vec<String> {
    let mut extended = existing.to_vec();

    for record in records {
        let value = field.value_of(record);
        if !value.is_empty() && !extended.iter().any(|v| v == value) {
            extended.push(value.to_string());
        }
    }

    extended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DefectRecord, NewDefect};

    fn record(id: &str, description: &str) -> DefectRecord {
        DefectRecord::new(NewDefect {
            incident_id: id.to_string(),
            description: description.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn ids(records: &[DefectRecord]) -> Vec<&str> {
        records.iter().map(|r| r.incident_id.as_str()).collect()
    }

    #[test]
    fn test_first_occurrence_wins_within_batch() {
        let batch = vec![
            record("B-1", "first copy"),
            record("B-2", "other"),
            record("B-1", "second copy"),
        ];

        let outcome = reconcile(batch, &HashSet::new());
        assert_eq!(ids(&outcome.accepted), vec!["B-1", "B-2"]);
        assert_eq!(outcome.accepted[0].description, "first copy");
        assert_eq!(outcome.duplicate_in_file, 1);
        assert_eq!(outcome.skipped_existing, 0);
    }

    #[test]
    fn test_already_tracked_ids_are_skipped() {
        let existing: HashSet<String> = ["B-1".to_string(), "B-3".to_string()].into();
        let batch = vec![record("B-1", "dup"), record("B-2", "new")];

        let outcome = reconcile(batch, &existing);
        assert_eq!(ids(&outcome.accepted), vec!["B-2"]);
        assert_eq!(outcome.skipped_existing, 1);
    }

    #[test]
    fn test_all_duplicates_means_no_new_records() {
        let existing: HashSet<String> = ["B-1".to_string()].into();
        let batch = vec![record("B-1", "dup"), record("B-1", "dup again")];

        let outcome = reconcile(batch, &existing);
        assert!(!outcome.has_new_records());
        assert_eq!(outcome.skipped_existing, 1);
        assert_eq!(outcome.duplicate_in_file, 1);
    }

    #[test]
    fn test_rollover_demotes_whole_universe() {
        let rollover = roll_over(
            vec![record("D", "d"), record("E", "e")],
            vec![record("A", "a"), record("B", "b")],
            vec![record("C", "c")],
        );

        assert_eq!(ids(&rollover.current), vec!["D", "E"]);
        assert_eq!(ids(&rollover.last), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_option_extension_preserves_order() {
        let existing = vec!["GIC".to_string(), "Facets".to_string()];
        let mut a = record("B-1", "a");
        a.application = "ETL".to_string();
        let mut b = record("B-2", "b");
        b.application = "GIC".to_string();
        let mut c = record("B-3", "c");
        c.application = "EDM".to_string();

        let extended = extend_options(&existing, &[a, b, c], OptionField::Application);
        assert_eq!(extended, vec!["GIC", "Facets", "ETL", "EDM"]);
    }

    #[test]
    fn test_option_extension_ignores_empty_values() {
        let records = vec![record("B-1", "a")];
        let extended = extend_options(&[], &records, OptionField::Environment);
        assert!(extended.is_empty());
    }
}
