//! Plan computation: the two-snapshot diff at the heart of every cycle.

use std::collections::{HashMap, HashSet};

use crate::error::SyncError;
use crate::record::{SourceRecord, TargetRecord};

/// The minimal set of operations needed to converge the target on the source.
///
/// Keys present in both snapshots are left untouched; there is no update
/// path. The `to_create` and `to_delete` key sets are disjoint from each
/// other and from the matched set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Source records with no mirror in the target.
    pub to_create: Vec<SourceRecord>,
    /// Target records whose source entity no longer exists.
    pub to_delete: Vec<TargetRecord>,
}

impl ReconciliationPlan {
    /// Returns `true` when the two systems are already converged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of units of work in this plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_delete.len()
    }
}

/// Computes the reconciliation plan from a source and a target snapshot.
///
/// Both snapshots are indexed by correlation key; a source record whose key
/// has no target entry becomes a creation, a target record whose key has no
/// source entry becomes a deletion, and a key present on both sides is
/// matched and dropped from the plan. Runs in O(n + m).
///
/// # Errors
///
/// Returns `SyncError::DuplicateKey` when the source snapshot contains the
/// same correlation key twice. Duplicate keys within the target snapshot are
/// tolerated: the last record wins the index slot and earlier ones are
/// treated as already matched.
pub fn diff(
    source: Vec<SourceRecord>,
    target: Vec<TargetRecord>,
) -> Result<ReconciliationPlan, SyncError> {
    // 1. Index the target snapshot by correlation key
    let mut target_index: HashMap<_, _> = target
        .into_iter()
        .map(|record| (record.key.clone(), record))
        .collect();

    // 2. Match source records against the index; unmatched ones are created
    let mut seen = HashSet::with_capacity(source.len());
    let mut to_create = Vec::new();
    for record in source {
        if !seen.insert(record.key.clone()) {
            return Err(SyncError::duplicate_key(record.key.as_str()));
        }
        if target_index.remove(&record.key).is_none() {
            to_create.push(record);
        }
    }

    // 3. Whatever the source never claimed is deleted
    let to_delete: Vec<TargetRecord> = target_index.into_values().collect();

    tracing::debug!(
        creates = to_create.len(),
        deletes = to_delete.len(),
        "reconciliation plan computed"
    );

    Ok(ReconciliationPlan {
        to_create,
        to_delete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CorrelationKey;

    fn source(keys: &[&str]) -> Vec<SourceRecord> {
        keys.iter()
            .map(|k| SourceRecord::new(*k, format!("app-{k}")))
            .collect()
    }

    fn target(keys: &[&str]) -> Vec<TargetRecord> {
        keys.iter()
            .map(|k| TargetRecord::new(*k, format!("id-{k}")))
            .collect()
    }

    fn create_keys(plan: &ReconciliationPlan) -> Vec<String> {
        let mut keys: Vec<String> = plan
            .to_create
            .iter()
            .map(|r| r.key.as_str().to_string())
            .collect();
        keys.sort();
        keys
    }

    fn delete_keys(plan: &ReconciliationPlan) -> Vec<String> {
        let mut keys: Vec<String> = plan
            .to_delete
            .iter()
            .map(|r| r.key.as_str().to_string())
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_diff_disjoint_snapshots() {
        // Source {a, b}, target {c}: create a and b, delete c
        let plan = diff(source(&["a", "b"]), target(&["c"])).unwrap();

        assert_eq!(create_keys(&plan), vec!["a", "b"]);
        assert_eq!(delete_keys(&plan), vec!["c"]);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_diff_identical_snapshots_is_empty() {
        let plan = diff(source(&["a", "b"]), target(&["a", "b"])).unwrap();

        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }

    #[test]
    fn test_diff_partial_overlap() {
        // Source {a, b, c}, target {b, c, d}: create a, delete d
        let plan = diff(source(&["a", "b", "c"]), target(&["b", "c", "d"])).unwrap();

        assert_eq!(create_keys(&plan), vec!["a"]);
        assert_eq!(delete_keys(&plan), vec!["d"]);
    }

    #[test]
    fn test_diff_empty_source_deletes_everything() {
        let plan = diff(Vec::new(), target(&["x", "y"])).unwrap();

        assert!(plan.to_create.is_empty());
        assert_eq!(delete_keys(&plan), vec!["x", "y"]);
    }

    #[test]
    fn test_diff_empty_target_creates_everything() {
        let plan = diff(source(&["x", "y"]), Vec::new()).unwrap();

        assert_eq!(create_keys(&plan), vec!["x", "y"]);
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn test_diff_both_empty() {
        let plan = diff(Vec::new(), Vec::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_diff_duplicate_source_key_rejected() {
        let err = diff(source(&["a", "b", "a"]), Vec::new()).unwrap_err();

        assert!(matches!(err, SyncError::DuplicateKey { ref key } if key == "a"));
    }

    #[test]
    fn test_diff_duplicate_target_keys_last_wins() {
        let mut records = target(&["a"]);
        records.push(TargetRecord::new("a", "id-a-2"));

        let plan = diff(Vec::new(), records).unwrap();
        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].target_id.as_str(), "id-a-2");
    }

    #[test]
    fn test_diff_preserves_record_contents() {
        let records = vec![
            SourceRecord::new("a", "app-a")
                .with_description("first")
                .with_payload("body"),
        ];
        let plan = diff(records, Vec::new()).unwrap();

        assert_eq!(plan.to_create[0].display_name, "app-a");
        assert_eq!(plan.to_create[0].description.as_deref(), Some("first"));
        assert!(plan.to_create[0].has_payload());
    }

    #[test]
    fn test_diff_plan_key_sets_are_disjoint() {
        let plan = diff(source(&["a", "b", "c"]), target(&["c", "d", "e"])).unwrap();

        let creates: HashSet<CorrelationKey> =
            plan.to_create.iter().map(|r| r.key.clone()).collect();
        let deletes: HashSet<CorrelationKey> =
            plan.to_delete.iter().map(|r| r.key.clone()).collect();

        assert!(creates.is_disjoint(&deletes));
        assert!(!creates.contains(&CorrelationKey::new("c")));
        assert!(!deletes.contains(&CorrelationKey::new("c")));
    }
}
