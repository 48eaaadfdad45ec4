use crate::custodian::locate::ContentGroup;
use std::collections::BTreeSet;

/// Partition of discovered groups against the authoritative active-id set.
/// `valid` and `orphaned` are disjoint and keyed by id; together they cover
/// every group that carries an id.
#[derive(Debug, Default)]
pub struct ReconciliationResult {
    pub valid: Vec<ContentGroup>,
    pub orphaned: Vec<ContentGroup>,
}

impl ReconciliationResult {
    pub fn scanned(&self) -> usize {
        self.valid.len() + self.orphaned.len()
    }
}

/// Pure partition: membership in `active_ids` is the sole validity
/// criterion. Duplicate ids on disk resolve first-seen-wins; callers sort
/// the input for reproducibility. Groups without an id are ignored.
pub fn reconcile(groups: Vec<ContentGroup>, active_ids: &BTreeSet<String>) -> ReconciliationResult {
    let mut result = ReconciliationResult::default();
    let mut seen = BTreeSet::new();

    for group in groups {
        let Some(id) = group.id.as_deref() else {
            continue;
        };
        if !seen.insert(id.to_string()) {
            continue;
        }

        if active_ids.contains(id) {
            result.valid.push(group);
        } else {
            result.orphaned.push(group);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::reconcile;
    use crate::custodian::locate::{AssetPaths, ContentGroup};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn group(id: Option<&str>, path: &str) -> ContentGroup {
        ContentGroup {
            id: id.map(str::to_string),
            definition_path: PathBuf::from(path),
            assets: AssetPaths::default(),
            total_bytes: 0,
        }
    }

    fn ids(groups: &[ContentGroup]) -> Vec<&str> {
        groups
            .iter()
            .filter_map(|g| g.id.as_deref())
            .collect::<Vec<_>>()
    }

    #[test]
    fn membership_in_active_ids_is_the_sole_criterion() {
        let active: BTreeSet<String> = ["a", "c"].into_iter().map(str::to_string).collect();
        let groups = vec![
            group(Some("a"), "blueprints/a.xml"),
            group(Some("b"), "blueprints/b.xml"),
            group(Some("c"), "blueprints/c.xml"),
        ];

        let result = reconcile(groups, &active);
        assert_eq!(ids(&result.valid), vec!["a", "c"]);
        assert_eq!(ids(&result.orphaned), vec!["b"]);
    }

    #[test]
    fn valid_and_orphaned_cover_all_identified_groups_disjointly() {
        let active: BTreeSet<String> = ["x"].into_iter().map(str::to_string).collect();
        let groups = vec![
            group(Some("x"), "blueprints/x.xml"),
            group(Some("y"), "blueprints/y.xml"),
            group(None, "blueprints/anonymous.xml"),
        ];

        let result = reconcile(groups, &active);
        assert_eq!(result.scanned(), 2);
        let valid_ids: BTreeSet<_> = ids(&result.valid).into_iter().collect();
        let orphaned_ids: BTreeSet<_> = ids(&result.orphaned).into_iter().collect();
        assert!(valid_ids.is_disjoint(&orphaned_ids));
    }

    #[test]
    fn duplicate_ids_resolve_first_seen_wins() {
        let active = BTreeSet::new();
        let groups = vec![
            group(Some("dup"), "blueprints/first.xml"),
            group(Some("dup"), "blueprints/second.xml"),
        ];

        let result = reconcile(groups, &active);
        assert_eq!(result.orphaned.len(), 1);
        assert_eq!(
            result.orphaned[0].definition_path,
            PathBuf::from("blueprints/first.xml")
        );
    }

    #[test]
    fn empty_active_set_orphans_everything_identified() {
        let active = BTreeSet::new();
        let groups = vec![
            group(Some("a"), "blueprints/a.xml"),
            group(Some("b"), "blueprints/b.xml"),
        ];

        let result = reconcile(groups, &active);
        assert!(result.valid.is_empty());
        assert_eq!(result.orphaned.len(), 2);
    }
}
