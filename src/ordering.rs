use crate::enumerate::DirectoryEntry;

/// Reordering applied to every enumerated level before tasks are spawned.
///
/// Size sort runs first (descending, stable, so ties keep enumeration
/// order), then the whole sequence is reversed if asked. With both flags
/// the result is `reverse(sort_by_size_desc(entries))`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderingPolicy {
    pub reverse: bool,
    pub sort_by_size: bool,
}

impl OrderingPolicy {
    pub fn new(reverse: bool, sort_by_size: bool) -> Self {
        Self {
            reverse,
            sort_by_size,
        }
    }

    pub fn apply(&self, entries: Vec<DirectoryEntry>) -> Vec<DirectoryEntry> {
        let mut entries = entries;
        if self.sort_by_size {
            entries = entries.into_iter().map(DirectoryEntry::probed).collect();
            // sort_by is stable
            entries.sort_by(|a, b| b.size().unwrap_or(0).cmp(&a.size().unwrap_or(0)));
        }
        if self.reverse {
            entries.reverse();
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(name: &str, size: u64) -> DirectoryEntry {
        DirectoryEntry::new("/virtual", name, false).with_size(size)
    }

    fn names(entries: &[DirectoryEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_policy_keeps_enumeration_order() {
        let entries = vec![sized("z", 1), sized("a", 2), sized("m", 3)];
        let out = OrderingPolicy::default().apply(entries);
        assert_eq!(names(&out), ["z", "a", "m"]);
    }

    #[test]
    fn test_reverse_flips_enumeration_order() {
        let entries = vec![sized("z", 1), sized("a", 2), sized("m", 3)];
        let out = OrderingPolicy::new(true, false).apply(entries);
        assert_eq!(names(&out), ["m", "a", "z"]);
    }

    #[test]
    fn test_size_sort_is_descending_and_stable() {
        let entries = vec![
            sized("small", 5),
            sized("tie-first", 10),
            sized("big", 30),
            sized("tie-second", 10),
            sized("tie-third", 10),
        ];
        let out = OrderingPolicy::new(false, true).apply(entries);

        assert_eq!(
            names(&out),
            ["big", "tie-first", "tie-second", "tie-third", "small"]
        );
        assert!(out.windows(2).all(|w| w[0].size() >= w[1].size()));
    }

    #[test]
    fn test_ties_never_fall_back_to_name_order() {
        let entries = vec![sized("b", 1), sized("a", 1), sized("c", 1)];
        let out = OrderingPolicy::new(false, true).apply(entries);
        assert_eq!(names(&out), ["b", "a", "c"]);
    }

    #[test]
    fn test_reverse_and_size_sort_compose_left_to_right() {
        let entries = vec![
            sized("a", 10),
            sized("b", 30),
            sized("c", 10),
            sized("d", 20),
        ];

        let mut expected = OrderingPolicy::new(false, true).apply(entries.clone());
        expected.reverse();

        let out = OrderingPolicy::new(true, true).apply(entries);
        assert_eq!(out, expected);
        assert_eq!(names(&out), ["c", "a", "d", "b"]);
    }

    #[test]
    fn test_unsized_entries_are_probed_and_missing_ones_sort_as_zero() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("real"), vec![0u8; 12]).unwrap();

        let entries = vec![
            DirectoryEntry::new(tmp.path(), "ghost", false),
            DirectoryEntry::new(tmp.path(), "real", false),
        ];
        let out = OrderingPolicy::new(false, true).apply(entries);

        assert_eq!(names(&out), ["real", "ghost"]);
        assert_eq!(out[0].size(), Some(12));
        assert_eq!(out[1].size(), Some(0));
    }
}
