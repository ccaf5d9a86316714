//! The collision-safe renaming rule used by import: given a serialized id
//! that may already be live, find the smallest positive integer `k` such
//! that `"{base}_{k}"` is unused.

/// Returns `base` unchanged if `is_taken(base)` is false, otherwise the
/// first `"{base}_{k}"` (k = 1, 2, ...) for which `is_taken` is false.
pub fn dedupe_id(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    let mut k: u64 = 1;
    loop {
        let candidate = format!("{base}_{k}");
        if !is_taken(&candidate) {
            return candidate;
        }
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn returns_base_when_free() {
        let taken: HashSet<&str> = HashSet::new();
        assert_eq!(dedupe_id("t1", |id| taken.contains(id)), "t1");
    }

    #[test]
    fn appends_smallest_free_suffix() {
        let taken: HashSet<&str> = ["t1", "t1_1", "t1_2"].into_iter().collect();
        assert_eq!(dedupe_id("t1", |id| taken.contains(id)), "t1_3");
    }

    #[test]
    fn gap_in_suffixes_is_not_reused_out_of_order() {
        // t1_1 is free but t1 itself is taken: smallest k starting at 1 wins.
        let taken: HashSet<&str> = ["t1"].into_iter().collect();
        assert_eq!(dedupe_id("t1", |id| taken.contains(id)), "t1_1");
    }
}
