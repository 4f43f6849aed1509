//! Entry name ordering
//!
//! Names compare case-insensitively; names that differ only in case fall
//! back to their raw bytes so the order stays total.

use std::cmp::Ordering;

use super::PackedFile;

/// Collator used for index order and name lookup
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()));
    folded.then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Stable sort of entries by name
pub fn sort_packed_files(files: &mut [PackedFile]) {
    files.sort_by(|a, b| compare_names(&a.name, &b.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_order() {
        assert_eq!(compare_names("db\\B", "db\\a"), Ordering::Greater);
        assert_eq!(compare_names("DB\\a", "db\\b"), Ordering::Less);
        assert_eq!(compare_names("x", "x"), Ordering::Equal);
    }

    #[test]
    fn test_case_only_difference_is_total() {
        assert_ne!(compare_names("Text\\a.loc", "text\\a.loc"), Ordering::Equal);
        assert_eq!(
            compare_names("Text\\a.loc", "text\\a.loc"),
            compare_names("text\\a.loc", "Text\\a.loc").reverse()
        );
    }

    #[test]
    fn test_sort_is_stable_across_runs() {
        let names = ["text\\z.loc", "db\\b_tables\\x", "DB\\a_tables\\y", "movies\\m"];
        let mut first: Vec<PackedFile> = names
            .iter()
            .map(|n| PackedFile::from_bytes(*n, Vec::new()))
            .collect();
        let mut second = first.clone();
        second.reverse();

        sort_packed_files(&mut first);
        sort_packed_files(&mut second);

        let order: Vec<_> = first.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            order,
            vec!["DB\\a_tables\\y", "db\\b_tables\\x", "movies\\m", "text\\z.loc"]
        );
        assert_eq!(
            order,
            second.iter().map(|f| f.name.as_str()).collect::<Vec<_>>()
        );
    }
}
