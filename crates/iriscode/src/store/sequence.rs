//! Output identity allocation.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::StoreError;

/// Numbered output identity, rendered `<prefix>-NNN` (zero padded to at
/// least three digits).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputId {
    prefix: String,
    number: u32,
}

impl OutputId {
    pub fn new(prefix: impl Into<String>, number: u32) -> Self {
        Self {
            prefix: prefix.into(),
            number,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse `<prefix>-<digits>` from a file stem.
    pub fn parse_stem(stem: &str, prefix: &str) -> Option<Self> {
        let digits = stem.strip_prefix(prefix)?.strip_prefix('-')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self::new(prefix, digits.parse().ok()?))
    }
}

impl std::fmt::Display for OutputId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:03}", self.prefix, self.number)
    }
}

/// Hands out strictly increasing output identities.
///
/// Seeded once from the outputs already on disk; afterwards `reserve` is a
/// single atomic increment, so concurrent runs sharing `&SequenceAllocator`
/// never receive the same identity.
#[derive(Debug)]
pub struct SequenceAllocator {
    prefix: String,
    next: AtomicU32,
}

impl SequenceAllocator {
    /// Start at `first` without scanning.
    pub fn starting_at(prefix: impl Into<String>, first: u32) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU32::new(first.max(1)),
        }
    }

    /// Scan `dir` for `<prefix>-<NNN>.<ext>` files with one of `extensions`
    /// and start after the largest number found (1 when none). Gaps are
    /// not reused. A missing directory counts as empty.
    pub fn scan(dir: &Path, prefix: &str, extensions: &[&str]) -> Result<Self, StoreError> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::starting_at(prefix, 1));
            }
            Err(e) => return Err(StoreError::io(dir, e)),
        };

        let mut max_seen = 0u32;
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(dir, e))?.path();
            let ext_ok = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
            if !ext_ok {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(id) = OutputId::parse_stem(stem, prefix) {
                max_seen = max_seen.max(id.number());
            }
        }
        let next = max_seen.saturating_add(1);
        tracing::debug!("sequence '{}' starts at {}", prefix, next);
        Ok(Self::starting_at(prefix, next))
    }

    /// Atomically take the next identity.
    pub fn reserve(&self) -> OutputId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        OutputId::new(self.prefix.clone(), n)
    }

    /// Identity the next `reserve` would return.
    pub fn peek(&self) -> OutputId {
        OutputId::new(self.prefix.clone(), self.next.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_render_zero_padded() {
        assert_eq!(OutputId::new("iris", 7).to_string(), "iris-007");
        assert_eq!(OutputId::new("iris", 1234).to_string(), "iris-1234");
    }

    #[test]
    fn parse_stem_requires_exact_shape() {
        assert_eq!(OutputId::parse_stem("iris-012", "iris").map(|i| i.number()), Some(12));
        assert!(OutputId::parse_stem("iris-", "iris").is_none());
        assert!(OutputId::parse_stem("iris-01a", "iris").is_none());
        assert!(OutputId::parse_stem("metadata_iris-001", "iris").is_none());
        assert!(OutputId::parse_stem("irisx-001", "iris").is_none());
    }

    #[test]
    fn scan_takes_max_plus_one_and_tolerates_gaps() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["iris-001.jpg", "iris-004.jpg", "iris-009.txt", "notes.jpg", "iris-x.jpg"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let alloc = SequenceAllocator::scan(dir.path(), "iris", &["jpg"]).unwrap();
        assert_eq!(alloc.reserve().to_string(), "iris-005");
        assert_eq!(alloc.reserve().to_string(), "iris-006");
    }

    #[test]
    fn empty_or_missing_dir_starts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let alloc = SequenceAllocator::scan(dir.path(), "iris", &["jpg"]).unwrap();
        assert_eq!(alloc.peek().number(), 1);
        let missing = SequenceAllocator::scan(&dir.path().join("nope"), "iris", &["jpg"]).unwrap();
        assert_eq!(missing.reserve().number(), 1);
    }

    #[test]
    fn concurrent_reservations_are_unique() {
        let alloc = SequenceAllocator::starting_at("iris", 1);
        let ids: Vec<u32> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| (0..50).map(|_| alloc.reserve().number()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });
        let unique: HashSet<u32> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 400);
        assert_eq!(ids.iter().max(), Some(&400));
    }
}
