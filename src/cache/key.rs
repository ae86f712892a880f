/// Tagged read-cache keys: one variant per store read operation.

use crate::types::PageKey;

/// Operation family a key belongs to; invalidation works per family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Page,
    Snapshot,
    TotalCount,
    LastUpdated,
    RecordCount,
}

impl CacheKind {
    pub const COUNT: usize = 5;

    pub fn index(self) -> usize {
        match self {
            CacheKind::Page => 0,
            CacheKind::Snapshot => 1,
            CacheKind::TotalCount => 2,
            CacheKind::LastUpdated => 3,
            CacheKind::RecordCount => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CacheKind::Page => "get_page",
            CacheKind::Snapshot => "get_snapshot",
            CacheKind::TotalCount => "get_total_count",
            CacheKind::LastUpdated => "get_last_updated",
            CacheKind::RecordCount => "count",
        }
    }
}

/// Operation plus its structured arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Page(PageKey),
    Snapshot,
    TotalCount,
    LastUpdated,
    RecordCount,
}

impl CacheKey {
    pub fn kind(&self) -> CacheKind {
        match self {
            CacheKey::Page(_) => CacheKind::Page,
            CacheKey::Snapshot => CacheKind::Snapshot,
            CacheKey::TotalCount => CacheKind::TotalCount,
            CacheKey::LastUpdated => CacheKind::LastUpdated,
            CacheKey::RecordCount => CacheKind::RecordCount,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Page(page) => write!(f, "{}({}, {})", self.kind().as_str(), page.index, page.size),
            other => write!(f, "{}()", other.kind().as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_with_different_arguments_do_not_collide() {
        let a = CacheKey::Page(PageKey::new(1, 20));
        let b = CacheKey::Page(PageKey::new(12, 0));
        assert_ne!(a, b);
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.to_string(), "get_page(1, 20)");
        assert_eq!(CacheKey::Snapshot.to_string(), "get_snapshot()");
    }

    #[test]
    fn test_kind_indexes_are_distinct() {
        let kinds = [
            CacheKind::Page,
            CacheKind::Snapshot,
            CacheKind::TotalCount,
            CacheKind::LastUpdated,
            CacheKind::RecordCount,
        ];
        let mut seen = [false; CacheKind::COUNT];
        for kind in kinds {
            assert!(!seen[kind.index()]);
            seen[kind.index()] = true;
        }
    }
}
