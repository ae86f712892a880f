/// Local, case-insensitive search over loaded records.

use crate::types::CryptoRecord;

/// A term is active once it has non-whitespace content
pub fn is_active(term: &str) -> bool {
    !term.trim().is_empty()
}

fn needle(term: &str) -> String {
    term.trim().to_lowercase()
}

pub fn matches(record: &CryptoRecord, needle: &str) -> bool {
    record.name.to_lowercase().contains(needle) || record.symbol.to_lowercase().contains(needle)
}

/// Records whose name or symbol contains `term`, in input order, at most `limit`
pub fn filter_records(records: &[CryptoRecord], term: &str, limit: usize) -> Vec<CryptoRecord> {
    let needle = needle(term);
    records
        .iter()
        .filter(|record| matches(record, &needle))
        .take(limit)
        .cloned()
        .collect()
}
