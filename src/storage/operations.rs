/// Synchronous CRUD on the page store tables. Callers hold the connection lock.

use rusqlite::{params, Connection, OptionalExtension};

use super::schema::{META_SNAPSHOT_KEY, META_TOTAL_COUNT_KEY};
use crate::errors::StorageError;
use crate::types::{CryptoRecord, PageKey, Snapshot};

/// Upsert the records of one physical page and replace its membership rows.
///
/// The record timestamp never moves backwards, so the max timestamp is monotonic.
pub fn save_page(
    conn: &mut Connection,
    page: PageKey,
    records: &[CryptoRecord],
    total_count: Option<u64>,
    now_ms: i64,
) -> Result<(), StorageError> {
    let op = "put_page";
    let tx = conn
        .transaction()
        .map_err(|e| StorageError::from_sqlite(op, e))?;

    {
        let mut upsert = tx
            .prepare_cached(
                r#"
                INSERT INTO records (id, cmc_rank, name, symbol, data, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    cmc_rank = excluded.cmc_rank,
                    name = excluded.name,
                    symbol = excluded.symbol,
                    data = excluded.data,
                    timestamp = MAX(records.timestamp, excluded.timestamp)
                "#,
            )
            .map_err(|e| StorageError::from_sqlite(op, e))?;

        let mut member = tx
            .prepare_cached(
                "INSERT INTO page_entries (page_size, page_index, position, record_id) VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| StorageError::from_sqlite(op, e))?;

        tx.execute(
            "DELETE FROM page_entries WHERE page_size = ?1 AND page_index = ?2",
            params![page.size, page.index],
        )
        .map_err(|e| StorageError::from_sqlite(op, e))?;

        for (position, record) in records.iter().enumerate() {
            let canonical = record.clone().without_timestamp();
            let data = serde_json::to_string(&canonical).map_err(|e| {
                StorageError::Serialization {
                    what: "record",
                    reason: e.to_string(),
                }
            })?;

            upsert
                .execute(params![
                    record.id as i64,
                    record.cmc_rank,
                    record.name,
                    record.symbol,
                    data,
                    now_ms
                ])
                .map_err(|e| StorageError::from_sqlite(op, e))?;
            member
                .execute(params![page.size, page.index, position as i64, record.id as i64])
                .map_err(|e| StorageError::from_sqlite(op, e))?;
        }
    }

    if let Some(total) = total_count {
        write_meta(&tx, META_TOTAL_COUNT_KEY, &total.to_string(), now_ms)?;
    }

    tx.commit().map_err(|e| StorageError::from_sqlite(op, e))
}

/// Records of one physical page in stored order, each stamped with its cache time
pub fn load_page(conn: &Connection, page: PageKey) -> Result<Vec<CryptoRecord>, StorageError> {
    let op = "get_page";
    let mut stmt = conn
        .prepare_cached(
            r#"
            SELECT r.data, r.timestamp
            FROM page_entries p
            JOIN records r ON r.id = p.record_id
            WHERE p.page_size = ?1 AND p.page_index = ?2
            ORDER BY p.position
            "#,
        )
        .map_err(|e| StorageError::from_sqlite(op, e))?;

    let rows = stmt
        .query_map(params![page.size, page.index], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| StorageError::from_sqlite(op, e))?;

    let mut records = Vec::new();
    for row in rows {
        let (data, timestamp) = row.map_err(|e| StorageError::from_sqlite(op, e))?;
        let mut record: CryptoRecord =
            serde_json::from_str(&data).map_err(|e| StorageError::Serialization {
                what: "record",
                reason: e.to_string(),
            })?;
        record.timestamp = Some(timestamp);
        records.push(record);
    }
    Ok(records)
}

pub fn save_snapshot(
    conn: &Connection,
    items: &[CryptoRecord],
    now_ms: i64,
) -> Result<(), StorageError> {
    let canonical: Vec<CryptoRecord> = items
        .iter()
        .cloned()
        .map(CryptoRecord::without_timestamp)
        .collect();
    let value = serde_json::to_string(&canonical).map_err(|e| StorageError::Serialization {
        what: "snapshot",
        reason: e.to_string(),
    })?;
    write_meta(conn, META_SNAPSHOT_KEY, &value, now_ms)
}

pub fn load_snapshot(conn: &Connection) -> Result<Option<Snapshot>, StorageError> {
    let Some((value, timestamp)) = read_meta(conn, META_SNAPSHOT_KEY, "get_snapshot")? else {
        return Ok(None);
    };
    let items: Vec<CryptoRecord> =
        serde_json::from_str(&value).map_err(|e| StorageError::Serialization {
            what: "snapshot",
            reason: e.to_string(),
        })?;
    Ok(Some(Snapshot { items, timestamp }))
}

pub fn load_total_count(conn: &Connection) -> Result<Option<u64>, StorageError> {
    let Some((value, _)) = read_meta(conn, META_TOTAL_COUNT_KEY, "get_total_count")? else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| StorageError::Serialization {
            what: "total count",
            reason: e.to_string(),
        })
}

/// Max write timestamp across stored records (epoch ms)
pub fn max_timestamp(conn: &Connection) -> Result<Option<i64>, StorageError> {
    conn.query_row("SELECT MAX(timestamp) FROM records", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .map_err(|e| StorageError::from_sqlite("get_last_updated", e))
}

pub fn record_count(conn: &Connection) -> Result<u64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get::<_, i64>(0))
        .map(|n| n.max(0) as u64)
        .map_err(|e| StorageError::from_sqlite("count", e))
}

/// Drop page rows under any other page size, then records no page references
pub fn evict_other_page_sizes(
    conn: &mut Connection,
    keep_page_size: u32,
) -> Result<usize, StorageError> {
    let op = "evict_pages_except";
    let tx = conn
        .transaction()
        .map_err(|e| StorageError::from_sqlite(op, e))?;

    let removed = tx
        .execute(
            "DELETE FROM page_entries WHERE page_size != ?1",
            params![keep_page_size],
        )
        .map_err(|e| StorageError::from_sqlite(op, e))?;
    tx.execute(
        "DELETE FROM records WHERE id NOT IN (SELECT record_id FROM page_entries)",
        [],
    )
    .map_err(|e| StorageError::from_sqlite(op, e))?;

    tx.commit().map_err(|e| StorageError::from_sqlite(op, e))?;
    Ok(removed)
}

fn write_meta(conn: &Connection, key: &str, value: &str, now_ms: i64) -> Result<(), StorageError> {
    conn.execute(
        r#"
        INSERT INTO meta (key, value, timestamp) VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, timestamp = excluded.timestamp
        "#,
        params![key, value, now_ms],
    )
    .map(|_| ())
    .map_err(|e| StorageError::from_sqlite("write meta", e))
}

fn read_meta(
    conn: &Connection,
    key: &str,
    op: &'static str,
) -> Result<Option<(String, i64)>, StorageError> {
    conn.query_row(
        "SELECT value, timestamp FROM meta WHERE key = ?1",
        params![key],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
    )
    .optional()
    .map_err(|e| StorageError::from_sqlite(op, e))
}
