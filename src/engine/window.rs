/// Physical page loading for a logical window.

use std::ops::RangeInclusive;

use super::Engine;
use crate::errors::{CoinListError, StorageError};
use crate::logger::{self, LogTag};
use crate::types::{CryptoRecord, PageKey};

/// Physical pages under `page_size` covering absolute indexes `[start, start + len)`
pub fn covering_pages(start: usize, len: usize, page_size: u32) -> RangeInclusive<u32> {
    let page_size = page_size.max(1) as usize;
    let first = start / page_size;
    let last = (start + len.max(1) - 1) / page_size;
    first as u32..=last as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Serve stored pages, fetch only the missing ones
    PreferStore,
    /// Always fetch from the remote source
    Remote,
}

/// Contiguous records of the covering pages
#[derive(Debug, Default)]
pub struct LoadedWindow {
    pub records: Vec<CryptoRecord>,
    /// Absolute index of `records[0]`
    pub loaded_start: usize,
    /// Total count reported by the last remote response
    pub total_count: Option<u64>,
    pub fetched_remote: bool,
    /// First failed store write; the records are still usable
    pub write_error: Option<StorageError>,
}

impl Engine {
    /// Load the pages covering `[start, start + len)`.
    ///
    /// Stops early at a short page (end of the collection). Remote and parse
    /// errors fail the whole load; store failures only degrade it.
    pub(crate) async fn load_window(
        &self,
        start: usize,
        len: usize,
        page_size: u32,
        mode: LoadMode,
    ) -> Result<LoadedWindow, CoinListError> {
        let pages = covering_pages(start, len, page_size);
        let mut window = LoadedWindow {
            loaded_start: *pages.start() as usize * page_size.max(1) as usize,
            ..Default::default()
        };

        for index in pages {
            let key = PageKey::new(index, page_size);

            let stored = match mode {
                LoadMode::PreferStore => self.read_stored_page(key).await,
                LoadMode::Remote => None,
            };

            let records = match stored {
                Some(records) => records,
                None => {
                    let (records, total) = self.fetch_remote_page(key).await?;
                    window.fetched_remote = true;
                    window.total_count = Some(total);
                    if let Err(e) = self.store.put_page(key, &records, Some(total)).await {
                        self.note_write_failure(&mut window.write_error, e);
                    }
                    records
                }
            };

            let short = records.len() < page_size as usize;
            window.records.extend(records);
            if short {
                break;
            }
        }

        Ok(window)
    }

    /// Stored page if present and non-empty; read failures fall through to remote
    pub(crate) async fn read_stored_page(&self, key: PageKey) -> Option<Vec<CryptoRecord>> {
        match self.store.get_page(key).await {
            Ok(records) if !records.is_empty() => {
                logger::verbose(LogTag::Engine, &format!("Serving {} from store", key));
                Some(records)
            }
            Ok(_) => None,
            Err(e) => {
                logger::warning(
                    LogTag::Engine,
                    &format!("Store read of {} failed, using remote: {}", key, e),
                );
                None
            }
        }
    }

    /// One remote page plus its parsed total count
    pub(crate) async fn fetch_remote_page(
        &self,
        key: PageKey,
    ) -> Result<(Vec<CryptoRecord>, u64), CoinListError> {
        let request = self.listing.request(key.remote_page(), key.size);
        let response = self.source.fetch_page(&request).await?;
        let total = response.total_count()?;
        let records = response.into_records();

        logger::debug(
            LogTag::Engine,
            &format!("Fetched {} ({} records, total {})", key, records.len(), total),
        );
        Ok((records, total))
    }

    /// Keep the first write failure; an unavailable store is expected and only logged
    pub(crate) fn note_write_failure(&self, slot: &mut Option<StorageError>, err: StorageError) {
        if matches!(err, StorageError::Unavailable { .. }) {
            logger::debug(LogTag::Engine, &format!("Store write skipped: {}", err));
            return;
        }
        logger::warning(LogTag::Engine, &format!("Store write failed: {}", err));
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covering_pages() {
        assert_eq!(covering_pages(0, 10, 200), 0..=0);
        assert_eq!(covering_pages(0, 60, 10), 0..=5);
        assert_eq!(covering_pages(195, 10, 200), 0..=1);
        assert_eq!(covering_pages(400, 10, 200), 2..=2);
        assert_eq!(covering_pages(15, 10, 10), 1..=2);
    }
}
