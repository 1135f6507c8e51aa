//! Extension operations composed from backend primitives.

use crate::backend::StoreBackend;
use async_trait::async_trait;
use recache_core::RecacheResult;
use tracing::debug;

/// Page-size hint for pattern scans.
const SCAN_COUNT: usize = 100;

/// Extension trait composing scans and bulk deletion from primitives.
#[async_trait]
pub trait StoreExt: StoreBackend {
    /// Collect every key matching `pattern` by driving the paginated scan
    /// to completion.
    async fn scan_keys(&self, pattern: &str) -> RecacheResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut cursor = 0u64;
        loop {
            let page = self.scan_page(pattern, cursor, SCAN_COUNT).await?;
            keys.extend(page.keys);
            cursor = page.cursor;
            if cursor == 0 {
                break;
            }
        }
        Ok(keys)
    }

    /// Delete every key matching `pattern`, one scan page at a time.
    ///
    /// Returns the number of keys deleted. Not atomic with respect to
    /// concurrent writers: keys written after a page was scanned may
    /// survive until the next invalidation.
    async fn delete_matching(&self, pattern: &str) -> RecacheResult<u64> {
        let mut deleted = 0u64;
        let mut cursor = 0u64;
        loop {
            let page = self.scan_page(pattern, cursor, SCAN_COUNT).await?;
            if !page.keys.is_empty() {
                deleted += self.delete_many(&page.keys).await?;
            }
            cursor = page.cursor;
            if cursor == 0 {
                break;
            }
        }
        debug!("Deleted {} keys matching pattern '{}'", deleted, pattern);
        Ok(deleted)
    }
}

// Blanket implementation for all StoreBackend implementations
impl<T: StoreBackend + ?Sized> StoreExt for T {}
