// Existence index: cached answers to "is this file on disk", invalidated by transfers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::stats::StatsCollector;
use crate::error::HelperError;
use crate::platform::traits::MediaPlatform;
use crate::storage::resolver::StoragePathResolver;

#[derive(Debug, Clone)]
pub struct ExistenceRecord {
    pub filename: String,
    pub exists: bool,
    pub checked_at: Instant,
}

#[derive(Default)]
struct IndexSlot {
    /// Bumped on every invalidation; a platform answer is only cached if the
    /// generation it started under is still current.
    generation: u64,
    /// Platform queries currently running for this key.
    queries: u32,
    record: Option<ExistenceRecord>,
}

impl IndexSlot {
    /// Nothing cached and nothing pending: the slot can be dropped.
    fn is_idle(&self) -> bool {
        self.record.is_none() && self.queries == 0
    }
}

pub struct ExistenceIndex {
    platform: Arc<dyn MediaPlatform>,
    resolver: Arc<StoragePathResolver>,
    stats: Arc<StatsCollector>,
    slots: Mutex<HashMap<String, IndexSlot>>,
    ttl: Duration,
}

impl ExistenceIndex {
    pub fn new(
        platform: Arc<dyn MediaPlatform>,
        resolver: Arc<StoragePathResolver>,
        stats: Arc<StatsCollector>,
        ttl: Duration,
    ) -> Self {
        Self {
            platform,
            resolver,
            stats,
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Answer from a fresh cached record, or query the platform and cache the result.
    ///
    /// A failed query leaves the cache untouched.
    pub async fn check_exists(&self, filename: &str) -> Result<bool, HelperError> {
        let path = self.resolver.resolve(filename)?;

        let generation = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(filename.to_string()).or_default();
            if let Some(record) = &slot.record {
                if record.checked_at.elapsed() < self.ttl {
                    self.stats.record_lookup(true);
                    return Ok(record.exists);
                }
                slot.record = None;
            }
            slot.queries += 1;
            slot.generation
        };
        self.stats.record_lookup(false);

        let answer = self.platform.file_exists(&path).await;

        let mut slots = self.slots.lock();
        let slot = slots.entry(filename.to_string()).or_default();
        slot.queries = slot.queries.saturating_sub(1);
        let result = match answer {
            Ok(exists) if slot.generation == generation => {
                slot.record = Some(ExistenceRecord {
                    filename: filename.to_string(),
                    exists,
                    checked_at: Instant::now(),
                });
                Ok(exists)
            }
            Ok(exists) => {
                debug!("discarding existence answer for {}: invalidated mid-query", filename);
                Ok(exists)
            }
            Err(source) => {
                warn!("existence query failed file={} err={}", filename, source);
                Err(HelperError::ExistenceCheck {
                    filename: filename.to_string(),
                    source,
                })
            }
        };
        if slot.is_idle() {
            slots.remove(filename);
        }
        result
    }

    /// Drop any cached record so the next check goes to the platform.
    pub fn invalidate(&self, filename: &str) {
        let mut slots = self.slots.lock();
        let Some(slot) = slots.get_mut(filename) else {
            return;
        };
        if slot.record.take().is_some() {
            debug!("invalidated existence record for {}", filename);
        }
        if slot.queries == 0 {
            slots.remove(filename);
        } else {
            // A query in flight must not cache what it saw before this point.
            slot.generation = slot.generation.wrapping_add(1);
        }
    }

    /// Number of filenames with a cached record or a query in progress.
    pub fn tracked(&self) -> usize {
        self.slots.lock().len()
    }

    /// The cached record for `filename`, fresh or not.
    pub fn cached(&self, filename: &str) -> Option<ExistenceRecord> {
        self.slots
            .lock()
            .get(filename)
            .and_then(|slot| slot.record.clone())
    }
}
