//! Stats recorder - per-plugin invocation counters

use std::sync::Arc;

use crate::domain::entities::StatEntry;
use crate::domain::traits::Store;

pub struct StatsRecorder {
    store: Arc<dyn Store>,
}

impl StatsRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn record(&self, plugin: &str, succeeded: bool, timestamp_ms: u64) {
        self.store.update_stat(plugin, &mut |stat| {
            stat.total += 1;
            stat.last = timestamp_ms;
            if succeeded {
                stat.success += 1;
                stat.last_success = timestamp_ms;
            }
        });
        tracing::debug!(plugin, succeeded, "stat recorded");
    }

    pub fn get(&self, plugin: &str) -> Option<StatEntry> {
        self.store.stat(plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryStore;

    #[test]
    fn test_first_record_creates_entry() {
        let recorder = StatsRecorder::new(Arc::new(MemoryStore::new()));
        recorder.record("ping", true, 1_000);
        assert_eq!(
            recorder.get("ping"),
            Some(StatEntry {
                total: 1,
                success: 1,
                last: 1_000,
                last_success: 1_000,
            })
        );
    }

    #[test]
    fn test_failure_only_touches_total_and_last() {
        let recorder = StatsRecorder::new(Arc::new(MemoryStore::new()));
        recorder.record("ping", true, 1_000);
        recorder.record("ping", false, 2_000);
        let stat = recorder.get("ping").unwrap();
        assert_eq!(stat.total, 2);
        assert_eq!(stat.success, 1);
        assert_eq!(stat.last, 2_000);
        assert_eq!(stat.last_success, 1_000);
        assert!(stat.success <= stat.total);
    }

    #[test]
    fn test_first_failure() {
        let recorder = StatsRecorder::new(Arc::new(MemoryStore::new()));
        recorder.record("broken", false, 5);
        let stat = recorder.get("broken").unwrap();
        assert_eq!((stat.total, stat.success, stat.last_success), (1, 0, 0));
    }
}
