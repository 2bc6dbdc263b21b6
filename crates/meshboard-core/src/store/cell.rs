// ── Per-target reactive cell ──
//
// One table plus its scalar count, each behind a `watch` channel so
// table observers and count observers subscribe independently and
// receive different payload shapes.

use std::sync::Arc;

use tokio::sync::watch;

use super::Record;

/// Shared snapshot of one target's table.
pub type Table = Arc<Vec<Record>>;

pub(crate) struct TableCell {
    table: watch::Sender<Table>,
    count: watch::Sender<u64>,
}

impl TableCell {
    pub(crate) fn new() -> Self {
        let (table, _) = watch::channel(Arc::new(Vec::new()));
        let (count, _) = watch::channel(0);
        Self { table, count }
    }

    /// Wholesale-replace the table and publish the new cardinality.
    /// Subscribers are notified even when the contents are unchanged —
    /// an ingest that touches a target always counts as a change.
    pub(crate) fn replace(&self, records: Vec<Record>) {
        let count = u64::try_from(records.len()).unwrap_or(u64::MAX);
        self.table.send_replace(Arc::new(records));
        self.count.send_replace(count);
    }

    /// Publish a derived count (composite cells only; their table stays empty).
    pub(crate) fn publish_count(&self, count: u64) {
        self.count.send_replace(count);
    }

    pub(crate) fn table(&self) -> Table {
        self.table.borrow().clone()
    }

    pub(crate) fn count(&self) -> u64 {
        *self.count.borrow()
    }

    pub(crate) fn subscribe_table(&self) -> watch::Receiver<Table> {
        self.table.subscribe()
    }

    pub(crate) fn subscribe_count(&self) -> watch::Receiver<u64> {
        self.count.subscribe()
    }
}
