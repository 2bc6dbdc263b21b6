// ── Central reactive store ──
//
// Holds the authoritative client-side snapshot of the controller's
// entity tables, one table per target. Ingest replaces tables
// wholesale, recomputes derived composite counts synchronously, and
// notifies subscribers through `watch` channels.

mod cell;

use chrono::{DateTime, Utc};
use strum::EnumCount;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::stream::TableStream;
use crate::target::Target;
use cell::TableCell;

pub use cell::Table;

/// An opaque table record. The store never interprets record fields;
/// only cardinality matters to it.
pub type Record = serde_json::Value;

/// The normalized, tag-keyed table store.
///
/// One instance lives for the whole session, constructed at engine
/// bootstrap and passed by reference — there is no ambient global.
/// All mutation goes through [`ingest`](Self::ingest); observers
/// subscribe per target and unsubscribe by dropping the handle.
pub struct Store {
    cells: [TableCell; Target::COUNT],
    last_ingest: watch::Sender<Option<DateTime<Utc>>>,
}

impl Store {
    pub fn new() -> Self {
        let (last_ingest, _) = watch::channel(None);
        Self {
            cells: std::array::from_fn(|_| TableCell::new()),
            last_ingest,
        }
    }

    fn cell(&self, target: Target) -> &TableCell {
        &self.cells[target.index()]
    }

    // ── Ingest ───────────────────────────────────────────────────────

    /// Merge one batch's per-target results into the store.
    ///
    /// For each entry: the target's table is replaced wholesale (empty
    /// input empties the table), its count is republished, and every
    /// composite summing over it is recomputed before the next entry is
    /// processed — composite counts are never stale relative to their
    /// constituents. A composite target appearing as a key is a
    /// soft-fail: it logs a diagnostic and the rest of the ingest
    /// proceeds. Synchronous and total.
    pub fn ingest<I>(&self, results: I)
    where
        I: IntoIterator<Item = (Target, Vec<Record>)>,
    {
        let mut touched = false;

        for (target, records) in results {
            if target.is_composite() {
                warn!(entity = %target, "ingest key is a derived target, not stored");
                continue;
            }

            debug!(entity = %target, records = records.len(), "table replaced");
            self.cell(target).replace(records);

            for composite in target.composites() {
                let total = composite
                    .constituents()
                    .iter()
                    .map(|&c| self.cell(c).count())
                    .sum();
                self.cell(composite).publish_count(total);
            }

            touched = true;
        }

        if touched {
            self.last_ingest.send_replace(Some(Utc::now()));
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// The current table for `target`; empty if never ingested.
    /// Composite targets have no table of their own.
    pub fn table(&self, target: Target) -> Table {
        self.cell(target).table()
    }

    /// Current cardinality: table length for fetchable targets, sum of
    /// constituent cardinalities for composites.
    pub fn count(&self, target: Target) -> u64 {
        self.cell(target).count()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Subscribe to full-table changes for `target`.
    pub fn subscribe_table(&self, target: Target) -> TableStream {
        TableStream::new(self.cell(target).subscribe_table())
    }

    /// Subscribe to scalar-count changes for `target` (badge observers).
    /// Composite counts change whenever any constituent table does.
    pub fn subscribe_count(&self, target: Target) -> watch::Receiver<u64> {
        self.cell(target).subscribe_count()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_ingest(&self) -> Option<DateTime<Utc>> {
        *self.last_ingest.borrow()
    }

    /// How long ago the last ingest occurred, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_ingest().map(|t| Utc::now() - t)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn records(n: usize) -> Vec<Record> {
        (0..n).map(|i| json!({ "id": i })).collect()
    }

    #[test]
    fn ingest_replaces_tables_wholesale() {
        let store = Store::new();

        store.ingest(vec![(Target::Network, records(3))]);
        assert_eq!(store.table(Target::Network).len(), 3);

        store.ingest(vec![(Target::Network, records(1))]);
        assert_eq!(store.table(Target::Network).len(), 1);
        assert_eq!(store.count(Target::Network), 1);
    }

    #[test]
    fn ingest_with_empty_table_empties_and_notifies() {
        let store = Store::new();
        store.ingest(vec![(Target::Account, records(2))]);

        let mut counts = store.subscribe_count(Target::Account);
        counts.borrow_and_update();

        store.ingest(vec![(Target::Account, Vec::new())]);
        assert!(store.table(Target::Account).is_empty());
        assert_eq!(store.count(Target::Account), 0);
        assert!(counts.has_changed().unwrap());
    }

    #[test]
    fn never_ingested_table_is_empty() {
        let store = Store::new();
        assert!(store.table(Target::Gateway).is_empty());
        assert_eq!(store.count(Target::Gateway), 0);
        assert!(store.last_ingest().is_none());
    }

    #[test]
    fn ingest_is_idempotent() {
        let store = Store::new();
        let input = vec![
            (Target::WiredClient, records(2)),
            (Target::WirelessClient, records(3)),
        ];

        store.ingest(input.clone());
        let first_tables = (
            store.table(Target::WiredClient),
            store.table(Target::WirelessClient),
        );
        let first_count = store.count(Target::Client);

        store.ingest(input);
        assert_eq!(store.table(Target::WiredClient), first_tables.0);
        assert_eq!(store.table(Target::WirelessClient), first_tables.1);
        assert_eq!(store.count(Target::Client), first_count);
    }

    #[test]
    fn composite_count_tracks_constituents() {
        let store = Store::new();

        store.ingest(vec![(Target::WiredClient, records(1))]);
        assert_eq!(store.count(Target::Client), 1);

        store.ingest(vec![(Target::WirelessClient, records(2))]);
        assert_eq!(store.count(Target::Client), 3);

        store.ingest(vec![(Target::WiredClient, Vec::new())]);
        assert_eq!(store.count(Target::Client), 2);

        assert_eq!(
            store.count(Target::Client),
            store.count(Target::WiredClient) + store.count(Target::WirelessClient)
        );
    }

    #[test]
    fn composite_observers_notified_on_constituent_change() {
        let store = Store::new();
        let mut badge = store.subscribe_count(Target::Device);
        badge.borrow_and_update();

        store.ingest(vec![(Target::Switch, records(4))]);

        assert!(badge.has_changed().unwrap());
        assert_eq!(*badge.borrow_and_update(), 4);
    }

    #[test]
    fn observer_isolation() {
        let store = Store::new();
        let mut firewall_counts = store.subscribe_count(Target::FirewallRule);
        let firewall_tables = store.subscribe_table(Target::FirewallRule);
        let mut client_badge = store.subscribe_count(Target::Client);
        firewall_counts.borrow_and_update();
        client_badge.borrow_and_update();

        // Touches neither FirewallRule nor any constituent of Client.
        store.ingest(vec![(Target::AccessPoint, records(2))]);

        assert!(!firewall_counts.has_changed().unwrap());
        assert!(!firewall_tables.has_changed());
        assert!(!client_badge.has_changed().unwrap());
    }

    #[test]
    fn composite_ingest_key_is_soft_fail() {
        let store = Store::new();
        let mut badge = store.subscribe_count(Target::Client);
        badge.borrow_and_update();

        // Derived target as key: skipped, rest of the ingest applies.
        store.ingest(vec![
            (Target::Client, records(9)),
            (Target::Network, records(2)),
        ]);

        assert!(store.table(Target::Client).is_empty());
        assert!(!badge.has_changed().unwrap());
        assert_eq!(store.count(Target::Network), 2);
    }

    #[test]
    fn ingest_updates_last_ingest_timestamp() {
        let store = Store::new();
        assert!(store.last_ingest().is_none());

        store.ingest(vec![(Target::WifiNetwork, records(1))]);
        assert!(store.last_ingest().is_some());
        assert!(store.data_age().is_some());
    }

    #[test]
    fn table_observer_sees_new_snapshot() {
        let store = Store::new();
        let mut tables = store.subscribe_table(Target::WirelessClient);

        store.ingest(vec![(
            Target::WirelessClient,
            vec![json!({ "id": 2 }), json!({ "id": 3 })],
        )]);

        assert!(tables.has_changed());
        let snapshot = tables.latest();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0]["id"], 2);
    }
}
