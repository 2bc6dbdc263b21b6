// ── Reactive table streams ──
//
// Subscription handle for consuming table changes from the Store.
// Dropping the handle is the unsubscribe — bindings are scoped to the
// observing view's lifetime, never leaked into a global registry.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::Table;

/// A subscription to one target's table.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via [`changed`](Self::changed) or by converting to a
/// `Stream`.
pub struct TableStream {
    current: Table,
    receiver: watch::Receiver<Table>,
}

impl TableStream {
    pub(crate) fn new(receiver: watch::Receiver<Table>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time.
    pub fn current(&self) -> &Table {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Table {
        self.receiver.borrow().clone()
    }

    /// `true` if the table changed since this handle last observed it.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the sender (Store) has been dropped.
    pub async fn changed(&mut self) -> Option<Table> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> TableWatchStream {
        TableWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields a new [`Table`] snapshot each time the underlying table is
/// replaced.
pub struct TableWatchStream {
    inner: WatchStream<Table>,
}

impl Stream for TableWatchStream {
    type Item = Table;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream is Unpin when the inner type is Unpin, and Table
        // always is.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
