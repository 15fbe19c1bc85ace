//! Fan-in of several asynchronous sources into one ordered-per-source stream.
//!
//! Each source gets its own forwarding task; items reach the merged channel in
//! whatever order their reads complete. Relative order within one source is
//! preserved. The merged channel closes once every forwarder has finished.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Default capacity of the merged channel.
pub const MERGE_CAPACITY: usize = 64;

/// A finite asynchronous sequence of items.
pub trait Source: Send + 'static {
    type Item: Send + 'static;

    /// Yields the next item, or `None` once the source is exhausted.
    fn next(&mut self) -> impl Future<Output = Option<Self::Item>> + Send;
}

impl<T: Send + 'static> Source for mpsc::Receiver<T> {
    type Item = T;

    fn next(&mut self) -> impl Future<Output = Option<T>> + Send {
        self.recv()
    }
}

/// Merges `sources` into one receiver, forwarding first-ready-first.
///
/// Must be called from within a tokio runtime.
pub fn merge<S: Source>(sources: Vec<S>, capacity: usize) -> mpsc::Receiver<S::Item> {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let remaining = Arc::new(AtomicUsize::new(sources.len()));

    for (id, mut source) in sources.into_iter().enumerate() {
        let tx = tx.clone();
        let remaining = Arc::clone(&remaining);
        tokio::spawn(async move {
            while let Some(item) = source.next().await {
                if tx.send(item).await.is_err() {
                    debug!(source = id, "merged stream dropped; stopping forwarder");
                    break;
                }
            }
            let left = remaining.fetch_sub(1, Ordering::AcqRel) - 1;
            trace!(source = id, left, "source finished");
            if left == 0 {
                debug!("all sources finished");
            }
        });
    }

    rx
}

/// Writes every chunk of a merged stream into `sink`, then shuts it down.
///
/// A source error is remembered and returned after the remaining chunks have
/// been written, so one failing source does not truncate its siblings. A sink
/// write error stops draining immediately.
pub async fn drain<W>(mut merged: mpsc::Receiver<io::Result<Vec<u8>>>, sink: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut first_error = None;
    while let Some(item) = merged.recv().await {
        match item {
            Ok(chunk) => {
                sink.write_all(&chunk).await?;
                sink.flush().await?;
            }
            Err(err) => {
                debug!(error = %err, "source failed while draining");
                first_error.get_or_insert(err);
            }
        }
    }
    sink.shutdown().await?;
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
