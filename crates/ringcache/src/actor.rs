//! The control actor: a single task owning every ring mutation.
//!
//! Lookups never touch this task; they read buckets directly. Everything
//! that mutates ring state (inserts, deletes, clears, resolver swaps,
//! rotations) funnels through one spawned loop, so those operations apply in
//! enqueue order and rotations are totally ordered with respect to all of
//! them.

use crate::cache::{BucketContents, CacheShared};
use crate::driver::ExpiryTimer;
use crate::resolver::SharedResolver;
use genring::Entry;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Shared shutdown state between cache handles and the control task.
#[derive(Debug, Default)]
pub(crate) struct ShutdownState {
    closed: AtomicBool,
}

impl ShutdownState {
    /// Marks the cache as closed. Returns `true` on the first call only.
    #[inline]
    pub(crate) fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` once shutdown has begun.
    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Messages applied by the control loop, in enqueue order.
pub(crate) enum Command<K, V> {
    /// Install entries into the newest bucket.
    Insert(Vec<(K, Entry<V>)>),
    /// Remove a key from every bucket.
    Delete(K),
    /// Empty every bucket, ring positions unchanged.
    Clear,
    /// Replace the resolver used for subsequent misses.
    SetResolver(SharedResolver<K, V>),
    /// Report bucket labels newest→oldest.
    InspectOrder(oneshot::Sender<Vec<Box<str>>>),
    /// Report per-bucket contents.
    InspectContents(oneshot::Sender<Vec<BucketContents<K, V>>>),
    /// Drain the queue, stop the timer, and exit; ack when done.
    Shutdown(oneshot::Sender<()>),
}

/// The control loop. Runs until a shutdown command arrives or every handle
/// has been dropped.
pub(crate) async fn run<K, V>(
    shared: Arc<CacheShared<K, V>>,
    mut rx: mpsc::UnboundedReceiver<Command<K, V>>,
    period: Duration,
) where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut timer = ExpiryTimer::new(period);

    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(cmd) => {
                    if let Some(ack) = apply(&shared, cmd) {
                        // Stop accepting new commands, apply what is already
                        // queued, then acknowledge and exit.
                        rx.close();
                        while let Some(cmd) = rx.recv().await {
                            if let Some(extra) = apply(&shared, cmd) {
                                let _ = extra.send(());
                            }
                        }
                        let _ = ack.send(());
                        return;
                    }
                }
                // Every handle dropped; nothing can reach this cache again.
                None => return,
            },

            () = timer.tick() => {
                let rotation = shared.ring.rotate();
                tracing::info!(
                    cache = %shared.name,
                    expired = %rotation.expired,
                    evicted = rotation.evicted,
                    newest = %rotation.newest,
                    oldest = %rotation.oldest,
                    "generation rotated"
                );
            }
        }
    }
}

/// Applies one command. Returns the ack channel when the command asks the
/// loop to stop.
fn apply<K, V>(shared: &CacheShared<K, V>, cmd: Command<K, V>) -> Option<oneshot::Sender<()>>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    match cmd {
        Command::Insert(pairs) => {
            shared.ring.newest().insert_many(pairs);
        }
        Command::Delete(key) => {
            shared.ring.delete_from_all(&key);
        }
        Command::Clear => {
            shared.ring.clear_all();
        }
        Command::SetResolver(resolver) => {
            shared.swap_resolver(resolver);
        }
        Command::InspectOrder(reply) => {
            let _ = reply.send(shared.ring.layout());
        }
        Command::InspectContents(reply) => {
            let _ = reply.send(shared.contents());
        }
        Command::Shutdown(ack) => return Some(ack),
    }
    None
}
