use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::models::torrent::TorrentSnapshot;
use crate::rpc::client::TorrentBackend;
use crate::sweep::policy::RemovalPolicy;

/// Tracks when each torrent was first observed completed and stops
/// torrents once the active removal policy is satisfied.
///
/// Invariant: an id is in `pending` iff a prior poll classified that
/// torrent as completed and it has not yet been finalized. Tracking never
/// survives the end of a completed streak; pausing, reverting, or external
/// removal all restart it from zero.
pub struct CompletionTracker {
    policy: RemovalPolicy,
    /// Torrent id -> unix timestamp of the first completed observation
    pending: HashMap<i64, i64>,
}

impl CompletionTracker {
    pub fn new(policy: RemovalPolicy) -> Self {
        Self {
            policy,
            pending: HashMap::new(),
        }
    }

    pub fn is_tracked(&self, id: i64) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn tracked_count(&self) -> usize {
        self.pending.len()
    }

    /// One reconciliation pass over the current snapshot.
    ///
    /// Stop-command failures keep the entry so the stop is retried on
    /// the next cycle.
    pub async fn reconcile(
        &mut self,
        backend: &dyn TorrentBackend,
        snapshot: &[TorrentSnapshot],
        now: i64,
    ) {
        for torrent in snapshot {
            if torrent.status.is_paused() {
                if self.pending.remove(&torrent.id).is_some() {
                    info!(
                        id = torrent.id,
                        name = %torrent.name,
                        "Torrent paused, dropped from tracking"
                    );
                }
            } else if torrent.status.is_complete() {
                match self.pending.get(&torrent.id).copied() {
                    None => {
                        // A torrent must survive one full poll interval as
                        // completed before it is evaluated for removal
                        self.pending.insert(torrent.id, now);
                        info!(
                            id = torrent.id,
                            name = %torrent.name,
                            progress = torrent.percent_done,
                            "Torrent completed, tracking for removal"
                        );
                    }
                    Some(first_seen) => match self.policy {
                        RemovalPolicy::Delay { minutes } => {
                            if RemovalPolicy::delay_elapsed(minutes, first_seen, now)
                                && self.try_stop(backend, torrent).await
                            {
                                info!(
                                    id = torrent.id,
                                    name = %torrent.name,
                                    elapsed_secs = now - first_seen,
                                    "Stopped torrent after completion delay"
                                );
                            }
                        }
                        RemovalPolicy::Ratio { threshold } => {
                            // Evaluated from the live ratio every cycle;
                            // first_seen plays no part in this branch
                            if RemovalPolicy::ratio_reached(threshold, torrent.upload_ratio)
                                && self.try_stop(backend, torrent).await
                            {
                                info!(
                                    id = torrent.id,
                                    name = %torrent.name,
                                    ratio = torrent.upload_ratio,
                                    threshold = threshold,
                                    "Stopped torrent at target ratio"
                                );
                            }
                        }
                    },
                }
            } else if self.pending.remove(&torrent.id).is_some() {
                info!(
                    id = torrent.id,
                    name = %torrent.name,
                    status = ?torrent.status,
                    "Torrent no longer completed, dropped from tracking"
                );
            }
        }

        // Entries whose torrents vanished from the snapshot were removed
        // externally; stale tracking must not outlive them
        let seen: HashSet<i64> = snapshot.iter().map(|torrent| torrent.id).collect();
        self.pending.retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                info!(id = *id, "Tracked torrent vanished from backend, dropped from tracking");
            }
            keep
        });
    }

    async fn try_stop(&mut self, backend: &dyn TorrentBackend, torrent: &TorrentSnapshot) -> bool {
        match backend.stop_torrent(torrent.id).await {
            Ok(()) => {
                self.pending.remove(&torrent.id);
                true
            }
            Err(error) => {
                warn!(
                    id = torrent.id,
                    name = %torrent.name,
                    error = %error,
                    "Failed to stop torrent, will retry next cycle"
                );
                false
            }
        }
    }
}
