/// Lifecycle states reported by the Transmission RPC `status` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TorrentStatus {
    /// Torrent is stopped/paused
    Stopped,
    /// Queued for file verification
    CheckWait,
    /// Verifying local data
    Checking,
    /// Queued for download
    DownloadWait,
    /// Downloading
    Downloading,
    /// Queued to seed
    SeedWait,
    /// Seeding
    Seeding,
}

impl TorrentStatus {
    /// Map a numeric Transmission status code. Unknown codes map to `None`
    /// so a newer backend cannot be misclassified as stopped.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TorrentStatus::Stopped),
            1 => Some(TorrentStatus::CheckWait),
            2 => Some(TorrentStatus::Checking),
            3 => Some(TorrentStatus::DownloadWait),
            4 => Some(TorrentStatus::Downloading),
            5 => Some(TorrentStatus::SeedWait),
            6 => Some(TorrentStatus::Seeding),
            _ => None,
        }
    }

    /// Paused torrents are not in flight toward completion
    pub fn is_paused(self) -> bool {
        matches!(self, TorrentStatus::Stopped)
    }

    /// Upload-only states: the torrent has finished transferring
    pub fn is_complete(self) -> bool {
        matches!(self, TorrentStatus::SeedWait | TorrentStatus::Seeding)
    }
}

/// One torrent as observed on a single poll. Ephemeral; never stored
/// across cycles.
#[derive(Clone, Debug)]
pub struct TorrentSnapshot {
    /// Backend-assigned ID, stable across polls
    pub id: i64,
    /// Display name, used in log output only
    pub name: String,
    pub status: TorrentStatus,
    /// Download progress in [0.0, 1.0]
    pub percent_done: f64,
    /// Upload ratio as reported by the backend (-1 when unknown)
    pub upload_ratio: f64,
}

impl TorrentSnapshot {
    pub fn new(id: i64, name: impl Into<String>, status: TorrentStatus) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            percent_done: 0.0,
            upload_ratio: 0.0,
        }
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.upload_ratio = ratio;
        self
    }
}
