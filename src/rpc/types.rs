// Wire-level DTOs for the Transmission RPC protocol. Kept separate from
// the domain model so reconciliation never sees raw status codes.

use serde::{Deserialize, Serialize};

/// Fields requested on every `torrent-get` call
pub const TORRENT_GET_FIELDS: &[&str] = &["id", "name", "status", "percentDone", "uploadRatio"];

#[derive(Debug, Serialize)]
pub struct RpcRequest<A> {
    pub method: &'static str,
    pub arguments: A,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse<A> {
    pub result: String,
    pub arguments: Option<A>,
}

#[derive(Debug, Serialize)]
pub struct TorrentGetArgs {
    pub fields: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct TorrentActionArgs {
    pub ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TorrentGetBody {
    #[serde(default)]
    pub torrents: Vec<RpcTorrent>,
}

#[derive(Debug, Deserialize)]
pub struct RpcTorrent {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub status: i64,
    #[serde(rename = "percentDone", default)]
    pub percent_done: f64,
    #[serde(rename = "uploadRatio", default)]
    pub upload_ratio: f64,
}
