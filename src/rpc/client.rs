use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::config::ConnectionConfig;
use crate::core::error::BackendError;
use crate::models::torrent::{TorrentSnapshot, TorrentStatus};
use crate::rpc::types::{
    RpcRequest, RpcResponse, RpcTorrent, TorrentActionArgs, TorrentGetArgs, TorrentGetBody,
    TORRENT_GET_FIELDS,
};

const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Capability set the reconciliation core consumes. Implemented by the
/// Transmission RPC client and by test doubles.
#[async_trait]
pub trait TorrentBackend: Send + Sync {
    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, BackendError>;
    async fn stop_torrent(&self, id: i64) -> Result<(), BackendError>;
}

/// Client for the Transmission RPC endpoint
pub struct TransmissionClient {
    http: reqwest::Client,
    url: String,
    username: String,
    password: String,
    /// CSRF token issued by the backend on a 409 response
    session_id: Mutex<Option<String>>,
}

impl TransmissionClient {
    pub fn new(connection: &ConnectionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(connection.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            url: connection.endpoint_url(),
            username: connection.username.clone(),
            password: connection.password.clone(),
            session_id: Mutex::new(None),
        })
    }

    /// Issue one RPC call, renegotiating the session id once if the
    /// backend answers 409 with a fresh `X-Transmission-Session-Id`.
    async fn call<A, B>(
        &self,
        method: &'static str,
        arguments: A,
    ) -> Result<RpcResponse<B>, BackendError>
    where
        A: Serialize,
        B: DeserializeOwned,
    {
        let request = RpcRequest { method, arguments };

        for _ in 0..2 {
            let mut builder = self.http.post(&self.url).json(&request);

            if !self.username.is_empty() {
                builder = builder.basic_auth(&self.username, Some(&self.password));
            }

            let session_id = self
                .session_id
                .lock()
                .expect("session id lock poisoned")
                .clone();
            if let Some(session_id) = session_id {
                builder = builder.header(SESSION_ID_HEADER, session_id);
            }

            let response = builder.send().await?;

            if response.status() == StatusCode::CONFLICT {
                let session_id = response
                    .headers()
                    .get(SESSION_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);

                match session_id {
                    Some(session_id) => {
                        debug!(method, "Negotiated new RPC session id");
                        *self.session_id.lock().expect("session id lock poisoned") =
                            Some(session_id);
                        continue;
                    }
                    None => {
                        return Err(BackendError::Protocol(
                            "409 response without a session id header".to_string(),
                        ))
                    }
                }
            }

            if !response.status().is_success() {
                return Err(BackendError::Protocol(format!(
                    "HTTP {} from backend",
                    response.status()
                )));
            }

            return response
                .json::<RpcResponse<B>>()
                .await
                .map_err(BackendError::Connection);
        }

        Err(BackendError::Protocol(
            "session id renegotiation did not converge".to_string(),
        ))
    }

    fn into_snapshot(raw: RpcTorrent) -> Option<TorrentSnapshot> {
        match TorrentStatus::from_code(raw.status) {
            Some(status) => Some(TorrentSnapshot {
                id: raw.id,
                name: raw.name,
                status,
                percent_done: raw.percent_done,
                upload_ratio: raw.upload_ratio,
            }),
            None => {
                warn!(
                    id = raw.id,
                    name = %raw.name,
                    code = raw.status,
                    "Unknown torrent status code, skipping torrent"
                );
                None
            }
        }
    }
}

#[async_trait]
impl TorrentBackend for TransmissionClient {
    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, BackendError> {
        let response: RpcResponse<TorrentGetBody> = self
            .call(
                "torrent-get",
                TorrentGetArgs {
                    fields: TORRENT_GET_FIELDS,
                },
            )
            .await?;

        if response.result != "success" {
            return Err(BackendError::Protocol(format!(
                "torrent-get failed: {}",
                response.result
            )));
        }

        let body = response.arguments.ok_or_else(|| {
            BackendError::Protocol("torrent-get response missing arguments".to_string())
        })?;

        Ok(body
            .torrents
            .into_iter()
            .filter_map(Self::into_snapshot)
            .collect())
    }

    async fn stop_torrent(&self, id: i64) -> Result<(), BackendError> {
        let response: RpcResponse<serde_json::Value> = self
            .call("torrent-stop", TorrentActionArgs { ids: vec![id] })
            .await?;

        if response.result != "success" {
            return Err(BackendError::Command {
                method: "torrent-stop",
                id,
                result: response.result,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConnectionConfig;

    #[test]
    fn test_client_creation() {
        let client = TransmissionClient::new(&ConnectionConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_uses_configured_endpoint() {
        let connection = ConnectionConfig {
            host: "seedbox.local".to_string(),
            port: 9092,
            ..ConnectionConfig::default()
        };
        let client = TransmissionClient::new(&connection).unwrap();
        assert_eq!(client.url, "http://seedbox.local:9092/transmission/rpc/");
    }

    #[test]
    fn test_unknown_status_code_is_skipped() {
        let raw = RpcTorrent {
            id: 9,
            name: "mystery".to_string(),
            status: 42,
            percent_done: 1.0,
            upload_ratio: 0.5,
        };
        assert!(TransmissionClient::into_snapshot(raw).is_none());
    }

    #[test]
    fn test_known_status_code_converts() {
        let raw = RpcTorrent {
            id: 9,
            name: "dist.iso".to_string(),
            status: 6,
            percent_done: 1.0,
            upload_ratio: 1.5,
        };
        let snapshot = TransmissionClient::into_snapshot(raw).unwrap();
        assert_eq!(snapshot.status, TorrentStatus::Seeding);
        assert_eq!(snapshot.id, 9);
    }
}
