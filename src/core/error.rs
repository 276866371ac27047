// Centralized error handling for the sweeper

use thiserror::Error;

/// Errors surfaced by the Transmission backend client.
///
/// `Connection` failures are fatal at startup and logged-and-skipped
/// mid-run; `Command` failures leave the affected torrent tracked so the
/// stop is retried on the next cycle.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("backend rejected {method} for torrent {id}: {result}")]
    Command {
        method: &'static str,
        id: i64,
        result: String,
    },

    #[error("unexpected RPC response: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_names_the_torrent() {
        let err = BackendError::Command {
            method: "torrent-stop",
            id: 42,
            result: "invalid argument".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("torrent-stop"));
        assert!(msg.contains("42"));
        assert!(msg.contains("invalid argument"));
    }

    #[test]
    fn test_protocol_error_display() {
        let err = BackendError::Protocol("missing arguments".to_string());
        assert_eq!(err.to_string(), "unexpected RPC response: missing arguments");
    }
}
