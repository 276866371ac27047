use anyhow::{bail, Result};

use crate::core::config::RemovalConfig;
use crate::utils::time::elapsed_seconds;

/// Removal policy selected at startup, immutable for the daemon's lifetime.
/// Exactly one of the two is ever active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RemovalPolicy {
    /// Stop a torrent once it has dwelled completed for `minutes`.
    /// Zero minutes stops on the first poll after the completion was
    /// first observed.
    Delay { minutes: i64 },
    /// Stop a torrent once its live upload ratio reaches `threshold`.
    Ratio { threshold: f64 },
}

impl RemovalPolicy {
    /// Resolve the configured policy. Supplying both thresholds is a
    /// configuration error; supplying neither selects immediate removal.
    pub fn from_config(removal: &RemovalConfig) -> Result<Self> {
        match (removal.delay_minutes, removal.ratio) {
            (Some(_), Some(_)) => {
                bail!("delay_minutes and ratio are mutually exclusive; configure at most one")
            }
            (Some(minutes), None) => {
                if minutes < 0 {
                    bail!("delay_minutes must be non-negative");
                }
                Ok(RemovalPolicy::Delay { minutes })
            }
            (None, Some(threshold)) => {
                if threshold <= 0.0 {
                    bail!("ratio must be greater than 0");
                }
                Ok(RemovalPolicy::Ratio { threshold })
            }
            (None, None) => Ok(RemovalPolicy::Delay { minutes: 0 }),
        }
    }

    /// Delay check, inclusive at the boundary: an elapsed dwell equal to
    /// the threshold fires.
    pub fn delay_elapsed(minutes: i64, first_seen: i64, now: i64) -> bool {
        minutes == 0 || elapsed_seconds(first_seen, now) >= minutes * 60
    }

    /// Ratio check against the live backend-reported value.
    pub fn ratio_reached(threshold: f64, upload_ratio: f64) -> bool {
        upload_ratio >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn removal(delay: Option<i64>, ratio: Option<f64>) -> RemovalConfig {
        RemovalConfig {
            delay_minutes: delay,
            ratio,
        }
    }

    #[test]
    fn test_neither_threshold_defaults_to_immediate_delay() {
        let policy = RemovalPolicy::from_config(&removal(None, None)).unwrap();
        assert_eq!(policy, RemovalPolicy::Delay { minutes: 0 });
    }

    #[test]
    fn test_both_thresholds_rejected() {
        assert!(RemovalPolicy::from_config(&removal(Some(15), Some(2.0))).is_err());
    }

    #[test]
    fn test_delay_selects_delay_policy() {
        let policy = RemovalPolicy::from_config(&removal(Some(15), None)).unwrap();
        assert_eq!(policy, RemovalPolicy::Delay { minutes: 15 });
    }

    #[test]
    fn test_ratio_selects_ratio_policy() {
        let policy = RemovalPolicy::from_config(&removal(None, Some(2.0))).unwrap();
        assert_eq!(policy, RemovalPolicy::Ratio { threshold: 2.0 });
    }

    #[test]
    fn test_negative_delay_rejected() {
        assert!(RemovalPolicy::from_config(&removal(Some(-1), None)).is_err());
    }

    #[test]
    fn test_non_positive_ratio_rejected() {
        assert!(RemovalPolicy::from_config(&removal(None, Some(0.0))).is_err());
        assert!(RemovalPolicy::from_config(&removal(None, Some(-1.5))).is_err());
    }

    #[test]
    fn test_delay_boundary_is_inclusive() {
        // 15 minutes, first seen at t=0
        assert!(!RemovalPolicy::delay_elapsed(15, 0, 899));
        assert!(RemovalPolicy::delay_elapsed(15, 0, 900));
        assert!(RemovalPolicy::delay_elapsed(15, 0, 901));
    }

    #[test]
    fn test_zero_delay_always_elapsed() {
        assert!(RemovalPolicy::delay_elapsed(0, 100, 100));
    }

    #[test]
    fn test_ratio_boundary_is_inclusive() {
        assert!(!RemovalPolicy::ratio_reached(2.0, 1.999));
        assert!(RemovalPolicy::ratio_reached(2.0, 2.0));
        assert!(RemovalPolicy::ratio_reached(2.0, 2.1));
    }
}
