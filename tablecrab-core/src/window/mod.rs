//! # Window Specifications
//!
//! The time semantics a cogrouped aggregation can run under, and the grace
//! period each of them implies for late records.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::types::Millis;

/// Discriminant of a [`WindowSpec`], recorded on aggregate graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    None,
    Fixed,
    Session,
    Sliding,
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WindowKind::None => "rolling",
            WindowKind::Fixed => "time-windowed",
            WindowKind::Session => "session-windowed",
            WindowKind::Sliding => "sliding-windowed",
        };
        f.write_str(name)
    }
}

/// When a windowed aggregate forwards its result downstream. Cogrouped
/// aggregates only emit on update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitStrategy {
    /// Emit on every update of a window.
    OnWindowUpdate,
}

/// Time semantics of an aggregation.
///
/// - [`WindowSpec::None`]: rolling aggregation over all time
/// - [`WindowSpec::Fixed`]: tumbling (`advance == size`) or hopping windows
/// - [`WindowSpec::Session`]: gap-based sessions, merged as records arrive
/// - [`WindowSpec::Sliding`]: windows of a fixed time difference anchored on records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowSpec {
    None,
    Fixed {
        size_ms: Millis,
        advance_ms: Millis,
        grace_period_ms: Millis,
    },
    Session {
        grace_period_ms: Millis,
        inactivity_gap_ms: Millis,
    },
    Sliding {
        time_difference_ms: Millis,
        grace_period_ms: Millis,
    },
}

fn to_millis(what: &str, duration: Duration) -> Result<Millis, TopologyError> {
    Millis::try_from(duration.as_millis())
        .map_err(|_| TopologyError::InvalidWindow(format!("{what} {duration:?} overflows")))
}

fn positive_millis(what: &str, duration: Duration) -> Result<Millis, TopologyError> {
    let ms = to_millis(what, duration)?;
    if ms <= 0 {
        return Err(TopologyError::InvalidWindow(format!(
            "{what} must be at least 1ms"
        )));
    }
    Ok(ms)
}

fn overflow(what: &str) -> TopologyError {
    TopologyError::InvalidWindow(format!("{what} overflows"))
}

impl WindowSpec {
    /// Non-overlapping windows of `size` with no grace period.
    pub fn tumbling(size: Duration) -> Result<Self, TopologyError> {
        let size_ms = positive_millis("window size", size)?;
        WindowSpec::Fixed {
            size_ms,
            advance_ms: size_ms,
            grace_period_ms: 0,
        }
        .checked()
    }

    /// Windows of `size` starting every `advance`.
    pub fn hopping(size: Duration, advance: Duration) -> Result<Self, TopologyError> {
        let size_ms = positive_millis("window size", size)?;
        let advance_ms = positive_millis("window advance", advance)?;
        if advance_ms > size_ms {
            return Err(TopologyError::InvalidWindow(format!(
                "advance {advance_ms}ms must not exceed window size {size_ms}ms"
            )));
        }
        WindowSpec::Fixed {
            size_ms,
            advance_ms,
            grace_period_ms: 0,
        }
        .checked()
    }

    /// Sessions closed by `inactivity_gap` without records, with no grace period.
    pub fn session(inactivity_gap: Duration) -> Result<Self, TopologyError> {
        WindowSpec::Session {
            grace_period_ms: 0,
            inactivity_gap_ms: positive_millis("inactivity gap", inactivity_gap)?,
        }
        .checked()
    }

    /// Sliding windows covering at most `time_difference`, with no grace period.
    pub fn sliding(time_difference: Duration) -> Result<Self, TopologyError> {
        WindowSpec::Sliding {
            time_difference_ms: positive_millis("time difference", time_difference)?,
            grace_period_ms: 0,
        }
        .checked()
    }

    /// Replace the grace period. Rolling aggregations have no grace period.
    pub fn with_grace(self, grace: Duration) -> Result<Self, TopologyError> {
        let grace_ms = to_millis("grace period", grace)?;
        let spec = match self {
            WindowSpec::None => {
                return Err(TopologyError::InvalidWindow(
                    "a rolling aggregation has no grace period".to_string(),
                ));
            }
            WindowSpec::Fixed {
                size_ms,
                advance_ms,
                ..
            } => WindowSpec::Fixed {
                size_ms,
                advance_ms,
                grace_period_ms: grace_ms,
            },
            WindowSpec::Session {
                inactivity_gap_ms,
                ..
            } => WindowSpec::Session {
                grace_period_ms: grace_ms,
                inactivity_gap_ms,
            },
            WindowSpec::Sliding {
                time_difference_ms,
                ..
            } => WindowSpec::Sliding {
                time_difference_ms,
                grace_period_ms: grace_ms,
            },
        };
        spec.checked()
    }

    /// Reject windows whose effective grace or required retention does not
    /// fit in [`Millis`].
    fn checked(self) -> Result<Self, TopologyError> {
        match self {
            WindowSpec::None => {}
            WindowSpec::Fixed {
                size_ms,
                grace_period_ms,
                ..
            } => {
                size_ms
                    .checked_add(grace_period_ms)
                    .ok_or_else(|| overflow("window size plus grace period"))?;
            }
            WindowSpec::Session {
                grace_period_ms,
                inactivity_gap_ms,
            } => {
                inactivity_gap_ms
                    .checked_add(grace_period_ms)
                    .ok_or_else(|| overflow("inactivity gap plus grace period"))?;
            }
            WindowSpec::Sliding {
                time_difference_ms,
                grace_period_ms,
            } => {
                time_difference_ms
                    .checked_mul(2)
                    .and_then(|ms| ms.checked_add(grace_period_ms))
                    .ok_or_else(|| overflow("twice the time difference plus grace period"))?;
            }
        }
        Ok(self)
    }

    pub fn kind(&self) -> WindowKind {
        match self {
            WindowSpec::None => WindowKind::None,
            WindowSpec::Fixed { .. } => WindowKind::Fixed,
            WindowSpec::Session { .. } => WindowKind::Session,
            WindowSpec::Sliding { .. } => WindowKind::Sliding,
        }
    }

    /// The configured grace period, `0` for rolling aggregations.
    pub fn grace_period_ms(&self) -> Millis {
        match self {
            WindowSpec::None => 0,
            WindowSpec::Fixed {
                grace_period_ms, ..
            }
            | WindowSpec::Session {
                grace_period_ms, ..
            }
            | WindowSpec::Sliding {
                grace_period_ms, ..
            } => *grace_period_ms,
        }
    }

    /// Grace period attached to the aggregate node, or `None` for rolling
    /// aggregations which carry no grace wrapper.
    ///
    /// A session stays open for `inactivity_gap` after its last record, so
    /// late records are accepted for the gap plus the grace period.
    pub fn effective_grace_ms(&self) -> Option<Millis> {
        match self {
            WindowSpec::None => None,
            WindowSpec::Fixed {
                grace_period_ms, ..
            }
            | WindowSpec::Sliding {
                grace_period_ms, ..
            } => Some(*grace_period_ms),
            WindowSpec::Session {
                grace_period_ms,
                inactivity_gap_ms,
            } => Some(grace_period_ms.saturating_add(*inactivity_gap_ms)),
        }
    }

    /// Minimum retention a window store needs to answer for every open window.
    pub fn required_retention_ms(&self) -> Option<Millis> {
        match self {
            WindowSpec::None => None,
            WindowSpec::Fixed {
                size_ms,
                grace_period_ms,
                ..
            } => Some(size_ms.saturating_add(*grace_period_ms)),
            WindowSpec::Session {
                grace_period_ms,
                inactivity_gap_ms,
            } => Some(inactivity_gap_ms.saturating_add(*grace_period_ms)),
            WindowSpec::Sliding {
                time_difference_ms,
                grace_period_ms,
            } => Some(time_difference_ms.saturating_mul(2).saturating_add(*grace_period_ms)),
        }
    }

    /// Emit policy used by cogrouped aggregates. Only on-update emission is
    /// available for cogroup; rolling aggregations have no policy.
    pub fn cogroup_emit_strategy(&self) -> Option<EmitStrategy> {
        match self {
            WindowSpec::None => None,
            _ => Some(EmitStrategy::OnWindowUpdate),
        }
    }
}

#[cfg(test)]
#[path = "tests/window_tests.rs"]
mod tests;
