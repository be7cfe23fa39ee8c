use thiserror::Error;

use crate::server::Fault;

/// Failures that leave the live rankings as they were.
#[derive(Error, Debug)]
pub enum RankingError {
    /// The active mode script cannot be ranked. Live rankings stay dormant
    /// until a supported mode is loaded.
    #[error("mode script '{0}' is not supported")]
    UnsupportedMode(String),

    /// The active mode script could not be determined.
    #[error("failed to fetch mode script: {0}")]
    ModeUnavailable(#[source] Fault),

    /// Points were requested, but there is no points repartition.
    /// This indicates that it was not refreshed for the current mode.
    #[error("no points repartition to award points for rank {rank}")]
    EmptyRepartition { rank: usize },

    /// The current race scores could not be fetched.
    #[error("failed to fetch scores: {0}")]
    SnapshotUnavailable(#[source] Fault),

    /// The points repartition could not be fetched.
    #[error("failed to fetch points repartition: {0}")]
    RepartitionUnavailable(#[source] Fault),
}
