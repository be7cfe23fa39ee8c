use async_trait::async_trait;

use crate::api::*;

pub(in crate) type Result<T> = std::result::Result<T, Fault>;

/// Queries on the game server that are needed to keep live rankings
/// in sync with the game.
///
/// References:
///  - https://doc.maniaplanet.com/dedicated-server/references/xml-rpc-methods
///  - https://github.com/maniaplanet/script-xmlrpc/blob/master/XmlRpcListing.md
#[async_trait]
pub trait Calls: Send + Sync {
    /// Fetch some info about the running mode script.
    ///
    /// Faults in edge cases with message "No current script",
    /// f.e. when setting the script failed.
    ///
    /// Calls method:
    ///     GetModeScriptInfo
    async fn mode(&self) -> Result<ModeInfo>;

    /// Fetch the current race ranking.
    ///
    /// Faults when the mode script does not implement it, which
    /// is f.e. the case right after the server started.
    ///
    /// Calls method:
    ///     Trackmania.GetScores
    async fn scores(&self) -> Result<Scores>;

    /// Fetch the points that are awarded to finishers of a round,
    /// starting with the points for the first finisher.
    ///
    /// Calls method:
    ///     Trackmania.GetPointsRepartition
    async fn points_repartition(&self) -> Result<Vec<i32>>;

    /// Fetch information about a connected player.
    ///
    /// Faults if there is no player with the given login.
    ///
    /// Calls method:
    ///     GetPlayerInfo
    async fn player_info(&self, login: &str) -> Result<PlayerInfo>;
}
