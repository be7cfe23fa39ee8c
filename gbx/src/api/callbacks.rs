use crate::api::*;

/// Callbacks that are relevant to live rankings.
///
/// References:
///  - https://doc.maniaplanet.com/dedicated-server/references/xml-rpc-callbacks
///  - https://github.com/maniaplanet/script-xmlrpc/blob/master/XmlRpcListing.md
#[derive(Debug, PartialEq, Clone)]
pub enum Callback {
    /// Sent when a map starts, including restarts.
    ///
    /// Triggered by `Maniaplanet.StartMap_Start`
    MapStart { map_uid: String, restarted: bool },

    /// Sent at the beginning of each round. Modes without rounds
    /// still send this once per map.
    ///
    /// Triggered by `Maniaplanet.StartRound_Start`
    RoundStart { count: i32, time: i32 },

    /// Sent when a player connects to the server.
    ///
    /// Triggered by `ManiaPlanet.PlayerConnect`
    PlayerConnect { login: String, is_spectator: bool },

    /// Sent when a player crosses the finish line.
    ///
    /// Triggered by `Trackmania.Event.WayPoint` with `isendrace` set.
    PlayerFinish(WaypointEvent),

    /// Sent when a player crosses a checkpoint, or completes a lap
    /// in a multi-lap race.
    ///
    /// Triggered by `Trackmania.Event.WayPoint` without `isendrace` set.
    PlayerWaypoint(WaypointEvent),

    /// Sent when a player gives up their run.
    ///
    /// Triggered by `Trackmania.Event.GiveUp`
    PlayerGiveUp(GiveUpEvent),

    /// Sent at the end of rounds, maps and matches, or on demand.
    ///
    /// Triggered by `Trackmania.Scores`
    Scores(Scores),
}
