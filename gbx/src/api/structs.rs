use std::fmt::Formatter;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use lazy_static::lazy_static;

/// Used by the game in place of a time or a number of points
/// that does not exist yet.
pub const NO_VALUE: i32 = -1;

/// The `section` of a `Trackmania.Scores` callback that is sent before
/// the points of a round are actually awarded.
pub const PRE_END_ROUND_SECTION: &str = "PreEndRound";

/// Game mode information.
///
/// Reference: GetModeScriptInfo https://doc.maniaplanet.com/dedicated-server/references/xml-rpc-methods
#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ModeInfo {
    /// The name of the game mode script,
    /// f.e. "Trackmania/TM_TimeAttack_Online.Script.txt".
    #[serde(rename = "Name")]
    pub script_name: String,

    /// Comma-delimited; indicates compatible map types for this mode.
    #[serde(default)]
    pub compatible_map_types: String,

    /// Development: The version date of the mode script.
    #[serde(default)]
    pub version: String,
}

/// Player information.
///
/// Reference: GetPlayerInfo https://doc.maniaplanet.com/dedicated-server/references/xml-rpc-methods
#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerInfo {
    /// Player-unique login.
    pub login: String,

    /// Formatted nick name.
    pub nick_name: GameString,
}

/// Reference: https://github.com/maniaplanet/script-xmlrpc/blob/master/XmlRpcListing.md#maniaplanetstartmap_start
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct MapStartEvent {
    /// `True` if the map was restarted instead of loaded.
    pub restarted: bool,

    pub map: MapRef,
}

/// The map that is part of a `MapStartEvent`.
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct MapRef {
    /// A unique identifier.
    pub uid: String,

    /// The formatted map name.
    #[serde(default)]
    pub name: GameString,
}

/// Reference: https://github.com/maniaplanet/script-xmlrpc/blob/master/XmlRpcListing.md#maniaplanetstartround_start
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct RoundStartEvent {
    /// The number of rounds started on this map, including this one.
    pub count: i32,

    /// Server time when the callback was sent.
    pub time: i32,
}

/// Run data at the time of crossing any checkpoint or the finish line.
///
/// Reference: https://github.com/maniaplanet/script-xmlrpc/blob/master/XmlRpcListing.md#trackmaniaeventwaypoint
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct WaypointEvent {
    /// The driving player's login.
    #[serde(rename = "login")]
    pub player_login: String,

    /// Total duration of the run up to this checkpoint.
    #[serde(rename = "racetime")]
    pub race_time_millis: i32,

    /// Duration of the current lap up to this checkpoint.
    #[serde(rename = "laptime")]
    pub lap_time_millis: i32,

    /// The total durations of this run at the time of passing each checkpoint.
    /// The last element will be equal to `race_time_millis`.
    #[serde(rename = "curracecheckpoints")]
    pub race_time_cp_millis: Vec<i32>,

    /// Checkpoint index; or the number of unique checkpoints crossed
    /// since the beginning of this run minus one.
    #[serde(rename = "checkpointinrace")]
    pub cp_index: i32,

    /// Same as `cp_index`, but only counting the current lap.
    #[serde(rename = "checkpointinlap", default)]
    pub lap_cp_index: i32,

    /// `True` if the player has crossed the finish line.
    #[serde(rename = "isendrace")]
    pub is_finish: bool,

    /// `True` if the player has completed a lap. Also `true` when crossing
    /// the finish line of a map that is not multi-lap.
    #[serde(rename = "isendlap", default)]
    pub is_lap_finish: bool,
}

/// Reference: https://github.com/maniaplanet/script-xmlrpc/blob/master/XmlRpcListing.md#trackmaniaeventgiveup
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct GiveUpEvent {
    /// Server time when the player gave up.
    pub time: i32,

    /// The login of the player that gave up.
    #[serde(rename = "login")]
    pub player_login: String,
}

/// The ranking of the current race.
///
/// Reference: https://github.com/maniaplanet/script-xmlrpc/blob/master/XmlRpcListing.md#trackmaniascores
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct Scores {
    /// Empty, or an ID that was used when explicitly triggering the callback.
    #[serde(rename = "responseid", default)]
    pub response_id: String,

    /// "" | "PreEndRound" | "EndRound" | "EndMap" | "EndMatch"
    #[serde(default)]
    pub section: String,

    /// Race ranking sorted from best to worst.
    #[serde(rename = "players")]
    pub entries: Vec<Score>,
}

impl Scores {
    /// `True` for the scores sent right before the end of a round,
    /// which already contain the points of that round in some places,
    /// but not in others.
    pub fn is_pre_end_round(&self) -> bool {
        self.section == PRE_END_ROUND_SECTION
    }
}

/// A player's entry in the current race scores.
///
/// The game sends flat entries, but hosts may deliver entries that
/// reference the player as an object instead. Both are accepted,
/// and should be read with `Score::normalize`.
///
/// Reference: https://github.com/maniaplanet/script-xmlrpc/blob/master/XmlRpcListing.md#trackmaniascores
#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum Score {
    /// Entry as sent by `Trackmania.Scores` or returned by `Trackmania.GetScores`.
    Snapshot {
        login: String,

        #[serde(rename = "name")]
        nick_name: GameString,

        /// Best run time in milliseconds (or -1 if no completed run).
        #[serde(rename = "bestracetime", default = "no_value")]
        best_time_millis: i32,

        /// Points on the current map (or -1 if not ranked).
        #[serde(rename = "mappoints", default = "no_value")]
        map_points: i32,
    },

    /// Entry with an object-shaped player.
    Signal {
        player: PlayerRef,

        #[serde(default = "no_value")]
        best_race_time: i32,

        #[serde(default = "no_value")]
        map_points: i32,
    },
}

/// The player of a `Score::Signal` entry.
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct PlayerRef {
    pub login: String,
    pub nickname: GameString,
}

/// A `Score` entry in its canonical shape, where the `NO_VALUE`
/// sentinel was replaced with `None`.
#[derive(Debug, PartialEq, Clone)]
pub struct NormalizedScore {
    pub login: String,
    pub nick_name: GameString,
    pub best_time_millis: Option<i32>,
    pub map_points: Option<i32>,
}

impl Score {
    pub fn normalize(&self) -> NormalizedScore {
        fn value(x: i32) -> Option<i32> {
            Some(x).filter(|x| *x != NO_VALUE)
        }

        match self {
            Score::Snapshot {
                login,
                nick_name,
                best_time_millis,
                map_points,
            } => NormalizedScore {
                login: login.clone(),
                nick_name: nick_name.clone(),
                best_time_millis: value(*best_time_millis),
                map_points: value(*map_points),
            },
            Score::Signal {
                player,
                best_race_time,
                map_points,
            } => NormalizedScore {
                login: player.login.clone(),
                nick_name: player.nickname.clone(),
                best_time_millis: value(*best_race_time),
                map_points: value(*map_points),
            },
        }
    }
}

fn no_value() -> i32 {
    NO_VALUE
}

/// A string with in-game formatting.
#[derive(PartialEq, Clone, Default)]
pub struct GameString {
    /// The formatted string.
    pub formatted: String,
}

impl GameString {
    pub fn from(str: String) -> Self {
        GameString { formatted: str }
    }

    /// Removes all text formatting.
    ///
    /// References:
    /// - https://doc.maniaplanet.com/client/text-formatting
    /// - https://wiki.xaseco.org/wiki/Text_formatting
    pub fn plain(&self) -> String {
        lazy_static! {
            static ref RE_DOLLAR: Regex = Regex::new(r"\${2}").unwrap();
            static ref RE_FORMATTING: Regex =
                Regex::new(r"\$[A-Fa-f0-9]{3}|\$[wWnNoOiItTsSgGzZpP]|\$[lLhHpP]\[.+]").unwrap();
        }

        let output = RE_DOLLAR.replace_all(&self.formatted, r"\$");
        let output = RE_FORMATTING.replace_all(&output, "");
        output.into_owned()
    }
}

impl std::fmt::Debug for GameString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.plain())
    }
}

impl<'de> Deserialize<'de> for GameString {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as Deserializer<'de>>::Error>
    where
        D: Deserializer<'de>,
    {
        let formatted: String = serde::de::Deserialize::deserialize(deserializer)?;
        Ok(GameString { formatted })
    }
}

impl Serialize for GameString {
    fn serialize<S>(&self, serializer: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.formatted)
    }
}

/// A failed call on the game server.
///
/// Specific errors should be matched by its error message,
/// since the game often uses the code `-1000` for a lot of different errors.
#[derive(Clone, Debug, PartialEq)]
pub struct Fault {
    pub code: i32,
    pub msg: String,
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "fault {}: {}", self.code, self.msg)
    }
}

impl std::error::Error for Fault {}
