use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::*;

/// A method call received from the game server, which is how
/// the server notifies us of events.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Call {
    pub name: String,

    #[serde(default)]
    pub args: Vec<Value>,
}

/// The subset of XML-RPC values that callback arguments are made of.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// A boolean value (`<boolean>`, 0 == `false`, 1 == `true`).
    Bool(bool),

    /// A 32-bit signed integer (`<i4>`).
    Int(i32),

    /// A string (`<string>`).
    String(String),

    /// A list of arbitrary (heterogeneous) values (`<array>`).
    Array(Vec<Value>),
}

/// Matches calls by their method name to their respective `Callback` variant.
///
/// Selectively ignores callbacks that we don't use, and returns `None` for them.
///
/// Logs a warning on ignored callbacks that were not explicitly ignored.
///
/// # Errors
/// Fails if we recognized the name of a callback, but it has different parameters
/// than expected.
pub fn parse_callback(call: &Call) -> Result<Option<Callback>> {
    log::debug!("callback: {:#?}", call);
    if call.name == "ManiaPlanet.ModeScriptCallbackArray" {
        parse_script_callback(call)
    } else {
        parse_regular_callback(call)
    }
}

fn parse_regular_callback(call: &Call) -> Result<Option<Callback>> {
    match call.name.as_str() {
        "ManiaPlanet.PlayerConnect" => {
            if let [Value::String(login), Value::Bool(is_spectator)] = &call.args[..] {
                return Ok(Some(Callback::PlayerConnect {
                    login: login.clone(),
                    is_spectator: *is_spectator,
                }));
            }
        }
        "ManiaPlanet.BeginMap"
        | "ManiaPlanet.BeginMatch"
        | "ManiaPlanet.EndMap"
        | "ManiaPlanet.EndMatch"
        | "ManiaPlanet.PlayerChat"
        | "ManiaPlanet.PlayerDisconnect"
        | "ManiaPlanet.PlayerInfoChanged"
        | "ManiaPlanet.StatusChanged"
        | "TrackMania.PlayerCheckpoint"
        | "TrackMania.PlayerFinish"
        | "TrackMania.PlayerIncoherence" => {
            // ignore without logging
            return Ok(None);
        }
        _ => {
            log::warn!("ignored callback {:?}", call);
            return Ok(None);
        }
    }

    bail!("unexpected signature for {:?}", call)
}

fn parse_script_callback(call: &Call) -> Result<Option<Callback>> {
    let (cb_name, value_args) = match &call.args[..] {
        [Value::String(cb_name), Value::Array(value_args)] => (cb_name, value_args),
        _ => bail!("unexpected signature for {:?}", call),
    };

    // All arguments of script callbacks are strings.
    let str_args = value_args
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.as_str()),
            _ => Err(anyhow!("expected only String args for {}", cb_name)),
        })
        .collect::<Result<Vec<&str>>>()?;

    let cb = match cb_name.as_str() {
        "Maniaplanet.StartMap_Start" => {
            let data: MapStartEvent = de(cb_name, &str_args)?;
            Callback::MapStart {
                map_uid: data.map.uid,
                restarted: data.restarted,
            }
        }
        "Maniaplanet.StartRound_Start" => {
            let data: RoundStartEvent = de(cb_name, &str_args)?;
            Callback::RoundStart {
                count: data.count,
                time: data.time,
            }
        }
        "Trackmania.Event.WayPoint" => {
            let event: WaypointEvent = de(cb_name, &str_args)?;
            if event.is_finish {
                Callback::PlayerFinish(event)
            } else {
                Callback::PlayerWaypoint(event)
            }
        }
        "Trackmania.Event.GiveUp" => Callback::PlayerGiveUp(de(cb_name, &str_args)?),
        "Trackmania.Scores" => Callback::Scores(de(cb_name, &str_args)?),
        "Maniaplanet.ChannelProgression_End"
        | "Maniaplanet.ChannelProgression_Start"
        | "Maniaplanet.EndMap_End"
        | "Maniaplanet.EndMap_Start"
        | "Maniaplanet.EndMatch_End"
        | "Maniaplanet.EndMatch_Start"
        | "Maniaplanet.EndPlayLoop"
        | "Maniaplanet.EndRound_End"
        | "Maniaplanet.EndRound_Start"
        | "Maniaplanet.EndTurn_End"
        | "Maniaplanet.EndTurn_Start"
        | "Maniaplanet.LoadingMap_End"
        | "Maniaplanet.LoadingMap_Start"
        | "Maniaplanet.Podium_End"
        | "Maniaplanet.Podium_Start"
        | "Maniaplanet.StartMap_End"
        | "Maniaplanet.StartMatch_End"
        | "Maniaplanet.StartMatch_Start"
        | "Maniaplanet.StartPlayLoop"
        | "Maniaplanet.StartRound_End"
        | "Maniaplanet.StartServer_End"
        | "Maniaplanet.StartServer_Start"
        | "Maniaplanet.StartTurn_End"
        | "Maniaplanet.StartTurn_Start"
        | "Maniaplanet.UnloadingMap_End"
        | "Maniaplanet.UnloadingMap_Start"
        | "Trackmania.Event.OnPlayerAdded"
        | "Trackmania.Event.OnPlayerRemoved"
        | "Trackmania.Event.Respawn"
        | "Trackmania.Event.SkipOutro"
        | "Trackmania.Event.StartCountdown"
        | "Trackmania.Event.StartLine"
        | "Trackmania.Event.Stunt" => {
            // ignore without logging
            return Ok(None);
        }
        _ => {
            log::warn!("ignored script callback {:?}", call);
            return Ok(None);
        }
    };

    Ok(Some(cb))
}

/// Deserialize the JSON in the first argument of a script callback.
fn de<T>(cb_name: &str, str_args: &[&str]) -> Result<T>
where
    T: DeserializeOwned,
{
    let json = str_args
        .first()
        .ok_or_else(|| anyhow!("missing args for {}", cb_name))?;
    serde_json::from_str(json).with_context(|| format!("unexpected args for {}", cb_name))
}
