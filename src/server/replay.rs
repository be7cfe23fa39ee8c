use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::server::*;

type Result<T> = std::result::Result<T, Fault>;

/// A stand-in for the game server, that answers calls with the state
/// set by host directives in a callback log.
pub struct ReplayServer {
    state: RwLock<ReplayState>,
}

#[derive(Default)]
struct ReplayState {
    mode_script: Option<String>,
    points_repartition: Option<Vec<i32>>,
    scores: Option<Scores>,
    nick_names: HashMap<String, GameString>,
}

/// Changes the state of the `ReplayServer` in between callbacks,
/// f.e. when the mode script is switched on the host.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum HostDirective {
    SetMode(String),
    ClearMode,
    SetPointsRepartition(Vec<i32>),
    FailPointsRepartition,
    SetScores(Scores),
    ClearScores,
    SetNickName { login: String, nick_name: String },
}

/// A line in a callback log.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ReplayLine {
    Callback(Call),
    Directive(HostDirective),
}

/// A parsed line in a callback log.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    Callback(Callback),
    Directive(HostDirective),
}

/// Parse a line in a callback log.
///
/// Returns `None` for empty lines, comments starting with `#`,
/// and callbacks that are ignored.
///
/// # Errors
/// Fails if the line is neither a callback nor a host directive,
/// or if a known callback has unexpected arguments.
pub fn parse_replay_line(line: &str) -> anyhow::Result<Option<ReplayStep>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parsed: ReplayLine =
        serde_json::from_str(line).with_context(|| format!("unexpected replay line: {}", line))?;

    match parsed {
        ReplayLine::Callback(call) => Ok(parse_callback(&call)?.map(ReplayStep::Callback)),
        ReplayLine::Directive(directive) => Ok(Some(ReplayStep::Directive(directive))),
    }
}

impl ReplayServer {
    pub fn new(mode_script: &str, points_repartition: Vec<i32>) -> Self {
        let state = ReplayState {
            mode_script: Some(mode_script.to_string()),
            points_repartition: Some(points_repartition),
            ..ReplayState::default()
        };
        ReplayServer {
            state: RwLock::new(state),
        }
    }

    pub async fn apply(&self, directive: HostDirective) {
        log::debug!("host: {:?}", &directive);
        let mut state = self.state.write().await;
        match directive {
            HostDirective::SetMode(script) => state.mode_script = Some(script),
            HostDirective::ClearMode => state.mode_script = None,
            HostDirective::SetPointsRepartition(points) => state.points_repartition = Some(points),
            HostDirective::FailPointsRepartition => state.points_repartition = None,
            HostDirective::SetScores(scores) => state.scores = Some(scores),
            HostDirective::ClearScores => state.scores = None,
            HostDirective::SetNickName { login, nick_name } => {
                let _ = state.nick_names.insert(login, GameString::from(nick_name));
            }
        }
    }

    pub async fn set_mode(&self, script: &str) {
        self.apply(HostDirective::SetMode(script.to_string())).await
    }

    pub async fn set_points_repartition(&self, points: Vec<i32>) {
        self.apply(HostDirective::SetPointsRepartition(points)).await
    }

    pub async fn clear_mode(&self) {
        self.apply(HostDirective::ClearMode).await
    }

    pub async fn fail_points_repartition(&self) {
        self.apply(HostDirective::FailPointsRepartition).await
    }

    pub async fn set_scores(&self, scores: Scores) {
        self.apply(HostDirective::SetScores(scores)).await
    }

    pub async fn set_nick_name(&self, login: &str, nick_name: &str) {
        self.apply(HostDirective::SetNickName {
            login: login.to_string(),
            nick_name: nick_name.to_string(),
        })
        .await
    }
}

fn fault(msg: &str) -> Fault {
    Fault {
        code: -1000,
        msg: msg.to_string(),
    }
}

#[async_trait]
impl Calls for ReplayServer {
    async fn mode(&self) -> Result<ModeInfo> {
        let state = self.state.read().await;
        match &state.mode_script {
            Some(script) => Ok(ModeInfo {
                script_name: script.clone(),
                compatible_map_types: "TrackMania\\TM_Race,TM_Race".to_string(),
                version: String::new(),
            }),
            None => Err(fault("No current script")),
        }
    }

    async fn scores(&self) -> Result<Scores> {
        self.state
            .read()
            .await
            .scores
            .clone()
            .ok_or_else(|| fault("Scores are not available"))
    }

    async fn points_repartition(&self) -> Result<Vec<i32>> {
        self.state
            .read()
            .await
            .points_repartition
            .clone()
            .ok_or_else(|| fault("Points repartition is not available"))
    }

    async fn player_info(&self, login: &str) -> Result<PlayerInfo> {
        self.state
            .read()
            .await
            .nick_names
            .get(login)
            .map(|nick_name| PlayerInfo {
                login: login.to_string(),
                nick_name: nick_name.clone(),
            })
            .ok_or_else(|| fault("Login unknown."))
    }
}
