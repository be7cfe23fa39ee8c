use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::controller::{LivePoints, Mode, RankingError};
use crate::server::{GameString, PlayerInfo, Score, Scores, WaypointEvent};

/// Use to lookup the ranking of the current map.
#[async_trait]
pub trait LiveRanking: Send + Sync {
    /// While holding this guard, the state is read-only, and can be referenced.
    async fn lock(&self) -> RwLockReadGuard<'_, RankingState>;

    /// A copy of the current ranking, sorted from best to worst.
    async fn snapshot(&self) -> Vec<RankingEntry> {
        self.lock().await.entries().cloned().collect()
    }

    /// The position of a player in the ranking, starting at `1`.
    async fn rank_of(&self, login: &str) -> Option<usize> {
        self.lock().await.ranking.get_index_of(login).map(|idx| idx + 1)
    }

    /// A copy of the finishes in the current round.
    async fn finishes(&self) -> Vec<FinishEntry> {
        self.lock().await.finishes.clone()
    }
}

#[derive(Default, Debug)]
pub struct RankingState {
    /// Ranked players mapped by their login, and sorted with
    /// the order of the active mode.
    pub ranking: IndexMap<String, RankingEntry>,

    /// Players that finished in the current round, in the order
    /// they crossed the finish line. Only used in round-based modes.
    pub finishes: Vec<FinishEntry>,
}

impl RankingState {
    /// The ranking sorted from best to worst.
    pub fn entries(&self) -> impl Iterator<Item = &RankingEntry> {
        self.ranking.values()
    }

    /// The checkpoint count of the player at the top of the ranking,
    /// or zero if there is none.
    fn leader_checkpoint_count(&self) -> i32 {
        self.ranking
            .get_index(0)
            .and_then(|(_, entry)| entry.checkpoint_count)
            .unwrap_or(0)
    }

    fn sort_by_time(&mut self) {
        self.ranking.sort_by(|_, a, _, b| cmp_time(a, b));
    }

    fn sort_by_points(&mut self) {
        self.ranking.sort_by(|_, a, _, b| cmp_points(a, b));
    }

    fn sort_by_progress(&mut self) {
        self.ranking.sort_by(|_, a, _, b| cmp_progress(a, b));
    }
}

/// A player's entry in the ranking of the current map.
///
/// Which of the optional fields are set depends on the mode.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub login: String,

    pub nick_name: GameString,

    /// - Time Attack: the best run time in milliseconds.
    /// - Laps: the race time at the last checkpoint in milliseconds.
    /// - Round-based: the points on the current map.
    pub score: i32,

    /// Round-based: the points awarded for the last finish.
    pub points_added: Option<i32>,

    /// Laps: the number of checkpoints crossed in this race.
    pub checkpoint_count: Option<i32>,

    /// Laps: the checkpoint count of the leading player at the
    /// time this player crossed their last checkpoint.
    pub best_checkpoint_count: Option<i32>,

    /// Laps: `true` if the player crossed the finish line.
    pub is_finished: Option<bool>,

    /// Laps: the race times at each crossed checkpoint.
    pub checkpoint_times: Vec<i32>,

    /// Laps: `true` if the player gave up.
    pub gave_up: bool,
}

impl RankingEntry {
    fn new(login: String, nick_name: GameString, score: i32) -> Self {
        RankingEntry {
            login,
            nick_name,
            score,
            points_added: None,
            checkpoint_count: None,
            best_checkpoint_count: None,
            is_finished: None,
            checkpoint_times: Vec::new(),
            gave_up: false,
        }
    }
}

/// A player that crossed the finish line in the current round.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishEntry {
    pub login: String,
    pub nick_name: GameString,

    /// The race time in milliseconds.
    pub score: i32,

    /// The points awarded for this finish.
    pub points_added: i32,
}

/// Faster times first.
fn cmp_time(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    a.score.cmp(&b.score)
}

/// More points first, then more recently added points.
fn cmp_points(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    b.score.cmp(&a.score).then_with(|| {
        b.points_added
            .unwrap_or(0)
            .cmp(&a.points_added.unwrap_or(0))
    })
}

/// More checkpoints first, then faster times.
fn cmp_progress(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    b.checkpoint_count
        .unwrap_or(0)
        .cmp(&a.checkpoint_count.unwrap_or(0))
        .then_with(|| a.score.cmp(&b.score))
}

#[derive(Clone)]
pub struct RankingController {
    state: Arc<RwLock<RankingState>>,
    live_points: Arc<dyn LivePoints>,
}

impl RankingController {
    pub fn init(live_points: &Arc<dyn LivePoints>) -> Self {
        RankingController {
            state: Arc::new(RwLock::new(RankingState::default())),
            live_points: live_points.clone(),
        }
    }

    /// Clear the ranking and the finishes for a new map.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.ranking.clear();
        state.finishes.clear();
    }

    /// Clear the finishes for a new round.
    pub async fn clear_finishes(&self) {
        self.state.write().await.finishes.clear();
    }

    /// Replace the entire ranking with the scores sent by the server.
    ///
    /// Scores in the "PreEndRound" section are ignored: they would remove
    /// the added points of the round before the points are actually awarded.
    ///
    /// Returns `true` if the ranking was replaced.
    pub async fn apply_scores(&self, mode: Mode, scores: &Scores) -> bool {
        if scores.is_pre_end_round() {
            return false;
        }

        let normalized = scores.entries.iter().map(Score::normalize);
        let entries: Vec<RankingEntry> = match mode {
            Mode::TimeAttack => normalized
                .filter_map(|score| {
                    let millis = score.best_time_millis?;
                    Some(RankingEntry::new(score.login, score.nick_name, millis))
                })
                .collect(),
            Mode::RoundBased => normalized
                .filter_map(|score| {
                    let points = score.map_points?;
                    let mut entry = RankingEntry::new(score.login, score.nick_name, points);
                    entry.points_added = Some(0);
                    Some(entry)
                })
                .collect(),
            Mode::Laps | Mode::Unsupported => return false,
        };

        let mut state = self.state.write().await;
        state.ranking = entries
            .into_iter()
            .map(|entry| (entry.login.clone(), entry))
            .collect();
        match mode {
            Mode::TimeAttack => state.sort_by_time(),
            _ => state.sort_by_points(),
        }
        true
    }

    /// Update the ranking when a player crosses a checkpoint.
    ///
    /// Returns `true` if the ranking was updated, which is only
    /// the case in the Laps mode.
    pub async fn on_waypoint(&self, mode: Mode, player: &PlayerInfo, ev: &WaypointEvent) -> bool {
        if !mode.ranks_waypoints() {
            return false;
        }
        self.update_progress(player, ev).await;
        true
    }

    /// Update the ranking when a player gives up their run.
    ///
    /// Returns `true` if the ranking was updated, which is only
    /// the case in the Laps mode.
    pub async fn on_give_up(&self, mode: Mode, player_login: &str) -> bool {
        if !mode.ranks_waypoints() {
            return false;
        }
        let mut state = self.state.write().await;
        if let Some(entry) = state.ranking.get_mut(player_login) {
            entry.gave_up = true;
        }
        true
    }

    /// Update the ranking when a player crosses the finish line.
    ///
    /// Returns `true` if the ranking was updated.
    ///
    /// # Errors
    /// Fails in round-based modes if there is no points repartition,
    /// in which case the finish is not recorded.
    pub async fn on_finish(
        &self,
        mode: Mode,
        player: &PlayerInfo,
        ev: &WaypointEvent,
    ) -> Result<bool, RankingError> {
        match mode {
            Mode::Laps => {
                // A finish is the last waypoint of the race.
                self.update_progress(player, ev).await;
                Ok(true)
            }
            Mode::TimeAttack => Ok(self.update_time(player, ev.lap_time_millis).await),
            Mode::RoundBased => {
                self.add_finish(player, ev.race_time_millis).await?;
                Ok(true)
            }
            Mode::Unsupported => Ok(false),
        }
    }

    async fn update_progress(&self, player: &PlayerInfo, ev: &WaypointEvent) {
        let mut state = self.state.write().await;

        match state.ranking.get_mut(&player.login) {
            Some(entry) => {
                entry.score = ev.race_time_millis;
                entry.checkpoint_count = Some(ev.cp_index + 1);
                entry.is_finished = Some(ev.is_finish);
                entry.checkpoint_times = ev.race_time_cp_millis.clone();
                entry.gave_up = false;

                // The leader is looked up after updating this player, who
                // might be the leader themselves.
                let leader_cps = state.leader_checkpoint_count();
                if let Some(entry) = state.ranking.get_mut(&player.login) {
                    entry.best_checkpoint_count = Some(leader_cps);
                }
            }
            None => {
                let leader_cps = state.leader_checkpoint_count();
                let mut entry = RankingEntry::new(
                    player.login.clone(),
                    player.nick_name.clone(),
                    ev.race_time_millis,
                );
                entry.checkpoint_count = Some(ev.cp_index + 1);
                entry.best_checkpoint_count = Some(leader_cps);
                entry.is_finished = Some(ev.is_finish);
                entry.checkpoint_times = ev.race_time_cp_millis.clone();
                state.ranking.insert(player.login.clone(), entry);
            }
        }

        state.sort_by_progress();
    }

    /// Only keeps a player's best time. Returns `false` if the given time
    /// did not improve the player's time.
    async fn update_time(&self, player: &PlayerInfo, millis: i32) -> bool {
        let mut state = self.state.write().await;

        match state.ranking.get_mut(&player.login) {
            Some(entry) if millis >= entry.score => return false,
            Some(entry) => entry.score = millis,
            None => {
                let entry = RankingEntry::new(player.login.clone(), player.nick_name.clone(), millis);
                state.ranking.insert(player.login.clone(), entry);
            }
        }

        state.sort_by_time();
        true
    }

    /// Award points to a player by their finish position in this round.
    ///
    /// The points are not added to the player's score here. Instead,
    /// the updated scores are sent by the server at the end of the round.
    async fn add_finish(&self, player: &PlayerInfo, race_millis: i32) -> Result<(), RankingError> {
        let mut state = self.state.write().await;

        let rank = state.finishes.len();
        let points_added = self.live_points.points_for_rank(rank).await?;

        state.finishes.push(FinishEntry {
            login: player.login.clone(),
            nick_name: player.nick_name.clone(),
            score: race_millis,
            points_added,
        });

        match state.ranking.get_mut(&player.login) {
            Some(entry) => entry.points_added = Some(points_added),
            None => {
                // This player finished before being part of any scores.
                let mut entry = RankingEntry::new(player.login.clone(), player.nick_name.clone(), 0);
                entry.points_added = Some(points_added);
                state.ranking.insert(player.login.clone(), entry);
            }
        }

        state.sort_by_points();
        Ok(())
    }
}

#[async_trait]
impl LiveRanking for RankingController {
    async fn lock(&self) -> RwLockReadGuard<'_, RankingState> {
        self.state.read().await
    }
}
