use serde::Serialize;

use gbx::GameString;

use crate::controller::RankingEntry;
use crate::widget::formatters::*;
use crate::widget::Widget;

/// A widget that is displayed during a race to let players know
/// the top of the live ranking, and their own position in it.
///
/// # Sending
/// - Send this widget to everyone whenever the ranking changes.
/// - Send it to a player once they connect.
#[derive(Serialize, Debug)]
pub struct LiveRankingsWidget<'a> {
    /// The login of the player this widget is displayed for,
    /// or `None` if it is displayed for everyone.
    pub for_login: Option<&'a str>,

    /// The position of `for_login` in the ranking, if they are ranked.
    pub own_pos: Option<usize>,

    /// The number of ranked players.
    pub max_pos: usize,

    /// The top of the ranking.
    pub entries: Vec<LiveRankingsEntry<'a>>,
}

#[derive(Serialize, Debug)]
pub struct LiveRankingsEntry<'a> {
    pub pos: usize,

    #[serde(serialize_with = "format_plain")]
    pub nick_name: &'a GameString,

    /// Either a run time, or a number of points.
    pub score: String,

    #[serde(serialize_with = "format_points_added")]
    pub points_added: Option<i32>,

    /// Laps: the number of crossed checkpoints.
    pub checkpoints: Option<i32>,

    /// Laps: the number of checkpoints this player is behind the leader.
    pub checkpoints_behind: Option<i32>,

    pub finished: bool,

    pub gave_up: bool,
}

impl<'a> LiveRankingsWidget<'a> {
    /// Display the first `max_displayed` entries of the given ranking.
    pub fn new(
        ranking: &'a [RankingEntry],
        for_login: Option<&'a str>,
        max_displayed: usize,
    ) -> Self {
        let own_pos = for_login.and_then(|login| {
            ranking
                .iter()
                .position(|entry| entry.login == login)
                .map(|idx| idx + 1)
        });

        let entries = ranking
            .iter()
            .take(max_displayed)
            .enumerate()
            .map(|(idx, entry)| LiveRankingsEntry::new(idx + 1, entry))
            .collect();

        LiveRankingsWidget {
            for_login,
            own_pos,
            max_pos: ranking.len(),
            entries,
        }
    }
}

impl<'a> LiveRankingsEntry<'a> {
    fn new(pos: usize, entry: &'a RankingEntry) -> Self {
        // Only round-based modes award points.
        let score = match entry.points_added {
            Some(_) => entry.score.to_string(),
            None => fmt_time(entry.score),
        };

        let checkpoints_behind = entry
            .checkpoint_count
            .zip(entry.best_checkpoint_count)
            .map(|(cps, best_cps)| (best_cps - cps).max(0));

        LiveRankingsEntry {
            pos,
            nick_name: &entry.nick_name,
            score,
            points_added: entry.points_added,
            checkpoints: entry.checkpoint_count,
            checkpoints_behind,
            finished: entry.is_finished.unwrap_or(false),
            gave_up: entry.gave_up,
        }
    }
}

impl Widget for LiveRankingsWidget<'_> {
    const ID: &'static str = "live_rankings";
}
