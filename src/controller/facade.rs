use std::sync::Arc;

use crate::controller::*;
use crate::server::{GameString, PlayerInfo, Server, ServerEvent};
use crate::widget::RankingSink;

/// This facade hides the ranking and points controllers behind one
/// interface that can react to server events.
///
/// Events must be passed one at a time: the next event should only be passed
/// once the future of the previous one has completed.
#[derive(Clone)]
pub struct Controller {
    server: Arc<dyn Server>,
    sink: Arc<dyn RankingSink>,
    points: PointsController,
    ranking: RankingController,
}

impl Controller {
    pub async fn init(server: Arc<dyn Server>, sink: Arc<dyn RankingSink>) -> Controller {
        let points = PointsController::init(&server);
        let live_points = Arc::new(points.clone()) as Arc<dyn LivePoints>;

        let ranking = RankingController::init(&live_points);

        let controller = Controller {
            server,
            sink,
            points,
            ranking,
        };

        controller.display(None).await;

        // The mode script might not provide scores yet, f.e. right after
        // the server started. The ranking will fill up with the next events.
        match controller.server.scores().await {
            Ok(scores) => {
                let mode = controller.mode().await;
                if controller.ranking.apply_scores(mode, &scores).await {
                    controller.display(None).await;
                }
            }
            Err(fault) => log::warn!("{}", RankingError::SnapshotUnavailable(fault)),
        }

        let mode = controller.mode().await;
        controller.refresh_points(mode).await;

        controller
    }

    /// Use to lookup the current ranking.
    pub fn live_ranking(&self) -> Arc<dyn LiveRanking> {
        Arc::new(self.ranking.clone())
    }

    /// Update the live rankings, and display them if they changed.
    pub async fn on_server_event(&self, event: ServerEvent) {
        log::debug!("{:#?}", &event);

        // Always ask for the mode: the mode script can change in between
        // maps without us being notified.
        let mode = self.mode().await;

        match event {
            ServerEvent::MapStart { map_uid, restarted } => {
                let verb = if restarted { "restart" } else { "start" };
                log::info!("{} map {} in mode {:?}", verb, map_uid, mode);
                self.ranking.reset().await;
                self.refresh_points(mode).await;
                self.display(None).await;
            }

            ServerEvent::RoundStart { count, .. } => {
                log::debug!("start round {}", count);
                self.ranking.clear_finishes().await;
                self.refresh_points(mode).await;
            }

            ServerEvent::PlayerConnect { login, .. } => {
                let player = self.player(&login).await;
                self.display(Some(&player)).await;
            }

            ServerEvent::PlayerWaypoint(ev) => {
                if !mode.ranks_waypoints() {
                    return;
                }
                let player = self.player(&ev.player_login).await;
                if self.ranking.on_waypoint(mode, &player, &ev).await {
                    self.display(None).await;
                }
            }

            ServerEvent::PlayerFinish(ev) => {
                if !mode.is_supported() {
                    return;
                }
                let player = self.player(&ev.player_login).await;
                match self.ranking.on_finish(mode, &player, &ev).await {
                    Ok(true) => self.display(None).await,
                    Ok(false) => {}
                    Err(err) => log::error!("failed to rank finish of {}: {}", &player.login, err),
                }
            }

            ServerEvent::PlayerGiveUp(ev) => {
                if self.ranking.on_give_up(mode, &ev.player_login).await {
                    self.display(None).await;
                }
            }

            ServerEvent::Scores(scores) => {
                if self.ranking.apply_scores(mode, &scores).await {
                    self.display(None).await;
                }
            }
        }
    }

    /// The mode of the running mode script. Rankings stay dormant
    /// with `Mode::Unsupported`, which is also used if the mode script
    /// cannot be determined.
    async fn mode(&self) -> Mode {
        let script_name = match self.server.mode().await {
            Ok(info) => info.script_name,
            Err(fault) => {
                log::warn!("{}", RankingError::ModeUnavailable(fault));
                return Mode::Unsupported;
            }
        };
        let mode = Mode::from_script(&script_name);
        if !mode.is_supported() {
            log::debug!("{}", RankingError::UnsupportedMode(script_name));
        }
        mode
    }

    /// Refresh the points repartition, and drop the finishes of the
    /// current round if the mode does not award points.
    async fn refresh_points(&self, mode: Mode) {
        match self.points.refresh(mode).await {
            Ok(true) => {}
            Ok(false) => self.ranking.clear_finishes().await,
            Err(err) => log::warn!("{}", err),
        }
    }

    /// Callbacks only include player logins. If the nick name cannot
    /// be looked up, the login is used instead.
    async fn player(&self, login: &str) -> PlayerInfo {
        match self.server.player_info(login).await {
            Ok(info) => info,
            Err(fault) => {
                log::debug!("failed to lookup player {}: {}", login, fault);
                PlayerInfo {
                    login: login.to_string(),
                    nick_name: GameString::from(login.to_string()),
                }
            }
        }
    }

    /// Send the current ranking to the sink, optionally for a specific player.
    async fn display(&self, player: Option<&PlayerInfo>) {
        let ranking = self.ranking.snapshot().await;
        if let Err(err) = self.sink.display(&ranking, player).await {
            log::warn!("failed to display live rankings: {:#}", err);
        }
    }
}
