use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::controller::{Mode, RankingError};
use crate::server::Server;

/// Use to lookup the points that are awarded for finishing a round.
#[async_trait]
pub trait LivePoints: Send + Sync {
    /// While holding this guard, the state is read-only, and can be referenced.
    async fn lock(&self) -> RwLockReadGuard<'_, PointsState>;

    /// The points awarded to the finisher at the given rank,
    /// where rank `0` is the first finisher.
    async fn points_for_rank(&self, rank: usize) -> Result<i32, RankingError> {
        self.lock().await.points_for_rank(rank)
    }
}

#[derive(Default, Debug)]
pub struct PointsState {
    /// Points awarded by finish position, starting with the first finisher.
    /// Empty if the current mode does not award points.
    repartition: Vec<i32>,
}

impl PointsState {
    /// Finishers beyond the length of the repartition are awarded
    /// the points of its last position.
    pub fn points_for_rank(&self, rank: usize) -> Result<i32, RankingError> {
        self.repartition
            .get(rank)
            .or_else(|| self.repartition.last())
            .copied()
            .ok_or(RankingError::EmptyRepartition { rank })
    }

    pub fn repartition(&self) -> &[i32] {
        &self.repartition
    }
}

#[derive(Clone)]
pub struct PointsController {
    server: Arc<dyn Server>,
    state: Arc<RwLock<PointsState>>,
}

impl PointsController {
    pub fn init(server: &Arc<dyn Server>) -> Self {
        PointsController {
            server: server.clone(),
            state: Arc::new(RwLock::new(PointsState::default())),
        }
    }

    /// Fetch the points repartition if the given mode awards points,
    /// or clear it otherwise.
    ///
    /// Returns `false` if the mode does not award points, in which case
    /// the finishes of the current round should be dropped as well.
    ///
    /// If the repartition cannot be fetched, the previous one is kept.
    pub async fn refresh(&self, mode: Mode) -> Result<bool, RankingError> {
        if !mode.uses_points() {
            self.state.write().await.repartition.clear();
            return Ok(false);
        }

        let repartition = self
            .server
            .points_repartition()
            .await
            .map_err(RankingError::RepartitionUnavailable)?;

        if repartition.is_empty() {
            log::warn!("server returned an empty points repartition");
        }
        log::debug!("points repartition: {:?}", &repartition);

        self.state.write().await.repartition = repartition;
        Ok(true)
    }
}

#[async_trait]
impl LivePoints for PointsController {
    async fn lock(&self) -> RwLockReadGuard<'_, PointsState> {
        self.state.read().await
    }
}
