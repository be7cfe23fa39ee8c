use async_trait::async_trait;

use crate::controller::RankingEntry;
use crate::server::PlayerInfo;
use crate::widget::{LiveRankingsWidget, RankingSink, Widget};

/// Writes the rendered live rankings widget to the log.
pub struct LogSink {
    max_displayed: usize,
}

impl LogSink {
    pub fn new(max_displayed: usize) -> Self {
        LogSink { max_displayed }
    }
}

#[async_trait]
impl RankingSink for LogSink {
    async fn display(
        &self,
        ranking: &[RankingEntry],
        player: Option<&PlayerInfo>,
    ) -> anyhow::Result<()> {
        let for_login = player.map(|p| p.login.as_str());
        let widget = LiveRankingsWidget::new(ranking, for_login, self.max_displayed);
        let rendered = widget.render()?;
        match for_login {
            Some(login) => log::info!("live rankings @{}> {}", login, rendered),
            None => log::info!("live rankings> {}", rendered),
        }
        Ok(())
    }
}
