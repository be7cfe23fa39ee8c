use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;

pub use live_rankings::*;
pub use log_sink::*;

use crate::controller::RankingEntry;
use crate::server::PlayerInfo;

mod formatters;
mod live_rankings;
mod log_sink;

/// Consumes the live rankings whenever they change.
///
/// Failing to display the rankings does not affect them in any way.
#[async_trait]
pub trait RankingSink: Send + Sync {
    /// Display the given ranking, which is sorted from best to worst.
    ///
    /// If a player is given, the ranking only has to be displayed
    /// for that player, f.e. because they just connected.
    async fn display(
        &self,
        ranking: &[RankingEntry],
        player: Option<&PlayerInfo>,
    ) -> anyhow::Result<()>;
}

pub trait Widget
where
    Self: Serialize + Sized + Debug,
{
    /// Identifies this widget, so that sending a widget with the same ID
    /// replaces the previous one.
    const ID: &'static str;

    /// Render the widget context, extended by
    /// - `widget_id`: the `ID` of this widget
    fn render(&self) -> anyhow::Result<String> {
        log::debug!("render widget context: {:?}", &self);

        let mut ctxt = serde_json::to_value(self)?;
        if let serde_json::Value::Object(map) = &mut ctxt {
            map.insert("widget_id".to_string(), Self::ID.into());
        }
        Ok(serde_json::to_string(&ctxt)?)
    }
}
