use std::sync::Arc;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::sync::mpsc;

use live_rankings::config::Config;
use live_rankings::controller::Controller;
use live_rankings::server::{parse_replay_line, ReplayServer, ReplayStep, Server};
use live_rankings::widget::{LogSink, RankingSink};

/// Replays a callback log through the live rankings, and writes
/// the widget output of every ranking change to the log.
#[tokio::main]
async fn main() -> Result<()> {
    // Read environment variables from an '.env' file in the working directory.
    // We use these env vars:
    //  - RUST_LOG
    //  - LIVE_RANKINGS_CONFIG
    let using_env_file = dotenv().is_ok();

    env_logger::init(); // Use log::* to write to stderr

    if using_env_file {
        log::info!("using .env file")
    }

    let config = Config::read_from_env()?;
    log::debug!("{:#?}", &config);

    let callback_log = tokio::fs::read_to_string(&config.callback_log)
        .await
        .with_context(|| format!("failed to read callback log {:?}", &config.callback_log))?;

    let replay = Arc::new(ReplayServer::new(
        &config.initial_mode_script,
        config.initial_points_repartition.clone(),
    ));
    let server = replay.clone() as Arc<dyn Server>;
    let sink = Arc::new(LogSink::new(config.max_displayed_ranks)) as Arc<dyn RankingSink>;

    let controller = Controller::init(server, sink).await;

    let (steps_out, mut steps_in) = mpsc::unbounded_channel::<ReplayStep>();
    let reader = tokio::spawn(async move {
        let mut nb_skipped = 0;
        for (idx, line) in callback_log.lines().enumerate() {
            match parse_replay_line(line) {
                Ok(Some(step)) => {
                    if steps_out.send(step).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    log::error!("skipped line {}: {:#}", idx + 1, err);
                    nb_skipped += 1;
                }
            }
        }
        nb_skipped
    });

    log::info!("replaying {:?}...", &config.callback_log);
    while let Some(step) = steps_in.recv().await {
        match step {
            ReplayStep::Directive(directive) => replay.apply(directive).await,
            ReplayStep::Callback(callback) => controller.on_server_event(callback).await,
        }
    }

    let nb_skipped = reader.await.context("callback log reader panicked")?;

    let ranking = controller.live_ranking().snapshot().await;
    log::info!(
        "replay finished with {} ranked players ({} lines skipped)",
        ranking.len(),
        nb_skipped
    );
    Ok(())
}
