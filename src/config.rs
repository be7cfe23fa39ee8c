use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

/// The environment variable that points to the config file.
pub const CONFIG_ENV_VAR: &str = "LIVE_RANKINGS_CONFIG";

/// Limits the amount of top race ranks displayed.
///
/// This should be as low as necessary to display it in a widget
/// with limited vertical space.
pub const DEFAULT_MAX_DISPLAYED_RANKS: usize = 10;

/// Live rankings config.
#[derive(Deserialize, Debug)]
pub struct Config {
    /// A file of recorded callbacks and host directives, one JSON
    /// document per line, that will be replayed in order.
    pub callback_log: PathBuf,

    /// The number of top ranks that are displayed.
    #[serde(default = "default_max_displayed_ranks")]
    pub max_displayed_ranks: usize,

    /// The name of the mode script that is active when the replay starts,
    /// f.e. "Trackmania/TM_Rounds_Online.Script.txt".
    pub initial_mode_script: String,

    /// The points repartition that is active when the replay starts.
    #[serde(default)]
    pub initial_points_repartition: Vec<i32>,
}

fn default_max_displayed_ranks() -> usize {
    DEFAULT_MAX_DISPLAYED_RANKS
}

impl Config {
    /// Read the config file listed in the `LIVE_RANKINGS_CONFIG` environment variable.
    ///
    /// # Errors
    /// - when `LIVE_RANKINGS_CONFIG` is not set, or not pointing to a file
    /// - when the file is not a valid TOML config
    /// - when a check on one or more values fails
    pub fn read_from_env() -> Result<Config> {
        let env_file = std::env::var(CONFIG_ENV_VAR)
            .ok()
            .map(PathBuf::from)
            .filter(|p| p.is_file())
            .with_context(|| format!("cannot locate config: use the '{}' env var", CONFIG_ENV_VAR))?;

        let f_str = std::fs::read_to_string(&env_file)
            .with_context(|| format!("failed to read config file {:?}", env_file))?;
        let config = Config::parse(&f_str)?;
        Ok(config)
    }

    /// Parse a TOML config.
    pub fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config file")?;
        check_config(&config)?;
        Ok(config)
    }
}

/// Try to catch configuration errors early.
fn check_config(config: &Config) -> Result<()> {
    ensure!(
        config.max_displayed_ranks > 0,
        "config: 'max_displayed_ranks' must be larger than zero!"
    );
    ensure!(
        config.initial_points_repartition.iter().all(|p| *p >= 0),
        "config: 'initial_points_repartition' must not contain negative points!"
    );
    Ok(())
}
