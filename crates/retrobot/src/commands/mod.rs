//! CLI command implementations.

use std::path::Path;

use tracing::warn;

use retrobot::config::{self, Config};
use retrobot::words::WordLists;

pub mod ask;
pub mod serve;

/// Load word lists from the configured directory, resolved against the
/// config file. The bot still runs without them; `.acr` then echoes letters.
async fn load_words(config_path: &str, config: &Config) -> WordLists {
    let dir = config::resolve_path(Path::new(config_path), &config.words.dir);
    match WordLists::load(&dir).await {
        Ok(words) => words,
        Err(e) => {
            warn!(error = %e, "word lists unavailable");
            WordLists::default()
        }
    }
}
