//! Discord bot command implementation.

use anyhow::{Context, Result};
use tracing::info;

use retrobot::config::{Config, DISCORD_TOKEN_ENV};
use retrobot::gateway::{BotState, DiscordGateway};
use retrobot::llm::FallbackChain;

pub async fn run(config_path: &str) -> Result<()> {
    let config = Config::load(config_path)
        .await
        .with_context(|| format!("failed to load {config_path}"))?;

    let token = config.discord.resolve_token().with_context(|| {
        format!("no Discord token: set discord.bot_token in {config_path} or ${DISCORD_TOKEN_ENV}")
    })?;

    let words = super::load_words(config_path, &config).await;
    let llm = FallbackChain::from_config(&config.llm);
    info!(models = llm.len(), "configured model fallback chain");

    let state = BotState {
        words,
        llm,
        frames: config.streaming.to_frame_config(),
    };

    DiscordGateway::new(token, state)
        .run()
        .await
        .context("Discord client failed")
}
