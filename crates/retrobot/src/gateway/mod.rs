//! Discord gateway: text replies, member greetings and the `/ai` command.

mod ai;
mod handler;
mod sink;

use std::sync::Arc;

use retrobot_frames::FrameConfig;
use serenity::all::GatewayIntents;
use serenity::prelude::*;
use tracing::{error, info};

pub use sink::{InteractionMessage, InteractionSink};

use crate::llm::FallbackChain;
use crate::words::WordLists;
use handler::Handler;

/// Everything event handlers share.
pub struct BotState {
    pub words: WordLists,
    pub llm: FallbackChain,
    pub frames: FrameConfig,
}

pub struct DiscordGateway {
    token: String,
    state: Arc<BotState>,
}

impl DiscordGateway {
    pub fn new(token: impl Into<String>, state: BotState) -> Self {
        Self {
            token: token.into(),
            state: Arc::new(state),
        }
    }

    fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    /// Connect and handle events until Ctrl-C.
    pub async fn run(self) -> Result<(), serenity::Error> {
        let handler = Handler {
            state: self.state.clone(),
        };
        let mut client = Client::builder(&self.token, Self::intents())
            .event_handler(handler)
            .await?;

        let shard_manager = client.shard_manager.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("shutdown signal received");
                    shard_manager.shutdown_all().await;
                }
                Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
            }
        });

        info!("Discord gateway started");
        client.start().await?;
        info!("Discord gateway stopped");
        Ok(())
    }
}
