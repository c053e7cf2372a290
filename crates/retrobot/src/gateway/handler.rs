use std::sync::Arc;

use serenity::all::{
    ChannelId, Command, Context, EventHandler, GuildId, Interaction, Member, Mentionable, Message,
    Ready,
};
use serenity::async_trait;
use serenity::cache::Cache;
use tracing::{debug, info, warn};

use super::{BotState, ai};
use crate::responses::{MessageContext, respond, wants_emojis};

pub(super) struct Handler {
    pub(super) state: Arc<BotState>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let mut message_ctx = MessageContext::default();
        if wants_emojis(&msg.content)
            && let Some(guild_id) = msg.guild_id
        {
            message_ctx.guild_emojis = Some(guild_emojis(&ctx, guild_id).await);
        }

        let replies = {
            let mut rng = rand::rng();
            respond(&msg.content, &message_ctx, &self.state.words, &mut rng)
        };

        for reply in replies {
            if let Err(e) = msg.reply(&ctx, reply).await {
                warn!(error = %e, channel_id = %msg.channel_id, "failed to reply");
                break;
            }
        }
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let Some(channel) = system_channel(&ctx, new_member.guild_id).await else {
            debug!(guild_id = %new_member.guild_id, "no system channel for greeting");
            return;
        };

        let greeting = format!("Welcome {}! o/", new_member.mention());
        if let Err(e) = channel.say(&ctx.http, greeting).await {
            warn!(error = %e, guild_id = %new_member.guild_id, "failed to greet member");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        match command.data.name.as_str() {
            ai::NAME => ai::execute(&ctx, &command, &self.state).await,
            other => debug!(command = other, "ignoring unknown command"),
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            user_id = %ready.user.id,
            guilds = ready.guilds.len(),
            "Discord bot connected"
        );

        if let Err(e) = Command::create_global_command(&ctx.http, ai::register()).await {
            warn!(error = %e, "failed to register /ai command");
        }
    }

    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        for guild in guild_overviews(&ctx.cache, &guilds) {
            info!(
                guild = %guild.name,
                guild_id = %guild.id,
                members = guild.members,
                channels = guild.channels,
                "serving guild"
            );
        }
    }
}

/// What the bot can see of a guild it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GuildOverview {
    id: GuildId,
    name: String,
    members: u64,
    channels: usize,
}

/// Overviews of the cached guilds among `ids`.
fn guild_overviews(cache: &Cache, ids: &[GuildId]) -> Vec<GuildOverview> {
    ids.iter()
        .filter_map(|id| {
            let Some(guild) = cache.guild(*id) else {
                debug!(guild_id = %id, "guild missing from cache");
                return None;
            };
            Some(GuildOverview {
                id: *id,
                name: guild.name.clone(),
                members: guild.member_count,
                channels: guild.channels.len(),
            })
        })
        .collect()
}

/// Custom emojis of a guild, from the cache when possible.
async fn guild_emojis(ctx: &Context, guild_id: GuildId) -> Vec<String> {
    let cached = guild_id
        .to_guild_cached(&ctx.cache)
        .map(|guild| guild.emojis.values().map(ToString::to_string).collect());
    if let Some(emojis) = cached {
        return emojis;
    }

    match guild_id.emojis(&ctx.http).await {
        Ok(emojis) => emojis.iter().map(ToString::to_string).collect(),
        Err(e) => {
            warn!(error = %e, guild_id = %guild_id, "failed to fetch emojis");
            Vec::new()
        }
    }
}

async fn system_channel(ctx: &Context, guild_id: GuildId) -> Option<ChannelId> {
    let cached = guild_id
        .to_guild_cached(&ctx.cache)
        .map(|guild| guild.system_channel_id);
    if let Some(channel) = cached {
        return channel;
    }

    match guild_id.to_partial_guild(&ctx.http).await {
        Ok(guild) => guild.system_channel_id,
        Err(e) => {
            warn!(error = %e, guild_id = %guild_id, "failed to fetch guild");
            None
        }
    }
}
