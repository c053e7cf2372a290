//! The `/ai prompt:<text>` slash command.

use retrobot_frames::StreamSession;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    EditInteractionResponse, ResolvedValue,
};
use tracing::{info, warn};

use super::BotState;
use super::sink::InteractionSink;

pub const NAME: &str = "ai";
const PROMPT_OPTION: &str = "prompt";

const UNAVAILABLE: &str = "Sorry, no model is available right now.";
const EMPTY_ANSWER: &str = "The model had nothing to say.";

/// Global command definition.
pub fn register() -> CreateCommand {
    CreateCommand::new(NAME)
        .description("Prompt Gemini 2.5 Flash, or fall back to llama3.2:3b.")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                PROMPT_OPTION,
                "A question or prompt for the LLM",
            )
            .required(true),
        )
}

fn prompt(command: &CommandInteraction) -> Option<String> {
    command
        .data
        .options()
        .into_iter()
        .find(|option| option.name == PROMPT_OPTION)
        .and_then(|option| match option.value {
            ResolvedValue::String(text) => Some(text.to_string()),
            _ => None,
        })
}

/// Defer an ephemeral reply, then stream the model's answer into it.
pub async fn execute(ctx: &Context, command: &CommandInteraction, state: &BotState) {
    let Some(prompt) = prompt(command) else {
        warn!(command = %command.data.name, "missing prompt option");
        return;
    };

    // Discord wants an answer within 3 seconds; the stream takes longer.
    if let Err(e) = command.defer_ephemeral(&ctx.http).await {
        warn!(error = %e, "failed to defer interaction");
        return;
    }

    let fragments = match state.llm.open(&prompt).await {
        Ok(fragments) => fragments,
        Err(e) => {
            warn!(error = %e, "no model could answer");
            edit_original(ctx, command, UNAVAILABLE).await;
            return;
        }
    };

    let sink = InteractionSink::new(ctx.http.clone(), command.clone());
    let result = match StreamSession::new(state.frames.clone(), sink) {
        Ok(session) => session.run(fragments).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            info!(
                user = %command.user.name,
                frames = summary.frames,
                sink_calls = summary.sink_calls(),
                failed_calls = summary.failed_calls,
                dropped_frames = summary.dropped_frames,
                source_error = summary.source_error.as_deref(),
                "answered /ai"
            );
            if summary.frames == 0 {
                edit_original(ctx, command, EMPTY_ANSWER).await;
            }
        }
        Err(e) => {
            warn!(error = %e, "stream session failed");
            edit_original(ctx, command, UNAVAILABLE).await;
        }
    }
}

async fn edit_original(ctx: &Context, command: &CommandInteraction, content: &str) {
    let builder = EditInteractionResponse::new().content(content);
    if let Err(e) = command.edit_response(&ctx.http, builder).await {
        warn!(error = %e, "failed to edit interaction response");
    }
}
