//! Frame sink backed by a deferred slash-command response.

use std::sync::Arc;

use async_trait::async_trait;
use retrobot_frames::{Sink, SinkError, SinkOp};
use serenity::all::{
    CommandInteraction, CreateInteractionResponseFollowup, EditInteractionResponse, MessageId,
};
use serenity::http::Http;

/// A message belonging to one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMessage {
    /// The deferred response itself.
    Original,
    /// An ephemeral follow-up.
    Followup(MessageId),
}

/// Writes frames into an interaction: the first frame fills the deferred
/// response, later frames become ephemeral follow-ups.
pub struct InteractionSink {
    http: Arc<Http>,
    interaction: CommandInteraction,
}

impl InteractionSink {
    pub fn new(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self { http, interaction }
    }

    async fn edit_original(&self, content: &str) -> serenity::Result<()> {
        self.interaction
            .edit_response(&self.http, EditInteractionResponse::new().content(content))
            .await
            .map(|_| ())
    }
}

fn sink_error(op: SinkOp) -> impl FnOnce(serenity::Error) -> SinkError {
    move |e| SinkError::new(op, e.to_string())
}

#[async_trait]
impl Sink for InteractionSink {
    type Handle = InteractionMessage;

    async fn send(&self, content: &str) -> Result<InteractionMessage, SinkError> {
        self.edit_original(content)
            .await
            .map_err(sink_error(SinkOp::Send))?;
        Ok(InteractionMessage::Original)
    }

    async fn edit(&self, handle: &InteractionMessage, content: &str) -> Result<bool, SinkError> {
        match handle {
            InteractionMessage::Original => self.edit_original(content).await,
            InteractionMessage::Followup(id) => self
                .interaction
                .edit_followup(
                    &self.http,
                    *id,
                    CreateInteractionResponseFollowup::new().content(content),
                )
                .await
                .map(|_| ()),
        }
        .map_err(sink_error(SinkOp::Edit))?;
        Ok(true)
    }

    async fn reply(
        &self,
        _handle: &InteractionMessage,
        content: &str,
    ) -> Result<InteractionMessage, SinkError> {
        let message = self
            .interaction
            .create_followup(
                &self.http,
                CreateInteractionResponseFollowup::new()
                    .content(content)
                    .ephemeral(true),
            )
            .await
            .map_err(sink_error(SinkOp::Reply))?;
        Ok(InteractionMessage::Followup(message.id))
    }
}
