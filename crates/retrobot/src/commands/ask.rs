//! Stream a single prompt to stdout.

use anyhow::{Context, Result};
use tracing::{info, warn};

use retrobot::config::Config;
use retrobot::llm::FallbackChain;
use retrobot::terminal::TerminalSink;
use retrobot_frames::StreamSession;

pub async fn run(prompt: &str, config_path: &str, max_frame_length: Option<usize>) -> Result<()> {
    let mut config = Config::load(config_path)
        .await
        .with_context(|| format!("failed to load {config_path}"))?;

    // CLI overrides config
    if let Some(max) = max_frame_length {
        config.streaming.max_frame_length = max;
    }

    let chain = FallbackChain::from_config(&config.llm);
    let fragments = chain.open(prompt).await?;

    let session = StreamSession::new(
        config.streaming.to_frame_config(),
        TerminalSink::new(std::io::stdout()),
    )?;
    let summary = session.run(fragments).await?;

    if let Some(error) = &summary.source_error {
        warn!(error = %error, "stream ended early");
    }
    info!(
        frames = summary.frames,
        sink_calls = summary.sink_calls(),
        failed_calls = summary.failed_calls,
        "done"
    );
    Ok(())
}
