use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use retrobot_frames::FrameConfig;
use retrobot_frames::config::{
    DEFAULT_MAX_FRAME_LENGTH, DEFAULT_PREWRAP_WIDTH, DEFAULT_WORD_WINDOW,
};
use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "retrobot.yaml";
/// Environment variable holding the Discord bot token when the config has none.
pub const DISCORD_TOKEN_ENV: &str = "DISCORD_TOKEN";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub words: WordsConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,

    #[error("invalid streaming config: {0}")]
    Streaming(#[from] retrobot_frames::FrameError),
}

impl Config {
    /// Load the config file, falling back to defaults when it does not exist.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let expanded = expand_env_vars(&contents)?;
        let config: Self = serde_saphyr::from_str(&expanded)?;
        config.streaming.to_frame_config().validate()?;
        Ok(config)
    }
}

/// Resolve a path relative to the config file directory.
///
/// Absolute paths are returned as-is.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_max_frame_length() -> usize {
    DEFAULT_MAX_FRAME_LENGTH
}

fn default_flush_interval_ms() -> u64 {
    1000
}

fn default_word_window() -> usize {
    DEFAULT_WORD_WINDOW
}

fn default_prewrap_width() -> Option<usize> {
    Some(DEFAULT_PREWRAP_WIDTH)
}

fn default_words_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            name: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            api_key_env: Some("GEMINI_API_KEY".to_string()),
            temperature: None,
            max_tokens: None,
        },
        ModelConfig {
            name: "ollama".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.2:3b".to_string(),
            api_key: None,
            api_key_env: None,
            temperature: Some(0.7),
            max_tokens: None,
        },
    ]
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` references in the raw config text.
///
/// - `${VAR}` is required and errors if unset
/// - `${VAR:-default}` falls back to `default` (which may be empty)
/// - `$$` is a literal `$`; a `$` not followed by `{` is kept as-is
///
/// ```yaml
/// discord:
///   bot_token: ${DISCORD_TOKEN}
/// llm:
///   models:
///     - name: local
///       base_url: ${OLLAMA_URL:-http://localhost:11434/v1}
///       model: llama3.2:3b
/// ```
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            result.push('$');
            rest = tail;
        } else if let Some(reference) = after.strip_prefix('{') {
            let end = reference.find('}').ok_or(ConfigError::UnclosedVarReference)?;
            result.push_str(&lookup_var(&reference[..end])?);
            rest = &reference[end + 1..];
        } else {
            result.push('$');
            rest = after;
        }
    }

    result.push_str(rest);
    Ok(result)
}

/// Resolve the inside of a `${...}` reference.
fn lookup_var(reference: &str) -> Result<String, ConfigError> {
    let (name, default) = match reference.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (reference, None),
    };

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_string()),
        (Err(_), None) => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

// ============================================================================
// DiscordConfig
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Falls back to the `DISCORD_TOKEN` environment variable.
    #[serde(default)]
    pub bot_token: Option<String>,
}

impl DiscordConfig {
    pub fn resolve_token(&self) -> Option<String> {
        self.bot_token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| std::env::var(DISCORD_TOKEN_ENV).ok())
    }
}

// ============================================================================
// LlmConfig
// ============================================================================

/// Models tried in order for every prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
        }
    }
}

/// One OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Label used in logs.
    pub name: String,
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable read when `api_key` is not set.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl ModelConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                self.api_key_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok())
            })
    }
}

// ============================================================================
// StreamingConfig
// ============================================================================

/// Frame limits and pacing for streamed answers.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "default_word_window")]
    pub word_window: usize,
    /// `null` disables pre-wrapping of long partial lines.
    #[serde(default = "default_prewrap_width")]
    pub prewrap_width: Option<usize>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            max_frame_length: default_max_frame_length(),
            flush_interval_ms: default_flush_interval_ms(),
            word_window: default_word_window(),
            prewrap_width: default_prewrap_width(),
        }
    }
}

impl StreamingConfig {
    #[must_use]
    pub fn to_frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_frame_length: self.max_frame_length,
            flush_interval: Duration::from_millis(self.flush_interval_ms),
            word_window: self.word_window,
            prewrap_width: self.prewrap_width,
        }
    }
}

// ============================================================================
// WordsConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WordsConfig {
    /// Directory holding `nouns.txt`, `verbs.txt`, `adverbs.txt` and
    /// `adjectives.txt`, relative to the config file.
    #[serde(default = "default_words_dir")]
    pub dir: PathBuf,
}

impl Default for WordsConfig {
    fn default() -> Self {
        Self {
            dir: default_words_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    // ========================================================================
    // Config Tests
    // ========================================================================

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.discord.bot_token.is_none());
        assert_eq!(config.llm.models.len(), 2);
        assert_eq!(config.llm.models[0].model, "gemini-2.5-flash");
        assert_eq!(config.llm.models[1].model, "llama3.2:3b");
        assert_eq!(config.llm.models[1].temperature, Some(0.7));
        assert_eq!(config.streaming.max_frame_length, 2000);
        assert_eq!(config.streaming.flush_interval_ms, 1000);
        assert_eq!(config.words.dir, PathBuf::from("static"));
    }

    #[test]
    fn test_default_streaming_matches_frame_defaults() {
        assert_eq!(
            StreamingConfig::default().to_frame_config(),
            FrameConfig::default()
        );
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let missing_path = tmp_dir.path().join("missing-config.yaml");
        let config = Config::load(&missing_path).await.unwrap();
        assert_eq!(config.streaming.max_frame_length, 2000);
        assert_eq!(config.llm.models.len(), 2);
    }

    #[tokio::test]
    async fn test_load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
discord:
  bot_token: "abc.def"
llm:
  models:
    - name: openai
      base_url: "https://api.openai.com/v1"
      model: "gpt-4o-mini"
      api_key: "sk-test"
      max_tokens: 512
streaming:
  max_frame_length: 4096
  flush_interval_ms: 500
  word_window: 256
  prewrap_width: null
words:
  dir: "words"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.discord.bot_token.as_deref(), Some("abc.def"));
        assert_eq!(config.llm.models.len(), 1);
        assert_eq!(config.llm.models[0].name, "openai");
        assert_eq!(config.llm.models[0].max_tokens, Some(512));
        assert_eq!(config.llm.models[0].resolve_api_key().as_deref(), Some("sk-test"));

        let frames = config.streaming.to_frame_config();
        assert_eq!(frames.max_frame_length, 4096);
        assert_eq!(frames.flush_interval, Duration::from_millis(500));
        assert_eq!(frames.word_window, 256);
        assert_eq!(frames.prewrap_width, None);
        assert_eq!(config.words.dir, PathBuf::from("words"));
    }

    #[tokio::test]
    async fn test_load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
streaming:
  flush_interval_ms: 750
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.streaming.flush_interval_ms, 750);
        assert_eq!(config.streaming.max_frame_length, 2000); // default
        assert_eq!(config.streaming.prewrap_width, Some(1996)); // default
        assert_eq!(config.llm.models.len(), 2); // default
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(file.path()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_rejects_tiny_frames() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "streaming:\n  max_frame_length: 10").unwrap();

        let result = Config::load(file.path()).await;
        assert!(matches!(result, Err(ConfigError::Streaming(_))));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("DISCORD_TOKEN".to_string());
        assert_eq!(
            err.to_string(),
            "environment variable 'DISCORD_TOKEN' is not set"
        );
        assert_eq!(
            ConfigError::UnclosedVarReference.to_string(),
            "unclosed variable reference '${' (missing '}')"
        );
    }

    // ========================================================================
    // Path Resolution Tests
    // ========================================================================

    #[test]
    fn test_resolve_path_absolute() {
        let resolved = resolve_path(Path::new("/etc/retrobot.yaml"), Path::new("/srv/words"));
        assert_eq!(resolved, PathBuf::from("/srv/words"));
    }

    #[test]
    fn test_resolve_path_relative() {
        let resolved = resolve_path(Path::new("/etc/bot/retrobot.yaml"), Path::new("static"));
        assert_eq!(resolved, PathBuf::from("/etc/bot/static"));
    }

    #[test]
    fn test_resolve_path_config_in_current_dir() {
        let resolved = resolve_path(Path::new("retrobot.yaml"), Path::new("static"));
        assert_eq!(resolved, PathBuf::from("static"));
    }

    // ========================================================================
    // Environment Expansion Tests
    // ========================================================================

    #[test]
    fn test_expand_env_vars_no_vars() {
        let input = "plain string without variables";
        assert_eq!(expand_env_vars(input).unwrap(), input);
    }

    #[test]
    fn test_expand_env_vars_required_var() {
        // SAFETY: Single-threaded test
        unsafe { std::env::set_var("RETROBOT_TEST_REQUIRED", "test_value") };
        let result = expand_env_vars("prefix ${RETROBOT_TEST_REQUIRED} suffix").unwrap();
        assert_eq!(result, "prefix test_value suffix");
        unsafe { std::env::remove_var("RETROBOT_TEST_REQUIRED") };
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("RETROBOT_MISSING_12345") };
        match expand_env_vars("value: ${RETROBOT_MISSING_12345}") {
            Err(ConfigError::MissingEnvVar(name)) => assert_eq!(name, "RETROBOT_MISSING_12345"),
            other => panic!("expected MissingEnvVar error, got {other:?}"),
        }
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("RETROBOT_UNSET_DEFAULT") };
        let result = expand_env_vars("url: ${RETROBOT_UNSET_DEFAULT:-http://localhost:11434/v1}");
        assert_eq!(result.unwrap(), "url: http://localhost:11434/v1");
    }

    #[test]
    fn test_expand_env_vars_with_empty_default() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("RETROBOT_UNSET_EMPTY") };
        let result = expand_env_vars("value: ${RETROBOT_UNSET_EMPTY:-}").unwrap();
        assert_eq!(result, "value: ");
    }

    #[test]
    fn test_expand_env_vars_set_var_ignores_default() {
        // SAFETY: Single-threaded test
        unsafe { std::env::set_var("RETROBOT_SET_DEFAULT", "actual") };
        let result = expand_env_vars("value: ${RETROBOT_SET_DEFAULT:-ignored}").unwrap();
        assert_eq!(result, "value: actual");
        unsafe { std::env::remove_var("RETROBOT_SET_DEFAULT") };
    }

    #[test]
    fn test_expand_env_vars_escaped_and_literal_dollar() {
        let result = expand_env_vars("price: $$100, cost $50 and ${RETROBOT_ESC:-value}").unwrap();
        assert_eq!(result, "price: $100, cost $50 and value");
    }

    #[test]
    fn test_expand_env_vars_unclosed_brace() {
        let result = expand_env_vars("token: ${DISCORD_TOKEN");
        assert!(matches!(result, Err(ConfigError::UnclosedVarReference)));
    }

    #[tokio::test]
    async fn test_config_load_with_env_var() {
        // SAFETY: Single-threaded test
        unsafe { std::env::set_var("RETROBOT_TEST_TOKEN", "env_token_value") };

        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
discord:
  bot_token: ${{RETROBOT_TEST_TOKEN}}
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.discord.resolve_token().as_deref(), Some("env_token_value"));

        unsafe { std::env::remove_var("RETROBOT_TEST_TOKEN") };
    }

    #[test]
    fn test_api_key_from_env() {
        // SAFETY: Single-threaded test
        unsafe { std::env::set_var("RETROBOT_TEST_KEY", "from-env") };
        let model = ModelConfig {
            name: "test".to_string(),
            base_url: "http://localhost".to_string(),
            model: "m".to_string(),
            api_key: None,
            api_key_env: Some("RETROBOT_TEST_KEY".to_string()),
            temperature: None,
            max_tokens: None,
        };
        assert_eq!(model.resolve_api_key().as_deref(), Some("from-env"));
        unsafe { std::env::remove_var("RETROBOT_TEST_KEY") };
    }
}
