use smartbot_types::{
    ConfigError, DEFAULT_API_URL, DEFAULT_CHAT_MODEL, DEFAULT_STT_MODEL, DEFAULT_TTS_MODEL,
    DEFAULT_TTS_VOICE,
};

use crate::cli::Cli;

/// Environment variable holding the one required credential
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Resolved application configuration. Built once at startup; a missing
/// credential fails here, not on first use.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_url: String,
    pub chat_model: String,
    pub stt_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub audio_enabled: bool,
    pub verbose: bool,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential(API_KEY_ENV))?;

        let api_url = cli
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        Ok(Self {
            api_key,
            api_url,
            chat_model: cli
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            stt_model: cli
                .stt_model
                .clone()
                .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            tts_voice: cli
                .tts_voice
                .clone()
                .unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
            audio_enabled: !cli.no_audio,
            verbose: cli.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("smartbot").chain(args.iter().copied()))
    }

    // Env-var tests mutate process state; serialize them.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn test_missing_api_key_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var(API_KEY_ENV);

        let err = AppConfig::from_cli(&cli(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(API_KEY_ENV)));
    }

    #[test]
    fn test_defaults_applied_when_flags_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(API_KEY_ENV, "test-key");

        let config = AppConfig::from_cli(&cli(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
        assert!(config.audio_enabled);

        std::env::remove_var(API_KEY_ENV);
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(API_KEY_ENV, "test-key");

        let err = AppConfig::from_cli(&cli(&["--api-url", "not-a-url"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiUrl(_)));

        std::env::remove_var(API_KEY_ENV);
    }

    #[test]
    fn test_no_audio_flag_disables_synthesis() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(API_KEY_ENV, "test-key");

        let config = AppConfig::from_cli(&cli(&["--no-audio"])).unwrap();
        assert!(!config.audio_enabled);

        std::env::remove_var(API_KEY_ENV);
    }
}
