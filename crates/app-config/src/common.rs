use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Args, ValueEnum, ValueHint};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validators::{
    directory::validate_is_writable_directory,
    file::{validate_is_file, value_parser_parse_valid_file},
    url::{validate_is_absolute_url, value_parser_parse_absolute_url},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Args, Validate)]
#[allow(clippy::struct_field_names, clippy::option_option)]
#[clap(next_help_heading = Some("Run options"))]
pub struct RunConfig {
    /// The URL to resolve and download.
    ///
    /// May also be provided via the RELAY_DL_URL environment variable,
    /// which is how the CI pipeline passes it in.
    #[arg(env = "RELAY_DL_URL", value_hint = ValueHint::Url)]
    pub url: Option<String>,

    /// Directory the downloaded file ends up in.
    #[arg(long, default_value = ".", env = "RELAY_DL_DOWNLOAD_DIR", value_hint = ValueHint::DirPath)]
    #[validate(custom(function = "validate_is_writable_directory"))]
    pub download_dir: PathBuf,

    /// File the name of the downloaded artifact is written to on success.
    ///
    /// A separate upload step reads this file to know what to pick up.
    #[arg(long, default_value = "downloaded_filename.txt", env = "RELAY_DL_MARKER_FILE")]
    pub marker_file: PathBuf,

    /// Overall per-phase timeout, in seconds.
    ///
    /// Applies to browser automation and to the byte transfer separately.
    #[arg(long, default_value_t = 300, env = "RELAY_DL_TIMEOUT")]
    pub timeout_secs: u64,

    /// Dump the config to stdout
    #[arg(long, value_enum, default_value = None)]
    #[serde(skip)]
    pub dump_config: Option<Option<DumpConfigType>>,
}

impl RunConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Args, Validate)]
#[allow(clippy::struct_field_names)]
#[clap(next_help_heading = Some("Program paths"))]
pub struct ProgramPathConfig {
    /// Path to the aria2c executable.
    ///
    /// If not provided, aria2c will be searched for in $PATH
    #[arg(long, default_value = None, env = "RELAY_DL_ARIA2C", value_hint = ValueHint::FilePath)]
    #[validate(custom(function = "validate_program_path"), required)]
    aria2c_path: Option<PathBuf>,

    /// Path to the yt-dlp executable.
    ///
    /// If not provided, yt-dlp will be searched for in $PATH
    #[arg(long, default_value = None, env = "RELAY_DL_YT_DLP", value_hint = ValueHint::FilePath)]
    #[validate(custom(function = "validate_program_path"), required)]
    yt_dlp_path: Option<PathBuf>,

    /// Path to the megatools executable. Only needed for mega.nz links.
    ///
    /// If not provided, megatools will be searched for in $PATH
    #[arg(long, default_value = None, env = "RELAY_DL_MEGATOOLS", value_hint = ValueHint::FilePath)]
    #[validate(custom(function = "validate_program_path"))]
    megatools_path: Option<PathBuf>,

    /// Path to the gdown executable. Only needed for Google Drive links.
    ///
    /// If not provided, gdown will be searched for in $PATH
    #[arg(long, default_value = None, env = "RELAY_DL_GDOWN", value_hint = ValueHint::FilePath)]
    #[validate(custom(function = "validate_program_path"))]
    gdown_path: Option<PathBuf>,
}

impl ProgramPathConfig {
    #[must_use]
    pub fn aria2c_path(&self) -> &Path {
        self.aria2c_path.as_ref().expect(
            "`aria2c' executable not found. Please make sure it is installed and added to the \
             PATH environment variable.",
        )
    }

    #[must_use]
    pub fn yt_dlp_path(&self) -> &Path {
        self.yt_dlp_path.as_ref().expect(
            "`yt-dlp' executable not found. Please make sure it is installed and added to the \
             PATH environment variable.",
        )
    }

    #[must_use]
    pub fn megatools_path(&self) -> Option<&Path> {
        self.megatools_path.as_deref()
    }

    #[must_use]
    pub fn gdown_path(&self) -> Option<&Path> {
        self.gdown_path.as_deref()
    }

    #[must_use]
    pub fn resolve_paths(mut self) -> Self {
        self.aria2c_path = self
            .aria2c_path
            .take()
            .or_else(|| which::which("aria2c").ok());
        self.yt_dlp_path = self
            .yt_dlp_path
            .take()
            .or_else(|| which::which("yt-dlp").ok());
        self.megatools_path = self
            .megatools_path
            .take()
            .or_else(|| which::which("megatools").ok());
        self.gdown_path = self.gdown_path.take().or_else(|| which::which("gdown").ok());

        self
    }
}

fn validate_program_path(path: &Path) -> Result<(), validator::ValidationError> {
    validate_is_file(path)
}

#[derive(Debug, Clone, Serialize, Deserialize, Args, Validate)]
#[clap(next_help_heading = Some("Telegram notifications"))]
pub struct TelegramConfig {
    /// Bot token used for progress notifications.
    ///
    /// Notifications are silently disabled when this is not set.
    #[arg(long, default_value = None, env = "RELAY_DL_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Chat the progress messages are sent to.
    #[arg(long, default_value = None, env = "RELAY_DL_CHAT_ID", allow_hyphen_values = true)]
    pub chat_id: Option<i64>,

    /// Base URL of the Telegram Bot API.
    #[arg(long, default_value = "https://api.telegram.org", env = "RELAY_DL_TELEGRAM_API_URL", value_hint = ValueHint::Url, value_parser = value_parser_parse_absolute_url())]
    #[validate(custom(function = "validate_is_absolute_url"))]
    pub api_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_url: "https://api.telegram.org".to_string(),
        }
    }
}

impl TelegramConfig {
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, i64)> {
        match (self.bot_token.as_deref(), self.chat_id) {
            (Some(token), Some(chat_id)) => Some((token, chat_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Args, Validate)]
#[clap(next_help_heading = Some("Network options"))]
pub struct NetworkConfig {
    /// Proxy passed to HTTP requests and the external downloaders.
    #[arg(long, default_value = None, env = "RELAY_DL_PROXY", value_hint = ValueHint::Url)]
    #[validate(custom(function = "validate_is_absolute_url"))]
    pub proxy: Option<String>,

    /// Netscape-format cookie file passed to yt-dlp and aria2c.
    #[arg(long, default_value = None, env = "RELAY_DL_COOKIES", value_hint = ValueHint::FilePath, value_parser = value_parser_parse_valid_file())]
    pub cookies_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ValueEnum)]
pub enum DumpConfigType {
    Json,
    Toml,
}
