use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};

use crate::common;

/// Resolve a hosting-site URL to a direct download, fetch the file,
/// and record its name for the upload step that follows.
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[clap(disable_help_flag = true)]
pub struct CliArgs {
    /// Print help
    #[clap(action = ArgAction::Help, long)]
    help: Option<bool>,

    #[command(flatten)]
    pub run: common::RunConfig,

    #[command(flatten)]
    pub dependency_path: common::ProgramPathConfig,

    #[command(flatten)]
    pub telegram: common::TelegramConfig,

    #[command(flatten)]
    pub network: common::NetworkConfig,
}
