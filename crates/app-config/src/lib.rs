pub mod cli;
pub mod common;
pub mod validators;

use clap::Parser;
use cli::CliArgs;
use common::DumpConfigType;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use validator::Validate;

static CONFIG: Lazy<Config> = Lazy::new(Config::new);

pub static APPLICATION_NAME: &str = "relay-downloader";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub run: common::RunConfig,

    /// Paths to the external programs used at runtime
    #[validate(nested)]
    pub dependency_paths: common::ProgramPathConfig,

    #[validate(nested)]
    pub telegram: common::TelegramConfig,

    #[validate(nested)]
    pub network: common::NetworkConfig,
}

impl Config {
    #[must_use]
    #[inline]
    pub fn global() -> &'static Self {
        &CONFIG
    }

    fn new() -> Self {
        let args = CliArgs::parse();

        Self::default()
            .merge_with_cli(args)
            .resolve_paths()
            .validate_self()
            .dump_if_needed()
    }

    fn merge_with_cli(mut self, args: CliArgs) -> Self {
        self.run = args.run;
        self.dependency_paths = args.dependency_path;
        self.telegram = args.telegram;
        self.network = args.network;

        self
    }

    fn resolve_paths(mut self) -> Self {
        self.dependency_paths = self.dependency_paths.resolve_paths();

        self
    }

    #[inline]
    fn validate_self(self) -> Self {
        if let Err(e) = self.validate() {
            eprintln!("Errors validating configuration:");
            print_validation_errors(&e, "  ", 1);
            std::process::exit(1);
        }

        self
    }

    fn dump_if_needed(self) -> Self {
        if let Some(dump_type) = &self.run.dump_config {
            let out = match dump_type {
                None | Some(DumpConfigType::Json) => {
                    serde_json::to_string_pretty(&self).expect("Failed to serialize config to JSON")
                }

                Some(DumpConfigType::Toml) => {
                    toml::to_string_pretty(&self).expect("Failed to serialize config to TOML")
                }
            };

            println!("{}", out.trim());
            std::process::exit(0);
        }

        self
    }
}

fn print_validation_errors(e: &validator::ValidationErrors, prefix: &str, level: usize) {
    let level = level.max(1);
    for (e_name, e) in e.errors() {
        match e {
            validator::ValidationErrorsKind::Field(e) => {
                let prefix_rep = prefix.repeat(level);
                eprintln!(
                    "{prefix_rep}{e_name}:\n{}",
                    e.iter()
                        .map(|x| format!("{} {:?}", x.code, x.params))
                        .fold(String::new(), |acc, a| format!(
                            "{acc}{prefix_rep}{prefix}- {a}\n"
                        ))
                        .trim_end()
                );
            }

            validator::ValidationErrorsKind::Struct(e) => {
                eprintln!("{}{}:", prefix, e_name);
                print_validation_errors(e, prefix, level + 1);
            }

            validator::ValidationErrorsKind::List(e) => {
                eprintln!("{}{}:", prefix, e_name);
                for e in e.values() {
                    print_validation_errors(e, prefix, level + 1);
                }
            }
        }
    }
}
