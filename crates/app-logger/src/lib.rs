use std::env;

use tracing::Level;
pub use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

pub const LOG_LEVEL_ENV_VAR: &str = "RELAY_DL_LOG_LEVEL";

pub const COMPONENT_LEVELS: &[(&str, Level)] = &[
    ("relay_downloader", Level::INFO),
    ("app_config", Level::INFO),
    ("app_helpers", Level::INFO),
    ("app_logger", Level::INFO),
    ("app_resolvers", Level::INFO),
];

/// Initialize the logger
///
/// # Panics
/// Panics if the logger fails to initialize
pub fn init() {
    init_with(COMPONENT_LEVELS.iter().copied());
}

pub fn init_with<T>(levels: T)
where
    T: IntoIterator<Item = (&'static str, Level)>,
{
    let default_directives = levels
        .into_iter()
        .map(|(component, level)| {
            if component.is_empty() {
                level.to_string()
            } else {
                format!("{}={}", component, level)
            }
        })
        .collect::<Vec<_>>()
        .join(",");

    let mut filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .parse_lossy(default_directives);

    let env_directives = env::var(LOG_LEVEL_ENV_VAR)
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<Directive>() {
            Ok(d) => Some(d),
            Err(e) => {
                eprintln!("Failed to parse log level directive {s:?}: {e:?}");
                None
            }
        })
        .collect::<Vec<_>>();

    for d in env_directives {
        filter = filter.add_directive(d);
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .expect("setting default subscriber failed");
}
