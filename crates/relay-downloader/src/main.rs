pub(crate) mod dispatch;
pub(crate) mod notifier;

use std::process::ExitCode;

use app_config::Config;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let loaded_dotenv = dotenvy::dotenv();

    app_logger::init();

    match loaded_dotenv {
        Ok(loaded_dotenv) => {
            debug!(path = ?loaded_dotenv, "Loaded dotenv file");
        }
        Err(e) if e.not_found() => {
            debug!("No dotenv file found");
        }
        Err(e) => {
            error!("Failed to load dotenv file: {e:?}");
            return ExitCode::from(2);
        }
    }

    debug!(config = ?*Config::global(), "Running with config");

    let Some(url) = Config::global().run.url.clone() else {
        error!("No URL given. Pass it as an argument or set RELAY_DL_URL.");
        return ExitCode::from(2);
    };

    match dispatch::run(&url).await {
        Ok(path) => {
            info!(?path, "Download finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Download failed: {e:?}");
            ExitCode::FAILURE
        }
    }
}
