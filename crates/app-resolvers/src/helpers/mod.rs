pub mod browser;
pub mod command;
pub mod content_disposition;
pub mod progress;
