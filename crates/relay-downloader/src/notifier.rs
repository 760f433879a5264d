//! Telegram progress messages.
//!
//! One message is sent at the start of the run and edited in place
//! afterwards, so the chat gets a single evolving status line instead
//! of a flood. Everything here is best-effort: a Telegram hiccup must
//! never fail the download.

use app_config::Config;
use app_resolvers::ProgressReporter;
use teloxide::{
    adaptors::DefaultParseMode,
    payloads::{EditMessageTextSetters, SendMessageSetters},
    requests::{Requester, RequesterExt},
    types::{ChatId, MessageId, ParseMode},
    ApiError, Bot, RequestError,
};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

type NotifierBot = DefaultParseMode<Bot>;

pub enum StatusNotifier {
    /// Credentials not configured; every update is a no-op.
    Disabled,
    Enabled {
        bot: NotifierBot,
        chat_id: ChatId,
        message_id: Mutex<Option<MessageId>>,
    },
}

impl StatusNotifier {
    pub fn from_config() -> Self {
        let config = Config::global();

        let Some((token, chat_id)) = config.telegram.credentials() else {
            info!("Telegram credentials not set, progress notifications disabled");
            return Self::Disabled;
        };

        let api_url = Url::parse(&config.telegram.api_url).expect("Invalid API URL");

        let bot = Bot::new(token)
            .set_api_url(api_url)
            .parse_mode(ParseMode::Markdown);

        Self::Enabled {
            bot,
            chat_id: ChatId(chat_id),
            message_id: Mutex::new(None),
        }
    }

    async fn send_or_edit(&self, text: &str) -> Result<(), RequestError> {
        let Self::Enabled {
            bot,
            chat_id,
            message_id,
        } = self
        else {
            return Ok(());
        };

        let mut message_id = message_id.lock().await;

        // Two passes at most: if the status message got deleted from
        // the chat, fall back to sending a fresh one.
        for _ in 0..2 {
            match *message_id {
                Some(id) => {
                    let res = bot
                        .edit_message_text(*chat_id, id, text)
                        .disable_web_page_preview(true)
                        .await;

                    match res {
                        Err(RequestError::Api(ApiError::MessageToEditNotFound)) => {
                            *message_id = None;
                        }
                        Err(RequestError::Api(ApiError::MessageNotModified)) | Ok(_) => {
                            return Ok(());
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => {
                    let message = bot
                        .send_message(*chat_id, text)
                        .disable_notification(true)
                        .disable_web_page_preview(true)
                        .await?;

                    *message_id = Some(message.id);

                    return Ok(());
                }
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl ProgressReporter for StatusNotifier {
    async fn update(&self, text: &str) {
        if let Err(e) = self.send_or_edit(text).await {
            debug!("Failed to send progress notification: {e}");
        }
    }
}
