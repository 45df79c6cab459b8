//! Telegram surface of the ledger.
//!
//! Messages are turned into transport-neutral [`InboundEvent`]s and handled
//! by a [`Router`]; replies go back through an [`Outbox`]. Only the message
//! handler and the outbox implementation know about Telegram.

use std::{sync::Arc, time::Duration};

use engine::{Ledger, TextRecognizer};
use teloxide::prelude::*;

pub use ocr::HttpRecognizer;
pub use router::{InboundEvent, Router};
pub use transport::{Outbox, TransportError};

mod handlers;
mod intent;
mod ocr;
mod router;
mod transport;
mod ui;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);
pub const DEFAULT_LANGUAGES: &str = "eng+ind";

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("telegram bot is missing {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct ConfigParameters {
    allowed_users: Option<Vec<UserId>>,
    router: Arc<Router>,
}

pub struct Bot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    router: Arc<Router>,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        let parameters = ConfigParameters {
            allowed_users: self.allowed_users.clone(),
            router: self.router.clone(),
        };

        let handler =
            dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd.kind);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

pub struct BotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    ledger: Option<Arc<Ledger>>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
    cooldown: Duration,
    languages: String,
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self {
            token: String::new(),
            allowed_users: None,
            ledger: None,
            recognizer: None,
            cooldown: DEFAULT_COOLDOWN,
            languages: DEFAULT_LANGUAGES.to_string(),
        }
    }
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    /// An empty list lets everyone in.
    pub fn allowed_users(mut self, allowed_users: Vec<u64>) -> BotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users.into_iter().map(UserId).collect());
        }
        self
    }

    pub fn ledger(mut self, ledger: Arc<Ledger>) -> BotBuilder {
        self.ledger = Some(ledger);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> BotBuilder {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> BotBuilder {
        self.cooldown = cooldown;
        self
    }

    pub fn languages(mut self, languages: &str) -> BotBuilder {
        self.languages = languages.to_string();
        self
    }

    pub fn build(self) -> Result<Bot, BotError> {
        tracing::info!("Initializing telegram bot...");
        if self.token.trim().is_empty() {
            return Err(BotError::Missing("a token"));
        }
        let ledger = self.ledger.ok_or(BotError::Missing("a ledger"))?;
        let recognizer = self.recognizer.ok_or(BotError::Missing("an ocr recognizer"))?;

        let router = Router::new(ledger, recognizer, self.cooldown, &self.languages);
        Ok(Bot {
            token: self.token,
            allowed_users: self.allowed_users,
            router: Arc::new(router),
        })
    }
}
