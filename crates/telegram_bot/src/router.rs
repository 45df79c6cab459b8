//! Transport-agnostic event handling.
//!
//! The [`Router`] owns the per-process gates (cooldown, report dedup) and a
//! handle to the shared [`Ledger`]. Every failure inside [`Router::handle`] is
//! logged and, where it makes sense, answered; nothing propagates out.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use engine::{
    Ledger, PeriodMode, RateLimiter, ReportGate, TextRecognizer, day_key, parse_command,
    receipt::draft_from_receipt,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    intent::{self, Intent},
    transport::Outbox,
    ui,
};

/// One message as delivered by a transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender_id: String,
    pub text: Option<String>,
    pub image: Option<Vec<u8>>,
}

impl InboundEvent {
    pub fn text(sender_id: &str, text: &str) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            text: Some(text.to_string()),
            image: None,
        }
    }

    pub fn image(sender_id: &str, image: Vec<u8>) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            text: None,
            image: Some(image),
        }
    }
}

pub struct Router {
    ledger: Arc<Ledger>,
    limiter: RateLimiter,
    reports: ReportGate,
    recognizer: Arc<dyn TextRecognizer>,
    languages: String,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("ledger", &self.ledger)
            .field("limiter", &self.limiter)
            .field("languages", &self.languages)
            .finish_non_exhaustive()
    }
}

impl Router {
    pub fn new(
        ledger: Arc<Ledger>,
        recognizer: Arc<dyn TextRecognizer>,
        cooldown: Duration,
        languages: &str,
    ) -> Self {
        Self {
            ledger,
            limiter: RateLimiter::new(cooldown),
            reports: ReportGate::new(),
            recognizer,
            languages: languages.to_string(),
        }
    }

    /// Cooldown gate. Transports that must do expensive work before an
    /// event is complete (downloading a photo) call this first and then
    /// [`Router::handle_admitted`].
    pub async fn admit(&self, sender_id: &str) -> bool {
        self.limiter.admit(sender_id).await
    }

    /// Handles one event end to end, cooldown included.
    pub async fn handle(&self, event: InboundEvent, outbox: &dyn Outbox) {
        if !self.admit(&event.sender_id).await {
            return;
        }
        self.handle_admitted(event, outbox).await;
    }

    /// Handles an event whose sender already passed [`Router::admit`].
    pub async fn handle_admitted(&self, event: InboundEvent, outbox: &dyn Outbox) {
        let span = tracing::info_span!(
            "event",
            event_id = %Uuid::new_v4(),
            sender_id = %event.sender_id,
        );
        self.dispatch(event, outbox).instrument(span).await;
    }

    /// Tells `sender` an attached image could not be fetched.
    pub(crate) async fn image_unavailable(&self, outbox: &dyn Outbox, sender: &str) {
        self.reply(outbox, sender, ui::ocr_failed()).await;
    }

    async fn dispatch(&self, event: InboundEvent, outbox: &dyn Outbox) {
        let Some(intent) = intent::detect(event.text.as_deref(), event.image.is_some()) else {
            tracing::debug!("no intent, ignoring");
            return;
        };
        tracing::debug!(?intent, "routing");

        let sender = event.sender_id.as_str();
        match intent {
            Intent::Help => {
                self.reply(outbox, sender, ui::help_text().to_string()).await;
            }
            Intent::Record => {
                let text = event.text.as_deref().unwrap_or_default();
                self.record(outbox, sender, text).await;
            }
            Intent::Balance => self.balance(outbox, sender).await,
            Intent::Report(mode) => self.report(outbox, sender, mode).await,
            Intent::Receipt => {
                let image = event.image.as_deref().unwrap_or_default();
                self.receipt(outbox, sender, image).await;
            }
        }
    }

    async fn record(&self, outbox: &dyn Outbox, sender: &str, text: &str) {
        let draft = match parse_command(text) {
            Ok(draft) => draft,
            Err(err) => {
                tracing::info!(%err, "rejected command");
                self.reply(outbox, sender, ui::invalid_command(&err)).await;
                return;
            }
        };

        if let Err(err) = self.ledger.append(draft).await {
            tracing::error!(%err, "failed to append command entry");
            self.reply(outbox, sender, ui::store_failed().to_string()).await;
            return;
        }

        let balance = self.fresh_balance().await;
        self.reply(outbox, sender, ui::saved(balance)).await;
    }

    async fn balance(&self, outbox: &dyn Outbox, sender: &str) {
        let values = async {
            let balance = self.ledger.balance(false).await?;
            let investment = self.ledger.investment_value(false).await?;
            Ok::<_, engine::StoreError>((balance, investment))
        };

        let text = match values.await {
            Ok((balance, investment)) => ui::balance_update(balance, investment),
            Err(err) => {
                tracing::error!(%err, "failed to read balance");
                ui::store_failed().to_string()
            }
        };
        self.reply(outbox, sender, text).await;
    }

    async fn report(&self, outbox: &dyn Outbox, sender: &str, mode: PeriodMode) {
        let today = day_key(Utc::now(), self.ledger.timezone());
        let Some(claim) = self.reports.claim(mode, &today).await else {
            tracing::info!(mode = mode.label(), %today, "report already sent");
            self.reply(outbox, sender, ui::report_already_sent(mode)).await;
            return;
        };

        let figures = async {
            let totals = self.ledger.period_totals(mode).await?;
            let balance = self.ledger.balance(false).await?;
            Ok::<_, engine::StoreError>((totals, balance))
        };
        let (totals, balance) = match figures.await {
            Ok(figures) => figures,
            Err(err) => {
                tracing::error!(%err, "failed to build report");
                drop(claim);
                self.reply(outbox, sender, ui::store_failed().to_string()).await;
                return;
            }
        };

        if self.reply(outbox, sender, ui::report(mode, totals, balance)).await {
            claim.mark_sent();
        }
    }

    async fn receipt(&self, outbox: &dyn Outbox, sender: &str, image: &[u8]) {
        let text = match self.recognizer.recognize(image, &self.languages).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(%err, "ocr failed");
                self.reply(outbox, sender, ui::ocr_failed()).await;
                return;
            }
        };
        tracing::debug!(chars = text.chars().count(), "ocr text received");

        let (draft, extraction) = draft_from_receipt(&text);
        if extraction.is_low_confidence() {
            tracing::warn!("no total found on receipt, recording 0");
        }

        let ack = match self.ledger.append(draft).await {
            Ok(ack) => ack,
            Err(err) => {
                tracing::error!(%err, "failed to append receipt entry");
                self.reply(outbox, sender, ui::store_failed().to_string()).await;
                return;
            }
        };

        let balance = self.fresh_balance().await;
        self.reply(outbox, sender, ui::receipt_saved(&ack.record, extraction, balance))
            .await;
    }

    /// Balance right after a write. The entry is already stored, so a read
    /// failure only drops the figure from the reply.
    async fn fresh_balance(&self) -> Option<i64> {
        match self.ledger.balance(true).await {
            Ok(balance) => Some(balance),
            Err(err) => {
                tracing::error!(%err, "failed to refresh balance after append");
                None
            }
        }
    }

    /// Sends `text`, returning whether it was delivered.
    async fn reply(&self, outbox: &dyn Outbox, sender: &str, text: String) -> bool {
        match outbox.send(sender, text).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(%err, "failed to deliver reply");
                false
            }
        }
    }
}
