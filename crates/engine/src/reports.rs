//! At most one periodic report per calendar day per period mode.
//!
//! State lives for the process only; a restart forgets what was sent.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeriodMode {
    /// Trailing 7×24h.
    Week,
    /// Current calendar month.
    Month,
}

impl PeriodMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Week => "minggu",
            Self::Month => "bulan",
        }
    }
}

/// `YYYY-MM-DD` of `now` in `timezone`.
pub fn day_key(now: DateTime<Utc>, timezone: Tz) -> String {
    now.with_timezone(&timezone).format("%Y-%m-%d").to_string()
}

#[derive(Debug, Default)]
pub struct ReportGate {
    week: Mutex<Option<String>>,
    month: Mutex<Option<String>>,
}

impl ReportGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, mode: PeriodMode) -> &Mutex<Option<String>> {
        match mode {
            PeriodMode::Week => &self.week,
            PeriodMode::Month => &self.month,
        }
    }

    pub async fn should_send(&self, mode: PeriodMode, today_key: &str) -> bool {
        self.slot(mode).lock().await.as_deref() != Some(today_key)
    }

    pub async fn mark_sent(&self, mode: PeriodMode, today_key: &str) {
        *self.slot(mode).lock().await = Some(today_key.to_string());
    }

    /// Atomic form of `should_send` + `mark_sent`: the returned claim holds
    /// the mode's slot until it is committed or dropped, so a concurrent
    /// request for the same mode waits and then sees the mark.
    pub async fn claim(&self, mode: PeriodMode, today_key: &str) -> Option<ReportClaim<'_>> {
        let guard = self.slot(mode).lock().await;
        if guard.as_deref() == Some(today_key) {
            return None;
        }
        Some(ReportClaim {
            guard,
            today_key: today_key.to_string(),
        })
    }
}

/// Permission to send one report. Dropping it without
/// [`ReportClaim::mark_sent`] leaves the day unmarked.
#[derive(Debug)]
pub struct ReportClaim<'a> {
    guard: MutexGuard<'a, Option<String>>,
    today_key: String,
}

impl ReportClaim<'_> {
    pub fn mark_sent(mut self) {
        *self.guard = Some(self.today_key);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[tokio::test]
    async fn once_per_day_per_mode() {
        let gate = ReportGate::new();
        assert!(gate.should_send(PeriodMode::Week, "2024-01-01").await);
        gate.mark_sent(PeriodMode::Week, "2024-01-01").await;
        assert!(!gate.should_send(PeriodMode::Week, "2024-01-01").await);

        assert!(gate.should_send(PeriodMode::Month, "2024-01-01").await);
        assert!(gate.should_send(PeriodMode::Week, "2024-01-02").await);
    }

    #[tokio::test]
    async fn claim_marks_only_when_committed() {
        let gate = ReportGate::new();
        let claim = gate.claim(PeriodMode::Month, "2024-01-01").await.unwrap();
        drop(claim);
        assert!(gate.should_send(PeriodMode::Month, "2024-01-01").await);

        let claim = gate.claim(PeriodMode::Month, "2024-01-01").await.unwrap();
        claim.mark_sent();
        assert!(gate.claim(PeriodMode::Month, "2024-01-01").await.is_none());
        assert!(gate.claim(PeriodMode::Month, "2024-01-02").await.is_some());
    }

    async fn claim_and_send(gate: &ReportGate) -> bool {
        match gate.claim(PeriodMode::Week, "2024-01-01").await {
            Some(claim) => {
                // Delivery is a suspension point.
                tokio::task::yield_now().await;
                claim.mark_sent();
                true
            }
            None => false,
        }
    }

    #[tokio::test]
    async fn concurrent_claims_send_once() {
        let gate = ReportGate::new();
        let (a, b) = tokio::join!(claim_and_send(&gate), claim_and_send(&gate));
        assert!(a ^ b);
        assert!(!gate.should_send(PeriodMode::Week, "2024-01-01").await);
    }

    #[test]
    fn day_key_uses_the_local_calendar() {
        let late_utc = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(day_key(late_utc, chrono_tz::UTC), "2024-01-01");
        assert_eq!(day_key(late_utc, chrono_tz::Asia::Jakarta), "2024-01-02");
    }
}
