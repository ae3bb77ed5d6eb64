//! Session-expiry countdown.
//!
//! The expiry wall-clock timestamp is read once at start and converted to a
//! monotonic deadline; every subsequent tick derives remaining time from
//! `tokio::time::Instant`, so a wall-clock adjustment mid-session cannot
//! stretch or shrink the countdown.
//!
//! An absent or malformed expiry leaves the timer inert: no ticking, no
//! notices, remaining pinned at zero. That is a deliberate no-op, not an
//! error.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Remaining-time threshold for the one-shot warning notice.
const FIVE_MINUTES_MS: u64 = 300_000;

/// Pause between the expiry notice and the forced logout.
const LOGOUT_GRACE: Duration = Duration::from_secs(2);

/// Notices emitted by the countdown task, in the order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Remaining time first fell inside the five minute band. Fires at most
    /// once per session; a skipped tick (stalled scheduler) may skip it.
    FiveMinuteWarning,
    /// Remaining time reached zero. Ticking has stopped.
    Expired,
    /// The post-expiry grace period elapsed; the caller must log out now.
    ForcedLogout,
}

/// Handle over the running countdown task.
///
/// Dropping the handle cancels the task; cancellation is idempotent and a
/// tick that races teardown checks the token before touching anything.
pub struct Countdown {
    remaining: watch::Receiver<u64>,
    cancel: CancellationToken,
}

impl Countdown {
    /// Start counting down toward `expiry`, delivering notices on `events`.
    pub fn start(expiry: Option<&str>, events: mpsc::UnboundedSender<CountdownEvent>) -> Self {
        let cancel = CancellationToken::new();

        let parsed = match expiry.map(DateTime::parse_from_rfc3339) {
            None => None,
            Some(Err(err)) => {
                tracing::debug!(%err, "unparseable access expiry, countdown stays inert");
                None
            }
            Some(Ok(parsed)) => Some(parsed),
        };
        let Some(parsed) = parsed else {
            let (_inert_tx, remaining_rx) = watch::channel(0u64);
            return Self {
                remaining: remaining_rx,
                cancel,
            };
        };

        let until = (parsed.with_timezone(&Utc) - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let deadline = Instant::now() + until;
        let (remaining_tx, remaining_rx) = watch::channel(until.as_millis() as u64);

        let token = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut warned = false;

            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = ticker.tick() => {
                        if token.is_cancelled() {
                            return;
                        }

                        let remaining =
                            deadline.saturating_duration_since(Instant::now()).as_millis() as u64;
                        let _ = remaining_tx.send(remaining);

                        if remaining == 0 {
                            tracing::info!("access session expired");
                            let _ = events.send(CountdownEvent::Expired);
                            tokio::select! {
                                _ = token.cancelled() => {}
                                _ = tokio::time::sleep(LOGOUT_GRACE) => {
                                    let _ = events.send(CountdownEvent::ForcedLogout);
                                }
                            }
                            return;
                        }

                        if !warned
                            && remaining <= FIVE_MINUTES_MS
                            && remaining > FIVE_MINUTES_MS - 1_000
                        {
                            warned = true;
                            tracing::info!("five minutes of access remaining");
                            let _ = events.send(CountdownEvent::FiveMinuteWarning);
                        }
                    }
                }
            }
        });

        Self {
            remaining: remaining_rx,
            cancel,
        }
    }

    /// Latest remaining milliseconds, clamped to zero.
    pub fn remaining_ms(&self) -> u64 {
        *self.remaining.borrow()
    }

    pub fn remaining_watch(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    /// Cancel the tick task. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Render remaining milliseconds as `{h}h {m}m {s}s`, or `Time Expired`
/// once nothing is left.
pub fn format_remaining(ms: i64) -> String {
    if ms <= 0 {
        return "Time Expired".to_string();
    }

    let total_seconds = ms / 1_000;
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expiry_in(seconds: i64) -> String {
        (Utc::now() + chrono::Duration::seconds(seconds)).to_rfc3339()
    }

    #[test]
    fn format_zero_and_below_is_expired() {
        assert_eq!(format_remaining(0), "Time Expired");
        assert_eq!(format_remaining(-5_000), "Time Expired");
    }

    #[test]
    fn format_decomposes_hours_minutes_seconds() {
        assert_eq!(format_remaining(1_000), "0h 0m 1s");
        assert_eq!(format_remaining(61_500), "0h 1m 1s");
        assert_eq!(format_remaining(3_661_000), "1h 1m 1s");
        assert_eq!(format_remaining(299_999), "0h 4m 59s");
    }

    #[tokio::test(start_paused = true)]
    async fn absent_expiry_stays_inert() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let countdown = Countdown::start(None, tx);

        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;

        assert_eq!(countdown.remaining_ms(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_expiry_stays_inert() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let countdown = Countdown::start(Some("next tuesday"), tx);

        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;

        assert_eq!(countdown.remaining_ms(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_notice_then_logout_after_grace() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let expiry = expiry_in(10);
        let _countdown = Countdown::start(Some(expiry.as_str()), tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, CountdownEvent::Expired);
        let at_expiry = start.elapsed().as_secs();
        assert!((9..=11).contains(&at_expiry), "expired at {at_expiry}s");

        let event = rx.recv().await.unwrap();
        assert_eq!(event, CountdownEvent::ForcedLogout);
        let at_logout = start.elapsed().as_secs();
        assert!((11..=13).contains(&at_logout), "logout at {at_logout}s");
    }

    #[tokio::test(start_paused = true)]
    async fn five_minute_warning_fires_exactly_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let expiry = expiry_in(301);
        let _countdown = Countdown::start(Some(expiry.as_str()), tx);

        let mut warnings = 0;
        loop {
            match rx.recv().await.unwrap() {
                CountdownEvent::FiveMinuteWarning => warnings += 1,
                CountdownEvent::Expired => break,
                CountdownEvent::ForcedLogout => break,
            }
        }
        assert_eq!(warnings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_warning_when_session_starts_inside_the_band() {
        // A session that opens with less than 4m59s left never crosses the
        // band from above, so the edge-triggered warning must stay quiet.
        let (tx, mut rx) = mpsc::unbounded_channel();
        let expiry = expiry_in(200);
        let _countdown = Countdown::start(Some(expiry.as_str()), tx);

        let mut warnings = 0;
        loop {
            match rx.recv().await.unwrap() {
                CountdownEvent::FiveMinuteWarning => warnings += 1,
                CountdownEvent::Expired => break,
                CountdownEvent::ForcedLogout => break,
            }
        }
        assert_eq!(warnings, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_is_idempotent_and_silences_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let expiry = expiry_in(5);
        let countdown = Countdown::start(Some(expiry.as_str()), tx);

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;

        countdown.shutdown();
        countdown.shutdown();

        // Drain anything delivered before the shutdown, then confirm the
        // expiry never arrives.
        while rx.try_recv().is_ok() {}
        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
