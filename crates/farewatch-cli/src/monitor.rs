//! The check → notify → sleep loop.

use std::cell::Cell;
use std::future::Future;
use std::time::Duration;

use chrono::Local;
use farewatch_core::{evaluate, lowest_overall, AlertResult, AppConfig, PriceHistoryEntry};
use farewatch_notify::reminder::render_reminder;
use farewatch_notify::status::{render_shutdown, render_startup};
use farewatch_notify::{render_alerts, AlertMessage, Notifier, RenderOptions};
use farewatch_scraper::PriceSource;
use farewatch_store::{history_key, HistoryStore, PriceHistory};

/// Something a finished check wants delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outgoing {
    /// Price alert for every channel.
    Alert(AlertMessage),
    /// Telegram-formatted status text (reminder links).
    Status(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoopState {
    Idle,
    Checking,
    Notifying(Outgoing),
    Sleeping(Duration),
    Stopped,
}

/// Maps a finished check to the next state: deliver its output, or sleep the
/// regular interval, or sleep `retry_delay` after a failure.
pub(crate) fn next_state(
    result: anyhow::Result<Option<Outgoing>>,
    interval: Duration,
    retry_delay: Duration,
) -> LoopState {
    match result {
        Ok(Some(outgoing)) => LoopState::Notifying(outgoing),
        Ok(None) => LoopState::Sleeping(interval),
        Err(e) => {
            tracing::error!(
                error = %e,
                retry_in_secs = retry_delay.as_secs(),
                "check cycle failed; retrying"
            );
            LoopState::Sleeping(retry_delay)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunOptions {
    pub interval: Duration,
    pub retry_delay: Duration,
    /// Stop after the first check instead of sleeping. No startup or
    /// shutdown messages are sent.
    pub once: bool,
}

impl RunOptions {
    pub(crate) fn from_config(config: &AppConfig, once: bool) -> Self {
        Self {
            interval: config.check_interval(),
            retry_delay: config.retry_delay(),
            once,
        }
    }
}

/// One full pass over the configured dates.
///
/// `stop` is raised when shutdown is requested mid-cycle. Implementations
/// finish the date in progress, so browser sessions close normally, and skip
/// the rest.
pub(crate) trait CheckCycle {
    async fn run_cycle(&mut self, stop: &Cell<bool>) -> anyhow::Result<Option<Outgoing>>;
}

/// Drives `cycle` until `shutdown` resolves (or once, with
/// [`RunOptions::once`]). Returns the failure of a `--once` check.
pub(crate) async fn run<C: CheckCycle>(
    cycle: &mut C,
    notifier: &Notifier,
    config: &AppConfig,
    options: RunOptions,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    tokio::pin!(shutdown);

    if !options.once {
        notifier.send_status(&render_startup(config)).await;
    }

    let mut cycles: u64 = 0;
    let mut once_error = None;
    let mut state = LoopState::Idle;

    loop {
        tracing::debug!(?state, "monitor state");
        state = match state {
            LoopState::Idle => LoopState::Checking,

            LoopState::Checking => {
                let stop = Cell::new(false);
                let check = cycle.run_cycle(&stop);
                tokio::pin!(check);

                let mut stopping = false;
                let result = tokio::select! {
                    result = &mut check => result,
                    () = &mut shutdown => {
                        tracing::info!("shutdown requested; finishing the current date");
                        stop.set(true);
                        stopping = true;
                        check.await
                    }
                };
                cycles += 1;

                match result {
                    Err(e) if options.once => {
                        once_error = Some(e);
                        LoopState::Stopped
                    }
                    result if stopping => {
                        // `shutdown` has resolved and must not be polled again.
                        if let LoopState::Notifying(outgoing) =
                            next_state(result, options.interval, options.retry_delay)
                        {
                            deliver(notifier, &outgoing).await;
                        }
                        LoopState::Stopped
                    }
                    result => next_state(result, options.interval, options.retry_delay),
                }
            }

            LoopState::Notifying(outgoing) => tokio::select! {
                () = deliver(notifier, &outgoing) => LoopState::Sleeping(options.interval),
                () = &mut shutdown => LoopState::Stopped,
            },

            LoopState::Sleeping(_) if options.once => LoopState::Stopped,

            LoopState::Sleeping(delay) => {
                tracing::info!(next_check_in_secs = delay.as_secs(), "waiting for next check");
                tokio::select! {
                    () = tokio::time::sleep(delay) => LoopState::Checking,
                    () = &mut shutdown => LoopState::Stopped,
                }
            }

            LoopState::Stopped => break,
        };
    }

    tracing::info!(cycles, "monitor stopped");
    if !options.once {
        notifier.send_status(&render_shutdown(cycles)).await;
    }

    once_error.map_or(Ok(()), Err)
}

async fn deliver(notifier: &Notifier, outgoing: &Outgoing) {
    match outgoing {
        Outgoing::Alert(message) => {
            let delivered = notifier.notify(message).await;
            tracing::info!(subject = %message.subject, delivered, "price alert dispatched");
        }
        Outgoing::Status(text) => {
            if notifier.send_status(text).await {
                tracing::info!("reminder sent");
            } else {
                tracing::warn!("reminder could not be sent");
            }
        }
    }
}

/// Fetches, records and evaluates every date through a [`PriceSource`].
pub(crate) struct PriceMonitor<'a, S> {
    config: &'a AppConfig,
    source: S,
    store: HistoryStore,
    history: PriceHistory,
    render: RenderOptions,
}

impl<'a, S: PriceSource> PriceMonitor<'a, S> {
    pub(crate) fn new(
        config: &'a AppConfig,
        source: S,
        store: HistoryStore,
        history: PriceHistory,
        render: RenderOptions,
    ) -> Self {
        Self {
            config,
            source,
            store,
            history,
            render,
        }
    }
}

impl<S: PriceSource> CheckCycle for PriceMonitor<'_, S> {
    async fn run_cycle(&mut self, stop: &Cell<bool>) -> anyhow::Result<Option<Outgoing>> {
        let queries = self.config.queries();
        let threshold = self.config.price_threshold;
        tracing::info!(
            source = self.source.name(),
            dates = queries.len(),
            %threshold,
            "checking prices"
        );

        let mut results: Vec<AlertResult> = Vec::new();
        for (i, query) in queries.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.inter_date_delay()).await;
            }
            if stop.get() {
                tracing::info!(skipped = queries.len() - i, "stopping; remaining dates skipped");
                break;
            }

            let observations = self.source.fetch(query).await.into_observations();
            let Some(result) = evaluate(&query.date_label, &observations, threshold) else {
                continue;
            };

            if result.alert {
                tracing::info!(
                    date = %query.date_label,
                    count = result.low_prices.len(),
                    lowest = %result.min_price,
                    "prices at or below threshold"
                );
            } else {
                tracing::info!(
                    date = %query.date_label,
                    lowest = %result.min_price,
                    %threshold,
                    "nothing at or below threshold"
                );
            }

            let checked_at = Local::now();
            if let Some(entry) =
                PriceHistoryEntry::from_observations(&query.date_label, checked_at, observations)
            {
                self.history
                    .record(history_key(&query.date_label, &checked_at), entry);
            }
            results.push(result);
        }

        self.store.persist(&self.history).await?;

        if !results.iter().any(|r| r.alert) {
            match lowest_overall(&results) {
                Some(lowest) => tracing::info!(%lowest, "no prices below threshold this cycle"),
                None => tracing::warn!("no prices observed for any date"),
            }
            return Ok(None);
        }

        let message = render_alerts(&results, &self.render, &Local::now());
        Ok(Some(Outgoing::Alert(message)))
    }
}

/// Sends booking links for every date; nothing is fetched or recorded.
pub(crate) struct ReminderMonitor<'a> {
    config: &'a AppConfig,
}

impl<'a> ReminderMonitor<'a> {
    pub(crate) fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }
}

impl CheckCycle for ReminderMonitor<'_> {
    async fn run_cycle(&mut self, _stop: &Cell<bool>) -> anyhow::Result<Option<Outgoing>> {
        tracing::info!(dates = self.config.queries().len(), "sending booking reminder");
        Ok(Some(Outgoing::Status(render_reminder(
            self.config,
            &Local::now(),
        ))))
    }
}

#[cfg(test)]
#[path = "monitor_test.rs"]
mod tests;
