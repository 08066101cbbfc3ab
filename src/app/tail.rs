// relayctl - app/tail.rs
//
// Live tail of webhook delivery logs by polling.
//
// The service only offers "the most recent K entries", so the tailer keeps a
// watermark: the newest timestamp already shown. Each poll fetches the top-K
// window, keeps entries strictly newer than the watermark, emits them oldest
// first, and advances the watermark to the newest emitted timestamp.
//
// A burst of more than K deliveries between two polls cannot be fully seen.
// When every entry of a full window is new, a `WindowSaturated` event is
// emitted ahead of the batch so the operator knows entries may be missing.
//
// Cancellation is observed only while waiting (the fetch and the sleep).
// A batch that has been fetched is always emitted in full.

use crate::app::api_client::ApiClient;
use crate::core::model::{LogEntry, LogQuery};
use crate::platform::config::AppConfig;
use crate::util::constants;
use crate::util::error::ApiError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Something that can return the most recent delivery log entries.
pub trait LogSource {
    /// Up to `window` most recent entries, newest first, optionally
    /// restricted to one environment.
    fn fetch_recent(
        &self,
        window: u32,
        environment: Option<&str>,
    ) -> impl Future<Output = Result<Vec<LogEntry>, ApiError>>;
}

impl LogSource for ApiClient {
    async fn fetch_recent(
        &self,
        window: u32,
        environment: Option<&str>,
    ) -> Result<Vec<LogEntry>, ApiError> {
        let query = LogQuery::recent(window, environment.map(str::to_string));
        self.get_webhook_logs(&query).await
    }
}

/// Polling parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailConfig {
    /// Entries fetched per poll (K).
    pub window: u32,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
    /// Only tail this environment, if set.
    pub environment: Option<String>,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            window: constants::DEFAULT_TAIL_WINDOW,
            poll_interval: Duration::from_millis(constants::TAIL_POLL_INTERVAL_MS),
            error_backoff: Duration::from_millis(constants::TAIL_ERROR_BACKOFF_MS),
            environment: None,
        }
    }
}

impl From<&AppConfig> for TailConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            window: config.tail_window,
            poll_interval: config.tail_poll_interval,
            error_backoff: config.tail_error_backoff,
            environment: None,
        }
    }
}

/// What the tailer reports to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum TailEvent {
    /// The loop started; only entries newer than `watermark` will be shown.
    Started { watermark: DateTime<Utc> },

    /// A delivery newer than everything emitted so far.
    Entry(LogEntry),

    /// A full window of new entries arrived; older ones may have been skipped.
    WindowSaturated { window: u32 },

    /// A poll failed; the loop continues after `retry_in`.
    PollFailed { error: ApiError, retry_in: Duration },

    /// The loop ended after emitting `emitted` entries.
    Stopped { emitted: u64 },
}

/// Counters returned when a tail session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailSummary {
    pub polls: u64,
    pub failures: u64,
    pub emitted: u64,
}

/// Result of one successful poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollBatch {
    /// New entries, oldest first.
    pub entries: Vec<LogEntry>,
    /// Every entry of a full window was newer than the watermark.
    pub saturated: bool,
}

/// Poll-based log follower. Single use: `run` consumes it.
pub struct LogTailer<S> {
    source: S,
    config: TailConfig,
    cancel: CancellationToken,
    watermark: DateTime<Utc>,
}

impl<S: LogSource> LogTailer<S> {
    /// Tailer whose watermark is the current wall-clock time.
    pub fn new(source: S, config: TailConfig, cancel: CancellationToken) -> Self {
        Self::with_watermark(source, config, cancel, Utc::now())
    }

    /// Tailer starting from an explicit watermark.
    pub fn with_watermark(
        source: S,
        config: TailConfig,
        cancel: CancellationToken,
        watermark: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            config,
            cancel,
            watermark,
        }
    }

    /// Newest timestamp already emitted (or the start instant).
    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// Fetch once, select the new entries and advance the watermark.
    pub async fn poll_once(&mut self) -> Result<PollBatch, ApiError> {
        let fetched = self
            .source
            .fetch_recent(self.config.window, self.config.environment.as_deref())
            .await?;

        let saturated = fetched.len() >= self.config.window as usize
            && !fetched.is_empty()
            && fetched.iter().all(|e| e.timestamp > self.watermark);

        let entries = select_new(fetched, self.watermark);
        if let Some(last) = entries.last() {
            self.watermark = last.timestamp;
        }
        Ok(PollBatch { entries, saturated })
    }

    /// Poll until cancelled, reporting everything to `sink`.
    pub async fn run(mut self, mut sink: impl FnMut(TailEvent)) -> TailSummary {
        let cancel = self.cancel.clone();
        let mut summary = TailSummary::default();

        tracing::info!(
            watermark = %self.watermark,
            window = self.config.window,
            environment = ?self.config.environment,
            "Tail started"
        );
        sink(TailEvent::Started {
            watermark: self.watermark,
        });

        loop {
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                polled = self.poll_once() => polled,
            };
            summary.polls += 1;

            let delay = match polled {
                Ok(batch) => {
                    if batch.saturated {
                        tracing::warn!(
                            window = self.config.window,
                            "Tail window saturated; older entries may have been skipped"
                        );
                        sink(TailEvent::WindowSaturated {
                            window: self.config.window,
                        });
                    }
                    if !batch.entries.is_empty() {
                        tracing::debug!(
                            count = batch.entries.len(),
                            watermark = %self.watermark,
                            "New log entries"
                        );
                    }
                    for entry in batch.entries {
                        summary.emitted += 1;
                        sink(TailEvent::Entry(entry));
                    }
                    self.config.poll_interval
                }
                Err(error) => {
                    summary.failures += 1;
                    let retry_in = self.config.error_backoff;
                    tracing::warn!(error = %error, retry_in_ms = retry_in.as_millis() as u64, "Tail poll failed");
                    sink(TailEvent::PollFailed { error, retry_in });
                    retry_in
                }
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!(
            polls = summary.polls,
            failures = summary.failures,
            emitted = summary.emitted,
            "Tail stopped"
        );
        sink(TailEvent::Stopped {
            emitted: summary.emitted,
        });
        summary
    }
}

/// Entries strictly newer than `watermark`, oldest first, with repeated
/// `(webhook_id, timestamp)` pairs collapsed.
pub fn select_new(entries: Vec<LogEntry>, watermark: DateTime<Utc>) -> Vec<LogEntry> {
    let mut fresh: Vec<LogEntry> = entries
        .into_iter()
        .filter(|e| e.timestamp > watermark)
        .collect();
    fresh.sort_by_key(|e| e.timestamp);

    let mut seen = HashSet::new();
    fresh.retain(|e| seen.insert((e.webhook_id.clone(), e.timestamp)));
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::DeliveryStatus;
    use chrono::TimeZone;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    type Reply = Result<Vec<LogEntry>, ApiError>;

    /// Replays a fixed list of poll results, then cancels the tailer.
    struct Scripted {
        replies: RefCell<VecDeque<Reply>>,
        calls: Cell<usize>,
        cancel: CancellationToken,
    }

    impl Scripted {
        fn new(replies: Vec<Reply>, cancel: &CancellationToken) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: Cell::new(0),
                cancel: cancel.clone(),
            }
        }
    }

    impl LogSource for &Scripted {
        async fn fetch_recent(
            &self,
            _window: u32,
            _environment: Option<&str>,
        ) -> Result<Vec<LogEntry>, ApiError> {
            self.calls.set(self.calls.get() + 1);
            let next = self.replies.borrow_mut().pop_front();
            match next {
                Some(reply) => reply,
                None => {
                    self.cancel.cancel();
                    Ok(Vec::new())
                }
            }
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn at(secs: i64, id: &str) -> LogEntry {
        LogEntry {
            timestamp: t0() + chrono::Duration::seconds(secs),
            environment: "dev".to_string(),
            status: DeliveryStatus::Delivered,
            webhook_id: id.to_string(),
            response_code: Some(200),
            duration_ms: Some(12),
        }
    }

    fn config(window: u32) -> TailConfig {
        TailConfig {
            window,
            ..TailConfig::default()
        }
    }

    fn entries_of(events: &[TailEvent]) -> Vec<LogEntry> {
        events
            .iter()
            .filter_map(|e| match e {
                TailEvent::Entry(entry) => Some(entry.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn select_new_filters_sorts_and_dedups() {
        let picked = select_new(
            vec![at(2, "c"), at(1, "b"), at(1, "b"), at(-1, "a"), at(0, "z")],
            t0(),
        );
        let ids: Vec<_> = picked.iter().map(|e| e.webhook_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    /// Watermark T0; poll returns {T0-1, T0+1, T0+2} newest first; only the
    /// two newer entries are emitted, ascending, and the watermark is T0+2.
    #[tokio::test(start_paused = true)]
    async fn first_poll_emits_only_entries_after_start() {
        let cancel = CancellationToken::new();
        let source = Scripted::new(vec![Ok(vec![at(2, "w2"), at(1, "w1"), at(-1, "w0")])], &cancel);
        let mut tailer = LogTailer::with_watermark(&source, config(10), cancel.clone(), t0());

        let batch = tailer.poll_once().await.unwrap();
        let ids: Vec<_> = batch.entries.iter().map(|e| e.webhook_id.as_str()).collect();
        assert_eq!(ids, vec!["w1", "w2"]);
        assert!(!batch.saturated);
        assert_eq!(tailer.watermark(), t0() + chrono::Duration::seconds(2));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_windows_never_repeat_entries() {
        let cancel = CancellationToken::new();
        let source = Scripted::new(
            vec![
                Ok(vec![at(2, "b"), at(1, "a")]),
                Ok(vec![at(3, "c"), at(2, "b"), at(1, "a")]),
                Ok(vec![at(3, "c"), at(2, "b")]),
                Ok(vec![at(5, "e"), at(4, "d"), at(3, "c")]),
            ],
            &cancel,
        );
        let tailer = LogTailer::with_watermark(&source, config(10), cancel.clone(), t0());

        let mut events = Vec::new();
        let summary = tailer.run(|e| events.push(e)).await;

        let emitted = entries_of(&events);
        let ids: Vec<_> = emitted.iter().map(|e| e.webhook_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert!(emitted.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(summary.emitted, 5);
        assert_eq!(summary.failures, 0);

        assert!(matches!(events.first(), Some(TailEvent::Started { .. })));
        assert_eq!(events.last(), Some(&TailEvent::Stopped { emitted: 5 }));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_is_reported_and_loop_continues() {
        let cancel = CancellationToken::new();
        let source = Scripted::new(
            vec![
                Err(ApiError::ServerError { status: 503 }),
                Err(ApiError::TimedOut),
                Ok(vec![at(1, "a")]),
            ],
            &cancel,
        );
        let tailer = LogTailer::with_watermark(&source, config(10), cancel.clone(), t0());

        let started = tokio::time::Instant::now();
        let mut events = Vec::new();
        let summary = tailer.run(|e| events.push(e)).await;

        let failures: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                TailEvent::PollFailed { error, retry_in } => Some((error.clone(), *retry_in)),
                _ => None,
            })
            .collect();
        let backoff = TailConfig::default().error_backoff;
        assert_eq!(
            failures,
            vec![
                (ApiError::ServerError { status: 503 }, backoff),
                (ApiError::TimedOut, backoff)
            ]
        );
        assert_eq!(entries_of(&events).len(), 1);
        assert_eq!(summary.failures, 2);
        assert_eq!(source.calls.get(), 4);
        // Two backoffs plus one poll interval of virtual time elapsed.
        assert!(started.elapsed() >= backoff * 2 + TailConfig::default().poll_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_makes_no_requests() {
        let cancel = CancellationToken::new();
        let source = Scripted::new(vec![Ok(vec![at(1, "a")])], &cancel);
        cancel.cancel();

        let tailer = LogTailer::with_watermark(&source, config(10), cancel.clone(), t0());
        let mut events = Vec::new();
        let summary = tailer.run(|e| events.push(e)).await;

        assert_eq!(source.calls.get(), 0);
        assert_eq!(summary, TailSummary::default());
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], TailEvent::Stopped { emitted: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_sleep_keeps_emitted_batch() {
        let cancel = CancellationToken::new();
        // Plenty of replies; the test cancels from the sink instead.
        let source = Scripted::new(
            vec![Ok(vec![at(2, "b"), at(1, "a")]), Ok(vec![at(3, "c")])],
            &cancel,
        );
        let tailer = LogTailer::with_watermark(&source, config(10), cancel.clone(), t0());

        let stopper = cancel.clone();
        let mut events = Vec::new();
        let summary = tailer
            .run(|e| {
                if matches!(e, TailEvent::Entry(_)) {
                    stopper.cancel();
                }
                events.push(e);
            })
            .await;

        // Cancelled after the first entry, yet the whole batch went out.
        assert_eq!(summary.emitted, 2);
        assert_eq!(source.calls.get(), 1);
        assert_eq!(entries_of(&events).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn full_window_of_new_entries_reports_saturation() {
        let cancel = CancellationToken::new();
        let source = Scripted::new(
            vec![
                Ok(vec![at(3, "c"), at(2, "b"), at(1, "a")]),
                Ok(vec![at(4, "d"), at(3, "c"), at(2, "b")]),
            ],
            &cancel,
        );
        let tailer = LogTailer::with_watermark(&source, config(3), cancel.clone(), t0());

        let mut events = Vec::new();
        tailer.run(|e| events.push(e)).await;

        let saturated = events
            .iter()
            .position(|e| matches!(e, TailEvent::WindowSaturated { window: 3 }))
            .expect("saturation event");
        let first_entry = events
            .iter()
            .position(|e| matches!(e, TailEvent::Entry(_)))
            .unwrap();
        assert!(saturated < first_entry);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, TailEvent::WindowSaturated { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn config_follows_app_config() {
        let app = AppConfig {
            tail_window: 25,
            tail_poll_interval: Duration::from_millis(500),
            ..AppConfig::default()
        };
        let tail = TailConfig::from(&app);
        assert_eq!(tail.window, 25);
        assert_eq!(tail.poll_interval, Duration::from_millis(500));
        assert_eq!(tail.error_backoff, app.tail_error_backoff);
    }
}
