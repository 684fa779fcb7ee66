use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::OptionsChain;
use crate::service::automation::market_hours::is_market_open;
use crate::service::finance::{FinanceService, FinanceServiceError};

/// Anything that can hand back a fresh options chain.
pub trait ChainSource: Send + Sync + 'static {
    fn fetch_chain(
        &self,
        symbol: &str,
        expiration: Option<&str>,
    ) -> impl Future<Output = Result<OptionsChain, FinanceServiceError>> + Send;
}

impl ChainSource for FinanceService {
    fn fetch_chain(
        &self,
        symbol: &str,
        expiration: Option<&str>,
    ) -> impl Future<Output = Result<OptionsChain, FinanceServiceError>> + Send {
        self.get_options_chain(symbol, expiration)
    }
}

/// Latest result published by a poller.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainUpdate {
    Chain(OptionsChain),
    Failed(String),
}

pub type MarketClock = Arc<dyn Fn(DateTime<Utc>) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Checked before the first refresh and again on every tick.
    pub market_open: MarketClock,
}

impl PollerConfig {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            market_open: Arc::new(is_market_open),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::with_interval(Duration::from_secs(30))
    }
}

/// Background refresh of one options chain.
///
/// The chain is fetched once immediately. Polling continues on the configured
/// interval only while the market is open; a closed market on any tick, or a
/// failed fetch, ends the task. Dropping the poller aborts it.
pub struct ChainPoller {
    updates: watch::Receiver<Option<ChainUpdate>>,
    handle: JoinHandle<()>,
}

impl ChainPoller {
    pub fn spawn<S: ChainSource>(
        source: Arc<S>,
        symbol: String,
        expiration: Option<String>,
        config: PollerConfig,
    ) -> Self {
        let (tx, rx) = watch::channel(None);

        let handle = tokio::spawn(async move {
            let open_at_start = (config.market_open)(Utc::now());

            if !refresh(source.as_ref(), &symbol, expiration.as_deref(), &tx).await {
                return;
            }
            if !open_at_start {
                info!("Market closed; {} options chain will not auto-refresh", symbol);
                return;
            }

            info!("Polling {} options chain every {:?}", symbol, config.interval);
            let mut interval = tokio::time::interval(config.interval);
            // First tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !(config.market_open)(Utc::now()) {
                    info!("Market closed; stopping {} options refresh", symbol);
                    break;
                }
                if !refresh(source.as_ref(), &symbol, expiration.as_deref(), &tx).await {
                    break;
                }
            }
        });

        Self {
            updates: rx,
            handle,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ChainUpdate>> {
        self.updates.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ChainPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// Returns whether polling should continue.
async fn refresh<S: ChainSource>(
    source: &S,
    symbol: &str,
    expiration: Option<&str>,
    tx: &watch::Sender<Option<ChainUpdate>>,
) -> bool {
    match source.fetch_chain(symbol, expiration).await {
        Ok(chain) => tx.send(Some(ChainUpdate::Chain(chain))).is_ok(),
        Err(err) => {
            warn!("options refresh for {} failed: {}", symbol, err);
            let _ = tx.send(Some(ChainUpdate::Failed(err.to_string())));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl FakeSource {
        fn new(fail_on: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_on,
            })
        }
    }

    impl ChainSource for FakeSource {
        fn fetch_chain(
            &self,
            _symbol: &str,
            expiration: Option<&str>,
        ) -> impl Future<Output = Result<OptionsChain, FinanceServiceError>> + Send {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let fail = self.fail_on == Some(n);
            let date = expiration.unwrap_or("2025-02-21").to_string();
            async move {
                if fail {
                    return Err(FinanceServiceError::Http("boom".into()));
                }
                Ok(OptionsChain {
                    date,
                    calls: Vec::new(),
                    puts: Vec::new(),
                    current_price: Some(n as f64),
                })
            }
        }
    }

    fn clock_open_for(checks: usize) -> MarketClock {
        let seen = Arc::new(AtomicUsize::new(0));
        Arc::new(move |_| seen.fetch_add(1, Ordering::SeqCst) < checks)
    }

    fn config(market_open: MarketClock) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(30),
            market_open,
        }
    }

    async fn wait_finished(poller: &ChainPoller) {
        for _ in 0..200 {
            if poller.is_finished() {
                return;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        panic!("poller never finished");
    }

    #[tokio::test(start_paused = true)]
    async fn closed_market_fetches_once() {
        let source = FakeSource::new(None);
        let poller = ChainPoller::spawn(source.clone(), "AAPL".into(), None, config(clock_open_for(0)));

        wait_finished(&poller).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let latest = poller.subscribe().borrow().clone();
        assert!(matches!(latest, Some(ChainUpdate::Chain(ref c)) if c.date == "2025-02-21"));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_market_closes_on_a_tick() {
        let source = FakeSource::new(None);
        // Open at start plus two ticks, closed on the third tick.
        let poller = ChainPoller::spawn(
            source.clone(),
            "SPY".into(),
            Some("2025-03-21".into()),
            config(clock_open_for(3)),
        );

        wait_finished(&poller).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        let latest = poller.subscribe().borrow().clone();
        assert!(matches!(latest, Some(ChainUpdate::Chain(ref c)) if c.current_price == Some(3.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_publishes_error_and_stops() {
        let source = FakeSource::new(Some(2));
        let poller = ChainPoller::spawn(source.clone(), "TSLA".into(), None, config(clock_open_for(usize::MAX)));

        wait_finished(&poller).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        let latest = poller.subscribe().borrow().clone();
        assert!(matches!(latest, Some(ChainUpdate::Failed(ref msg)) if msg.contains("boom")));
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_sees_each_refresh() {
        let source = FakeSource::new(None);
        let poller = ChainPoller::spawn(source, "QQQ".into(), None, config(clock_open_for(usize::MAX)));
        let mut rx = poller.subscribe();

        for expected in 1..=3 {
            rx.changed().await.unwrap();
            let update = rx.borrow_and_update().clone();
            assert!(matches!(update, Some(ChainUpdate::Chain(ref c)) if c.current_price == Some(expected as f64)));
        }
    }
}
