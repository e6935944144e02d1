//! Simulated Metrics Broadcaster
//!
//! Owns the prediction list and system state, perturbs both on two
//! independent timers, and fans snapshots out to registered listeners.
//!
//! Each tick applies all of its mutations and copies the snapshot while
//! holding the state lock, then releases the lock before notifying, so
//! listeners never see a partial update and may call back into the
//! broadcaster.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use pulse_core::{Prediction, PredictionState, Snapshot, SystemBounds, SystemState, UpdateCause};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{BroadcasterConfig, ConfigError};
use crate::generator::{self, PredictionGenerator};
use crate::listener::{ListenerId, ListenerRegistry, NotifyReport, Subscription};
use crate::query::{self, PredictionQuery, PredictionSummary};

/// Mutable simulation state, guarded as a unit
struct Simulation {
    /// Newest first
    predictions: VecDeque<Prediction>,
    system: SystemState,
    rng: StdRng,
    sequence: u64,
}

impl Simulation {
    fn snapshot(&self, cause: UpdateCause) -> Snapshot {
        Snapshot {
            sequence: self.sequence,
            cause,
            taken_at: Utc::now(),
            predictions: self.predictions.iter().cloned().collect(),
            system: self.system,
        }
    }
}

/// Handles of the two timer tasks
struct Tickers {
    predictions: JoinHandle<()>,
    networks: JoinHandle<()>,
}

impl Tickers {
    fn abort(self) {
        self.predictions.abort();
        self.networks.abort();
    }
}

/// Periodic simulated feed with snapshot fan-out
pub struct MetricsBroadcaster {
    config: BroadcasterConfig,
    generator: PredictionGenerator,
    state: Mutex<Simulation>,
    listeners: ListenerRegistry,
    tickers: Mutex<Option<Tickers>>,
}

impl MetricsBroadcaster {
    /// Create a broadcaster and seed its initial predictions
    ///
    /// Timers are not running until [`start`](Self::start) is called.
    pub fn new(config: BroadcasterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let generator = PredictionGenerator::new(config.catalog.clone())?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let now = Utc::now();
        let mut predictions = VecDeque::with_capacity(config.max_predictions);
        for _ in 0..config.initial_predictions.min(config.max_predictions) {
            predictions.push_front(generator.generate(&mut rng, now));
        }

        let system = config.initial_state.clamped(&config.bounds);

        info!(
            "Created metrics broadcaster with {} predictions (max {})",
            predictions.len(),
            config.max_predictions
        );

        Ok(Self {
            generator,
            state: Mutex::new(Simulation {
                predictions,
                system,
                rng,
                sequence: 0,
            }),
            listeners: ListenerRegistry::new(),
            tickers: Mutex::new(None),
            config,
        })
    }

    pub fn config(&self) -> &BroadcasterConfig {
        &self.config
    }

    pub fn bounds(&self) -> &SystemBounds {
        &self.config.bounds
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a listener and immediately deliver the current snapshot to it
    ///
    /// The listener is registered before the initial snapshot is taken, so no
    /// tick is missed, but a tick running on another thread may reach the
    /// listener before its `Initial` delivery. Listeners that care about order
    /// should drop snapshots whose `sequence` is not newer than the last one
    /// they handled.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = self.listeners.register(Arc::new(callback));
        let snapshot = self.state.lock().snapshot(UpdateCause::Initial);
        self.listeners.notify_one(id, &snapshot);
        debug!("{} subscribed at snapshot #{}", id, snapshot.sequence);
        self.listeners.subscription(id)
    }

    /// Remove a listener; idempotent
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Copy of the current predictions, newest first
    pub fn predictions(&self) -> Vec<Prediction> {
        self.state.lock().predictions.iter().cloned().collect()
    }

    pub fn system_state(&self) -> SystemState {
        self.state.lock().system
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot(UpdateCause::Requested)
    }

    pub fn filter_by_sport(&self, sport: &str) -> Vec<Prediction> {
        query::filter_by_sport(&self.predictions(), sport)
    }

    pub fn filter_by_min_confidence(&self, min_confidence: f64) -> Vec<Prediction> {
        query::filter_by_min_confidence(&self.predictions(), min_confidence)
    }

    pub fn filter_by_state(&self, state: PredictionState) -> Vec<Prediction> {
        query::filter_by_state(&self.predictions(), state)
    }

    pub fn query(&self, query: &PredictionQuery) -> Vec<Prediction> {
        query.apply(&self.predictions())
    }

    pub fn summary(&self) -> PredictionSummary {
        query::summarize(&self.predictions())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Run one prediction tick and notify listeners
    ///
    /// Existing predictions drift, a new one may be generated, the list is
    /// truncated to capacity, and the float metrics take one step.
    pub fn tick_predictions(&self) -> Snapshot {
        let snapshot = {
            let mut guard = self.state.lock();
            let Simulation {
                predictions,
                system,
                rng,
                sequence,
            } = &mut *guard;

            for prediction in predictions.iter_mut() {
                generator::drift(prediction, rng, self.config.state_advance_probability);
            }

            if rng.random_bool(self.config.spawn_probability) {
                predictions.push_front(self.generator.generate(rng, Utc::now()));
            }
            predictions.truncate(self.config.max_predictions);

            let bounds = &self.config.bounds;
            system.coherence = bounds.coherence.perturb(system.coherence, rng.random());
            system.entanglement = bounds.entanglement.perturb(system.entanglement, rng.random());
            system.accuracy = bounds.accuracy.perturb(system.accuracy, rng.random());

            *sequence += 1;
            guard.snapshot(UpdateCause::PredictionTick)
        };

        self.publish(&snapshot);
        snapshot
    }

    /// Run one network tick and notify listeners
    pub fn tick_networks(&self) -> Snapshot {
        let snapshot = {
            let mut guard = self.state.lock();
            let sample = guard.rng.random();
            guard.system.active_networks = self
                .config
                .bounds
                .active_networks
                .perturb_count(guard.system.active_networks, sample);
            guard.sequence += 1;
            guard.snapshot(UpdateCause::NetworkTick)
        };

        self.publish(&snapshot);
        snapshot
    }

    /// Flip the boost flag and notify listeners right away
    ///
    /// Returns the new value.
    pub fn toggle_boost(&self) -> bool {
        let snapshot = {
            let mut guard = self.state.lock();
            guard.system.boost_enabled = !guard.system.boost_enabled;
            guard.sequence += 1;
            guard.snapshot(UpdateCause::BoostToggled)
        };

        info!("Boost {}", if snapshot.system.boost_enabled { "enabled" } else { "disabled" });
        self.publish(&snapshot);
        snapshot.system.boost_enabled
    }

    fn publish(&self, snapshot: &Snapshot) -> NotifyReport {
        let report = self.listeners.notify(snapshot);
        if report.failed > 0 {
            warn!(
                "Snapshot #{} ({:?}): {} listener(s) failed, {} delivered",
                snapshot.sequence, snapshot.cause, report.failed, report.delivered
            );
        } else {
            debug!(
                "Snapshot #{} ({:?}) delivered to {} listener(s), {} predictions",
                snapshot.sequence,
                snapshot.cause,
                report.delivered,
                snapshot.prediction_count()
            );
        }
        report
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Spawn both timers on the current Tokio runtime
    ///
    /// The first tick of each timer fires one full period after start.
    /// Returns false if the timers were already running.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut tickers = self.tickers.lock();
        if tickers.is_some() {
            warn!("Metrics broadcaster already running");
            return false;
        }

        info!(
            "Starting metrics broadcaster (predictions every {:?}, networks every {:?})",
            self.config.prediction_interval, self.config.network_interval
        );

        *tickers = Some(Tickers {
            predictions: spawn_ticker(
                Arc::downgrade(self),
                self.config.prediction_interval,
                |broadcaster| {
                    broadcaster.tick_predictions();
                },
            ),
            networks: spawn_ticker(
                Arc::downgrade(self),
                self.config.network_interval,
                |broadcaster| {
                    broadcaster.tick_networks();
                },
            ),
        });
        true
    }

    /// Cancel both timers
    ///
    /// A notification already being delivered completes. Returns false if
    /// the timers were not running.
    pub fn stop(&self) -> bool {
        match self.tickers.lock().take() {
            Some(tickers) => {
                tickers.abort();
                info!("Stopped metrics broadcaster");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.tickers.lock().is_some()
    }
}

/// Run `tick` every `period` for as long as the broadcaster is alive
fn spawn_ticker(
    broadcaster: Weak<MetricsBroadcaster>,
    period: Duration,
    tick: fn(&MetricsBroadcaster),
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(broadcaster) = broadcaster.upgrade() else {
                debug!("Metrics broadcaster dropped, ending ticker");
                break;
            };
            tick(&broadcaster);
        }
    })
}

impl Drop for MetricsBroadcaster {
    fn drop(&mut self) {
        if let Some(tickers) = self.tickers.get_mut().take() {
            tickers.abort();
        }
    }
}

impl std::fmt::Debug for MetricsBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsBroadcaster")
            .field("listeners", &self.listener_count())
            .field("running", &self.is_running())
            .finish()
    }
}
