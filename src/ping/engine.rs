use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tokio::time::interval;
use tracing::{debug, warn};

use super::dispatcher::InboundDispatcher;
use super::stats::{PingStats, StatsRecorder};
use super::{Outcome, PingEvent};
use crate::core::{Config, Error, ErrorKind, NodeId, Result};
use crate::network::{Resolver, Transport};
use crate::protocol::{EchoRequest, MessageCodec, RequestTracker, Sequence};
use crate::time::Clock;

/// Completion slot stored alongside each pending entry
pub(crate) type Waiter = Option<oneshot::Sender<Outcome>>;

/// State shared by the engine, its clones and its dispatchers
pub(crate) struct Shared {
    pub(crate) node_id: NodeId,
    pub(crate) codec: MessageCodec,
    pub(crate) tracker: Mutex<RequestTracker<Waiter>>,
    pub(crate) transport: Arc<dyn Transport>,
    resolver: Arc<dyn Resolver>,
    pub(crate) clock: Arc<dyn Clock>,
    events: broadcast::Sender<PingEvent>,
    stats: Mutex<StatsRecorder>,
    default_timeout: Duration,
    // only written with the tracker lock held
    stopped: AtomicBool,
}

impl Shared {
    pub(crate) fn lock_tracker(&self) -> MutexGuard<'_, RequestTracker<Waiter>> {
        // every tracker operation leaves it consistent, so a poisoned lock is still usable
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn with_stats(&self, f: impl FnOnce(&mut StatsRecorder)) {
        f(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Delivers a probe's terminal outcome. Called once per retired entry,
    /// never while the tracker lock is held.
    pub(crate) fn complete(
        &self,
        target: NodeId,
        sequence: Sequence,
        waiter: Waiter,
        outcome: Outcome,
    ) {
        self.with_stats(|stats| match outcome {
            Outcome::Success { round_trip } => stats.received(round_trip),
            Outcome::Timeout => stats.timeout(),
            Outcome::Error { .. } => {}
        });

        match outcome {
            Outcome::Success { round_trip } => debug!(
                node = %target,
                sequence,
                rtt_ms = round_trip.as_secs_f64() * 1000.0,
                "echo reply received"
            ),
            Outcome::Timeout => debug!(node = %target, sequence, "echo request timed out"),
            Outcome::Error { kind } => debug!(node = %target, sequence, ?kind, "echo request failed"),
        }

        if let Some(tx) = waiter {
            // the caller may have stopped listening
            let _ = tx.send(outcome);
        }
        let _ = self.events.send(PingEvent {
            target,
            sequence,
            outcome,
        });
    }
}

/// Issues echo probes and delivers their outcomes.
///
/// The engine is cheap to clone; all clones share one tracker. Expiry is
/// driven from outside, either by calling [`PingEngine::sweep`] or by
/// spawning [`PingEngine::run_sweeper`]. [`PingEngine::shutdown`] stops
/// every clone at once.
#[derive(Clone)]
pub struct PingEngine {
    shared: Arc<Shared>,
}

/// Future resolving to the outcome of one probe.
///
/// Dropping the handle abandons interest; the probe is still retired by the
/// sweep and its event still published.
#[derive(Debug)]
pub struct PingHandle {
    target: NodeId,
    sequence: Sequence,
    rx: oneshot::Receiver<Outcome>,
}

impl PingHandle {
    /// Node being probed
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Sequence the request was sent with
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }
}

impl Future for PingHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        Pin::new(&mut self.rx).poll(cx).map(|result| {
            // only reachable if the engine was dropped with the probe outstanding
            result.unwrap_or(Outcome::Error {
                kind: ErrorKind::Transport,
            })
        })
    }
}

impl PingEngine {
    /// Creates an engine for the node described by `config`
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        resolver: Arc<dyn Resolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let shared = Arc::new(Shared {
            node_id: config.node_id,
            codec: MessageCodec::new(),
            tracker: Mutex::new(RequestTracker::new(config.mismatch_policy)),
            transport,
            resolver,
            clock,
            events,
            stats: Mutex::new(StatsRecorder::default()),
            default_timeout: config.default_timeout,
            stopped: AtomicBool::new(false),
        });
        PingEngine { shared }
    }

    /// This node's identity
    pub fn node_id(&self) -> NodeId {
        self.shared.node_id
    }

    /// Returns a dispatcher that routes inbound datagrams into this engine
    pub fn dispatcher(&self) -> InboundDispatcher {
        InboundDispatcher::new(Arc::clone(&self.shared))
    }

    /// Subscribes to completion events for probes issued after this call
    pub fn subscribe(&self) -> broadcast::Receiver<PingEvent> {
        self.shared.events.subscribe()
    }

    /// Number of probes still awaiting a reply or expiry
    pub fn pending(&self) -> usize {
        self.shared.lock_tracker().len()
    }

    /// Snapshot of the engine's counters and latency summary
    pub fn stats(&self) -> PingStats {
        self.shared
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Sends one echo request to `target` and returns a handle to its outcome.
    ///
    /// Fails synchronously, without registering anything, if `target` cannot
    /// be resolved; fails with [`Error::ResourceExhausted`] if every sequence
    /// is in flight.
    pub fn start_ping(&self, target: NodeId, timeout: Duration) -> Result<PingHandle> {
        let (tx, rx) = oneshot::channel();
        let sequence = self.issue(target, timeout, Some(tx))?;
        Ok(PingHandle {
            target,
            sequence,
            rx,
        })
    }

    /// Probes `target` and waits for the outcome
    pub async fn ping(&self, target: NodeId, timeout: Duration) -> Outcome {
        match self.start_ping(target, timeout) {
            Ok(handle) => handle.await,
            Err(e) => Outcome::Error { kind: e.kind() },
        }
    }

    /// Fire-and-forget probe using the configured default timeout.
    ///
    /// The outcome is only published to [`PingEngine::subscribe`] receivers.
    pub fn send_ping(&self, target: NodeId) -> Result<Sequence> {
        self.issue(target, self.shared.default_timeout, None)
    }

    /// Repeats independent probes until one succeeds or `attempts` run out.
    ///
    /// Each attempt is a separate `ping` with its own sequence. Resolution
    /// failures are not retried.
    pub async fn ping_with_retries(
        &self,
        target: NodeId,
        timeout: Duration,
        attempts: usize,
    ) -> Outcome {
        let mut last = Outcome::Timeout;
        for attempt in 1..=attempts.max(1) {
            last = self.ping(target, timeout).await;
            match last {
                Outcome::Success { .. }
                | Outcome::Error {
                    kind: ErrorKind::UnknownNode,
                } => break,
                _ => debug!(node = %target, attempt, ?last, "probe attempt failed"),
            }
        }
        last
    }

    /// Retires every probe whose deadline has passed, reporting each as a
    /// timeout. Returns how many expired.
    pub fn sweep(&self) -> usize {
        let now = self.shared.clock.now();
        let expired = self.shared.lock_tracker().expire(now);
        let count = expired.len();
        for e in expired {
            self.shared
                .complete(e.entry.target_id, e.sequence, e.entry.waiter, Outcome::Timeout);
        }
        count
    }

    /// Sweeps for expired probes every `period` until the engine is shut down
    pub async fn run_sweeper(self, period: Duration) -> Result<()> {
        if period.is_zero() {
            return Err(Error::config("sweep interval must be non-zero"));
        }
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            if self.is_stopped() {
                debug!(node = %self.shared.node_id, "engine stopped, sweeper exiting");
                return Ok(());
            }
            self.sweep();
        }
    }

    /// Whether [`PingEngine::shutdown`] has been called on any clone
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    /// Stops the engine for all of its clones.
    ///
    /// Every outstanding probe completes with a transport error and later
    /// probes are rejected synchronously. Returns how many probes were
    /// failed. Calling it again is a no-op.
    pub fn shutdown(&self) -> usize {
        let drained = {
            let mut tracker = self.shared.lock_tracker();
            self.shared.stopped.store(true, Ordering::Release);
            tracker.drain()
        };
        let count = drained.len();
        for e in drained {
            self.shared.complete(
                e.entry.target_id,
                e.sequence,
                e.entry.waiter,
                Outcome::Error {
                    kind: ErrorKind::Transport,
                },
            );
        }
        if count > 0 {
            debug!(node = %self.shared.node_id, count, "failed outstanding probes on shutdown");
        }
        count
    }

    fn issue(&self, target: NodeId, timeout: Duration, waiter: Waiter) -> Result<Sequence> {
        let shared = &self.shared;
        let addr = shared
            .resolver
            .resolve(target)
            .ok_or(Error::UnknownNode(target))?;

        let now = shared.clock.now();
        let sequence = {
            let mut tracker = shared.lock_tracker();
            if shared.stopped.load(Ordering::Acquire) {
                return Err(Error::transport("engine stopped"));
            }
            tracker.register(target, timeout, now, waiter)?
        };

        let request = EchoRequest {
            requester_id: shared.node_id,
            target_id: target,
            sequence,
        };
        let payload = shared.codec.encode(&request.into());

        if let Err(e) = shared.transport.send(addr, payload) {
            warn!(node = %target, sequence, %addr, error = %e, "failed to send echo request");
            return match shared.lock_tracker().cancel(sequence) {
                Some(_) => Err(e),
                // a sweep already retired it and delivered the timeout
                None => Ok(sequence),
            };
        }

        shared.with_stats(StatsRecorder::sent);
        debug!(node = %target, sequence, %addr, "echo request sent");
        Ok(sequence)
    }
}
