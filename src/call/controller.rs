use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    budget::{
        format::{at_maximum_message, cooldown_message, time_added_message},
        CallTimeBudget, ExtensionResult, RejectReason,
    },
    clock::{Clock, SystemClock},
    models::{CallSession, CallStatus, CallSummary, ExtensionRequest},
    settings::CallSettings,
};

use super::events::{BudgetSnapshot, CallEvent};

struct CallState {
    budget: CallTimeBudget,
    session: CallSession,
    extensions: Vec<ExtensionRequest>,
    /// Set while the budget sits inside the warning window.
    warned: bool,
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Drives one call: ticks its budget once per interval, arbitrates extension
/// requests against the injected clock and broadcasts what changed.
///
/// Expiry is only announced. Ending the call is up to the caller.
#[derive(Clone)]
pub struct CallController {
    state: Arc<Mutex<CallState>>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<CallEvent>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    heartbeat_every_ticks: u32,
    max_minutes: u64,
}

impl CallController {
    pub fn new(settings: &CallSettings, clock: Arc<dyn Clock>) -> Result<Self> {
        settings.validate()?;
        let budget = CallTimeBudget::new(&settings.budget)?;
        let (events, _) = broadcast::channel(settings.event_capacity);

        Ok(Self {
            state: Arc::new(Mutex::new(CallState {
                budget,
                session: CallSession::new(Uuid::new_v4().to_string()),
                extensions: Vec::new(),
                warned: false,
            })),
            clock,
            events,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: settings.tick_interval(),
            heartbeat_every_ticks: settings.heartbeat_every(),
            max_minutes: settings.budget.max_minutes,
        })
    }

    pub fn with_system_clock(settings: &CallSettings) -> Result<Self> {
        Self::new(settings, Arc::new(SystemClock))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.events.subscribe()
    }

    pub async fn call_id(&self) -> String {
        self.state.lock().await.session.id.clone()
    }

    pub async fn status(&self) -> CallStatus {
        self.state.lock().await.session.status
    }

    pub async fn snapshot(&self) -> BudgetSnapshot {
        let guard = self.state.lock().await;
        BudgetSnapshot::capture(&guard.budget, self.clock.now_millis())
    }

    pub async fn extension_history(&self) -> Vec<ExtensionRequest> {
        self.state.lock().await.extensions.clone()
    }

    pub async fn start(&self) -> Result<BudgetSnapshot> {
        let (snapshot, expired) = {
            let mut guard = self.state.lock().await;
            if guard.session.status != CallStatus::Pending {
                bail!(
                    "call {} already started (status {})",
                    guard.session.id,
                    guard.session.status.as_str()
                );
            }

            guard.session.started_at = Some(self.clock.now());
            let snapshot = BudgetSnapshot::capture(&guard.budget, self.clock.now_millis());
            let expired = snapshot.remaining_seconds == 0;
            guard.session.status = if expired {
                CallStatus::Expired
            } else {
                CallStatus::Running
            };

            info!(
                "Call {} started with {} on the clock ({})",
                guard.session.id,
                snapshot.display,
                guard.session.status.as_str()
            );
            (snapshot, expired)
        };

        self.emit(CallEvent::StateChanged(snapshot.clone()));

        if expired {
            warn!("Call started with an empty budget; not ticking");
            self.emit(CallEvent::Expired(snapshot.clone()));
        } else {
            self.spawn_ticker().await;
        }

        Ok(snapshot)
    }

    /// Asks for more time on behalf of `requester`.
    ///
    /// A denial is a normal outcome and comes back as
    /// [`ExtensionResult::Rejected`]; only calling this outside an active
    /// call is an error.
    pub async fn request_extension(&self, requester: &str) -> Result<ExtensionResult> {
        let requested_at = self.clock.now();
        let now_ms = requested_at.timestamp_millis();

        let (result, event, revived) = {
            let mut guard = self.state.lock().await;
            match guard.session.status {
                CallStatus::Running | CallStatus::Expired => {}
                CallStatus::Pending => bail!("call {} has not started", guard.session.id),
                CallStatus::Ended => bail!("call {} already ended", guard.session.id),
            }

            let previous_remaining = guard.budget.remaining_seconds();
            let cooldown_ms = guard.budget.cooldown_remaining_ms(now_ms);
            let result = guard.budget.request_extension(now_ms);
            let request =
                ExtensionRequest::record(requester, requested_at, result, previous_remaining);
            guard.extensions.push(request.clone());

            let mut revived = false;
            let event = match result {
                ExtensionResult::Accepted {
                    new_remaining_seconds,
                } => {
                    if guard.session.status == CallStatus::Expired {
                        guard.session.status = CallStatus::Running;
                        revived = true;
                    }
                    if !guard.budget.is_almost_out_of_time() {
                        guard.warned = false;
                    }
                    let message = time_added_message(
                        new_remaining_seconds.saturating_sub(previous_remaining),
                        new_remaining_seconds,
                    );
                    info!(
                        "Call {}: {} extended the call to {}s",
                        guard.session.id, requester, new_remaining_seconds
                    );
                    CallEvent::ExtensionGranted {
                        request,
                        message,
                        snapshot: BudgetSnapshot::capture(&guard.budget, now_ms),
                    }
                }
                ExtensionResult::Rejected { reason } => {
                    let message = match reason {
                        RejectReason::Cooldown => cooldown_message(guard.budget.cooldown_ms()),
                        RejectReason::AtMaximum => at_maximum_message(self.max_minutes),
                    };
                    info!(
                        "Call {}: extension from {} rejected ({}, {}ms left on cooldown)",
                        guard.session.id,
                        requester,
                        reason.as_str(),
                        cooldown_ms
                    );
                    CallEvent::ExtensionRejected {
                        request,
                        reason,
                        message,
                    }
                }
            };

            (result, event, revived)
        };

        self.emit(event);

        if revived {
            info!("Expired call revived by extension; restarting ticker");
            self.emit(CallEvent::StateChanged(self.snapshot().await));
            self.spawn_ticker().await;
        }

        Ok(result)
    }

    pub async fn end_call(&self) -> Result<CallSummary> {
        let summary = {
            let mut guard = self.state.lock().await;
            match guard.session.status {
                CallStatus::Pending => bail!("call {} has not started", guard.session.id),
                CallStatus::Ended => bail!("call {} already ended", guard.session.id),
                CallStatus::Running | CallStatus::Expired => {}
            }

            let started_at = guard
                .session
                .started_at
                .ok_or_else(|| anyhow!("missing start time for call {}", guard.session.id))?;
            let ended_at = self.clock.now();

            info!(
                "Call {} moving from {} to {}",
                guard.session.id,
                guard.session.status.as_str(),
                CallStatus::Ended.as_str()
            );
            guard.session.status = CallStatus::Ended;
            guard.session.ended_at = Some(ended_at);

            CallSummary {
                id: guard.session.id.clone(),
                started_at,
                ended_at,
                elapsed_seconds: guard.budget.elapsed_seconds(),
                remaining_seconds: guard.budget.remaining_seconds(),
                extensions: guard.extensions.clone(),
            }
        };

        self.cancel_ticker().await?;

        info!(
            "Call {} ended after {}s ({} extensions granted)",
            summary.id,
            summary.elapsed_seconds,
            summary.accepted_extensions()
        );
        self.emit(CallEvent::Ended(summary.clone()));

        Ok(summary)
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(previous) = ticker_guard.take() {
            previous.cancel.cancel();
            previous.handle.abort();
        }

        let state = self.state.clone();
        let events = self.events.clone();
        let clock = self.clock.clone();
        let tick_interval = self.tick_interval;
        let heartbeat_every = self.heartbeat_every_ticks;
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + tick_interval, tick_interval);
            let mut ticks: u32 = 0;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let (snapshot, entered_warning, call_id) = {
                    let mut guard = state.lock().await;
                    if guard.session.status != CallStatus::Running {
                        break;
                    }
                    guard.budget.tick();
                    let snapshot = BudgetSnapshot::capture(&guard.budget, clock.now_millis());
                    let entered_warning = snapshot.almost_out_of_time && !guard.warned;
                    guard.warned = snapshot.almost_out_of_time;
                    if snapshot.remaining_seconds == 0 {
                        guard.session.status = CallStatus::Expired;
                    }
                    (snapshot, entered_warning, guard.session.id.clone())
                };

                let _ = events.send(CallEvent::Tick(snapshot.clone()));

                if entered_warning {
                    info!("Call {call_id} is almost out of time ({})", snapshot.display);
                    let _ = events.send(CallEvent::AlmostOutOfTime(snapshot.clone()));
                }

                if snapshot.remaining_seconds == 0 {
                    info!("Call {call_id} ran out of time");
                    let _ = events.send(CallEvent::Expired(snapshot));
                    break;
                }

                ticks = ticks.wrapping_add(1);
                if ticks % heartbeat_every == 0 {
                    debug!(
                        "Call {call_id} heartbeat: {} left, {}s elapsed",
                        snapshot.display, snapshot.elapsed_seconds
                    );
                    let _ = events.send(CallEvent::Heartbeat(snapshot));
                }
            }
        });

        *ticker_guard = Some(Ticker { handle, cancel });
    }

    async fn cancel_ticker(&self) -> Result<()> {
        let ticker = self.ticker.lock().await.take();
        if let Some(ticker) = ticker {
            ticker.cancel.cancel();
            ticker
                .handle
                .await
                .context("call ticker task failed to join")?;
        }
        Ok(())
    }

    fn emit(&self, event: CallEvent) {
        debug!("Emitting {}", event.name());
        let _ = self.events.send(event);
    }
}
