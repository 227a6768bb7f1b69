//! Quote service: one task owns the coordinator and handles every event in
//! order. Quote computations and snapshot fetches run on spawned tasks and
//! report back through a completion channel, possibly out of order.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::errors::{AppError, Result};
use crate::models::{FocusSide, QuoteResult, QuoteView};
use crate::pool::{PoolId, ReserveSnapshot, SnapshotSource};
use crate::quote::{Balances, QuoteRequest, RecomputeCoordinator};
use crate::scheduler::{RefreshTimer, TimerTick};
use crate::utils::Throttle;

/// Events accepted by the service.
#[derive(Debug, Clone)]
pub enum QuoteCommand {
    AmountEdited { side: FocusSide, raw_amount: String },
    FocusChanged(FocusSide),
    ManualRefresh,
    TimerTick,
    PoolChanged(Option<PoolId>),
    BalancesUpdated(Balances),
    DepositSent,
}

#[derive(Debug)]
enum Completion {
    Quoted(QuoteResult),
    Fetched {
        pool: PoolId,
        result: Result<ReserveSnapshot>,
    },
}

/// Cloneable entry point for collaborators. The service stops once every
/// handle is dropped.
#[derive(Debug, Clone)]
pub struct QuoteHandle {
    commands: mpsc::UnboundedSender<QuoteCommand>,
    view: watch::Receiver<QuoteView>,
}

impl QuoteHandle {
    fn send(&self, command: QuoteCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| AppError::ServiceClosed)
    }

    pub fn on_amount_edited(&self, side: FocusSide, raw_amount: impl Into<String>) -> Result<()> {
        self.send(QuoteCommand::AmountEdited {
            side,
            raw_amount: raw_amount.into(),
        })
    }

    pub fn on_focus_changed(&self, side: FocusSide) -> Result<()> {
        self.send(QuoteCommand::FocusChanged(side))
    }

    pub fn on_manual_refresh(&self) -> Result<()> {
        self.send(QuoteCommand::ManualRefresh)
    }

    pub fn on_timer_tick(&self) -> Result<()> {
        self.send(QuoteCommand::TimerTick)
    }

    pub fn on_pool_changed(&self, pool: Option<PoolId>) -> Result<()> {
        self.send(QuoteCommand::PoolChanged(pool))
    }

    pub fn on_balances_updated(&self, balances: Balances) -> Result<()> {
        self.send(QuoteCommand::BalancesUpdated(balances))
    }

    pub fn on_deposit_sent(&self) -> Result<()> {
        self.send(QuoteCommand::DepositSent)
    }

    /// Latest published read model.
    pub fn current_quote(&self) -> QuoteView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuoteView> {
        self.view.clone()
    }
}

pub struct QuoteService<S> {
    coordinator: RecomputeCoordinator,
    source: Arc<S>,
    balances: Balances,
    slippage_bps: u32,
    throttle: Throttle,
    timer: RefreshTimer,
    commands: mpsc::UnboundedReceiver<QuoteCommand>,
    ticks: mpsc::UnboundedReceiver<TimerTick>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    view: watch::Sender<QuoteView>,
}

/// Spawn the quote service for `pool` and return its handle.
pub fn spawn_quote_service<S: SnapshotSource>(
    pool: Option<PoolId>,
    source: S,
    balances: Balances,
    config: ServiceConfig,
) -> (QuoteHandle, JoinHandle<()>) {
    let (commands_tx, commands) = mpsc::unbounded_channel();
    let (ticks_tx, ticks) = mpsc::unbounded_channel();
    let (completions_tx, completions) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(QuoteView::default());

    let service = QuoteService {
        coordinator: RecomputeCoordinator::new(pool),
        source: Arc::new(source),
        balances,
        slippage_bps: config.slippage_bps,
        throttle: Throttle::new(config.refresh_throttle),
        timer: RefreshTimer::new(config.refresh_interval, ticks_tx),
        commands,
        ticks,
        completions_tx,
        completions,
        view: view_tx,
    };
    let handle = QuoteHandle {
        commands: commands_tx,
        view: view_rx,
    };
    (handle, tokio::spawn(service.run()))
}

impl<S: SnapshotSource> QuoteService<S> {
    async fn run(mut self) {
        info!(pool = ?self.coordinator.pool(), "[INIT] quote service started");
        self.timer.restart();
        self.fetch_snapshot();
        self.publish();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(TimerTick) = self.ticks.recv() => self.on_refresh_trigger(),
                Some(done) = self.completions.recv() => self.handle_completion(done),
            }
            self.publish();
        }

        // pending generations die with the coordinator
        self.timer.stop();
        info!("[QUOTE] service stopped");
    }

    fn handle_command(&mut self, command: QuoteCommand) {
        match command {
            QuoteCommand::AmountEdited { side, raw_amount } => {
                if let Some(request) = self.coordinator.on_amount_edited(side, &raw_amount) {
                    self.dispatch(request);
                }
            }
            QuoteCommand::FocusChanged(side) => self.coordinator.on_focus_changed(side),
            QuoteCommand::ManualRefresh => {
                self.timer.restart();
                self.on_refresh_trigger();
            }
            QuoteCommand::TimerTick => self.on_refresh_trigger(),
            QuoteCommand::PoolChanged(pool) => {
                info!(pool = ?pool, "[POOL] pool changed");
                self.coordinator.on_pool_changed(pool);
                self.fetch_snapshot();
            }
            QuoteCommand::BalancesUpdated(balances) => self.balances = balances,
            QuoteCommand::DepositSent => self.coordinator.on_deposit_sent(),
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Quoted(result) => {
                let generation = result.for_generation;
                if self.coordinator.on_quote_result(result) {
                    debug!(generation, "[QUOTE] result applied");
                }
            }
            Completion::Fetched {
                result: Ok(snapshot),
                ..
            } => {
                if let Some(request) = self.coordinator.on_snapshot(snapshot) {
                    self.dispatch(request);
                }
            }
            Completion::Fetched {
                pool,
                result: Err(AppError::PoolNotFound(_)),
            } => {
                if self.coordinator.pool() == Some(&pool) {
                    warn!(pool = %pool, "[POOL] pool not found");
                    self.coordinator.on_pool_not_found();
                }
            }
            Completion::Fetched {
                pool,
                result: Err(e),
            } => {
                warn!(pool = %pool, error = %e, "[REFRESH] snapshot fetch failed, keeping last snapshot");
            }
        }
    }

    fn on_refresh_trigger(&mut self) {
        if self.throttle.allow(Instant::now()) {
            self.fetch_snapshot();
        } else {
            debug!("[REFRESH] trigger throttled");
        }
    }

    fn fetch_snapshot(&self) {
        let Some(pool) = self.coordinator.pool().cloned() else {
            return;
        };
        let source = Arc::clone(&self.source);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_reserve_snapshot(&pool).await;
            let _ = completions.send(Completion::Fetched { pool, result });
        });
    }

    fn dispatch(&self, request: QuoteRequest) {
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = completions.send(Completion::Quoted(request.execute()));
        });
    }

    fn publish(&self) {
        let next = self.coordinator.view(&self.balances, self.slippage_bps);
        self.view.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
