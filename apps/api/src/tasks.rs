//! Background tasks.
//!
//! The expiry sweep closes out events whose end date has passed: pending
//! bookings are cancelled and their seats released, confirmed bookings
//! complete, and unused tickets expire. It runs on a fixed interval until
//! the returned handle is shut down.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::services::TicketService;
use crate::state::AppState;

/// Handle for a running expiry sweep.
pub struct SweepHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Signals the sweep to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            error!(error = %e, "Expiry sweep task panicked");
        }
    }
}

/// Starts the periodic expiry sweep.
pub fn spawn_expiry_sweep(state: Arc<AppState>) -> SweepHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let period = Duration::from_secs(state.config.expiry_sweep_interval_secs);

    let task = tokio::spawn(async move {
        info!(interval_secs = period.as_secs(), "Expiry sweep started");

        let tickets = TicketService::new(state);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match tickets.expire_ended_events(Utc::now()).await {
                        Ok(summary) if summary.is_empty() => debug!("Expiry sweep found nothing to do"),
                        Ok(_) => {}
                        Err(e) => error!(code = ?e.code, error = %e.message, "Expiry sweep failed"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Expiry sweep shutting down");
                    break;
                }
            }
        }
    });

    SweepHandle { shutdown_tx, task }
}
