// Live total ticker.
//
// Purpose
// - Republish the live total of a running control on a watch channel at a fixed period.
//
// Responsibilities
// - Reload the control from the store on every tick, so pauses, completes and manual
//   entries made elsewhere show up in the published value.
// - End the task, and with it the channel, once the timer is no longer active.
// - Abort the task when the handle is dropped.

use crate::core::control::reconcile::live_total;
use crate::core::control::state::ControlRecord;
use crate::core::ports::{Clock, ControlStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct LiveTotal {
    receiver: watch::Receiver<i64>,
    task: Option<JoinHandle<()>>,
}

impl LiveTotal {
    /// Must be called inside a tokio runtime. A stopped timer publishes its total once and
    /// the channel is closed right away.
    pub fn spawn<TStore>(
        store: Arc<TStore>,
        record: &ControlRecord,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> Self
    where
        TStore: ControlStore + 'static,
    {
        let (sender, receiver) = watch::channel(live_total(record, clock.now()));
        if !record.is_timer_active {
            return Self {
                receiver,
                task: None,
            };
        }
        let task = tokio::spawn(track(store, record.clone(), clock, period, sender));
        Self {
            receiver,
            task: Some(task),
        }
    }

    pub fn current(&self) -> i64 {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.receiver.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for LiveTotal {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn track<TStore>(
    store: Arc<TStore>,
    mut record: ControlRecord,
    clock: Arc<dyn Clock>,
    period: Duration,
    sender: watch::Sender<i64>,
) where
    TStore: ControlStore + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await;
    loop {
        interval.tick().await;
        match store.load(record.id).await {
            Ok(Some(loaded)) => record = loaded.aggregate.record,
            Ok(None) => {
                tracing::debug!(control_id = %record.id, "control gone, live total ends");
                return;
            }
            // Keep the last snapshot; the next tick retries.
            Err(error) => {
                tracing::warn!(control_id = %record.id, %error, "live total reload failed");
            }
        }
        let total = live_total(&record, clock.now());
        sender.send_if_modified(|current| {
            let changed = *current != total;
            *current = total;
            changed
        });
        if !record.is_timer_active {
            tracing::debug!(control_id = %record.id, total, "timer stopped, live total ends");
            return;
        }
    }
}
