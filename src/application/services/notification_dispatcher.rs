//! # Notification Dispatcher
//!
//! Fire-and-forget delivery of the notifications implied by market events.
//!
//! Each event is fanned out on its own spawned task. Every delivery is
//! bounded by the notify timeout; failures are logged and dropped, so a
//! dead notifier never affects the state transition that raised the event.
//! Call [`NotificationDispatcher::drain`] to wait for in-flight deliveries.

use crate::application::services::retry::with_timeout;
use crate::domain::events::{DomainEvent, MarketEvent};
use crate::infrastructure::gateways::Notifier;
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Best-effort side channel over a [`Notifier`].
#[derive(Debug)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, notify_timeout: Duration) -> Self {
        Self {
            notifier,
            notify_timeout,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Schedules the notifications implied by `event`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, event: impl Into<MarketEvent>) {
        let event = event.into();
        let notifications = event.notifications();
        debug!(
            event = event.event_name(),
            event_id = %event.event_id(),
            recipients = notifications.len(),
            "Dispatching event"
        );
        if notifications.is_empty() {
            return;
        }

        let notifier = Arc::clone(&self.notifier);
        let limit = self.notify_timeout;
        let event_name = event.event_name();
        let handle = tokio::spawn(async move {
            let deliveries = notifications.iter().map(|n| {
                let notifier = Arc::clone(&notifier);
                async move {
                    if let Err(e) = with_timeout(limit, "notify", notifier.notify(n)).await {
                        warn!(
                            event = event_name,
                            recipient = %n.recipient,
                            category = %n.category,
                            error = %e,
                            "Notification delivery failed"
                        );
                    }
                }
            });
            join_all(deliveries).await;
        });

        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Dispatches each event in order.
    pub fn dispatch_all(&self, events: impl IntoIterator<Item = MarketEvent>) {
        for event in events {
            self.dispatch(event);
        }
    }

    /// Waits for every delivery scheduled so far.
    pub async fn drain(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.in_flight.lock());
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Notification task aborted");
            }
        }
    }
}
