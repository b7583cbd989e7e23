// Logs lifecycle events as they are published.

use crate::models::LifecycleEvent;
use tokio::sync::broadcast;

/// Spawns a task that logs every lifecycle event until the channel closes.
pub fn spawn(mut rx: broadcast::Receiver<LifecycleEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.succeeded => {
                    tracing::info!(
                        component = %event.display_name,
                        action = %event.action,
                        status = %event.status,
                        "component {} {}", event.display_name, event.action.past_tense()
                    );
                }
                Ok(event) => {
                    tracing::warn!(
                        component = %event.display_name,
                        action = %event.action,
                        reason = event.reason.as_deref().unwrap_or("unknown"),
                        "failed to {} component {}", event.action, event.display_name
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("notifier lagged, skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("Notifier shutting down");
    })
}
