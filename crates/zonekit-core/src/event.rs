//! Event system for controller notifications.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! We use `tokio::sync::broadcast` for an async-friendly event bus:
//! - Events are values, not callbacks
//! - Subscribers receive copies (Clone)
//! - A slow subscriber lags instead of blocking the controller

use tokio::sync::broadcast;

use zonekit_model::ErrorCode;

/// Events emitted by the sync controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A space was loaded or refreshed into the draft
    SpaceLoaded(String),
    /// The service accepted a save
    SpaceSaved(String),
    /// The service rejected a save with this many errors
    SaveRejected { space: String, errors: usize },
    /// The space summary list was reloaded
    SpacesChanged,
    /// The entity catalog was rebuilt
    CatalogChanged,
    /// The open draft was edited
    DraftChanged(String),
    /// The selection was cleared
    SelectionCleared,
    /// A load response arrived for a request that is no longer current
    StaleResponseDiscarded(String),
    /// A service call failed
    OperationFailed(ErrorCode),
}

/// Event bus for broadcasting sync events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: SyncEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper for processing events asynchronously.
///
/// ## Example
///
/// ```ignore
/// let mut handler = EventHandler::new(controller.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let SyncEvent::DraftChanged(space) = event {
///             // Schedule a re-render
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<SyncEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<SyncEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event. Returns `None` once the bus is dropped.
    pub async fn next(&mut self) -> Option<SyncEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
