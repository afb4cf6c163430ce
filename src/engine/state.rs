use crate::engine::ConnectionEvent;

/// Progress of the chart snapshot for the current market.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Last fetch failed. Any previously loaded candles are still shown.
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Live stream status as seen by the UI header.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConnectionState {
    /// Streaming switched off, or not started yet.
    #[default]
    Offline,
    Connecting,
    Connected,
    /// Socket dropped; the stream is retrying.
    Reconnecting(Option<String>),
    /// Retries exhausted. Needs a manual reconnect.
    Failed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Fold one stream notification into the current state.
    pub fn apply(&mut self, event: &ConnectionEvent) {
        *self = match event {
            ConnectionEvent::Connected => ConnectionState::Connected,
            ConnectionEvent::Disconnected => ConnectionState::Reconnecting(None),
            ConnectionEvent::Error(msg) => ConnectionState::Reconnecting(Some(msg.clone())),
            ConnectionEvent::GaveUp => ConnectionState::Failed,
        };
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Offline => "Offline",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Live",
            ConnectionState::Reconnecting(_) => "Reconnecting",
            ConnectionState::Failed => "Disconnected",
        }
    }
}
