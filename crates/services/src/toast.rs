use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Fan-out of user-visible notices. Sending with nobody subscribed is fine;
/// the notice is still logged.
#[derive(Debug, Clone)]
pub struct Toasts {
    tx: broadcast::Sender<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message.into());
    }

    fn push(&self, level: ToastLevel, message: String) {
        match level {
            ToastLevel::Error => error!(%message, "toast"),
            _ => info!(?level, %message, "toast"),
        }
        let _ = self.tx.send(Toast { level, message });
    }
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new()
    }
}
