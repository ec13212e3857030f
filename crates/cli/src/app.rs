use anyhow::{Context, bail};
use serde::Serialize;
use servicehub_config::Settings;
use servicehub_services::{
    ApiClient, FileStorage, Session, SessionState, SessionStore, Storage, ToastLevel, Toasts,
};
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs, wired from settings.
pub struct App {
    pub settings: Settings,
    pub client: Arc<ApiClient>,
    pub toasts: Toasts,
    pub session: SessionStore,
    json: bool,
}

impl App {
    pub fn new(settings: Settings, json: bool) -> anyhow::Result<Self> {
        let path = match &settings.storage.path {
            Some(path) => path.into(),
            None => FileStorage::default_path()?,
        };
        debug!(path = %path.display(), "Opening token storage");
        let storage: Arc<dyn Storage> = Arc::new(
            FileStorage::open(&path)
                .with_context(|| format!("opening token storage at {}", path.display()))?,
        );

        let client = Arc::new(ApiClient::new(&settings.api, storage)?);
        let toasts = Toasts::new();
        spawn_toast_printer(&toasts);

        Ok(Self {
            session: SessionStore::new(Arc::clone(&client), toasts.clone()),
            settings,
            client,
            toasts,
            json,
        })
    }

    /// Restores the persisted session or fails with a hint to log in.
    pub async fn require_session(&self) -> anyhow::Result<Session> {
        match self.session.initialize().await {
            SessionState::Authenticated(session) => Ok(session),
            _ => bail!("Not signed in. Run `servicehub login` first."),
        }
    }

    pub fn print<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text(value));
        }
        Ok(())
    }
}

fn spawn_toast_printer(toasts: &Toasts) {
    let mut rx = toasts.subscribe();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match rx.recv().await {
                Ok(toast) => {
                    let tag = match toast.level {
                        ToastLevel::Success => "ok",
                        ToastLevel::Error => "error",
                        ToastLevel::Info => "info",
                    };
                    eprintln!("[{tag}] {}", toast.message);
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}
