use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::NotificationFeed;
use crate::session::SessionState;

/// Owns the polling task. Dropping the handle stops it; no fetch starts
/// after that, though one already in flight may still land.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl NotificationFeed {
    /// Polls every `interval` while the session has a user. A user change
    /// empties the cache and fetches right away; no user means no fetches.
    /// The task ends by itself when the session store goes away.
    pub fn start(
        self: &Arc<Self>,
        mut session: watch::Receiver<SessionState>,
        interval: Duration,
    ) -> PollHandle {
        let feed = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut user = session.borrow_and_update().user_id();
            feed.set_user(user);
            let mut due = true;
            // One deadline for the whole loop. Session republishes that keep
            // the same user must not push it back.
            let tick = tokio::time::sleep(interval);
            tokio::pin!(tick);

            loop {
                if due && user.is_some() {
                    if let Err(e) = feed.refresh().await {
                        warn!(error = %e, "Notification poll failed");
                    }
                    tick.as_mut().reset(Instant::now() + interval);
                }
                due = false;

                tokio::select! {
                    _ = &mut tick, if user.is_some() => {
                        due = true;
                    }
                    changed = session.changed() => {
                        if changed.is_err() {
                            debug!("Session store dropped, stopping notification poll");
                            break;
                        }
                        let next = session.borrow_and_update().user_id();
                        if next != user {
                            feed.set_user(next);
                            user = next;
                            due = true;
                        }
                    }
                }
            }
        });

        PollHandle { task }
    }
}
