//! Notification delivery without a push channel: a polled read-through
//! cache with optimistic read flags.

mod cache;
mod poller;

pub use cache::NotificationCache;
pub use poller::PollHandle;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize, de::IgnoredAny};
use servicehub_models::{Data, NewNotification, Notification, NotificationType};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateway::{ApiClient, ApiResult};
use crate::toast::Toasts;

#[derive(Debug, Serialize)]
struct UserQuery {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct UnreadCountResponse {
    count: u64,
}

/// Typed calls against the `/notifications` endpoints.
#[derive(Clone)]
pub struct NotificationApi {
    client: Arc<ApiClient>,
}

impl NotificationApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, user_id: Uuid) -> ApiResult<Vec<Notification>> {
        let resp: Data<Vec<Notification>> = self
            .client
            .get_with_query(Notification::ENDPOINT, &UserQuery { user_id })
            .await?;
        Ok(resp.data)
    }

    pub async fn mark_read(&self, id: Uuid) -> ApiResult<()> {
        let _: IgnoredAny = self
            .client
            .put(&format!("{}/{id}/read", Notification::ENDPOINT), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> ApiResult<()> {
        let _: IgnoredAny = self
            .client
            .put(
                &format!("{}/mark-all-read", Notification::ENDPOINT),
                &UserQuery { user_id },
            )
            .await?;
        Ok(())
    }

    pub async fn create(&self, notification: &NewNotification) -> ApiResult<Notification> {
        let resp: Data<Notification> = self
            .client
            .post(Notification::ENDPOINT, notification)
            .await?;
        Ok(resp.data)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> ApiResult<u64> {
        let resp: UnreadCountResponse = self
            .client
            .get_with_query(
                &format!("{}/unread-count", Notification::ENDPOINT),
                &UserQuery { user_id },
            )
            .await?;
        Ok(resp.count)
    }
}

/// The signed-in user's notifications, kept fresh by [`NotificationFeed::start`].
pub struct NotificationFeed {
    api: NotificationApi,
    cache: Mutex<NotificationCache>,
    active_user: Mutex<Option<Uuid>>,
    toasts: Toasts,
}

impl NotificationFeed {
    pub fn new(client: Arc<ApiClient>, toasts: Toasts) -> Self {
        Self {
            api: NotificationApi::new(client),
            cache: Mutex::new(NotificationCache::new()),
            active_user: Mutex::new(None),
            toasts,
        }
    }

    pub fn api(&self) -> &NotificationApi {
        &self.api
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.cache.lock().items().to_vec()
    }

    pub fn of_type(&self, notification_type: NotificationType) -> Vec<Notification> {
        self.cache.lock().of_type(notification_type)
    }

    pub fn unread_count(&self) -> usize {
        self.cache.lock().unread_count()
    }

    pub fn active_user(&self) -> Option<Uuid> {
        *self.active_user.lock()
    }

    /// Points the feed at another user (or none) and drops everything cached
    /// for the previous one.
    pub fn set_user(&self, user_id: Option<Uuid>) {
        let mut active = self.active_user.lock();
        if *active != user_id {
            debug!(from = ?*active, to = ?user_id, "Notification feed user changed");
            *active = user_id;
            self.cache.lock().clear();
        }
    }

    /// One fetch cycle. A response for a user that is no longer active is
    /// discarded.
    pub async fn refresh(&self) -> ApiResult<()> {
        let Some(user_id) = self.active_user() else {
            return Ok(());
        };
        let fresh = self.api.list(user_id).await?;
        if self.active_user() != Some(user_id) {
            debug!(%user_id, "Dropping notifications for inactive user");
            return Ok(());
        }
        let mut cache = self.cache.lock();
        cache.replace(fresh);
        debug!(%user_id, total = cache.items().len(), unread = cache.unread_count(), "Notifications refreshed");
        Ok(())
    }

    /// Marks one notification read locally, then on the server. A refused
    /// call restores that notification's last server state.
    pub async fn mark_as_read(&self, id: Uuid) -> ApiResult<()> {
        let ticket = self.cache.lock().mark_read(id);
        let result = self.api.mark_read(id).await;

        match &result {
            Ok(()) => {
                if let Some(ticket) = ticket {
                    self.cache.lock().confirm(ticket);
                }
            }
            Err(e) => {
                warn!(%id, error = %e, "Mark as read failed");
                if let Some(ticket) = ticket {
                    self.cache.lock().reject(ticket);
                }
                self.toasts.error(e.user_message());
            }
        }
        result
    }

    pub async fn mark_all_as_read(&self) -> ApiResult<()> {
        let Some(user_id) = self.active_user() else {
            return Ok(());
        };
        let tickets = self.cache.lock().mark_all_read();
        let result = self.api.mark_all_read(user_id).await;

        let mut cache = self.cache.lock();
        match &result {
            Ok(()) => tickets.into_iter().for_each(|t| cache.confirm(t)),
            Err(e) => {
                warn!(%user_id, error = %e, "Mark all as read failed");
                tickets.into_iter().for_each(|t| cache.reject(t));
                self.toasts.error(e.user_message());
            }
        }
        result
    }

    /// Fire-and-forget create. The cache picks the new row up on the next
    /// poll.
    pub async fn create_notification(&self, notification: &NewNotification) -> bool {
        match self.api.create(notification).await {
            Ok(created) => {
                debug!(id = %created.id, user_id = %created.user_id, "Notification created");
                true
            }
            Err(e) => {
                warn!(user_id = %notification.user_id, error = %e, "Create notification failed");
                false
            }
        }
    }

    /// Server-side unread count for the active user.
    pub async fn unread_count_remote(&self) -> ApiResult<Option<u64>> {
        match self.active_user() {
            Some(user_id) => self.api.unread_count(user_id).await.map(Some),
            None => Ok(None),
        }
    }
}
