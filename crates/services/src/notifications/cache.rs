use servicehub_models::{Notification, NotificationType};
use std::sync::Arc;
use uuid::Uuid;

use crate::optimistic::{Ledger, MutationTicket, Patch};

/// Read-through copy of one user's notifications.
///
/// The unread count is derived from the cached items on every read, so it
/// can never drift from them; an optimistic mark-as-read lowers it by one at
/// most and never below zero.
#[derive(Debug, Default)]
pub struct NotificationCache {
    items: Vec<Notification>,
    ledger: Ledger<Notification>,
}

fn mark_read_patch() -> Patch<Notification> {
    Arc::new(|n: &mut Notification| n.is_read = true)
}

impl NotificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn of_type(&self, notification_type: NotificationType) -> Vec<Notification> {
        self.items
            .iter()
            .filter(|n| n.notification_type == notification_type)
            .cloned()
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.ledger.pending_count() > 0
    }

    /// Replaces the whole list with a poll result. Mutations still awaiting
    /// the server are replayed on top so a lagging poll does not undo them.
    pub fn replace(&mut self, fresh: Vec<Notification>) {
        self.items = fresh;
        self.ledger.rebase(&mut self.items);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.ledger.clear();
    }

    /// Flips one unread notification to read. `None` when it is unknown or
    /// already read, in which case nothing changes locally.
    pub fn mark_read(&mut self, id: Uuid) -> Option<MutationTicket> {
        let unread = self.items.iter().any(|n| n.id == id && !n.is_read);
        if !unread {
            return None;
        }
        self.ledger.update(&mut self.items, id, mark_read_patch())
    }

    pub fn mark_all_read(&mut self) -> Vec<MutationTicket> {
        let unread: Vec<Uuid> = self
            .items
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id)
            .collect();
        unread
            .into_iter()
            .filter_map(|id| self.ledger.update(&mut self.items, id, mark_read_patch()))
            .collect()
    }

    pub fn confirm(&mut self, ticket: MutationTicket) {
        self.ledger.confirm(&mut self.items, ticket, None);
    }

    pub fn reject(&mut self, ticket: MutationTicket) {
        self.ledger.reject(&mut self.items, ticket);
    }
}
