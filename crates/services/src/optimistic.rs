//! Versioned bookkeeping for optimistic mutations over a cached list.
//!
//! Each local mutation gets a monotonic version and is kept until the server
//! confirms or rejects it. The ledger remembers the last server state of
//! every entity with pending mutations, so a rejection restores exactly that
//! entity (plus whatever other mutations are still in flight) and a fresh
//! fetch can be rebased without losing pending local changes.

use servicehub_models::Entity;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub type Patch<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationTicket {
    pub entity_id: Uuid,
    pub version: u64,
}

enum Change<T> {
    Update(Patch<T>),
    Delete,
}

struct Entry<T> {
    base: Option<T>,
    position: usize,
    /// Whether the entity belongs to the list currently cached. Entries for
    /// entities a later fetch did not return are parked: settling them never
    /// writes into the list.
    listed: bool,
    changes: Vec<(u64, Change<T>)>,
}

pub struct Ledger<T> {
    next_version: u64,
    entries: HashMap<Uuid, Entry<T>>,
}

impl<T> fmt::Debug for Ledger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("next_version", &self.next_version)
            .field("pending_entities", &self.entries.len())
            .finish()
    }
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self {
            next_version: 0,
            entries: HashMap::new(),
        }
    }
}

impl<T: Entity + Clone> Ledger<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, id: Uuid) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.values().map(|e| e.changes.len()).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Applies `patch` to the cached entity and records it. `None` when the
    /// entity is not in `items`.
    pub fn update(&mut self, items: &mut [T], id: Uuid, patch: Patch<T>) -> Option<MutationTicket> {
        let pos = items.iter().position(|i| i.id() == id)?;
        let ticket = self.record(&items[pos], pos, Change::Update(patch.clone()));
        patch(&mut items[pos]);
        Some(ticket)
    }

    /// Removes the cached entity and records the removal.
    pub fn delete(&mut self, items: &mut Vec<T>, id: Uuid) -> Option<MutationTicket> {
        let pos = items.iter().position(|i| i.id() == id)?;
        let ticket = self.record(&items[pos], pos, Change::Delete);
        items.remove(pos);
        Some(ticket)
    }

    fn record(&mut self, current: &T, position: usize, change: Change<T>) -> MutationTicket {
        self.next_version += 1;
        let version = self.next_version;
        let entity_id = current.id();
        let entry = self.entries.entry(entity_id).or_insert_with(|| Entry {
            base: Some(current.clone()),
            position,
            listed: true,
            changes: Vec::new(),
        });
        entry.changes.push((version, change));
        MutationTicket { entity_id, version }
    }

    /// The server accepted the mutation. When the response carried the
    /// entity, it becomes the new server truth and the cached copy is
    /// rebuilt from it. Returns `false` for unknown or already settled
    /// tickets.
    pub fn confirm(&mut self, items: &mut Vec<T>, ticket: MutationTicket, server: Option<T>) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.entity_id) else {
            return false;
        };
        let Some(idx) = entry.changes.iter().position(|(v, _)| *v == ticket.version) else {
            return false;
        };
        let (_, change) = entry.changes.remove(idx);

        let has_server = server.is_some();
        match (server, change) {
            (Some(s), _) => entry.base = Some(s),
            (None, Change::Update(patch)) => {
                if let Some(base) = entry.base.as_mut() {
                    patch(base);
                }
            }
            (None, Change::Delete) => entry.base = None,
        }

        if has_server {
            self.materialize(items, ticket.entity_id);
        }
        self.prune(ticket.entity_id);
        true
    }

    /// The server refused the mutation: drop it and rebuild the entity from
    /// its last server state plus the mutations still pending on it.
    pub fn reject(&mut self, items: &mut Vec<T>, ticket: MutationTicket) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.entity_id) else {
            return false;
        };
        let Some(idx) = entry.changes.iter().position(|(v, _)| *v == ticket.version) else {
            return false;
        };
        entry.changes.remove(idx);

        self.materialize(items, ticket.entity_id);
        self.prune(ticket.entity_id);
        true
    }

    /// Adopts a freshly fetched list as server truth for every pending
    /// entity it contains, then replays their pending mutations over it.
    pub fn rebase(&mut self, items: &mut Vec<T>) {
        for (id, entry) in self.entries.iter_mut() {
            let Some(pos) = items.iter().position(|i| i.id() == *id) else {
                entry.listed = false;
                continue;
            };
            entry.base = Some(items[pos].clone());
            entry.position = pos;
            entry.listed = true;
            for (_, change) in &entry.changes {
                match change {
                    Change::Update(patch) => patch(&mut items[pos]),
                    Change::Delete => {
                        items.remove(pos);
                        break;
                    }
                }
            }
        }
    }

    fn materialize(&self, items: &mut Vec<T>, id: Uuid) {
        let Some(entry) = self.entries.get(&id).filter(|e| e.listed) else {
            return;
        };

        let mut desired = entry.base.clone();
        for (_, change) in &entry.changes {
            match (change, desired.as_mut()) {
                (Change::Update(patch), Some(item)) => patch(item),
                (Change::Delete, _) => desired = None,
                (Change::Update(_), None) => {}
            }
        }

        let current = items.iter().position(|i| i.id() == id);
        match (desired, current) {
            (Some(item), Some(pos)) => items[pos] = item,
            (Some(item), None) => {
                let pos = entry.position.min(items.len());
                items.insert(pos, item);
            }
            (None, Some(pos)) => {
                items.remove(pos);
            }
            (None, None) => {}
        }
    }

    fn prune(&mut self, id: Uuid) {
        if self
            .entries
            .get(&id)
            .is_some_and(|entry| entry.changes.is_empty())
        {
            self.entries.remove(&id);
        }
    }
}
