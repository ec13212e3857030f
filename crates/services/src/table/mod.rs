//! Page cache behind every listing screen, with optimistic update/delete.

mod source;

pub use source::{EndpointSource, ListSource, PageQuery};

use parking_lot::Mutex;
use servicehub_models::{Entity, ListPage};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateway::ApiResult;
use crate::optimistic::{Ledger, MutationTicket};
use crate::toast::Toasts;

/// What to do with the cache when the server refuses a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Restore only the affected row from its last server state.
    #[default]
    RevertEntity,
    /// Throw the page away and fetch it again.
    Reload,
}

struct TableState<T> {
    page: ListPage<T>,
    query: PageQuery,
    ledger: Ledger<T>,
    generation: u64,
}

pub struct PagedTable<T, S = EndpointSource<T>> {
    source: S,
    state: Mutex<TableState<T>>,
    policy: RollbackPolicy,
    toasts: Toasts,
}

impl<T, S> PagedTable<T, S>
where
    T: Entity + Clone + Send + Sync + 'static,
    S: ListSource<T>,
{
    pub fn new(source: S, page_size: u64, toasts: Toasts) -> Self {
        let query = PageQuery::new(1, page_size);
        Self {
            source,
            state: Mutex::new(TableState {
                page: ListPage::empty(query.page, query.page_size),
                query,
                ledger: Ledger::new(),
                generation: 0,
            }),
            policy: RollbackPolicy::default(),
            toasts,
        }
    }

    pub fn with_policy(mut self, policy: RollbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn page(&self) -> ListPage<T> {
        self.state.lock().page.clone()
    }

    pub fn query(&self) -> PageQuery {
        self.state.lock().query.clone()
    }

    pub fn item(&self, id: Uuid) -> Option<T> {
        self.state
            .lock()
            .page
            .items
            .iter()
            .find(|i| i.id() == id)
            .cloned()
    }

    pub fn pending_mutations(&self) -> usize {
        self.state.lock().ledger.pending_count()
    }

    /// Fetches one page and replaces the cached one wholesale. Only the most
    /// recently started fetch may write; an older response is dropped.
    pub async fn fetch(&self, query: PageQuery) -> ApiResult<ListPage<T>> {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.query = query.clone();
            state.generation
        };

        let mut page = match self.source.fetch(&query).await {
            Ok(page) => page,
            Err(e) => {
                warn!(page = query.page, error = %e, "Page fetch failed");
                self.toasts.error(e.user_message());
                return Err(e);
            }
        };

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(page = query.page, "Dropping superseded page response");
            return Ok(state.page.clone());
        }

        if page.page_size > 0 {
            page.items.truncate(page.page_size as usize);
        }
        let before = page.items.len();
        state.ledger.rebase(&mut page.items);
        let hidden = before - page.items.len();
        page.total_count = page.total_count.saturating_sub(hidden as u64);

        debug!(page = page.page, items = page.items.len(), total = page.total_count, "Page cached");
        state.page = page;
        Ok(state.page.clone())
    }

    pub async fn reload(&self) -> ApiResult<ListPage<T>> {
        let query = self.query();
        self.fetch(query).await
    }

    pub async fn go_to(&self, page: u64) -> ApiResult<ListPage<T>> {
        let query = self.query().with_page(page);
        self.fetch(query).await
    }

    /// Applies `patch` to the cached row right away. `None` when the row is
    /// not on the cached page.
    pub fn update_optimistically<F>(&self, id: Uuid, patch: F) -> Option<MutationTicket>
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        let TableState { page, ledger, .. } = &mut *state;
        ledger.update(&mut page.items, id, Arc::new(patch))
    }

    /// Removes the cached row right away and counts it out of the total.
    pub fn delete_optimistically(&self, id: Uuid) -> Option<MutationTicket> {
        self.with_count_tracking(|page, ledger| ledger.delete(&mut page.items, id))
    }

    /// Settles a mutation the server accepted. `server` is the row as the
    /// server returned it, if it did.
    pub fn confirm(&self, ticket: MutationTicket, server: Option<T>) {
        self.with_count_tracking(|page, ledger| ledger.confirm(&mut page.items, ticket, server));
    }

    /// Undoes a mutation the server refused, following the table's policy.
    pub async fn rollback(&self, ticket: MutationTicket) {
        self.with_count_tracking(|page, ledger| ledger.reject(&mut page.items, ticket));
        if self.policy == RollbackPolicy::Reload {
            if let Err(e) = self.reload().await {
                warn!(error = %e, "Reload after failed mutation failed");
            }
        }
    }

    /// Runs `f` and moves `total_count` by however many rows it added or
    /// removed.
    fn with_count_tracking<R>(
        &self,
        f: impl FnOnce(&mut ListPage<T>, &mut Ledger<T>) -> R,
    ) -> R {
        let mut state = self.state.lock();
        let TableState { page, ledger, .. } = &mut *state;
        let before = page.items.len() as i64;
        let out = f(page, ledger);
        let delta = page.items.len() as i64 - before;
        page.total_count = page.total_count.saturating_add_signed(delta);
        out
    }

    /// Optimistic update followed by the confirming call. On failure the
    /// error is toasted and the row rolled back.
    pub async fn update<F, Fut>(&self, id: Uuid, patch: F, confirm: Fut) -> ApiResult<()>
    where
        F: Fn(&mut T) + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Option<T>>>,
    {
        let ticket = self.update_optimistically(id, patch);
        match confirm.await {
            Ok(server) => {
                if let Some(ticket) = ticket {
                    self.confirm(ticket, server);
                }
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "Update rejected");
                self.toasts.error(e.user_message());
                if let Some(ticket) = ticket {
                    self.rollback(ticket).await;
                }
                Err(e)
            }
        }
    }

    pub async fn delete<Fut>(&self, id: Uuid, confirm: Fut) -> ApiResult<()>
    where
        Fut: Future<Output = ApiResult<()>>,
    {
        let ticket = self.delete_optimistically(id);
        match confirm.await {
            Ok(()) => {
                if let Some(ticket) = ticket {
                    self.confirm(ticket, None);
                }
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "Delete rejected");
                self.toasts.error(e.user_message());
                if let Some(ticket) = ticket {
                    self.rollback(ticket).await;
                }
                Err(e)
            }
        }
    }
}
