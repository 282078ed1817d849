//! Navigation session
//!
//! A `Session` owns everything needed to move through the pages of one
//! augmented query:
//! - the query text currently being sent (it shrinks as branches are pruned)
//! - the pagination state of the last response
//! - a cursor history, one entry per forward step
//! - a pruned-branch record per forward step, `None` when nothing was pruned
//!
//! At most one navigation request is outstanding per session. Calls made
//! while a request is pending join it and resolve to the same page.

use super::extract::extract_pagination;
use super::types::{Page, PaginationState, PrunedBranch};
use crate::client::Client;
use crate::error::FetchError;
use crate::query::{cursor_bindings, prune_query};
use crate::types::{CursorMap, JsonValue, Variables};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

type PendingPage = Shared<BoxFuture<'static, Arc<Page>>>;

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Query and cursors for one navigation request
#[derive(Debug, Clone)]
struct Step {
    query: String,
    cursors: CursorMap,
}

/// State restored when a navigation request fails
struct Checkpoint {
    query: String,
    state: PaginationState,
    last_data: Option<JsonValue>,
    cursor_history: Vec<CursorMap>,
    pruned: Vec<Option<PrunedBranch>>,
}

struct Navigation {
    query: String,
    state: PaginationState,
    last_data: Option<JsonValue>,
    cursor_history: Vec<CursorMap>,
    pruned: Vec<Option<PrunedBranch>>,
    current: Arc<Page>,
    in_flight: Option<PendingPage>,
}

impl Navigation {
    fn new(query: String) -> Self {
        Self {
            query,
            state: PaginationState::default(),
            last_data: None,
            cursor_history: Vec::new(),
            pruned: Vec::new(),
            current: Arc::new(Page::default()),
            in_flight: None,
        }
    }

    fn can_move(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.state.has_next_page,
            Direction::Backward => self.state.has_prev_page,
        }
    }

    fn advance(&mut self) -> Step {
        let cursors = self.state.next_cursors.clone();
        self.cursor_history.push(cursors.clone());

        let record = prune_query(&self.query, self.last_data.as_ref()).map(|pruned| {
            let previous = std::mem::replace(&mut self.query, pruned);
            PrunedBranch {
                query: previous,
                cursors: cursors.clone(),
            }
        });
        if record.is_some() {
            debug!("Exhausted branches pruned from forward query");
        }
        self.pruned.push(record);

        debug!(depth = self.cursor_history.len(), "Stepping forward");
        Step {
            query: self.query.clone(),
            cursors,
        }
    }

    fn retreat(&mut self) -> Step {
        self.cursor_history.pop();

        let cursors = match self.pruned.pop().flatten() {
            Some(record) => {
                // The pruned step was reached with the cursors of the step before it
                debug!("Restoring pruned branches");
                self.query = record.query;
                self.cursor_history.last().cloned().unwrap_or_default()
            }
            None => self.state.prev_cursors.clone(),
        };

        debug!(depth = self.cursor_history.len(), "Stepping backward");
        Step {
            query: self.query.clone(),
            cursors,
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            query: self.query.clone(),
            state: self.state.clone(),
            last_data: self.last_data.clone(),
            cursor_history: self.cursor_history.clone(),
            pruned: self.pruned.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.query = checkpoint.query;
        self.state = checkpoint.state;
        self.last_data = checkpoint.last_data;
        self.cursor_history = checkpoint.cursor_history;
        self.pruned = checkpoint.pruned;
    }

    fn settle(&mut self, data: Option<JsonValue>) -> Arc<Page> {
        self.state = extract_pagination(data.as_ref());
        let page = Arc::new(Page::success(data.clone(), &self.state));
        self.last_data = data;
        self.current = Arc::clone(&page);
        page
    }

    fn fail(&mut self, error: FetchError) -> Arc<Page> {
        let page = Arc::new(Page::failure(error, &self.state));
        self.current = Arc::clone(&page);
        page
    }
}

struct SessionInner {
    client: Client,
    variables: Variables,
    nav: Mutex<Navigation>,
}

impl SessionInner {
    /// Base variables with each cursor bound to its branch's variable
    fn bind(&self, step: &Step) -> Variables {
        let bindings = match cursor_bindings(&step.query) {
            Ok(bindings) => bindings,
            Err(e) => {
                warn!("Cannot read cursor variables: {e}");
                Default::default()
            }
        };

        let mut variables = self.variables.clone();
        for variable in bindings.values() {
            variables.remove(variable);
        }
        for (branch, cursor) in &step.cursors {
            match bindings.get(branch) {
                Some(variable) => {
                    variables.insert(variable.clone(), JsonValue::String(cursor.clone()));
                }
                None => warn!(%branch, "Branch has no cursor variable; cursor dropped"),
            }
        }
        variables
    }
}

/// Paginated query handle; cheap to clone
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Fetch the first page of `query` and open a session on it
    pub async fn start(client: Client, query: impl Into<String>, variables: Variables) -> Self {
        let mut nav = Navigation::new(query.into());

        let result = client.execute(&nav.query, variables.clone()).await;
        match result {
            Ok(data) => {
                nav.settle(data);
            }
            Err(e) => {
                warn!("First page failed: {e}");
                nav.fail(e.into());
            }
        }

        Self {
            inner: Arc::new(SessionInner {
                client,
                variables,
                nav: Mutex::new(nav),
            }),
        }
    }

    /// Most recently fetched page
    pub async fn current(&self) -> Arc<Page> {
        Arc::clone(&self.inner.nav.lock().await.current)
    }

    /// Query text the next forward request would start from
    pub async fn query(&self) -> String {
        self.inner.nav.lock().await.query.clone()
    }

    /// A forward step is possible
    pub async fn has_next_page(&self) -> bool {
        self.inner.nav.lock().await.state.has_next_page
    }

    /// A backward step is possible
    pub async fn has_prev_page(&self) -> bool {
        self.inner.nav.lock().await.state.has_prev_page
    }

    /// Number of forward steps not yet undone
    pub async fn depth(&self) -> usize {
        self.inner.nav.lock().await.cursor_history.len()
    }

    /// Fetch the next page, or `None` if every branch is exhausted
    pub async fn next_page(&self) -> Option<Arc<Page>> {
        self.navigate(Direction::Forward).await
    }

    /// Fetch the previous page, or `None` if already at the start
    pub async fn prev_page(&self) -> Option<Arc<Page>> {
        self.navigate(Direction::Backward).await
    }

    /// Move in `direction`, joining any request already in flight
    pub async fn navigate(&self, direction: Direction) -> Option<Arc<Page>> {
        let pending = {
            let mut nav = self.inner.nav.lock().await;
            if let Some(pending) = nav.in_flight.clone() {
                debug!(?direction, "Joining in-flight request");
                pending
            } else {
                if !nav.can_move(direction) {
                    return None;
                }
                let pending = step(Arc::clone(&self.inner), direction).boxed().shared();
                nav.in_flight = Some(pending.clone());
                pending
            }
        };
        Some(pending.await)
    }
}

async fn step(inner: Arc<SessionInner>, direction: Direction) -> Arc<Page> {
    let (step, checkpoint) = {
        let mut nav = inner.nav.lock().await;
        let checkpoint = nav.checkpoint();
        let step = match direction {
            Direction::Forward => nav.advance(),
            Direction::Backward => nav.retreat(),
        };
        (step, checkpoint)
    };

    let variables = inner.bind(&step);
    let result = inner.client.execute(&step.query, variables).await;

    let mut nav = inner.nav.lock().await;
    nav.in_flight = None;
    match result {
        Ok(data) => nav.settle(data),
        Err(e) => {
            warn!(?direction, "Navigation request failed: {e}");
            nav.restore(checkpoint);
            nav.fail(e.into())
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.inner.client)
            .finish_non_exhaustive()
    }
}
