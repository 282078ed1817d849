//! Tests for pagination module

use super::*;
use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::{Error, FetchError, Result};
use crate::http::{GraphQlRequest, GraphQlResponse, Transport};
use crate::query::cursor_bindings;
use crate::types::{JsonObject, Variables};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;

// ============================================================================
// Paged backend
// ============================================================================

/// In-memory server: each branch has a fixed number of pages and cursors
/// look like `<branch>:<page>`
struct PagedBackend {
    pages: BTreeMap<String, usize>,
    requests: Mutex<Vec<GraphQlRequest>>,
    delay: Duration,
    failing: AtomicBool,
}

impl PagedBackend {
    fn new(pages: &[(&str, usize)]) -> Self {
        Self {
            pages: pages.iter().map(|(k, n)| (k.to_string(), *n)).collect(),
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            failing: AtomicBool::new(false),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, index: usize) -> GraphQlRequest {
        self.requests.lock().unwrap()[index].clone()
    }

    fn respond(&self, request: &GraphQlRequest) -> Value {
        let bindings = cursor_bindings(&request.query).unwrap();
        let mut data = JsonObject::new();

        for (branch, variable) in bindings {
            let total = self.pages[&branch];
            let index = request
                .variables
                .get(&variable)
                .and_then(Value::as_str)
                .and_then(|c| c.rsplit(':').next())
                .map_or(0, |i| i.parse::<usize>().unwrap());

            let next = (index + 1 < total).then(|| format!("{branch}:{}", index + 1));
            let prev = (index > 0).then(|| format!("{branch}:{}", index - 1));
            data.insert(
                branch.clone(),
                json!({
                    "id": format!("{branch}-{index}"),
                    "pageInfo": {"nextCursor": next, "prevCursor": prev}
                }),
            );
        }

        Value::Object(data)
    }
}

#[async_trait]
impl Transport for PagedBackend {
    async fn post(
        &self,
        _endpoint: &str,
        _api_key: &str,
        request: &GraphQlRequest,
    ) -> Result<GraphQlResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Other("connection reset".to_string()));
        }
        Ok(GraphQlResponse::from_data(self.respond(request)))
    }
}

const TWO_BRANCHES: &str = r"query Balances($aCursor: String, $bCursor: String) {
  a: TokenBalances(input: {limit: 1, cursor: $aCursor}) {
    id
    pageInfo { nextCursor prevCursor }
  }
  b: TokenBalances(input: {limit: 1, cursor: $bCursor}) {
    id
    pageInfo { nextCursor prevCursor }
  }
}";

const ONE_BRANCH: &str = r"query Socials($owner: Identity!, $socialsCursor: String) {
  Socials(owner: $owner, limit: 1, cursor: $socialsCursor) {
    id
    pageInfo { nextCursor prevCursor }
  }
}";

fn client(backend: &Arc<PagedBackend>) -> Client {
    let config = ClientConfig::new("https://api.example.com/graphql").init("test-key", None);
    Client::with_transport(config, Arc::clone(backend) as Arc<dyn Transport>)
}

fn ids(page: &Page) -> Vec<String> {
    let Some(Value::Object(data)) = &page.data else {
        return Vec::new();
    };
    data.values()
        .filter_map(|v| v["id"].as_str().map(str::to_string))
        .collect()
}

// ============================================================================
// Extraction Tests
// ============================================================================

#[test]
fn test_extract_multiple_branches() {
    let data = json!({
        "a": {"pageInfo": {"nextCursor": "n-a", "prevCursor": null}},
        "b": {"pageInfo": {"nextCursor": null, "prevCursor": "p-b"}},
        "c": {"items": [1, 2, 3]}
    });
    let state = extract_pagination(Some(&data));

    assert!(state.has_next_page);
    assert!(state.has_prev_page);
    assert_eq!(state.next_cursors.len(), 1);
    assert_eq!(state.next_cursors["a"], "n-a");
    assert_eq!(state.prev_cursors["b"], "p-b");
    assert_eq!(state.branches.len(), 2);
    assert!(!state.branches.contains("c"));
    assert_eq!(
        state.exhausted_branches().into_iter().collect::<Vec<_>>(),
        vec!["b".to_string()]
    );
}

#[test_case(json!({"nextCursor": "x", "prevCursor": "y"}), true, true ; "both cursors")]
#[test_case(json!({"nextCursor": "", "prevCursor": ""}), false, false ; "empty strings")]
#[test_case(json!({"nextCursor": null, "prevCursor": "y"}), false, true ; "null next")]
#[test_case(json!({}), false, false ; "no cursor fields")]
fn test_extract_flags(page_info: Value, next: bool, prev: bool) {
    let data = json!({"branch": {"pageInfo": page_info}});
    let state = extract_pagination(Some(&data));
    assert_eq!(state.has_next_page, next);
    assert_eq!(state.has_prev_page, prev);
    assert!(state.branches.contains("branch"));
}

#[test_case(None ; "no data")]
#[test_case(Some(json!(null)) ; "null data")]
#[test_case(Some(json!([1, 2])) ; "array data")]
#[test_case(Some(json!({"a": {"pageInfo": null}})) ; "null page info")]
fn test_extract_without_pagination(data: Option<Value>) {
    assert_eq!(extract_pagination(data.as_ref()), PaginationState::default());
}

#[test]
fn test_page_branch_lookup() {
    let data = json!({"a": {"id": 1}});
    let page = Page::success(Some(data), &PaginationState::default());
    assert_eq!(page.branch("a"), Some(&json!({"id": 1})));
    assert!(page.branch("b").is_none());
    assert!(!page.is_error());
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_first_page_flags() {
    let backend = Arc::new(PagedBackend::new(&[("Socials", 3)]));
    let mut variables = Variables::new();
    variables.insert("owner".to_string(), json!("vitalik.eth"));

    let session = Session::start(client(&backend), ONE_BRANCH, variables).await;
    let page = session.current().await;

    assert!(page.has_next_page);
    assert!(!page.has_prev_page);
    assert_eq!(ids(&page), vec!["Socials-0"]);
    assert_eq!(session.depth().await, 0);
}

#[tokio::test]
async fn test_next_page_returns_a_different_item() {
    let backend = Arc::new(PagedBackend::new(&[("Socials", 3)]));
    let mut variables = Variables::new();
    variables.insert("owner".to_string(), json!("vitalik.eth"));

    let session = Session::start(client(&backend), ONE_BRANCH, variables).await;
    let page = session.next_page().await.unwrap();

    assert_eq!(ids(&page), vec!["Socials-1"]);
    assert!(page.has_prev_page);

    let sent = backend.request(1).variables;
    assert_eq!(sent["owner"], json!("vitalik.eth"));
    assert_eq!(sent["socialsCursor"], json!("Socials:1"));
}

#[tokio::test]
async fn test_terminal_directions_return_none_without_request() {
    let backend = Arc::new(PagedBackend::new(&[("Socials", 1)]));
    let session = Session::start(client(&backend), ONE_BRANCH, Variables::new()).await;

    assert!(!session.has_next_page().await);
    assert!(!session.has_prev_page().await);
    assert!(session.next_page().await.is_none());
    assert!(session.prev_page().await.is_none());
    assert_eq!(backend.calls(), 1);
}

#[test_case(1 ; "one step")]
#[test_case(2 ; "two steps")]
#[test_case(3 ; "three steps")]
#[tokio::test]
async fn test_round_trip_returns_first_page(steps: usize) {
    let backend = Arc::new(PagedBackend::new(&[("Socials", 4)]));
    let session = Session::start(client(&backend), ONE_BRANCH, Variables::new()).await;
    let first = session.current().await;

    for _ in 0..steps {
        session.next_page().await.unwrap();
    }
    assert_eq!(session.depth().await, steps);
    for _ in 0..steps {
        session.prev_page().await.unwrap();
    }

    let back = session.current().await;
    assert_eq!(back.data, first.data);
    assert!(!back.has_prev_page);
    assert_eq!(session.depth().await, 0);
}

#[tokio::test]
async fn test_concurrent_next_page_is_single_flight() {
    let backend =
        Arc::new(PagedBackend::new(&[("Socials", 3)]).with_delay(Duration::from_millis(50)));
    let session = Session::start(client(&backend), ONE_BRANCH, Variables::new()).await;

    let (first, second) = tokio::join!(session.next_page(), session.next_page());
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(backend.calls(), 2);
    assert_eq!(session.depth().await, 1);
}

#[tokio::test]
async fn test_prev_page_joins_pending_next_page() {
    let backend =
        Arc::new(PagedBackend::new(&[("Socials", 3)]).with_delay(Duration::from_millis(50)));
    let session = Session::start(client(&backend), ONE_BRANCH, Variables::new()).await;

    let (next, prev) = tokio::join!(session.next_page(), session.prev_page());

    assert!(Arc::ptr_eq(&next.unwrap(), &prev.unwrap()));
    assert_eq!(backend.calls(), 2);
    assert_eq!(session.depth().await, 1);
}

#[tokio::test]
async fn test_exhausted_branch_pruned_and_restored() {
    let backend = Arc::new(PagedBackend::new(&[("a", 1), ("b", 4)]));
    let session = Session::start(client(&backend), TWO_BRANCHES, Variables::new()).await;
    let first = session.current().await;
    assert_eq!(ids(&first), vec!["a-0", "b-0"]);

    for expected in ["b-1", "b-2", "b-3"] {
        let page = session.next_page().await.unwrap();
        assert_eq!(ids(&page), vec![expected]);
    }
    assert!(session.next_page().await.is_none());

    // Every forward request after the first page omits branch `a`
    for i in 1..=3 {
        let request = backend.request(i);
        assert!(!request.query.contains("a: TokenBalances"));
        assert!(!request.variables.contains_key("aCursor"));
    }

    for expected in [vec!["b-2"], vec!["b-1"]] {
        let page = session.prev_page().await.unwrap();
        assert_eq!(ids(&page), expected);
    }

    let page = session.prev_page().await.unwrap();
    assert_eq!(page.data, first.data);
    assert!(page.has_next_page);
    assert!(!page.has_prev_page);
    assert_eq!(session.query().await, TWO_BRANCHES);
    assert_eq!(session.depth().await, 0);
}

#[tokio::test]
async fn test_prune_on_later_step_restores_with_earlier_cursors() {
    let backend = Arc::new(PagedBackend::new(&[("a", 2), ("b", 4)]));
    let session = Session::start(client(&backend), TWO_BRANCHES, Variables::new()).await;
    let first = session.current().await;

    let second = session.next_page().await.unwrap();
    assert_eq!(ids(&second), vec!["a-1", "b-1"]);

    let third = session.next_page().await.unwrap();
    assert_eq!(ids(&third), vec!["b-2"]);

    let back = session.prev_page().await.unwrap();
    assert_eq!(back.data, second.data);
    assert_eq!(session.query().await, TWO_BRANCHES);

    let back = session.prev_page().await.unwrap();
    assert_eq!(back.data, first.data);
    assert_eq!(session.depth().await, 0);
}

#[tokio::test]
async fn test_failed_step_restores_navigation() {
    let backend = Arc::new(PagedBackend::new(&[("a", 1), ("b", 3)]));
    let session = Session::start(client(&backend), TWO_BRANCHES, Variables::new()).await;

    backend.failing.store(true, Ordering::SeqCst);
    let failed = session.next_page().await.unwrap();
    assert_eq!(
        failed.error,
        Some(FetchError::Transport("connection reset".to_string()))
    );
    assert!(failed.data.is_none());
    assert!(failed.has_next_page);
    assert_eq!(session.query().await, TWO_BRANCHES);
    assert_eq!(session.depth().await, 0);

    backend.failing.store(false, Ordering::SeqCst);
    let page = session.next_page().await.unwrap();
    assert_eq!(ids(&page), vec!["b-1"]);
    assert_eq!(session.depth().await, 1);
}

#[tokio::test]
async fn test_missing_api_key_fails_first_page() {
    let backend = Arc::new(PagedBackend::new(&[("Socials", 3)]));
    let config = ClientConfig::new("https://api.example.com/graphql");
    let client = Client::with_transport(config, Arc::clone(&backend) as Arc<dyn Transport>);

    let session = Session::start(client, ONE_BRANCH, Variables::new()).await;
    let page = session.current().await;

    assert!(matches!(page.error, Some(FetchError::Config(_))));
    assert!(!page.has_next_page);
    assert!(session.next_page().await.is_none());
    assert_eq!(backend.calls(), 0);
}
