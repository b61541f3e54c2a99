use std::{
  collections::VecDeque,
  future::Future,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
  },
};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use grocer_ai::{CompletionRequest, Error as AiError, Gateway, RetryPolicy};
use grocer_core::{
  model::calendar_day,
  store::{Document, StateStore, StoredDocuments},
};
use grocer_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Answers prompts from a script; an exhausted script answers with an empty
/// body.
struct Scripted {
  replies: Mutex<VecDeque<grocer_ai::Result<String>>>,
  calls:   AtomicUsize,
}

impl Completion for Scripted {
  async fn complete(&self, _request: &CompletionRequest) -> grocer_ai::Result<String> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self
      .replies
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Ok(String::new()))
  }
}

fn scripted(replies: Vec<grocer_ai::Result<String>>) -> Scripted {
  Scripted { replies: Mutex::new(replies.into()), calls: AtomicUsize::new(0) }
}

/// Delegates to SQLite, but fails the next `save` once `fail_next` is set.
struct FlakyStore {
  inner:     SqliteStore,
  fail_next: Arc<AtomicBool>,
}

impl StateStore for FlakyStore {
  type Error = grocer_store_sqlite::Error;

  fn load(
    &self,
  ) -> impl Future<Output = Result<StoredDocuments, Self::Error>> + Send + '_ {
    self.inner.load()
  }

  fn save(
    &self,
    document: Document,
    body: serde_json::Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    let fail = self.fail_next.swap(false, Ordering::SeqCst);
    async move {
      if fail {
        return Err(grocer_store_sqlite::Error::UnknownDocument(
          document.key().to_owned(),
        ));
      }
      self.inner.save(document, body).await
    }
  }
}

type Service = AppService<SqliteStore, Scripted>;

fn no_retry() -> RetryPolicy { RetryPolicy { retries: 0, ..RetryPolicy::default() } }

async fn make_service(replies: Vec<grocer_ai::Result<String>>) -> (Arc<Service>, SqliteStore) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let gateway = Gateway::with_policy(scripted(replies), no_retry());
  let service = AppService::load(store.clone(), gateway)
    .await
    .unwrap();
  (Arc::new(service), store)
}

fn ai_calls(service: &Service) -> usize {
  service.gateway().completion().calls.load(Ordering::SeqCst)
}

async fn call<S: StateStore + 'static>(
  service: &Arc<AppService<S, Scripted>>,
  method:  &str,
  uri:     &str,
  body:    Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string())),
    None => builder.body(Body::empty()),
  }
  .unwrap();

  let resp = api_router(service.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

async fn add<S: StateStore + 'static>(
  service: &Arc<AppService<S, Scripted>>,
  name: &str,
  category_id: &str,
) -> Value {
  let (status, body) = call(
    service,
    "POST",
    "/items",
    Some(json!({ "name": name, "category_id": category_id })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  body["item"].clone()
}

// ─── Items ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_capitalises_and_merges_duplicates() {
  let (service, _) = make_service(vec![]).await;
  let first = add(&service, "bread", "dept_bakery").await;
  assert_eq!(first["name"], "Bread");

  let again = add(&service, "BREAD ", "dept_bakery").await;
  assert_eq!(again["id"], first["id"]);

  let (_, picker) = call(&service, "GET", "/history/picker", None).await;
  assert_eq!(picker.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_name_is_categorised_by_ai() {
  let (service, _) = make_service(vec![Ok(
    r#"{"categoryName":"Spices","suggestedEmoji":"🌶️","isNew":true}"#.into(),
  )])
  .await;

  let (status, body) = call(&service, "POST", "/items", Some(json!({ "name": "paprika" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.get("notice").is_none());
  assert_eq!(ai_calls(&service), 1);

  let (_, categories) = call(&service, "GET", "/categories", None).await;
  let spices = categories
    .as_array()
    .unwrap()
    .iter()
    .find(|c| c["name"] == "Spices")
    .expect("category created");
  assert_eq!(body["item"]["category_id"], spices["id"]);
}

#[tokio::test]
async fn failed_categorisation_falls_back_with_notice() {
  let (service, _) = make_service(vec![Err(AiError::MissingCredential)]).await;
  let (status, body) = call(&service, "POST", "/items", Some(json!({ "name": "quinoa" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["item"]["category_id"], "dept_none");
  assert!(body["notice"].as_str().unwrap().contains("API key"));
}

#[tokio::test]
async fn known_names_and_disabled_ai_skip_the_call() {
  let (service, _) = make_service(vec![]).await;
  let milk = add(&service, "Milk", "dept_dairy").await;
  let (_, again) = call(&service, "POST", "/items", Some(json!({ "name": "milk" }))).await;
  assert_eq!(again["item"]["category_id"], "dept_dairy");
  assert_eq!(again["item"]["id"], milk["id"]);

  let (status, _) =
    call(&service, "PUT", "/preferences", Some(json!({ "ai_enabled": false }))).await;
  assert_eq!(status, StatusCode::OK);
  let (_, fresh) = call(&service, "POST", "/items", Some(json!({ "name": "tofu" }))).await;
  assert_eq!(fresh["item"]["category_id"], "dept_none");
  assert!(fresh.get("notice").is_none());
  assert_eq!(ai_calls(&service), 0);
}

#[tokio::test]
async fn unknown_item_is_404() {
  let (service, _) = make_service(vec![]).await;
  let (status, body) = call(&service, "POST", "/items/item_nope/complete", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("item_nope"));
}

// ─── Completion and undo ─────────────────────────────────────────────────────

#[tokio::test]
async fn complete_then_undo_restores_count_and_log() {
  let (service, _) = make_service(vec![]).await;
  let milk = add(&service, "Milk", "dept_dairy").await;
  let id = milk["id"].as_str().unwrap();

  let (status, done) = call(&service, "POST", &format!("/items/{id}/complete"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(done["item"]["purchase_count"], 1);
  assert!(done["undo_expires_at"].is_string());

  let (_, list) = call(&service, "GET", "/list", None).await;
  assert_eq!(list["completed_today"][0]["id"], id);
  assert!(list["groups"].as_array().unwrap().is_empty());

  let today = calendar_day(Utc::now());
  let (_, calendar) = call(&service, "GET", "/calendar", None).await;
  assert_eq!(calendar, json!([{ "date": today.to_string(), "entries": 1 }]));

  let (status, undone) = call(&service, "POST", "/undo/complete", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(undone["purchase_count"], 0);
  assert_eq!(undone["completed"], false);

  let (_, calendar) = call(&service, "GET", "/calendar", None).await;
  assert_eq!(calendar, json!([]));
  let (status, _) = call(&service, "GET", &format!("/calendar/{today}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = call(&service, "POST", "/undo/complete", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn a_second_completion_supersedes_the_first_undo() {
  let (service, _) = make_service(vec![]).await;
  let eggs = add(&service, "Eggs", "dept_dairy").await;
  let milk = add(&service, "Milk", "dept_dairy").await;
  for item in [&eggs, &milk] {
    let id = item["id"].as_str().unwrap();
    call(&service, "POST", &format!("/items/{id}/complete"), None).await;
  }

  let (_, undone) = call(&service, "POST", "/undo/complete", None).await;
  assert_eq!(undone["id"], milk["id"]);
  let (status, _) = call(&service, "POST", "/undo/complete", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_undo_does_nothing() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let service = AppService::load(store, Gateway::with_policy(scripted(vec![]), no_retry()))
    .await
    .unwrap()
    .with_undo_window(Duration::zero());
  let service = Arc::new(service);

  let milk = add(&service, "Milk", "dept_dairy").await;
  let id = milk["id"].as_str().unwrap();
  call(&service, "POST", &format!("/items/{id}/complete"), None).await;

  let (status, _) = call(&service, "POST", "/undo/complete", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (_, calendar) = call(&service, "GET", "/calendar", None).await;
  assert_eq!(calendar[0]["entries"], 1);
}

#[tokio::test]
async fn deleted_item_can_be_restored() {
  let (service, _) = make_service(vec![]).await;
  add(&service, "Eggs", "dept_dairy").await;
  let bread = add(&service, "Bread", "dept_bakery").await;
  let id = bread["id"].as_str().unwrap();

  let (status, deleted) = call(&service, "DELETE", &format!("/items/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(deleted["item"]["id"], id);
  let (_, picker) = call(&service, "GET", "/history/picker", None).await;
  assert_eq!(picker.as_array().unwrap().len(), 1);

  let (status, restored) = call(&service, "POST", "/undo/delete", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(restored["id"], id);
  let (_, picker) = call(&service, "GET", "/history/picker", None).await;
  assert_eq!(picker.as_array().unwrap().len(), 2);
}

// ─── Categories ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_a_category_moves_its_items() {
  let (service, _) = make_service(vec![]).await;
  let milk = add(&service, "Milk", "dept_dairy").await;

  let (status, body) = call(&service, "DELETE", "/categories/dept_dairy", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "moved": 1 }));

  let (_, history) = call(&service, "GET", "/history", None).await;
  assert_eq!(history[0]["category"]["id"], "dept_none");
  assert_eq!(history[0]["items"][0]["id"], milk["id"]);
}

#[tokio::test]
async fn reserved_category_is_protected() {
  let (service, _) = make_service(vec![]).await;
  let (status, _) = call(&service, "DELETE", "/categories/dept_none", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = call(
    &service,
    "PUT",
    "/categories/dept_none",
    Some(json!({ "name": "Misc" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filter_matches_category() {
  let (service, _) = make_service(vec![]).await;
  add(&service, "Milk", "dept_dairy").await;
  add(&service, "Bread", "dept_bakery").await;

  let (_, list) = call(&service, "GET", "/list?category=dept_bakery", None).await;
  let groups = list["groups"].as_array().unwrap();
  assert_eq!(groups.len(), 1);
  assert_eq!(groups[0]["items"][0]["name"], "Bread");
}

// ─── Sets ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn applying_a_set_adds_its_lines_and_counts_a_use() {
  let (service, _) = make_service(vec![]).await;
  let (status, items) = call(&service, "POST", "/sets/set_breakfast/apply", None).await;
  assert_eq!(status, StatusCode::OK);
  let names: Vec<&str> = items
    .as_array()
    .unwrap()
    .iter()
    .map(|i| i["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, ["Eggs", "Bread", "Milk"]);
  assert_eq!(items[0]["category_id"], "dept_dairy");
  assert_eq!(ai_calls(&service), 0);

  let (_, items) = call(
    &service,
    "POST",
    "/sets/set_breakfast/apply",
    Some(json!({ "items": ["bread"] })),
  )
  .await;
  assert_eq!(items.as_array().unwrap().len(), 1);

  let (_, sets) = call(&service, "GET", "/sets", None).await;
  assert_eq!(sets[0]["usage_count"], 2);
}

#[tokio::test]
async fn set_crud() {
  let (service, _) = make_service(vec![]).await;
  let (status, set) = call(
    &service,
    "POST",
    "/sets",
    Some(json!({
      "name": "Tacos",
      "emoji": "🌮",
      "items": [{ "name": "Tortillas", "category_name": "Bakery", "emoji": "🫓" }]
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = set["id"].as_str().unwrap();

  let (_, renamed) =
    call(&service, "PUT", &format!("/sets/{id}"), Some(json!({ "name": "Taco night" }))).await;
  assert_eq!(renamed["name"], "Taco night");
  assert_eq!(renamed["items"].as_array().unwrap().len(), 1);

  let (status, _) = call(&service, "DELETE", &format!("/sets/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(&service, "DELETE", &format!("/sets/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn set_lines_without_a_name_are_refused() {
  let (service, _) = make_service(vec![]).await;
  let lines = json!([
    { "name": "Eggs", "category_name": "Dairy", "emoji": "" },
    { "name": "  ", "category_name": "Ghost", "emoji": "" }
  ]);
  let (status, body) =
    call(&service, "POST", "/sets", Some(json!({ "name": "Brunch", "items": lines }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (_, sets) = call(&service, "GET", "/sets", None).await;
  assert!(sets.as_array().unwrap().iter().all(|s| s["name"] != "Brunch"));
  let (_, categories) = call(&service, "GET", "/categories", None).await;
  assert!(categories.as_array().unwrap().iter().all(|c| c["name"] != "Ghost"));
}

// ─── AI ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dictation_adds_items_and_reports_the_dish() {
  let (service, _) = make_service(vec![Ok(r#"{
    "items": [
      {"name":"basil","categoryName":"Produce","suggestedEmoji":"🌿"},
      {"name":"pine nuts","categoryName":"Pantry","suggestedEmoji":"🥜"},
      {"name":"  ","categoryName":"Pantry","suggestedEmoji":""}
    ],
    "dishName": "Pesto"
  }"#
    .into())])
  .await;

  let (status, body) = call(
    &service,
    "POST",
    "/ai/dictation",
    Some(json!({ "text": "ingredients for pesto" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["dish_name"], "Pesto");
  let items = body["items"].as_array().unwrap();
  assert_eq!(items.len(), 2);
  assert_eq!(items[0]["name"], "Basil");
  assert_eq!(items[0]["category_id"], "dept_produce");
}

#[tokio::test]
async fn generated_set_is_a_draft() {
  let (service, store) = make_service(vec![Ok(
    r#"{"setEmoji":"🥞","items":[{"name":"Flour","categoryName":"Pantry","emoji":"🌾"}]}"#.into(),
  )])
  .await;

  let (status, draft) = call(
    &service,
    "POST",
    "/ai/sets/generate",
    Some(json!({ "description": "pancakes" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(draft["setEmoji"], "🥞");
  assert_eq!(draft["items"][0]["categoryName"], "Pantry");
  assert!(store.load().await.unwrap().sets.is_none());
}

#[tokio::test]
async fn rate_limit_is_503_and_other_failures_502() {
  let (service, _) = make_service(vec![
    Err(AiError::RateLimited { message: "quota".into() }),
    Err(AiError::Service { status: 500, message: "internal".into() }),
  ])
  .await;
  let body = Some(json!({ "description": "picnic" }));

  let (status, err) = call(&service, "POST", "/ai/sets/generate", body.clone()).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert!(err["error"].as_str().unwrap().contains("try again in a minute"));

  let (status, _) = call(&service, "POST", "/ai/sets/generate", body).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn suggestions_need_history() {
  let (service, _) = make_service(vec![Ok(
    r#"[{"name":"Coffee run","emoji":"☕","items":[]}]"#.into(),
  )])
  .await;
  let (_, none) = call(&service, "POST", "/ai/sets/suggest", None).await;
  assert_eq!(none, json!([]));
  assert_eq!(ai_calls(&service), 0);

  let milk = add(&service, "Milk", "dept_dairy").await;
  let id = milk["id"].as_str().unwrap();
  call(&service, "POST", &format!("/items/{id}/complete"), None).await;

  let (status, sets) = call(&service, "POST", "/ai/sets/suggest", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(sets[0]["name"], "Coffee run");
}

#[tokio::test]
async fn ai_endpoints_refuse_when_disabled() {
  let (service, _) = make_service(vec![]).await;
  call(&service, "PUT", "/preferences", Some(json!({ "ai_enabled": false }))).await;
  let (status, _) = call(&service, "POST", "/ai/dictation", Some(json!({ "text": "milk" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(ai_calls(&service), 0);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn actions_write_through_to_the_store() {
  let (service, store) = make_service(vec![]).await;
  let milk = add(&service, "Milk", "dept_dairy").await;
  let id = milk["id"].as_str().unwrap();
  call(&service, "POST", &format!("/items/{id}/complete"), None).await;

  let saved = store.load().await.unwrap();
  assert_eq!(saved.items.unwrap()[0].purchase_count, 1);
  assert_eq!(saved.logs.unwrap()[0].entries[0].name, "Milk");
  assert!(saved.categories.is_none());

  let reloaded =
    AppService::load(store.clone(), Gateway::with_policy(scripted(vec![]), no_retry()))
      .await
      .unwrap();
  let prefs = reloaded.preferences().await.unwrap();
  assert!(prefs.ai_enabled);
  let (_, picker) = call(&Arc::new(reloaded), "GET", "/history/picker", None).await;
  assert_eq!(picker[0]["name"], "Milk");
}

#[tokio::test]
async fn failed_save_is_retried_by_the_next_action() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let fail_next = Arc::new(AtomicBool::new(false));
  let flaky = FlakyStore { inner: store.clone(), fail_next: fail_next.clone() };
  let service = AppService::load(flaky, Gateway::with_policy(scripted(vec![]), no_retry()))
    .await
    .unwrap();
  let service = Arc::new(service);

  fail_next.store(true, Ordering::SeqCst);
  let (status, body) = call(
    &service,
    "POST",
    "/items",
    Some(json!({ "name": "Milk", "category_id": "dept_dairy" })),
  )
  .await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert!(body["error"].is_string());
  assert!(store.load().await.unwrap().items.is_none());

  let (status, _) =
    call(&service, "POST", "/categories", Some(json!({ "name": "Spices" }))).await;
  assert!(status.is_success());

  let saved = store.load().await.unwrap();
  let items = saved.items.unwrap();
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].name, "Milk");
  assert!(items[0].on_list);
  assert!(saved.categories.unwrap().iter().any(|c| c.name == "Spices"));
}

// ─── Day rollover ────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_action_on_a_new_day_rolls_over() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let offset = Arc::new(AtomicI64::new(0));
  let clock_offset = offset.clone();
  let clock = move || Utc::now() + Duration::seconds(clock_offset.load(Ordering::SeqCst));
  let gateway = Gateway::with_policy(scripted(vec![]), no_retry());
  let service = AppService::load(store.clone(), gateway)
    .await
    .unwrap()
    .with_clock(clock);
  let service = Arc::new(service);

  let milk = add(&service, "Milk", "dept_dairy").await;
  let id = milk["id"].as_str().unwrap();
  call(&service, "POST", &format!("/items/{id}/complete"), None).await;
  let (_, list) = call(&service, "GET", "/list", None).await;
  assert_eq!(list["completed_today"][0]["id"], id);

  offset.store(Duration::days(1).num_seconds(), Ordering::SeqCst);
  let (_, list) = call(&service, "GET", "/list", None).await;
  assert!(list["completed_today"].as_array().unwrap().is_empty());
  assert!(list["groups"].as_array().unwrap().is_empty());

  let saved = &store.load().await.unwrap().items.unwrap()[0];
  assert!(!saved.on_list);
  assert!(!saved.completed);
  assert!(saved.completed_at.is_none());
  assert_eq!(saved.purchase_count, 1);

  let (_, picker) = call(&service, "GET", "/history/picker", None).await;
  assert_eq!(picker[0]["name"], "Milk");
}
