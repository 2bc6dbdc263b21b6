// End-to-end pipeline tests: schedule through the engine, serve canned
// controller responses, and observe the store the way a view would.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use meshboard_api::{Error as ApiError, HttpMethod};
use meshboard_core::{
    BatchRequest, CoreError, Engine, SchedulerOptions, Target, Transport,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

/// Canned controller: maps paths to response bodies and records every
/// request it serves.
#[derive(Default)]
struct FakeController {
    responses: Mutex<HashMap<String, Value>>,
    served: Mutex<Vec<(HttpMethod, String)>>,
}

impl FakeController {
    fn with(self, path: &str, body: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_owned(), body);
        self
    }

    fn served(&self) -> Vec<(HttpMethod, String)> {
        self.served.lock().unwrap().clone()
    }
}

impl Transport for FakeController {
    fn perform(
        &self,
        method: HttpMethod,
        path: &str,
        _body: Option<&Value>,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send {
        self.served.lock().unwrap().push((method, path.to_owned()));
        let body = self.responses.lock().unwrap().get(path).cloned();
        async move {
            match body {
                Some(body) => Ok(body),
                None => Err(ApiError::Api {
                    status: 404,
                    message: "no such collection".into(),
                    code: Some("api.err.NoSuchCollection".into()),
                }),
            }
        }
    }
}

fn engine(controller: Arc<FakeController>) -> Engine {
    Engine::with_transport(
        controller,
        "default",
        SchedulerOptions::default(),
        Duration::ZERO,
    )
}

#[tokio::test]
async fn read_batch_flows_into_tables_and_composite_badge() {
    let controller = Arc::new(
        FakeController::default()
            .with("/api/s/default/rest/client/wired", json!([{ "id": 1 }]))
            .with(
                "/api/s/default/rest/client/wireless",
                json!([{ "id": 2 }, { "id": 3 }]),
            ),
    );
    let engine = engine(Arc::clone(&controller));

    let mut badge = engine.store().subscribe_count(Target::Client);
    badge.borrow_and_update();

    let results = engine
        .refresh(vec![Target::WiredClient, Target::WirelessClient])
        .unwrap()
        .settled()
        .await
        .unwrap();
    assert!(results.is_fully_ok());

    // Tables hold the fetched records and the derived badge saw the sum.
    assert_eq!(engine.store().table(Target::WiredClient).len(), 1);
    assert_eq!(engine.store().table(Target::WirelessClient).len(), 2);
    assert!(badge.has_changed().unwrap());
    assert_eq!(*badge.borrow_and_update(), 3);
    assert!(engine.store().last_ingest().is_some());

    engine.shutdown().await;
}

#[tokio::test]
async fn envelope_responses_are_unwrapped_before_ingest() {
    let controller = Arc::new(FakeController::default().with(
        "/api/s/default/rest/network",
        json!({ "meta": { "rc": "ok" }, "data": [{ "id": "net1" }, { "id": "net2" }] }),
    ));
    let engine = engine(controller);

    engine
        .refresh(vec![Target::Network])
        .unwrap()
        .settled()
        .await
        .unwrap();

    let table = engine.store().table(Target::Network);
    assert_eq!(table.len(), 2);
    assert_eq!(table[0]["id"], "net1");

    engine.shutdown().await;
}

#[tokio::test]
async fn mutation_then_reread_updates_the_store() {
    let controller = Arc::new(
        FakeController::default()
            .with("/api/s/default/rest/firewallrule", json!([{ "id": "fw1" }]))
            .with(
                "/api/s/default/rest/firewallrule/fw1",
                json!({ "id": "fw1", "enabled": false }),
            ),
    );
    let engine = engine(Arc::clone(&controller));

    let update = engine
        .scheduler()
        .schedule(BatchRequest::update(
            Target::FirewallRule,
            "fw1",
            json!({ "enabled": false }),
        ))
        .unwrap()
        .settled()
        .await
        .unwrap();
    assert!(update.is_fully_ok());
    // Mutations never write the store; the caller re-reads.
    assert!(engine.store().table(Target::FirewallRule).is_empty());

    engine
        .refresh(vec![Target::FirewallRule])
        .unwrap()
        .settled()
        .await
        .unwrap();
    assert_eq!(engine.store().table(Target::FirewallRule).len(), 1);

    let served = controller.served();
    assert_eq!(
        served,
        vec![
            (
                HttpMethod::Put,
                "/api/s/default/rest/firewallrule/fw1".to_owned()
            ),
            (
                HttpMethod::Get,
                "/api/s/default/rest/firewallrule".to_owned()
            ),
        ]
    );

    engine.shutdown().await;
}

#[tokio::test]
async fn failed_target_reports_error_but_siblings_land() {
    let controller = Arc::new(
        FakeController::default()
            .with("/api/s/default/rest/accesspoint", json!([{ "id": "ap1" }])),
    );
    let engine = engine(controller);

    let results = engine
        .refresh(vec![Target::AccessPoint, Target::Switch])
        .unwrap()
        .settled()
        .await
        .unwrap();

    assert!(!results.is_fully_ok());
    assert!(results.ok(Target::AccessPoint).is_some());
    match results.get(Target::Switch) {
        Some(Err(e @ CoreError::Api { code, .. })) => {
            assert_eq!(code.as_deref(), Some("api.err.NoSuchCollection"));
            assert!(!e.is_transient());
        }
        other => panic!("expected API error for switch, got {other:?}"),
    }

    assert_eq!(engine.store().count(Target::AccessPoint), 1);
    assert_eq!(engine.store().count(Target::Device), 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn dropped_subscription_does_not_disturb_remaining_observers() {
    let controller = Arc::new(
        FakeController::default()
            .with("/api/s/default/rest/wlan", json!([{ "id": "w1" }])),
    );
    let engine = engine(controller);

    let kept = engine.store().subscribe_table(Target::WifiNetwork);
    let dropped = engine.store().subscribe_table(Target::WifiNetwork);
    drop(dropped);

    engine
        .refresh(vec![Target::WifiNetwork])
        .unwrap()
        .settled()
        .await
        .unwrap();

    assert!(kept.has_changed());
    assert_eq!(kept.latest().len(), 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn table_stream_yields_each_replacement() {
    use futures_util::StreamExt;

    let controller = Arc::new(
        FakeController::default()
            .with("/api/s/default/rest/gateway", json!([{ "id": "gw1" }])),
    );
    let engine = engine(controller);

    let mut stream = engine
        .store()
        .subscribe_table(Target::Gateway)
        .into_stream();
    // WatchStream yields the initial value first.
    assert!(stream.next().await.unwrap().is_empty());

    engine
        .refresh(vec![Target::Gateway])
        .unwrap()
        .settled()
        .await
        .unwrap();

    let snapshot = stream.next().await.unwrap();
    assert_eq!(snapshot.len(), 1);

    engine.shutdown().await;
}
