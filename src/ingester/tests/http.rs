use std::sync::Arc;

use axum::body::Body;
use axum::http::header;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use http_body_util::BodyExt;
use identity::cache::Cache;
use identity::identities::Lookup;
use ingester::executor::Dispatcher;
use ingester::executor::Executor;
use ingester::executor::UnhandledPolicy;
use ingester::sources::http::attach_routes;
use ingester::test_util::identity;
use ingester::test_util::settings;
use ingester::test_util::StubProvider;
use ingester::transformers::timeshift;
use ingester::transformers::timeshift::Resolver;
use ingester::transformers::traits::identify::Normalize;
use ingester::transformers::traits::Nesting;
use tower::ServiceExt;

const IDENTIFY_REQUEST_BODY: &str = r#"{
  "type": "identify",
  "userId": "cust-1",
  "sentAt": "2015-12-12T19:11:01.169Z",
  "traits": {
    "email": "jane@example.com",
    "first_name": "Jane",
    "plan_status": "active"
  }
}"#;

const GROUP_REQUEST_BODY: &str = r#"{
  "type": "group",
  "userId": "cust-1",
  "groupId": "g-1"
}"#;

fn router(stub: Arc<StubProvider>) -> Router {
    let resolver = Arc::new(Resolver::new(stub, Arc::new(Cache::new())));
    let track = Executor::new(
        vec![Arc::new(timeshift::track::Timeshift::new(resolver.clone()))],
        vec![],
    );
    let identify = Executor::new(
        vec![
            Arc::new(timeshift::identify::Timeshift::new(resolver)),
            Arc::new(Normalize::new(Nesting::SettingsBrand)),
        ],
        vec![],
    );
    let dispatcher = Dispatcher::new(track, identify, UnhandledPolicy::Reject);
    attach_routes(Router::new(), Arc::new(dispatcher), Arc::new(settings()))
}

fn post_event(body: &'static str) -> Request<Body> {
    Request::post("/v1/events")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("cannot create request")
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn identify_is_resolved_and_forwarded() {
    let stub = Arc::new(StubProvider::new(vec![Ok(Lookup::Found(identity(
        "pilatesAnytime",
        "cust-1",
        Some("ts-uuid-123"),
    )))]));
    let response = router(stub)
        .oneshot(post_event(IDENTIFY_REQUEST_BODY))
        .await
        .expect("there must be a response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["outcome"], "forwarded");
    assert_eq!(json["event"]["userId"], "ts-uuid-123");
    let nested = &json["event"]["traits"]["brands"]["pilatesAnytime"];
    assert_eq!(nested["planStatus"], "active");
    assert_eq!(nested["firstName"], "Jane");
    assert_eq!(nested["customerId"], "cust-1");
    assert_eq!(json["event"]["traits"]["email"], "jane@example.com");
}

#[tokio::test]
async fn server_error_asks_for_redelivery() {
    let stub = Arc::new(StubProvider::new(vec![Ok(Lookup::Unavailable(
        StatusCode::INTERNAL_SERVER_ERROR,
    ))]));
    let response = router(stub)
        .oneshot(post_event(IDENTIFY_REQUEST_BODY))
        .await
        .expect("there must be a response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response_json(response).await["outcome"], "retry");
}

#[tokio::test]
async fn missing_identity_is_dropped() {
    let stub = Arc::new(StubProvider::new(vec![Ok(Lookup::NotFound)]));
    let response = router(stub)
        .oneshot(post_event(IDENTIFY_REQUEST_BODY))
        .await
        .expect("there must be a response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["outcome"], "dropped");
}

#[tokio::test]
async fn group_is_rejected() {
    let stub = Arc::new(StubProvider::new(vec![]));
    let response = router(stub)
        .oneshot(post_event(GROUP_REQUEST_BODY))
        .await
        .expect("there must be a response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["outcome"], "rejected");
}
