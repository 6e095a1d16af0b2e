use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing;
use axum::Json;
use axum::Router;
use common::types::Settings;
use serde::Serialize;
use tokio::select;
use tokio::signal::unix::SignalKind;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::Result;
use crate::event::Event;
use crate::executor::Dispatcher;
use crate::executor::Outcome;

#[derive(Clone)]
struct App {
    dispatcher: Arc<Dispatcher>,
    settings: Arc<Settings>,
}

/// Wire response: the terminal outcome of one event, with the transformed
/// record when it is forwarded.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum EventResponse {
    Forwarded { event: Event },
    Dropped { reason: String },
    Retry { reason: String },
    Rejected { reason: String },
}

pub fn attach_routes(
    router: Router,
    dispatcher: Arc<Dispatcher>,
    settings: Arc<Settings>,
) -> Router {
    info!("attaching api routes...");
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/v1/events", routing::post(events))
        .layer(cors)
        .with_state(App {
            dispatcher,
            settings,
        });
    router.merge(api)
}

pub struct Service {
    router: Router,
    addr: SocketAddr,
}

impl Service {
    pub fn new(dispatcher: Dispatcher, settings: Settings, addr: SocketAddr) -> Self {
        let router = attach_routes(
            Router::new(),
            Arc::new(dispatcher),
            Arc::new(settings),
        );
        Self { router, addr }
    }

    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("start listening on {}", self.addr);
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async {
                let mut sig_int = tokio::signal::unix::signal(SignalKind::interrupt())
                    .expect("failed to install signal");
                let mut sig_term = tokio::signal::unix::signal(SignalKind::terminate())
                    .expect("failed to install signal");
                select! {
                    _=sig_int.recv()=>info!("SIGINT received"),
                    _=sig_term.recv()=>info!("SIGTERM received"),
                }
            })
            .await?;
        Ok(())
    }
}

async fn events(
    State(state): State<App>,
    Json(event): Json<Event>,
) -> (StatusCode, Json<EventResponse>) {
    match state.dispatcher.dispatch(&state.settings, event).await {
        Outcome::Forward(event) => (StatusCode::OK, Json(EventResponse::Forwarded { event })),
        Outcome::Drop(reason) => (StatusCode::OK, Json(EventResponse::Dropped { reason })),
        Outcome::Retry(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(EventResponse::Retry { reason }),
        ),
        Outcome::Reject(reason) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(EventResponse::Rejected { reason }),
        ),
    }
}
