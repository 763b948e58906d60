//! Giftflow logistics-center integration service.
//!
//! Outbound: builds and transmits purchase orders and customer orders to the
//! warehouse provider's HTTP API. Inbound: reconciles the provider's
//! asynchronous receipt/status/shipment/stock messages into durable,
//! monotonically-consistent state.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod bundles;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod external_id;
pub mod handlers;
pub mod message_queue;
pub mod migrator;
pub mod services;
pub mod wire;
pub mod worker;

use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::errors::ServiceError;
use crate::external_id::ExternalIdMapper;
use crate::services::{
    dispatch::OutboundDispatcher, orders::OrderService, purchase_orders::PurchaseOrderService,
    reconciler::MessageReconciler, snapshots::SnapshotStore,
};

/// Services shared by HTTP handlers and the worker pool.
#[derive(Clone)]
pub struct AppServices {
    pub dispatcher: Arc<OutboundDispatcher>,
    pub reconciler: Arc<MessageReconciler>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub orders: Arc<OrderService>,
    pub snapshots: Arc<SnapshotStore>,
}

impl AppServices {
    pub fn build(
        db: Arc<DatabaseConnection>,
        config: &config::AppConfig,
        queue: Arc<dyn message_queue::MessageQueue>,
        event_sender: events::EventSender,
    ) -> Result<Self, ServiceError> {
        let mapper = ExternalIdMapper::new(config.provider.id_prefix.clone());
        let dispatcher = Arc::new(OutboundDispatcher::new(config.provider.clone(), mapper)?);
        let timezone = config.provider.timezone();

        Ok(Self {
            reconciler: Arc::new(MessageReconciler::new(
                db.clone(),
                &config.provider,
                event_sender.clone(),
            )),
            purchase_orders: Arc::new(PurchaseOrderService::new(
                db.clone(),
                dispatcher.clone(),
                queue.clone(),
                event_sender.clone(),
                timezone,
            )),
            orders: Arc::new(OrderService::new(
                db.clone(),
                dispatcher.clone(),
                queue,
                event_sender,
                timezone,
            )),
            snapshots: Arc::new(SnapshotStore::new(db)),
            dispatcher,
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub queue: Arc<dyn message_queue::MessageQueue>,
    pub services: AppServices,
}

/// Routes exposed by this service: the provider webhook plus status and
/// health endpoints. Everything else in the platform lives elsewhere.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .route(
            "/logistics/:provider_name/webhook",
            post(handlers::webhook::provider_webhook),
        )
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "giftflow-logistics",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
