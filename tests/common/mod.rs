use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::Value;
use tower::ServiceExt;

use giftflow_logistics::{
    config::{AppConfig, ProviderConfig},
    db,
    entities::{
        employee_group, order, order_line, product, product_bundle_item, purchase_order,
        purchase_order_line, raw_message,
    },
    events::{self, EventSender},
    message_queue::{InMemoryMessageQueue, Job, MessageQueue, LOGISTICS_TOPIC},
    worker::JobRunner,
    AppServices, AppState,
};

pub const WEBHOOK_TOKEN: &str = "401f7ac837da42b97f613d78";

/// Test harness: app state backed by a throwaway sqlite database, an
/// in-memory queue, and a router identical to the production one.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub runner: JobRunner,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_provider_urls("http://127.0.0.1:9/inbound", "http://127.0.0.1:9/outbound")
            .await
    }

    /// Points the dispatcher at the given provider endpoints (a wiremock
    /// server in dispatch tests).
    pub async fn with_provider_urls(inbound_url: &str, outbound_url: &str) -> Self {
        let tmp = tempfile::tempdir().expect("temp dir");
        let db_path = tmp.path().join("giftflow_test.db");

        let mut webhook_tokens = HashMap::new();
        webhook_tokens.insert(WEBHOOK_TOKEN.to_string(), "pickandpack".to_string());
        webhook_tokens.insert("other-token".to_string(), "otherprov".to_string());

        let cfg = AppConfig {
            database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
            host: "127.0.0.1".to_string(),
            port: 18_080,
            environment: "test".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            auto_migrate: true,
            db_max_connections: 1,
            db_min_connections: 1,
            db_connect_timeout_secs: 5,
            worker_count: 1,
            queue_max_retries: 2,
            queue_backoff_secs: 1,
            provider: ProviderConfig {
                name: "pickandpack".to_string(),
                inbound_url: inbound_url.to_string(),
                outbound_url: outbound_url.to_string(),
                consignee: "GFL".to_string(),
                id_prefix: "7".to_string(),
                timezone_name: "UTC".to_string(),
                http_timeout_secs: 5,
                verbose: false,
                webhook_tokens,
            },
        };

        let pool = db::establish_connection(&cfg).await.expect("db connection");
        db::run_migrations(&pool).await.expect("migrations");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = tokio::sync::mpsc::channel(1024);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let queue: Arc<dyn MessageQueue> = Arc::new(InMemoryMessageQueue::new());
        let services = AppServices::build(db.clone(), &cfg, queue.clone(), event_sender.clone())
            .expect("services");

        let runner = JobRunner {
            reconciler: services.reconciler.clone(),
            purchase_orders: services.purchase_orders.clone(),
            orders: services.orders.clone(),
        };

        let state = AppState {
            db,
            config: cfg,
            event_sender,
            queue,
            services,
        };
        let router = giftflow_logistics::api_routes().with_state(state.clone());

        Self {
            state,
            router,
            runner,
            _event_task: event_task,
            _tmp: tmp,
        }
    }

    /// Posts a provider webhook request, optionally authenticated.
    #[allow(dead_code)]
    pub async fn post_webhook(
        &self,
        provider: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/logistics/{provider}/webhook"))
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body.to_string())).expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    /// Drains every queued job to completion, failing the test on the first
    /// job error.
    #[allow(dead_code)]
    pub async fn run_jobs(&self) -> usize {
        let mut processed = 0;
        while let Some(message) = self
            .state
            .queue
            .subscribe(LOGISTICS_TOPIC)
            .await
            .expect("queue poll")
        {
            let job: Job = serde_json::from_value(message.payload).expect("job payload");
            self.runner.run(&job).await.expect("job should succeed");
            processed += 1;
        }
        processed
    }
}

#[allow(dead_code)]
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[allow(dead_code)]
pub async fn assert_status(response: Response, expected: StatusCode) -> Value {
    assert_eq!(response.status(), expected);
    response_json(response).await
}

// Seed helpers. All of them write through the entities the services read.

#[allow(dead_code)]
pub async fn create_product(app: &TestApp, sku: &str, kind: &str) -> product::Model {
    let now = Utc::now();
    product::ActiveModel {
        sku: Set(sku.to_string()),
        name: Set(format!("product {sku} name")),
        reference: Set(Some(format!("ref-{sku}"))),
        kind: Set(kind.to_string()),
        stock_snapshot_line_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert product")
}

#[allow(dead_code)]
pub async fn create_bundle_item(
    app: &TestApp,
    bundle: &product::Model,
    constituent: &product::Model,
    quantity: i32,
) -> product_bundle_item::Model {
    product_bundle_item::ActiveModel {
        bundle_id: Set(bundle.id),
        product_id: Set(constituent.id),
        quantity: Set(quantity),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert bundle item")
}

#[allow(dead_code)]
pub async fn create_purchase_order(
    app: &TestApp,
    status: &str,
    logistics_center_id: Option<&str>,
) -> purchase_order::Model {
    let now = Utc::now();
    purchase_order::ActiveModel {
        supplier_name: Set("Test supplier".to_string()),
        status: Set(status.to_string()),
        notes: Set(None),
        logistics_center_id: Set(logistics_center_id.map(str::to_string)),
        logistics_center_status: Set(None),
        sent_to_logistics_center_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert purchase order")
}

#[allow(dead_code)]
pub async fn create_purchase_order_line(
    app: &TestApp,
    purchase_order: &purchase_order::Model,
    sku: &str,
    quantity_ordered: i32,
) -> purchase_order_line::Model {
    purchase_order_line::ActiveModel {
        purchase_order_id: Set(purchase_order.id),
        product_sku: Set(sku.to_string()),
        quantity_ordered: Set(quantity_ordered),
        quantity_sent_to_logistics_center: Set(0),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert purchase order line")
}

#[allow(dead_code)]
pub async fn create_home_group(app: &TestApp) -> employee_group::Model {
    employee_group::ActiveModel {
        name: Set("Test employee group".to_string()),
        delivery_location: Set("TO_HOME".to_string()),
        office_street: Set(None),
        office_street_number: Set(None),
        office_apartment_number: Set(None),
        office_city: Set(None),
        organization_name: Set(None),
        manager_full_name: Set(None),
        manager_phone_number: Set(None),
        manager_email: Set(None),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert employee group")
}

#[allow(dead_code)]
pub async fn create_office_group(app: &TestApp) -> employee_group::Model {
    employee_group::ActiveModel {
        name: Set("Office group".to_string()),
        delivery_location: Set("TO_OFFICE".to_string()),
        office_street: Set(Some("Herzl".to_string())),
        office_street_number: Set(Some("12".to_string())),
        office_apartment_number: Set(Some("3".to_string())),
        office_city: Set(Some("Tel Aviv".to_string())),
        organization_name: Set(Some("Test organization".to_string())),
        manager_full_name: Set(Some("Test manager".to_string())),
        manager_phone_number: Set(Some("0500000009".to_string())),
        manager_email: Set(Some("manager@test.test".to_string())),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert employee group")
}

#[allow(dead_code)]
pub async fn create_order(
    app: &TestApp,
    group: &employee_group::Model,
    order_number: &str,
    status: &str,
    logistics_center_id: Option<&str>,
) -> order::Model {
    let now = Utc::now();
    order::ActiveModel {
        order_number: Set(order_number.to_string()),
        employee_group_id: Set(group.id),
        status: Set(status.to_string()),
        full_name: Set("Test employee".to_string()),
        phone_number: Set(Some("0500000000".to_string())),
        additional_phone_number: Set(None),
        email: Set(Some("employee@test.test".to_string())),
        delivery_street: Set(Some("Allenby".to_string())),
        delivery_street_number: Set(Some("5".to_string())),
        delivery_apartment_number: Set(Some("7".to_string())),
        delivery_city: Set(Some("Tel Aviv".to_string())),
        delivery_additional_details: Set(None),
        logistics_center_id: Set(logistics_center_id.map(str::to_string)),
        logistics_center_status: Set(None),
        logistics_center_shipping_number: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert order")
}

#[allow(dead_code)]
pub async fn create_order_line(
    app: &TestApp,
    order: &order::Model,
    product: &product::Model,
    quantity: i32,
) -> order_line::Model {
    order_line::ActiveModel {
        order_id: Set(order.id),
        product_id: Set(product.id),
        quantity: Set(quantity),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert order line")
}

/// Persists a raw provider message the way the webhook ingress does.
#[allow(dead_code)]
pub async fn insert_raw_message(
    app: &TestApp,
    message_type: raw_message::MessageType,
    data: &Value,
    received_at: DateTime<Utc>,
) -> raw_message::Model {
    raw_message::ActiveModel {
        center: Set("pickandpack".to_string()),
        message_type: Set(message_type.to_string()),
        raw_body: Set(serde_json::json!({ "data": data }).to_string()),
        received_at: Set(received_at),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert raw message")
}
