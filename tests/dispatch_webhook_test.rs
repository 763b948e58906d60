mod common;

use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::TestApp;
use giftflow_logistics::entities::{
    order, purchase_order, purchase_order_line, purchase_order_sent_log, raw_message,
};
use giftflow_logistics::errors::ServiceError;
use giftflow_logistics::message_queue::{MessageQueue, LOGISTICS_TOPIC};

async fn app_with_provider(server: &MockServer) -> TestApp {
    TestApp::with_provider_urls(
        &format!("{}/inbound", server.uri()),
        &format!("{}/outbound", server.uri()),
    )
    .await
}

async fn provider_request_body(server: &MockServer, index: usize) -> Value {
    let requests = server.received_requests().await.expect("recorded requests");
    serde_json::from_slice(&requests[index].body).expect("json request body")
}

#[tokio::test]
async fn approved_purchase_order_is_transmitted_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/inbound"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"PRIORITYPOID": "PO-900", "STATUS": "NEW"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = app_with_provider(&server).await;
    common::create_product(&app, "1", "PHYSICAL").await;
    let po = common::create_purchase_order(&app, "PENDING", None).await;
    common::create_purchase_order_line(&app, &po, "1", 1).await;

    let call_time = Utc::now();
    app.state
        .services
        .purchase_orders
        .approve(po.id)
        .await
        .expect("approve");
    assert_eq!(app.run_jobs().await, 1);

    let body = provider_request_body(&server, 0).await;
    let data = &body["DATACOLLECTION"]["DATA"];
    assert_eq!(data["ORDERTYPE"], "PO");
    assert_eq!(data["SOURCECOMPANY"], "Test supplier");
    assert_eq!(data["ORDERID"], format!("GFL7{}", po.id));
    let lines = data["LINES"]["LINE"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["SKU"], "1");
    assert_eq!(lines[0]["QTYORDERED"], 1);

    let refreshed = purchase_order::Entity::find_by_id(po.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.status, "APPROVED");
    assert_eq!(refreshed.logistics_center_id.as_deref(), Some("PO-900"));
    assert_eq!(refreshed.logistics_center_status.as_deref(), Some("NEW"));
    let sent_at = refreshed
        .sent_to_logistics_center_at
        .expect("sent timestamp must be set");
    assert!((sent_at - call_time).num_seconds().abs() < 5);

    let line = purchase_order_line::Entity::find()
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line.quantity_sent_to_logistics_center, 1);

    assert_eq!(
        purchase_order_sent_log::Entity::find()
            .count(&*app.state.db)
            .await
            .unwrap(),
        1
    );

    // approval is one-way: a second approve is rejected, nothing re-queued
    let err = app
        .state
        .services
        .purchase_orders
        .approve(po.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
    assert!(!err.is_retryable());
    assert_eq!(app.run_jobs().await, 0);
}

#[tokio::test]
async fn rejected_transmission_mutates_nothing_and_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/inbound"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = app_with_provider(&server).await;
    common::create_product(&app, "1", "PHYSICAL").await;
    let po = common::create_purchase_order(&app, "APPROVED", None).await;
    common::create_purchase_order_line(&app, &po, "1", 3).await;

    let err = app
        .state
        .services
        .purchase_orders
        .transmit(po.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ExternalServiceError(_)));
    assert!(err.is_retryable());

    let refreshed = purchase_order::Entity::find_by_id(po.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.sent_to_logistics_center_at, None);
    assert_eq!(refreshed.logistics_center_id, None);
    let line = purchase_order_line::Entity::find()
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line.quantity_sent_to_logistics_center, 0);
}

#[tokio::test]
async fn long_sku_fails_approval_validation() {
    let app = TestApp::new().await;
    let long_sku = "x".repeat(23);
    common::create_product(&app, &long_sku, "PHYSICAL").await;
    let po = common::create_purchase_order(&app, "PENDING", None).await;
    common::create_purchase_order_line(&app, &po, &long_sku, 1).await;

    let err = app
        .state
        .services
        .purchase_orders
        .approve(po.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let refreshed = purchase_order::Entity::find_by_id(po.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.status, "PENDING");
}

#[tokio::test]
async fn order_outbound_expands_bundles_and_excludes_non_warehouse_products() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/outbound"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"PRIORITY_ORDER_ID": "LC-9"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = app_with_provider(&server).await;
    let group = common::create_home_group(&app).await;
    let order_row = common::create_order(&app, &group, "ORD-3", "PENDING", None).await;

    let product_1 = common::create_product(&app, "1", "PHYSICAL").await;
    let product_3 = common::create_product(&app, "3", "MONEY").await;
    let product_4 = common::create_product(&app, "4", "PHYSICAL").await;
    let product_5 = common::create_product(&app, "5", "PHYSICAL").await;
    let bundle = common::create_product(&app, "4|1,5|2", "BUNDLE").await;
    common::create_bundle_item(&app, &bundle, &product_4, 1).await;
    common::create_bundle_item(&app, &bundle, &product_5, 2).await;

    common::create_order_line(&app, &order_row, &product_1, 1).await;
    common::create_order_line(&app, &order_row, &product_3, 1).await;
    common::create_order_line(&app, &order_row, &bundle, 2).await;

    app.state
        .services
        .orders
        .transmit(order_row.id)
        .await
        .expect("transmit");

    let body = provider_request_body(&server, 0).await;
    let data = &body["DATACOLLECTION"]["DATA"];
    assert_eq!(data["ORDERID"], "ORD-3");
    assert_eq!(data["ORDERTYPE"], "CUSTOMER");
    assert_eq!(data["BUNDLE"], "4|1,5|2|||4|1,5|2");
    assert_eq!(data["CONTACT"]["STREET1"], "Allenby 5");
    assert_eq!(data["CONTACT"]["STREET2"], "Apt 7");

    // bundled constituents ship, the bundle itself and money products do not
    let lines = data["LINES"]["LINE"].as_array().unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!((lines[0]["SKU"].as_str(), lines[0]["QTYORIGINAL"].as_i64()), (Some("1"), Some(1)));
    assert_eq!((lines[1]["SKU"].as_str(), lines[1]["QTYORIGINAL"].as_i64()), (Some("4"), Some(2)));
    assert_eq!((lines[2]["SKU"].as_str(), lines[2]["QTYORIGINAL"].as_i64()), (Some("5"), Some(4)));

    let refreshed = order::Entity::find_by_id(order_row.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.status, "SENT_TO_LOGISTIC_CENTER");
    assert_eq!(refreshed.logistics_center_id.as_deref(), Some("LC-9"));
}

#[tokio::test]
async fn office_orders_ship_to_the_organization_office() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/outbound"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_with_provider(&server).await;
    let group = common::create_office_group(&app).await;
    let order_row = common::create_order(&app, &group, "ORD-4", "PENDING", None).await;
    let product_1 = common::create_product(&app, "1", "PHYSICAL").await;
    common::create_order_line(&app, &order_row, &product_1, 1).await;

    app.state
        .services
        .orders
        .transmit(order_row.id)
        .await
        .expect("transmit");

    let body = provider_request_body(&server, 0).await;
    let data = &body["DATACOLLECTION"]["DATA"];
    assert_eq!(data["CONTACT"]["STREET1"], "Herzl 12");
    assert_eq!(data["CONTACT"]["CITY"], "Tel Aviv");
    assert_eq!(data["CONTACT"]["CONTACT1NAME"], "Test employee");
    assert_eq!(data["CONTACT"]["CONTACT2NAME"], "Test manager");
    assert_eq!(data["CONTACT"]["CONTACT2EMAIL"], "manager@test.test");
    assert_eq!(data["COMPANYNAME"], "Test organization");
    assert_eq!(data["REFERENCEORD"], format!("GFL7{}", group.id));
    assert_eq!(data["ROUTE"], "CUSTOMER");

    // the ack carried no provider id; the order still transitions
    let refreshed = order::Entity::find_by_id(order_row.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.status, "SENT_TO_LOGISTIC_CENTER");
    assert_eq!(refreshed.logistics_center_id, None);
}

#[tokio::test]
async fn orders_without_warehouse_products_are_skipped() {
    let server = MockServer::start().await;
    // no mock mounted: any request would 404 and the expect(0) below would fail
    let app = app_with_provider(&server).await;
    let group = common::create_home_group(&app).await;
    let order_row = common::create_order(&app, &group, "ORD-5", "PENDING", None).await;
    let money = common::create_product(&app, "3", "MONEY").await;
    let supplier_sent = common::create_product(&app, "2", "SENT_BY_SUPPLIER").await;
    common::create_order_line(&app, &order_row, &money, 1).await;
    common::create_order_line(&app, &order_row, &supplier_sent, 2).await;

    app.state
        .services
        .orders
        .transmit(order_row.id)
        .await
        .expect("skip counts as success");

    assert!(server.received_requests().await.unwrap().is_empty());
    let refreshed = order::Entity::find_by_id(order_row.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.status, "PENDING");
}

#[tokio::test]
async fn non_pending_orders_are_not_sent() {
    let server = MockServer::start().await;
    let app = app_with_provider(&server).await;
    let group = common::create_home_group(&app).await;
    let order_row = common::create_order(&app, &group, "ORD-6", "CANCELLED", None).await;

    app.state
        .services
        .orders
        .transmit(order_row.id)
        .await
        .expect("skip counts as success");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn webhook_persists_message_and_enqueues_processing() {
    let app = TestApp::new().await;

    let response = app
        .post_webhook(
            "pickandpack",
            Some(common::WEBHOOK_TOKEN),
            &json!({"type": "orderStatusChange", "data": {"ORDERID": "LC-1", "STATUS": "PICKED"}}),
        )
        .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["success"], true);

    let messages = raw_message::Entity::find().all(&*app.state.db).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_type, "ORDER_STATUS_CHANGE");
    assert_eq!(messages[0].center, "pickandpack");

    let queued = app
        .state
        .queue
        .subscribe(LOGISTICS_TOPIC)
        .await
        .unwrap()
        .expect("a processing job is queued");
    let job: Value = queued.payload;
    assert_eq!(job["kind"], "process_message");
    assert_eq!(job["raw_message_id"], messages[0].id);
}

#[tokio::test]
async fn webhook_rejects_bad_credentials() {
    let app = TestApp::new().await;
    let payload = json!({"type": "snapshot", "data": {}});

    // no token
    let response = app.post_webhook("pickandpack", None, &payload).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // unknown token
    let response = app.post_webhook("pickandpack", Some("wrong"), &payload).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // valid token for a different provider path
    let response = app.post_webhook("pickandpack", Some("other-token"), &payload).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(
        raw_message::Entity::find().count(&*app.state.db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn webhook_rejects_unconfigured_center() {
    let app = TestApp::new().await;
    let response = app
        .post_webhook(
            "otherprov",
            Some("other-token"),
            &json!({"type": "snapshot", "data": {}}),
        )
        .await;
    let body = common::assert_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["code"], "bad_provider");
}

#[tokio::test]
async fn webhook_rejects_unknown_message_type() {
    let app = TestApp::new().await;
    let response = app
        .post_webhook(
            "pickandpack",
            Some(common::WEBHOOK_TOKEN),
            &json!({"type": "somethingElse", "data": {}}),
        )
        .await;
    let body = common::assert_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["code"], "bad_message_type");
    assert_eq!(
        raw_message::Entity::find().count(&*app.state.db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn webhook_to_reconciler_end_to_end() {
    let app = TestApp::new().await;
    let group = common::create_home_group(&app).await;
    let order_row = common::create_order(&app, &group, "ORD-1", "SENT_TO_LOGISTIC_CENTER", Some("LC-1")).await;

    let response = app
        .post_webhook(
            "pickandpack",
            Some(common::WEBHOOK_TOKEN),
            &json!({
                "type": "orderShippingStatusChange",
                "data": {"ORDERID": "LC-1", "SHIPNU": "SHIP-55", "SHIPPING_STATUS": "SHIPPED"},
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.run_jobs().await, 1);

    let refreshed = order::Entity::find_by_id(order_row.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        refreshed.logistics_center_shipping_number.as_deref(),
        Some("SHIP-55")
    );
    assert_eq!(refreshed.logistics_center_status.as_deref(), Some("SHIPPED"));
}
