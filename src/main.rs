use std::{net::SocketAddr, sync::Arc, time::Duration};

use tokio::{signal, sync::mpsc};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use giftflow_logistics as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(&cfg.log_level, cfg.log_json);

    let db_pool = api::db::establish_connection(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db = Arc::new(db_pool);

    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    let queue: Arc<dyn api::message_queue::MessageQueue> =
        Arc::new(api::message_queue::InMemoryMessageQueue::new());

    let services = api::AppServices::build(db.clone(), &cfg, queue.clone(), event_sender.clone())?;

    let runner = api::worker::JobRunner {
        reconciler: services.reconciler.clone(),
        purchase_orders: services.purchase_orders.clone(),
        orders: services.orders.clone(),
    };
    let _workers = api::worker::spawn_workers(
        queue.clone(),
        runner,
        cfg.worker_count,
        cfg.queue_max_retries,
        Duration::from_secs(cfg.queue_backoff_secs),
    );
    info!("started {} logistics workers", cfg.worker_count);

    let state = api::AppState {
        db,
        config: cfg.clone(),
        event_sender,
        queue,
        services,
    };

    let app = api::api_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::new(cfg.host.parse()?, cfg.port);
    info!("giftflow-logistics listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
