use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostelcore::config::Config;
use hostelcore::middleware::RequestId;
use hostelcore::modules::{health, periods, reports};
use hostelcore::store::{LedgerStore, MySqlLedgerStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostelcore=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Hostelcore period and ledger service");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config.database.create_pool().await?;

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // Apply pending schema migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Wire the ledger store and the services on top of it
    let store: Arc<dyn LedgerStore> = Arc::new(MySqlLedgerStore::new(db_pool.clone()));
    let period_service = Arc::new(periods::PeriodService::new(store.clone()));
    let report_service = Arc::new(reports::ReportService::new(store));

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestId)
            // The dashboard frontend is served from another origin;
            // auth/session handling lives outside this service.
            .wrap(Cors::permissive())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(period_service.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .configure(health::controllers::health_controller::configure)
            .service(
                web::scope("/api")
                    .configure(reports::controllers::report_controller::configure)
                    .configure(periods::controllers::period_controller::configure),
            )
            .route("/", web::get().to(index))
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "Hostelcore period and ledger service",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
