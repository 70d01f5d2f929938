mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use crate::db::db::DBClient;
use service::{
    bid_service::BidService,
    escrow::HttpEscrowGateway,
    events,
    job_service::JobService,
    milestone_service::MilestoneService,
    notification_service::NotificationService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub job_service: Arc<JobService<DBClient>>,
    pub bid_service: Arc<BidService<DBClient>>,
    pub milestone_service: Arc<MilestoneService<DBClient, HttpEscrowGateway>>,
    pub notification_service: Arc<NotificationService<DBClient>>,
}

impl AppState {
    pub fn new(db_client: DBClient, gateway: HttpEscrowGateway, config: Config) -> Self {
        let db_client = Arc::new(db_client);
        let gateway = Arc::new(gateway);
        let (events_tx, events_rx) = events::channel();

        let job_service = Arc::new(JobService::new(db_client.clone(), events_tx.clone()));
        let bid_service = Arc::new(BidService::new(db_client.clone(), events_tx.clone()));
        let milestone_service = Arc::new(MilestoneService::new(
            db_client.clone(),
            gateway,
            events_tx,
        ));
        let notification_service = Arc::new(NotificationService::new(db_client.clone()));

        // The notification consumer outlives every request; it stops when the
        // last event sender is dropped.
        tokio::spawn(notification_service.clone().run(events_rx));

        Self {
            env: config,
            db_client,
            job_service,
            bid_service,
            milestone_service,
            notification_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            println!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let gateway = match HttpEscrowGateway::new(&config) {
        Ok(gateway) => gateway,
        Err(err) => {
            println!("🔥 Failed to build the escrow client: {:?}", err);
            std::process::exit(1);
        }
    };

    let allowed_origins = vec![
        "http://localhost:5173".parse::<HeaderValue>().unwrap(),
        "http://localhost:8000".parse::<HeaderValue>().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app_state = Arc::new(AppState::new(
        DBClient::new(pool),
        gateway,
        config.clone(),
    ));

    let app = create_router(app_state).layer(cors);

    println!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port))
        .await
        .unwrap();

    axum::serve(listener, app).await.unwrap();
}
