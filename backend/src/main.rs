use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};

use finandrive_backend::domain::clock::SystemClock;
use finandrive_backend::domain::{GoalService, ShiftService, ShiftTicker};
use finandrive_backend::rest::{self, AppState};
use finandrive_backend::storage::csv::{
    BillRepository, CsvConnection, GoalConfigRepository, HistoryRepository, ShiftRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Setting up storage");
    let connection = CsvConnection::new_default()?;

    // Single-driver deployment: one data directory per driver identity
    let driver_id = std::env::var("FINANDRIVE_DRIVER_ID").unwrap_or_else(|_| "driver".to_string());
    info!("Serving driver {}", driver_id);

    let shift_service = Arc::new(ShiftService::new(
        driver_id.clone(),
        Arc::new(ShiftRepository::new(connection.clone())),
        Arc::new(HistoryRepository::new(connection.clone())),
        Arc::new(SystemClock),
    ));
    let goal_service = GoalService::new(
        driver_id,
        Arc::new(BillRepository::new(connection.clone())),
        Arc::new(GoalConfigRepository::new(connection)),
    );

    // Drive the minute display even when no request is in flight
    let ticker = Arc::new(ShiftTicker::spawn(shift_service.clone()));
    let mut minutes = ticker.subscribe();
    tokio::spawn(async move {
        while minutes.changed().await.is_ok() {
            info!("Shift clock: {} min", *minutes.borrow());
        }
    });

    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let state = AppState::new(shift_service, goal_service, ticker);
    let app = rest::router(state).layer(cors);

    // Start the server
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
