//! Parking IO API Server
//!
//! REST API over the range sensor service and the LED, gate and bell
//! actuators, plus a Prometheus scrape endpoint.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hardware::{
    Actuators, HardwareContext, HardwareError, PinMap, SensorService, SensorServiceConfig,
    SensorTable,
};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod routes;

pub const ENV_PREFIX: &str = "PARKMON_IO";

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Metrics unavailable: {0}")]
    Metrics(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Metrics(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    pub bind_addr: String,
    pub pins: PinMap,
    pub sensors: SensorServiceConfig,
    /// Use in-memory lines instead of sysfs GPIO, I2C and PWM
    pub mock_hardware: bool,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            pins: PinMap::default(),
            sensors: SensorServiceConfig::default(),
            mock_hardware: false,
        }
    }
}

impl IoConfig {
    /// Defaults, then `path` if given, then `PARKMON_IO_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, ApiError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Latest reading per range sensor
    pub sensors: SensorTable,
    /// Output devices; one command at a time
    pub actuators: Mutex<Actuators>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(sensors: SensorTable, actuators: Actuators) -> Self {
        Self {
            sensors,
            actuators: Mutex::new(actuators),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub type SharedState = Arc<AppState>;

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub sensor_count: usize,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route(
            "/api/v1/sensors/:index/distance",
            get(routes::sensors::get_distance),
        )
        .route("/api/v1/status", get(routes::actuators::get_status))
        .route("/api/v1/led/:index/:action", get(routes::actuators::control_led))
        .route("/api/v1/gate/:action", get(routes::actuators::control_gate))
        .route("/api/v1/bell/:action", get(routes::actuators::control_bell))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        sensor_count: state.sensors.len(),
    })
}

async fn metrics_handler(State(state): State<SharedState>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or_else(|| ApiError::Metrics("no recorder installed".to_string()))
}

/// Apply every sensor sample to the mapped LEDs until the service stops
pub fn spawn_led_follower(
    mut service: SensorService,
    config: SensorServiceConfig,
    state: SharedState,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(sample) = service.next().await {
            gauge!("io_sensor_distance_cm", "sensor" => sample.index.to_string())
                .set(sample.distance_cm.unwrap_or(-1.0));

            let commands = config.led_commands(&sample);
            if commands.is_empty() {
                continue;
            }
            let mut actuators = state.actuators.lock().await;
            for (led, on) in commands {
                if let Err(e) = actuators.set_led(led, on) {
                    warn!("LED {} update failed: {}", led.get(), e);
                }
            }
        }
        info!("Sensor sample stream ended");
    })
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server until Ctrl-C
pub async fn run_server(config: IoConfig) -> Result<(), ApiError> {
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))?;

    let mut hardware = if config.mock_hardware {
        HardwareContext::mock(config.pins.clone())
    } else {
        HardwareContext::sysfs(config.pins.clone())
    };
    let actuators = hardware.actuators()?;
    let service = SensorService::spawn(
        config.sensors.clone(),
        hardware.sensor_pairs()?,
        hardware.clock(),
    );

    let state = Arc::new(AppState::new(service.table(), actuators).with_metrics(metrics));
    let follower = spawn_led_follower(service, config.sensors.clone(), state.clone());

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Starting IO API server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, stopping");
            }
        })
        .await?;

    // The follower owns the service; its drop joins the worker, which
    // releases the sensor lines
    follower.abort();
    let _ = follower.await;
    Ok(())
}
