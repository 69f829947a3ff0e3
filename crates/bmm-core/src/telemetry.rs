//! Telemetry module for OpenTelemetry distributed tracing.
//!
//! DAO calls open `tracing` spans; this module installs the subscriber that
//! prints them and, when an OTLP endpoint is configured, exports them.

#[cfg(feature = "telemetry")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "telemetry")]
use opentelemetry::KeyValue;
#[cfg(feature = "telemetry")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "telemetry")]
use opentelemetry_sdk::{
    runtime,
    trace::{RandomIdGenerator, Sampler},
    Resource,
};
#[cfg(feature = "telemetry")]
use opentelemetry_semantic_conventions::resource::SERVICE_NAME;
#[cfg(feature = "telemetry")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::BmmResult;
use serde::{Deserialize, Serialize};

#[cfg(feature = "telemetry")]
const DEFAULT_FILTER: &str = "info,bmm_db=debug,sqlx=warn";

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Whether OpenTelemetry export is enabled.
    #[serde(default)]
    pub enabled: bool,

    /// Service name for tracing.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// OTLP endpoint URL (e.g., "http://localhost:4317").
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// Sampling ratio (0.0 to 1.0).
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,

    /// Whether to enable console output.
    #[serde(default = "default_console_output")]
    pub console_output: bool,

    /// Emit console output as JSON lines instead of the pretty format.
    #[serde(default)]
    pub json_output: bool,
}

fn default_service_name() -> String {
    "bmm-db".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

fn default_console_output() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: default_service_name(),
            otlp_endpoint: None,
            sampling_ratio: default_sampling_ratio(),
            console_output: default_console_output(),
            json_output: false,
        }
    }
}

impl TelemetryConfig {
    /// Clamps the sampling ratio into `[0.0, 1.0]`.
    #[must_use]
    pub fn effective_sampling_ratio(&self) -> f64 {
        self.sampling_ratio.clamp(0.0, 1.0)
    }
}

/// Initialize telemetry with the given configuration.
///
/// This sets up:
/// - OpenTelemetry tracer with OTLP exporter (if endpoint configured)
/// - tracing subscriber with OpenTelemetry layer
/// - Console output layer, pretty or JSON (if enabled)
#[cfg(feature = "telemetry")]
pub fn init_telemetry(config: &TelemetryConfig) -> BmmResult<()> {
    if !config.enabled {
        init_basic_tracing(config)?;
        return Ok(());
    }

    let ratio = config.effective_sampling_ratio();
    let sampler = if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(ratio)
    };

    let resource = Resource::new(vec![KeyValue::new(
        SERVICE_NAME,
        config.service_name.clone(),
    )]);

    let tracer_provider = if let Some(endpoint) = &config.otlp_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| {
                crate::BmmError::Configuration(format!("Failed to create OTLP exporter: {}", e))
            })?;

        opentelemetry_sdk::trace::TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_sampler(sampler)
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource)
            .build()
    } else {
        opentelemetry_sdk::trace::TracerProvider::builder()
            .with_sampler(sampler)
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource)
            .build()
    };

    let tracer = tracer_provider.tracer("bmm-db");
    opentelemetry::global::set_tracer_provider(tracer_provider);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let pretty = (config.console_output && !config.json_output)
        .then(|| tracing_subscriber::fmt::layer().with_target(true));
    let json = (config.console_output && config.json_output)
        .then(|| tracing_subscriber::fmt::layer().json().with_current_span(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()
        .map_err(|e| crate::BmmError::Configuration(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        sampling_ratio = %ratio,
        otlp_endpoint = ?config.otlp_endpoint,
        "Telemetry initialized"
    );

    Ok(())
}

/// Initialize basic tracing without OpenTelemetry.
#[cfg(feature = "telemetry")]
fn init_basic_tracing(config: &TelemetryConfig) -> BmmResult<()> {
    if !config.console_output {
        return Ok(());
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let pretty = (!config.json_output).then(|| tracing_subscriber::fmt::layer().with_target(true));
    let json = config
        .json_output
        .then(|| tracing_subscriber::fmt::layer().json().with_current_span(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
        .map_err(|e| crate::BmmError::Configuration(format!("Failed to install subscriber: {}", e)))?;

    Ok(())
}

/// Shutdown telemetry, flushing any pending spans.
#[cfg(feature = "telemetry")]
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
    tracing::info!("Telemetry shutdown complete");
}

/// Placeholder for when telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn init_telemetry(_config: &TelemetryConfig) -> BmmResult<()> {
    Ok(())
}

/// Placeholder for when telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn shutdown_telemetry() {}
