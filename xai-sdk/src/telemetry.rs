//! Process-level tracing setup.
//!
//! [`init`] installs a `tracing-subscriber` registry and, when an
//! [`OtlpConfig`] is given, an OTLP span exporter registered as the global
//! tracer provider. Chat sessions emit their spans on that provider.
//!
//! ```rust,no_run
//! use xai_sdk::telemetry::{self, OtlpConfig, OtlpTransport};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = OtlpConfig::new("localhost:4317")
//!     .with_transport(OtlpTransport::Grpc)
//!     .with_insecure();
//! let _guard = telemetry::init(Some(&config), "info,xai_sdk=debug")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{anyhow, bail, Context};
use indexmap::IndexMap;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{
    Compression, SpanExporter, WithExportConfig, WithHttpConfig, WithTonicConfig,
};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use serde::Deserialize;
use tonic::metadata::{MetadataKey, MetadataMap, MetadataValue};
use xai_sdk_chat::telemetry::TRACER_NAME;
use xai_sdk_core::{SDK_LANGUAGE, SDK_VERSION};

/// Service name reported when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "xai-sdk-rust";

/// Path appended to HTTP endpoints given without one.
const HTTP_TRACES_PATH: &str = "/v1/traces";

/// OTLP wire transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpTransport {
    /// OTLP over HTTP with protobuf bodies.
    #[default]
    Http,
    /// OTLP over gRPC.
    Grpc,
}

/// Export compression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpCompression {
    /// Uncompressed.
    #[default]
    None,
    /// Gzip. Only applied on the gRPC transport.
    Gzip,
}

/// Where and how to export spans.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OtlpConfig {
    /// Collector address, with or without a scheme. Required.
    pub endpoint: String,
    /// Headers (HTTP) or metadata (gRPC) sent with every export.
    pub headers: IndexMap<String, String>,
    /// Export over plaintext.
    pub insecure: bool,
    /// Wire transport.
    pub transport: OtlpTransport,
    /// Resource attributes, merged over the defaults.
    pub resource_attributes: IndexMap<String, String>,
    /// Export compression.
    pub compression: OtlpCompression,
    /// `service.name`; defaults to [`DEFAULT_SERVICE_NAME`].
    pub service_name: Option<String>,
}

impl OtlpConfig {
    /// Export to `endpoint` with default settings.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Add an export header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Export over plaintext.
    #[must_use]
    pub fn with_insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    /// Set the transport.
    #[must_use]
    pub fn with_transport(mut self, transport: OtlpTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Add a resource attribute.
    #[must_use]
    pub fn with_resource_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.resource_attributes.insert(key.into(), value.into());
        self
    }

    /// Set the compression.
    #[must_use]
    pub fn with_compression(mut self, compression: OtlpCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Set `service.name`.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Check the config can be turned into an exporter.
    ///
    /// # Errors
    ///
    /// Fails on an empty endpoint, or on headers that are not valid gRPC
    /// metadata when the transport is gRPC.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.endpoint.trim().is_empty() {
            bail!("OTLP endpoint is required");
        }
        if self.transport == OtlpTransport::Grpc {
            grpc_metadata(&self.headers)?;
        }
        Ok(())
    }

    /// The URL the exporter sends to.
    ///
    /// Missing schemes follow `insecure`; HTTP endpoints without a path get
    /// the standard traces path.
    pub fn export_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        let url = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            let scheme = if self.insecure { "http" } else { "https" };
            format!("{scheme}://{endpoint}")
        };

        match self.transport {
            OtlpTransport::Grpc => url,
            OtlpTransport::Http => {
                let has_path = url
                    .split_once("://")
                    .is_some_and(|(_, rest)| rest.contains('/'));
                if has_path {
                    url
                } else {
                    format!("{url}{HTTP_TRACES_PATH}")
                }
            }
        }
    }
}

/// Keeps the tracer provider alive; flushes and shuts it down on drop.
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported.
    pub fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Export buffered spans now.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to flush.
    pub fn force_flush(&self) -> anyhow::Result<()> {
        if let Some(provider) = &self.tracer_provider {
            provider
                .force_flush()
                .map_err(|e| anyhow!("failed to flush spans: {e}"))?;
        }
        Ok(())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shutdown tracer provider: {e}");
            }
        }
    }
}

/// Install the global subscriber and, with `config`, the OTLP exporter.
///
/// `log_filter` is an `EnvFilter` directive; invalid directives fall back to
/// `info`. Hold the returned guard for the life of the process.
///
/// # Errors
///
/// Returns an error if the config is invalid or the exporter cannot be built.
pub fn init(config: Option<&OtlpConfig>, log_filter: &str) -> anyhow::Result<TelemetryGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let mut guard = TelemetryGuard::default();

    match config {
        Some(config) => {
            let provider = init_tracer_provider(config)?;
            let tracer = provider.tracer(TRACER_NAME);
            global::set_tracer_provider(provider.clone());
            guard.tracer_provider = Some(provider);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
    }

    Ok(guard)
}

/// Build a batch-exporting tracer provider without installing it.
///
/// # Errors
///
/// Returns an error if the config is invalid or the exporter cannot be built.
pub fn init_tracer_provider(config: &OtlpConfig) -> anyhow::Result<SdkTracerProvider> {
    config.validate()?;
    let exporter = build_span_exporter(config)?;

    Ok(SdkTracerProvider::builder()
        .with_resource(build_resource(config))
        .with_batch_exporter(exporter)
        .build())
}

/// The exported resource: defaults, then configured attributes on top.
pub fn build_resource(config: &OtlpConfig) -> Resource {
    let service_name = config
        .service_name
        .clone()
        .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());

    let mut attrs: IndexMap<String, String> = IndexMap::new();
    attrs.insert("service.name".into(), service_name);
    attrs.insert("service.version".into(), SDK_VERSION.into());
    attrs.insert("telemetry.sdk.language".into(), SDK_LANGUAGE.into());
    for (key, value) in &config.resource_attributes {
        attrs.insert(key.clone(), value.clone());
    }

    Resource::builder()
        .with_attributes(attrs.into_iter().map(|(k, v)| KeyValue::new(k, v)))
        .build()
}

fn build_span_exporter(config: &OtlpConfig) -> anyhow::Result<SpanExporter> {
    let url = config.export_url();

    let exporter = match config.transport {
        OtlpTransport::Grpc => {
            let mut builder = SpanExporter::builder()
                .with_tonic()
                .with_endpoint(url)
                .with_metadata(grpc_metadata(&config.headers)?);
            if config.compression == OtlpCompression::Gzip {
                builder = builder.with_compression(Compression::Gzip);
            }
            builder
                .build()
                .map_err(|e| anyhow!("failed to build gRPC span exporter: {e}"))?
        }
        OtlpTransport::Http => SpanExporter::builder()
            .with_http()
            .with_endpoint(url)
            .with_headers(config.headers.clone().into_iter().collect())
            .build()
            .map_err(|e| anyhow!("failed to build HTTP span exporter: {e}"))?,
    };

    Ok(exporter)
}

fn grpc_metadata(headers: &IndexMap<String, String>) -> anyhow::Result<MetadataMap> {
    let mut metadata = MetadataMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = MetadataKey::from_bytes(key.to_ascii_lowercase().as_bytes())
            .map_err(|e| anyhow!("invalid OTLP header name {key:?}: {e}"))?;
        let value = MetadataValue::try_from(value.as_str())
            .map_err(|e| anyhow!("invalid OTLP header value for {key:?}: {e}"))?;
        metadata.insert(name, value);
    }
    Ok(metadata)
}
