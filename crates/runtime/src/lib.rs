use std::sync::Arc;

use anyhow::{Context, Result};
use letterpress_config::AppConfig;
use letterpress_export::DocumentExporter;
use letterpress_orchestrator::DocumentOrchestrator;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::DEBUG)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Long-lived, read-only services shared by every request.
#[derive(Clone)]
pub struct BackendServices {
    pub orchestrator: Arc<DocumentOrchestrator>,
    pub exporter: Arc<DocumentExporter>,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let orchestrator = Arc::new(
            DocumentOrchestrator::from_config(&config.orchestrator)
                .context("failed to bootstrap orchestrator")?,
        );

        let exporter = DocumentExporter::from_config(&config.export);
        tokio::fs::create_dir_all(exporter.output_dir())
            .await
            .with_context(|| {
                format!(
                    "failed to prepare export directory {}",
                    exporter.output_dir().display()
                )
            })?;

        info!(
            generated_with = orchestrator.source_tag(),
            export_dir = %exporter.output_dir().display(),
            "backend services ready"
        );

        Ok(Self {
            orchestrator,
            exporter: Arc::new(exporter),
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
