use std::sync::Arc;

use letterpress_export::DocumentExporter;
use letterpress_orchestrator::DocumentOrchestrator;

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<DocumentOrchestrator>,
    exporter: Arc<DocumentExporter>,
}

impl AppState {
    pub fn new(orchestrator: Arc<DocumentOrchestrator>, exporter: Arc<DocumentExporter>) -> Self {
        Self {
            orchestrator,
            exporter,
        }
    }

    pub fn orchestrator(&self) -> &DocumentOrchestrator {
        &self.orchestrator
    }

    pub fn exporter(&self) -> Arc<DocumentExporter> {
        Arc::clone(&self.exporter)
    }
}
