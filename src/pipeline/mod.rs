pub mod assembler;
pub mod correlator;
pub mod grouper;
pub mod minimizer;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::har::{self, Har, TranscriptSource};
use crate::llm::EndpointClassifier;
use crate::models::{ApiDetectionReport, EndpointAnalysis, EndpointGroup};
use self::minimizer::HeaderMinimizer;

/// Endpoint groups sent to the oracle per call, bounded to respect its
/// payload limits.
const DEFAULT_BATCH_SIZE: usize = 5;

/// Wires the stages together: parse → group → classify → correlate →
/// minimize → assemble. Every intermediate artifact is persisted so a run
/// can be inspected after the fact.
pub struct ApiReconPipeline {
    output_dir: PathBuf,
    classifier: Arc<dyn EndpointClassifier>,
    minimizer: HeaderMinimizer,
    batch_size: usize,
}

impl ApiReconPipeline {
    pub fn new(output_dir: impl Into<PathBuf>, classifier: Arc<dyn EndpointClassifier>) -> Self {
        Self {
            output_dir: output_dir.into(),
            classifier,
            minimizer: HeaderMinimizer::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_minimizer(mut self, minimizer: HeaderMinimizer) -> Self {
        self.minimizer = minimizer;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Obtains a transcript through the source seam, then runs the pipeline
    /// on it.
    pub async fn run_from_source(
        &self,
        source: &dyn TranscriptSource,
        request_type: &str,
    ) -> Result<ApiDetectionReport> {
        let har = source.produce().await?;
        self.run(&har, request_type).await
    }

    pub async fn run(&self, har: &Har, request_type: &str) -> Result<ApiDetectionReport> {
        let started = Instant::now();
        fs::create_dir_all(&self.output_dir)?;

        info!("step 1: flattening transcript entries");
        let exchanges = har::exchanges(har);
        info!("extracted {} exchange(s) from transcript", exchanges.len());

        info!("step 2: grouping {request_type} requests by endpoint");
        let groups = grouper::group_by_endpoint(&exchanges, request_type);
        self.write_artifact("filtered_requests.json", &groups)?;
        info!("grouped into {} endpoint(s)", groups.len());

        info!("step 3: classifying endpoints with the interest oracle");
        let analyses = self.classify_in_batches(&groups).await?;
        self.write_artifact("analyzed_endpoints.json", &analyses)?;
        info!("oracle flagged {} endpoint(s) as interesting", analyses.len());

        info!("step 4: correlating transcript against interesting endpoints");
        let correlated = correlator::correlate(&exchanges, &analyses);
        self.write_artifact("matched_requests.json", &correlated)?;
        info!("correlated {} request(s)", correlated.len());

        info!("step 5: minimizing header sets with live probes");
        let minimized = self.minimizer.minimize_all(&correlated).await;

        let report = assembler::assemble(&minimized, &analyses);
        self.write_artifact("necessary_headers.json", &report)?;

        info!(
            "pipeline completed in {:.2}s with {} documented endpoint(s)",
            started.elapsed().as_secs_f64(),
            report.endpoints.len()
        );
        Ok(report)
    }

    async fn classify_in_batches(
        &self,
        groups: &[EndpointGroup],
    ) -> Result<Vec<EndpointAnalysis>> {
        let mut analyses = Vec::new();
        for batch in groups.chunks(self.batch_size) {
            let verdicts = self.classifier.classify(batch).await?;
            analyses.extend(verdicts);
        }
        Ok(analyses)
    }

    fn write_artifact<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.output_dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}
