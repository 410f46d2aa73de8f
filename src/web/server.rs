use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use warp::Filter;

use crate::config::Config;
use crate::har::Har;
use crate::llm::OpenAiClassifier;
use crate::models::EndpointDocumentation;
use crate::pipeline::ApiReconPipeline;

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    har: Har,
    #[serde(default = "default_request_type")]
    request_type: String,
}

fn default_request_type() -> String {
    "GET".to_string()
}

/// Boundary contract: a pass/fail flag plus the endpoints on success, null
/// otherwise. The caller decides how to present it.
#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    success: bool,
    endpoints: Option<Vec<EndpointDocumentation>>,
    error: Option<String>,
}

pub async fn run_server(port: u16, config: Config) -> Result<()> {
    let api_key = config.openai_api_key.clone().unwrap_or_else(|| {
        warn!("OPENAI_API_KEY not set; endpoint classification will fail");
        String::new()
    });
    let classifier = Arc::new(OpenAiClassifier::new(api_key, config.openai_model.clone()));
    let pipeline = Arc::new(ApiReconPipeline::new(config.output_dir.clone(), classifier));

    let pipeline_filter = pipeline.clone();
    let analyze_route = warp::path("analyze")
        .and(warp::post())
        .and(warp::body::json())
        .and_then(move |request: AnalyzeRequest| {
            let pipeline = pipeline_filter.clone();

            async move {
                info!(
                    "analyzing uploaded transcript ({} entries, {} requests)",
                    request.har.log.entries.len(),
                    request.request_type
                );

                let reply = match pipeline.run(&request.har, &request.request_type).await {
                    Ok(report) => AnalyzeResponse {
                        success: true,
                        endpoints: Some(report.endpoints),
                        error: None,
                    },
                    Err(e) => {
                        error!("pipeline failed: {e}");
                        AnalyzeResponse {
                            success: false,
                            endpoints: None,
                            error: Some(e.to_string()),
                        }
                    }
                };

                Ok::<_, warp::Rejection>(warp::reply::json(&reply))
            }
        });

    let health_route = warp::path("health")
        .map(|| warp::reply::json(&serde_json::json!({"status": "healthy"})));

    let routes = analyze_route
        .or(health_route)
        .with(warp::cors().allow_any_origin());

    info!("server running on http://localhost:{port}");
    warp::serve(routes).run(([127, 0, 0, 1], port)).await;

    Ok(())
}
