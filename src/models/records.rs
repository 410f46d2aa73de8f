use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header names kept as a sample for LLM analysis. Everything else is noise
/// at that stage, but the full list stays on the exchange for minimization.
const SAMPLE_HEADER_NAMES: [&str; 2] = ["authorization", "content-type"];

/// A `{name, value}` pair as it appears in HAR header and query lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One recorded request/response pair from the transcript.
///
/// Headers keep their arrival order. Pseudo-headers (`:method`, `:path` and
/// friends) are retained here because the minimizer reads `:path` to rebuild
/// the query string, but they are never sent on a live request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExchange {
    pub url: String,
    pub method: String,
    pub headers: Vec<HeaderEntry>,
    pub query_params: Vec<HeaderEntry>,
    pub post_data: Option<String>,
    pub status_code: u16,
}

impl RawExchange {
    /// URL with the query string stripped.
    pub fn base_url(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// The filtered header sample used for endpoint analysis.
    pub fn sample_headers(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .filter(|h| {
                SAMPLE_HEADER_NAMES
                    .iter()
                    .any(|name| h.name.eq_ignore_ascii_case(name))
            })
            .map(|h| (h.name.clone(), h.value.clone()))
            .collect()
    }
}

/// All observed traffic to one base URL, consolidated into the descriptor
/// shape the interest oracle consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointGroup {
    pub url: String,
    pub methods: Vec<String>,
    pub params: BTreeMap<String, String>,
    pub sample_headers: BTreeMap<String, String>,
    pub sample_post_data: Option<String>,
}

/// Oracle verdict for one endpoint. Opaque input as far as the pipeline is
/// concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointAnalysis {
    pub url: String,
    pub explanation: String,
    pub usefulness_score: u8,
}

/// A transcript exchange whose base URL matched an interesting endpoint.
/// Carries the full unfiltered header list for the minimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<HeaderEntry>,
    pub status_code: u16,
}

impl CorrelatedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// Same filtered view the grouper samples, kept retrievable here too.
    pub fn sample_headers(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .filter(|h| {
                SAMPLE_HEADER_NAMES
                    .iter()
                    .any(|name| h.name.eq_ignore_ascii_case(name))
            })
            .map(|h| (h.name.clone(), h.value.clone()))
            .collect()
    }
}

fn header_value<'a>(headers: &'a [HeaderEntry], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// The smallest header set found for one (effective URL, method) pair that
/// still reproduces the recorded response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimizedHeaderSet {
    pub api_endpoint: String,
    pub method: String,
    pub necessary_headers: BTreeMap<String, String>,
}

/// Final documentation record for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDocumentation {
    pub url: String,
    pub description: String,
    pub usefulness_score: u8,
    pub method: String,
    pub required_headers: BTreeMap<String, String>,
    pub example_params: BTreeMap<String, serde_json::Value>,
    pub curl_example: String,
    pub notes: Option<String>,
}

/// Complete output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDetectionReport {
    pub endpoints: Vec<EndpointDocumentation>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
