use std::collections::{BTreeMap, HashMap};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::models::{
    ApiDetectionReport, EndpointAnalysis, EndpointDocumentation, MinimizedHeaderSet,
};

/// Query parameter observed to carry base64-wrapped JSON payloads; decoded
/// transparently for the report.
const ENCODED_PARAM: &str = "d";

/// Joins minimized header sets with the oracle's explanations into the
/// final documentation records.
pub fn assemble(
    minimized: &[MinimizedHeaderSet],
    analyses: &[EndpointAnalysis],
) -> ApiDetectionReport {
    let descriptions: HashMap<&str, &EndpointAnalysis> =
        analyses.iter().map(|a| (a.url.as_str(), a)).collect();

    let endpoints = minimized
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let (base_url, example_params) = split_effective_url(&entry.api_endpoint);

            let (description, usefulness_score) = match descriptions.get(base_url.as_str()) {
                Some(analysis) => (analysis.explanation.clone(), analysis.usefulness_score),
                None => {
                    debug!("no oracle verdict for {base_url}, using placeholder");
                    ("No description available".to_string(), 0)
                }
            };

            let multi_method = minimized
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && strip_query(&other.api_endpoint) == base_url);

            EndpointDocumentation {
                url: base_url,
                description,
                usefulness_score,
                method: entry.method.clone(),
                required_headers: entry.necessary_headers.clone(),
                example_params,
                curl_example: curl_example(&entry.api_endpoint, &entry.necessary_headers),
                notes: multi_method
                    .then(|| "This endpoint was observed with more than one HTTP method".to_string()),
            }
        })
        .collect();

    ApiDetectionReport {
        endpoints,
        generated_at: chrono::Utc::now(),
    }
}

/// Splits an effective URL into its base URL and decoded example
/// parameters (first value wins on repeated names).
fn split_effective_url(effective: &str) -> (String, BTreeMap<String, Value>) {
    let Ok(parsed) = Url::parse(effective) else {
        return (strip_query(effective), BTreeMap::new());
    };

    let mut base = format!(
        "{}://{}",
        parsed.scheme(),
        parsed.host_str().unwrap_or_default()
    );
    if let Some(port) = parsed.port() {
        base.push_str(&format!(":{port}"));
    }
    base.push_str(parsed.path());

    let mut params = BTreeMap::new();
    for (name, value) in parsed.query_pairs() {
        if params.contains_key(name.as_ref()) {
            continue;
        }
        let decoded = if name == ENCODED_PARAM {
            decode_json_param(&value).unwrap_or_else(|_| Value::String(value.to_string()))
        } else {
            Value::String(value.to_string())
        };
        params.insert(name.to_string(), decoded);
    }

    (base, params)
}

fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

/// base64 → UTF-8 → JSON. Callers fall back to the raw string on any
/// failure; a bad payload never propagates.
fn decode_json_param(raw: &str) -> Result<Value> {
    let bytes = BASE64
        .decode(raw)
        .map_err(|e| Error::Decode(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| Error::Decode(e.to_string()))
}

/// Ready-to-run request template: the effective URL plus one header flag
/// per required header.
fn curl_example(effective_url: &str, headers: &BTreeMap<String, String>) -> String {
    let flags: Vec<String> = headers
        .iter()
        .map(|(name, value)| format!("-H '{name}: {value}'"))
        .collect();
    if flags.is_empty() {
        return format!("curl '{effective_url}'");
    }
    format!("curl '{}' \\\n  {}", effective_url, flags.join(" \\\n  "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimized(api_endpoint: &str, method: &str) -> MinimizedHeaderSet {
        MinimizedHeaderSet {
            api_endpoint: api_endpoint.to_string(),
            method: method.to_string(),
            necessary_headers: BTreeMap::from([
                ("accept".to_string(), "*/*".to_string()),
                ("authorization".to_string(), "Bearer X".to_string()),
            ]),
        }
    }

    fn analysis(url: &str, explanation: &str, score: u8) -> EndpointAnalysis {
        EndpointAnalysis {
            url: url.to_string(),
            explanation: explanation.to_string(),
            usefulness_score: score,
        }
    }

    #[test]
    fn joins_descriptions_by_base_url() {
        let report = assemble(
            &[minimized("https://s.test/api/items?page=1", "GET")],
            &[analysis("https://s.test/api/items", "Lists items", 72)],
        );

        assert_eq!(report.endpoints.len(), 1);
        let doc = &report.endpoints[0];
        assert_eq!(doc.url, "https://s.test/api/items");
        assert_eq!(doc.description, "Lists items");
        assert_eq!(doc.usefulness_score, 72);
        assert_eq!(doc.method, "GET");
    }

    #[test]
    fn missing_description_falls_back_to_placeholder() {
        let report = assemble(&[minimized("https://s.test/api/other", "GET")], &[]);

        let doc = &report.endpoints[0];
        assert_eq!(doc.description, "No description available");
        assert_eq!(doc.usefulness_score, 0);
    }

    #[test]
    fn d_parameter_is_decoded_as_base64_json() {
        let payload = BASE64.encode(r#"{"q":"shoes"}"#);
        let url = format!("https://s.test/api/search?d={payload}&q=shoes");

        let report = assemble(&[minimized(&url, "GET")], &[]);

        let params = &report.endpoints[0].example_params;
        assert_eq!(
            params.get("d"),
            Some(&serde_json::json!({"q": "shoes"}))
        );
        // Not named `d`: passed through as the raw string.
        assert_eq!(params.get("q"), Some(&Value::String("shoes".to_string())));
    }

    #[test]
    fn undecodable_d_parameter_falls_back_to_the_raw_string() {
        let report = assemble(
            &[minimized("https://s.test/api/search?d=%%%not-base64", "GET")],
            &[],
        );

        let params = &report.endpoints[0].example_params;
        assert!(matches!(params.get("d"), Some(Value::String(_))));
    }

    #[test]
    fn curl_example_embeds_the_effective_url_and_header_flags() {
        let report = assemble(
            &[minimized("https://s.test/api/items?page=1", "GET")],
            &[],
        );

        let curl = &report.endpoints[0].curl_example;
        assert!(curl.starts_with("curl 'https://s.test/api/items?page=1'"));
        assert!(curl.contains("-H 'authorization: Bearer X'"));
        assert!(curl.contains("-H 'accept: */*'"));
    }

    #[test]
    fn cross_method_note_is_set_when_the_base_url_repeats() {
        let report = assemble(
            &[
                minimized("https://s.test/api/items?page=1", "GET"),
                minimized("https://s.test/api/items", "POST"),
                minimized("https://s.test/api/solo", "GET"),
            ],
            &[],
        );

        assert!(report.endpoints[0].notes.is_some());
        assert!(report.endpoints[1].notes.is_some());
        assert!(report.endpoints[2].notes.is_none());
    }
}
