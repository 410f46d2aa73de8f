use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{HeaderEntry, RawExchange};

/// HAR 1.2 document, reduced to the fields the pipeline actually reads.
/// Anything else in the recording is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Har {
    pub log: HarLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarLog {
    pub entries: Vec<HarEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarEntry {
    pub request: HarRequest,
    pub response: HarResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
    #[serde(default, rename = "queryString")]
    pub query_string: Vec<HeaderEntry>,
    #[serde(rename = "postData", default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<HarPostData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarResponse {
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarPostData {
    #[serde(default)]
    pub text: Option<String>,
}

/// Parses a raw recording. A document without the `log.entries` list is a
/// malformed transcript and aborts the whole run.
pub fn parse_str(raw: &str) -> Result<Har> {
    serde_json::from_str(raw).map_err(|e| Error::MalformedTranscript(e.to_string()))
}

pub fn parse_file(path: &Path) -> Result<Har> {
    let raw = fs::read_to_string(path)?;
    parse_str(&raw)
}

/// Flattens a parsed transcript into raw exchanges, one per entry, in
/// arrival order.
pub fn exchanges(har: &Har) -> Vec<RawExchange> {
    har.log
        .entries
        .iter()
        .map(|entry| RawExchange {
            url: entry.request.url.clone(),
            method: entry.request.method.clone(),
            headers: entry.request.headers.clone(),
            query_params: entry.request.query_string.clone(),
            post_data: entry
                .request
                .post_data
                .as_ref()
                .and_then(|data| data.text.clone()),
            status_code: entry.response.status,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample_har() -> &'static str {
        r#"{
            "log": {
                "version": "1.2",
                "entries": [
                    {
                        "request": {
                            "method": "GET",
                            "url": "https://shop.example.com/api/items?page=1",
                            "headers": [
                                {"name": ":path", "value": "/api/items?page=1"},
                                {"name": "accept", "value": "*/*"},
                                {"name": "authorization", "value": "Bearer abc"}
                            ],
                            "queryString": [
                                {"name": "page", "value": "1"}
                            ]
                        },
                        "response": {"status": 200}
                    },
                    {
                        "request": {
                            "method": "POST",
                            "url": "https://shop.example.com/api/cart",
                            "headers": [],
                            "queryString": [],
                            "postData": {"mimeType": "application/json", "text": "{\"sku\":7}"}
                        },
                        "response": {"status": 201}
                    }
                ]
            }
        }"#
    }

    #[test]
    fn parses_entries_into_exchanges() {
        let har = parse_str(sample_har()).unwrap();
        let exchanges = exchanges(&har);

        assert_eq!(exchanges.len(), 2);
        assert_eq!(exchanges[0].method, "GET");
        assert_eq!(exchanges[0].url, "https://shop.example.com/api/items?page=1");
        assert_eq!(exchanges[0].base_url(), "https://shop.example.com/api/items");
        assert_eq!(exchanges[0].status_code, 200);
        assert_eq!(exchanges[0].query_params[0].name, "page");
        assert_eq!(exchanges[1].post_data.as_deref(), Some("{\"sku\":7}"));
    }

    #[test]
    fn pseudo_headers_are_retained_on_the_exchange() {
        let har = parse_str(sample_har()).unwrap();
        let exchanges = exchanges(&har);

        assert_eq!(exchanges[0].header(":path"), Some("/api/items?page=1"));
    }

    #[test]
    fn missing_entry_list_is_a_malformed_transcript() {
        let result = parse_str(r#"{"log": {"version": "1.2"}}"#);
        assert!(matches!(result, Err(Error::MalformedTranscript(_))));

        let result = parse_str("not json at all");
        assert!(matches!(result, Err(Error::MalformedTranscript(_))));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let har = parse_str(sample_har()).unwrap();
        let exchanges = exchanges(&har);

        assert_eq!(exchanges[0].header("AUTHORIZATION"), Some("Bearer abc"));
        assert_eq!(exchanges[0].header("x-missing"), None);
    }
}
