use tracing::debug;

use crate::models::{CorrelatedRequest, EndpointAnalysis, RawExchange};

/// Matches transcript exchanges against interesting endpoints by literal
/// URL prefix.
///
/// The first endpoint whose URL prefixes the exchange's base URL wins, so
/// iteration order over the endpoint list is significant on ties. The match
/// is plain string prefixing with no path-boundary awareness: an exchange to
/// `/apiv2` correlates against an endpoint at `/api`. Exchanges matching
/// nothing are dropped silently.
pub fn correlate(
    exchanges: &[RawExchange],
    endpoints: &[EndpointAnalysis],
) -> Vec<CorrelatedRequest> {
    let mut matched = Vec::new();

    for exchange in exchanges {
        let base = exchange.base_url();
        if let Some(endpoint) = endpoints.iter().find(|e| base.starts_with(e.url.as_str())) {
            debug!(
                "correlated {} {} against {}",
                exchange.method, base, endpoint.url
            );
            matched.push(CorrelatedRequest {
                url: base.to_string(),
                method: exchange.method.clone(),
                headers: exchange.headers.clone(),
                status_code: exchange.status_code,
            });
        }
    }

    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeaderEntry;

    fn exchange(url: &str) -> RawExchange {
        RawExchange {
            url: url.to_string(),
            method: "GET".to_string(),
            headers: vec![
                HeaderEntry::new("authorization", "Bearer abc"),
                HeaderEntry::new("x-tracking-id", "noise"),
            ],
            query_params: Vec::new(),
            post_data: None,
            status_code: 200,
        }
    }

    fn endpoint(url: &str) -> EndpointAnalysis {
        EndpointAnalysis {
            url: url.to_string(),
            explanation: "interesting".to_string(),
            usefulness_score: 50,
        }
    }

    #[test]
    fn prefixed_exchanges_correlate_with_full_headers() {
        let matched = correlate(
            &[exchange("https://s.com/api/v2/x?q=1")],
            &[endpoint("https://s.com/api")],
        );

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].url, "https://s.com/api/v2/x");
        assert_eq!(matched[0].status_code, 200);

        // Both header views stay retrievable: the full list for the
        // minimizer and the filtered sample for analysis.
        assert_eq!(matched[0].header("x-tracking-id"), Some("noise"));
        let sample = matched[0].sample_headers();
        assert_eq!(sample.get("authorization").map(String::as_str), Some("Bearer abc"));
        assert!(!sample.contains_key("x-tracking-id"));
    }

    #[test]
    fn matching_is_literal_prefix_without_path_boundaries() {
        // No separator between "api" and "v2"; the literal-prefix rule still
        // correlates it. Documented behavior, surprising or not.
        let matched = correlate(
            &[exchange("https://s.com/apiv2")],
            &[endpoint("https://s.com/api")],
        );

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].url, "https://s.com/apiv2");
    }

    #[test]
    fn first_matching_endpoint_wins() {
        let matched = correlate(
            &[exchange("https://s.com/api/users")],
            &[endpoint("https://s.com/api"), endpoint("https://s.com/api/users")],
        );

        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn unmatched_exchanges_are_dropped_silently() {
        let matched = correlate(
            &[exchange("https://other.com/api")],
            &[endpoint("https://s.com/api")],
        );

        assert!(matched.is_empty());
    }
}
