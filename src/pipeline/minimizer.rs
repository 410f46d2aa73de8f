use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, Method};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{CorrelatedRequest, HeaderEntry, MinimizedHeaderSet};

/// Original statuses worth minimizing. Anything else is skipped outright
/// and never appears in the output.
const MINIMIZABLE_STATUSES: [u16; 2] = [200, 204];

const DEFAULT_ACCEPT: &str = "*/*";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Greedy live-probing search for the smallest header set that still
/// reproduces the recorded response.
///
/// Removal is cumulative: every verdict is taken against the current
/// working set, not independently against the baseline. That keeps the
/// search at O(n) round trips but gives up exact minimality when headers
/// have interdependent necessity, which is the right trade when each test
/// hits a live third-party server. The comparison oracle is strict status
/// plus exact body equality, so server nondeterminism (timestamps, nonces)
/// makes headers get kept rather than wrongly dropped.
pub struct HeaderMinimizer {
    probe_timeout: Duration,
    probe_delay: Duration,
    concurrency: usize,
}

impl Default for HeaderMinimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderMinimizer {
    pub fn new() -> Self {
        Self {
            probe_timeout: Duration::from_secs(30),
            probe_delay: Duration::from_millis(100),
            concurrency: 4,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Pause between consecutive probes of one endpoint. A rate-limiting
    /// courtesy, not a correctness requirement.
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Minimizes every distinct (base URL, method) pair whose original
    /// status was successful. Duplicate pairs are skipped before any probe
    /// is sent. Pairs are probed concurrently; probing within one pair is
    /// strictly sequential because each removal depends on the last.
    pub async fn minimize_all(&self, requests: &[CorrelatedRequest]) -> Vec<MinimizedHeaderSet> {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut jobs: Vec<ProbeJob> = Vec::new();

        for request in requests {
            if !MINIMIZABLE_STATUSES.contains(&request.status_code) {
                debug!(
                    "skipping {} {} (original status {})",
                    request.method, request.url, request.status_code
                );
                continue;
            }
            if !seen.insert((request.url.clone(), request.method.clone())) {
                debug!(
                    "already minimizing {} {}, skipping duplicate",
                    request.method, request.url
                );
                continue;
            }
            jobs.push(ProbeJob::from_request(request));
        }

        info!("minimizing headers for {} request(s)", jobs.len());

        stream::iter(jobs)
            .map(|job| self.minimize_one(job))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn minimize_one(&self, job: ProbeJob) -> MinimizedHeaderSet {
        info!(
            "probing {} {} starting from {} header(s)",
            job.method,
            job.url,
            job.headers.len()
        );

        let necessary_headers = match self.shrink(&job).await {
            Ok(minimal) => {
                info!(
                    "finished {} {} with {} necessary header(s)",
                    job.method,
                    job.url,
                    minimal.len()
                );
                minimal
            }
            Err(e) => {
                // The baseline could not be verified, so nothing can be
                // safely removed.
                warn!(
                    "baseline probe failed for {} {}: {e}; keeping the full header set",
                    job.method, job.url
                );
                to_map(&job.headers)
            }
        };

        MinimizedHeaderSet {
            api_endpoint: job.url,
            method: job.method,
            necessary_headers,
        }
    }

    /// Runs the greedy removal loop. Any error before the first candidate
    /// verdict (client construction, method parse, baseline probe) bubbles
    /// up and triggers the full-set fallback in the caller.
    async fn shrink(&self, job: &ProbeJob) -> Result<BTreeMap<String, String>> {
        let client = Client::builder()
            .timeout(self.probe_timeout)
            .build()
            .map_err(|e| Error::ProbeTransport(e.to_string()))?;
        let method: Method = job
            .method
            .to_uppercase()
            .parse()
            .map_err(|_| Error::ProbeTransport(format!("invalid method {}", job.method)))?;

        let accept = header_value(&job.headers, "accept")
            .unwrap_or(DEFAULT_ACCEPT)
            .to_string();
        let user_agent = header_value(&job.headers, "user-agent")
            .unwrap_or(DEFAULT_USER_AGENT)
            .to_string();

        let baseline = self.probe(&client, &method, &job.url, &job.headers).await?;
        debug!(
            "baseline for {} {}: status {}, body {} byte(s)",
            job.method,
            job.url,
            baseline.status,
            baseline.body.as_deref().map_or(0, str::len)
        );

        let mut working = job.headers.clone();
        for candidate in &job.headers {
            if candidate.name.eq_ignore_ascii_case("accept")
                || candidate.name.eq_ignore_ascii_case("user-agent")
            {
                debug!("skipping required header {}", candidate.name);
                continue;
            }

            let trial: Vec<HeaderEntry> = working
                .iter()
                .filter(|h| h.name != candidate.name)
                .cloned()
                .collect();

            match self.probe(&client, &method, &job.url, &trial).await {
                Ok(response)
                    if response.status == baseline.status && response.body == baseline.body =>
                {
                    debug!("response unchanged without {}, dropping it", candidate.name);
                    working = trial;
                }
                Ok(response) => {
                    debug!(
                        "response changed without {} (status {}), keeping it",
                        candidate.name, response.status
                    );
                }
                Err(e) => {
                    warn!("probe without {} failed: {e}; keeping it", candidate.name);
                }
            }

            tokio::time::sleep(self.probe_delay).await;
        }

        let mut minimal = to_map(&working);
        if !working.iter().any(|h| h.name.eq_ignore_ascii_case("accept")) {
            minimal.insert("accept".to_string(), accept);
        }
        if !working
            .iter()
            .any(|h| h.name.eq_ignore_ascii_case("user-agent"))
        {
            minimal.insert("user-agent".to_string(), user_agent);
        }

        Ok(minimal)
    }

    async fn probe(
        &self,
        client: &Client,
        method: &Method,
        url: &str,
        headers: &[HeaderEntry],
    ) -> Result<ProbeResponse> {
        let mut request = client.request(method.clone(), url);
        for header in headers {
            request = request.header(&header.name, &header.value);
        }
        if [Method::POST, Method::PUT, Method::PATCH].contains(method) {
            request = request.body("{}");
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::ProbeTransport(e.to_string()))?;

        let status = response.status().as_u16();
        // Best effort: a body that cannot be decoded as text never fails
        // the probe.
        let body = response.text().await.ok();

        Ok(ProbeResponse { status, body })
    }
}

/// One minimization session: effective URL, method and the candidate
/// headers with pseudo-headers already stripped.
struct ProbeJob {
    url: String,
    method: String,
    headers: Vec<HeaderEntry>,
}

impl ProbeJob {
    fn from_request(request: &CorrelatedRequest) -> Self {
        // HTTP/2 captures carry the query string only inside the `:path`
        // pseudo-header; splice it back onto the base URL.
        let url = match request.header(":path").and_then(|p| p.split_once('?')) {
            Some((_, query)) => format!("{}?{}", request.url, query),
            None => request.url.clone(),
        };
        let headers = request
            .headers
            .iter()
            .filter(|h| !h.name.starts_with(':'))
            .cloned()
            .collect();

        Self {
            url,
            method: request.method.clone(),
            headers,
        }
    }
}

struct ProbeResponse {
    status: u16,
    body: Option<String>,
}

fn header_value<'a>(headers: &'a [HeaderEntry], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

fn to_map(headers: &[HeaderEntry]) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|h| (h.name.clone(), h.value.clone()))
        .collect()
}
