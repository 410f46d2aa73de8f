use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EndpointAnalysis, EndpointGroup};

/// Interest oracle boundary: decides which observed endpoints are worth
/// documenting and why.
///
/// The pipeline hands over one bounded batch of endpoint descriptors at a
/// time and treats the verdicts as opaque input, so the core carries no
/// compile-time dependency on any particular model provider.
#[async_trait]
pub trait EndpointClassifier: Send + Sync {
    async fn classify(&self, endpoints: &[EndpointGroup]) -> Result<Vec<EndpointAnalysis>>;
}
