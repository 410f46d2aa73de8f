use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::models::{EndpointGroup, RawExchange};

/// Groups exchanges matching `method` by base URL, preserving first-seen
/// endpoint order so oracle batches stay deterministic.
///
/// Grouping is query-string-insensitive: `/a?x=1` and `/a?x=2` land in the
/// same group under `/a`, with their query parameters unioned
/// (last-value-wins on collisions). The sample headers and body come from
/// the first exchange of the group; the full header lists stay untouched on
/// the exchanges themselves.
pub fn group_by_endpoint(exchanges: &[RawExchange], method: &str) -> Vec<EndpointGroup> {
    let mut groups: Vec<EndpointGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for exchange in exchanges
        .iter()
        .filter(|e| e.method.eq_ignore_ascii_case(method))
    {
        let base = exchange.base_url().to_string();
        let idx = *index.entry(base.clone()).or_insert_with(|| {
            debug!("new endpoint group for {base}");
            groups.push(EndpointGroup {
                url: base.clone(),
                methods: Vec::new(),
                params: BTreeMap::new(),
                sample_headers: exchange.sample_headers(),
                sample_post_data: None,
            });
            groups.len() - 1
        });

        let group = &mut groups[idx];
        if !group.methods.contains(&exchange.method) {
            group.methods.push(exchange.method.clone());
        }
        for param in &exchange.query_params {
            group.params.insert(param.name.clone(), param.value.clone());
        }
        if group.sample_post_data.is_none() {
            group.sample_post_data = exchange.post_data.clone();
        }
    }

    groups
}
