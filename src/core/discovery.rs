//! Candidate domain discovery via the search API
//!
//! Paginates in fixed ten-result pages until the unique-hostname set reaches
//! the target or the API runs out of pages. Hostnames are canonicalized
//! (scheme dropped, `www.` prefix stripped) and kept in first-seen order.
//! A request-level failure aborts the whole step; pages already consumed are
//! not retried.

use tracing::{debug, warn};

use crate::core::rate::RateGovernor;
use crate::error::EngineResult;
use crate::traits::SearchApi;
use crate::types::Service;

/// Fixed page size of the external search API.
pub const RESULTS_PER_PAGE: u32 = 10;

/// Extract a canonical hostname from a result link. Invalid URLs yield
/// `None` and are skipped by the caller.
pub fn extract_domain(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Discover up to `target` unique hostnames for a built query, recording one
/// governor usage unit per page request.
pub async fn discover_domains<S: SearchApi>(
    search: &S,
    governor: &RateGovernor,
    query: &str,
    target: usize,
) -> EngineResult<Vec<String>> {
    let mut domains: Vec<String> = Vec::new();
    let max_pages = (target as u32).div_ceil(RESULTS_PER_PAGE);

    for page in 0..max_pages {
        let start_index = page * RESULTS_PER_PAGE + 1;

        let result = search.search(query, start_index).await?;
        governor.record_usage(Service::Search, 1);

        for link in &result.links {
            match extract_domain(link) {
                Some(domain) => {
                    if !domains.contains(&domain) {
                        domains.push(domain);
                    }
                }
                None => warn!(link = %link, "skipping result with unparseable link"),
            }
        }

        if domains.len() >= target {
            break;
        }

        if !result.has_more {
            debug!(pages_fetched = page + 1, "search API exhausted before target");
            break;
        }
    }

    domains.truncate(target);
    Ok(domains)
}
