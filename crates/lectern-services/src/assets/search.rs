//! Ordered search over a bounded candidate space.

use lectern_core::{ResourceType, StorageClass};
use std::future::Future;

/// Every `(storage class, resource type)` pair in search order: storage class
/// is the outer loop, resource type the inner one.
pub fn storage_candidates() -> Vec<(StorageClass, ResourceType)> {
    StorageClass::ALL
        .iter()
        .flat_map(|class| ResourceType::ALL.iter().map(move |kind| (*class, *kind)))
        .collect()
}

/// Try candidates one at a time and return the first that succeeds.
///
/// The search stops at the first hit. When every candidate fails, the errors are
/// returned in search order.
pub async fn first_match<C, T, E, F, Fut>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: F,
) -> Result<(C, T), Vec<(C, E)>>
where
    C: Clone,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut misses = Vec::new();
    for candidate in candidates {
        match attempt(candidate.clone()).await {
            Ok(found) => return Ok((candidate, found)),
            Err(e) => misses.push((candidate, e)),
        }
    }
    Err(misses)
}
