//! Client filter post-processing for entity lists
//!
//! Only the `_id` allow-list is supported. Other filter keys are accepted and
//! ignored, leaving the candidate list unchanged.

use crate::query::ArgumentValue;
use tracing::debug;

/// Key of the identifier allow-list inside a `filter` argument
pub const ID_FILTER_KEY: &str = "_id";

/// Apply a client `filter` argument to candidate identifiers.
///
/// Candidate order is preserved.
pub fn apply_filter(candidates: Vec<String>, filter: Option<&ArgumentValue>) -> Vec<String> {
    let Some(ArgumentValue::Object(filter)) = filter else {
        return candidates;
    };

    for key in filter.keys().filter(|k| k.as_str() != ID_FILTER_KEY) {
        debug!("filter: ignoring unsupported key {}", key);
    }

    match filter.get(ID_FILTER_KEY) {
        Some(allowed) => {
            let allowed = allowed.string_list();
            candidates
                .into_iter()
                .filter(|id| allowed.contains(id))
                .collect()
        }
        None => candidates,
    }
}
