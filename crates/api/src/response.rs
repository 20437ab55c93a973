//! Shared response envelope types for API handlers.

use serde::Serialize;

/// One page of a filtered listing plus the size of the whole filtered set.
///
/// ```ignore
/// Ok(Json(Page { data: items, total_records: total }))
/// ```
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub data: Vec<T>,
    pub total_records: i64,
}
