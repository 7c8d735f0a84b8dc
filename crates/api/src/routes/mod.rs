//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod products;

use std::str::FromStr;

use common::InvalidId;

use crate::error::ApiError;

/// Parses a path id, mapping malformed input to 400.
fn parse_id<T: FromStr<Err = InvalidId>>(raw: &str) -> Result<T, ApiError> {
    raw.parse::<T>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}
