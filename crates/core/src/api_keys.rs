//! Shared-secret generation for the automation caller.

use rand::Rng;

/// Length of a generated service API key.
pub const KEY_LENGTH: usize = 32;

/// Generate a random alphanumeric key suitable for `SERVICE_API_KEY`.
pub fn generate_api_key() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect()
}
