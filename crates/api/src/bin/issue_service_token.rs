//! Print a local token identifying the automation caller.
//!
//! Reads `JWT_SECRET`, `SERVICE_API_KEY` and `SERVICE_TOKEN_EXPIRE_DAYS` from
//! the environment (or `.env`), the same variables the server uses.

use anyhow::Context;
use mediadesk_api::auth::jwt::{generate_service_token, JwtConfig};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let api_key = std::env::var("SERVICE_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .context("SERVICE_API_KEY must be set")?;
    let config = JwtConfig::from_env();

    let token = generate_service_token(&api_key, &config).context("failed to sign token")?;
    eprintln!(
        "Service token valid for {} day(s)",
        config.service_token_expiry_days
    );
    println!("{token}");
    Ok(())
}
