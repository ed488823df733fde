use serde_json::json;
use uuid::Uuid;

use crate::auth::{Claims, JwtIdentityProvider};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

/// Mint a token the way a login endpoint would. Development use only.
pub fn handle(config: &AppConfig, user: Uuid, hours: Option<u64>, output_format: OutputFormat) -> anyhow::Result<()> {
    let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = Claims::new(user, hours)?;
    let token = JwtIdentityProvider::new(config.security.jwt_secret.clone()).issue(&claims)?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => println!(
            "{}",
            json!({ "token": token, "user_id": user, "expires_at": claims.exp })
        ),
    }
    Ok(())
}
