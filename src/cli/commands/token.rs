use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, help = "Subject (user id) of the token")]
    pub user_id: String,

    #[arg(long, help = "Email claim")]
    pub email: Option<String>,

    #[arg(long, help = "Lifetime in hours (defaults to the configured session expiry)")]
    pub hours: Option<u64>,
}

pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config().security;
    let hours = args.hours.unwrap_or(security.jwt_expiry_hours);

    let claims = Claims::new(args.user_id, args.email, hours)?;
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Session token generated",
            Some(json!({
                "token": token,
                "user_id": claims.sub,
                "expires_at": claims.exp,
                "cookie": security.session_cookie
            })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
