use clap::Subcommand;
use serde_json::json;
use tokio::io::AsyncBufReadExt;

use crate::auth::AuthState;
use crate::cli::config::build_client;
use crate::cli::utils::{output_error, output_record, output_success};
use crate::cli::OutputFormat;
use crate::codec;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the CRM backend")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, help = "Password (read from CRM_PASSWORD or stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the stored token")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,
}

async fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    if let Ok(password) = std::env::var("CRM_PASSWORD") {
        return Ok(password);
    }

    eprint!("Password: ");
    let mut line = String::new();
    tokio::io::BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(anyhow::anyhow!("Password is required"));
    }
    Ok(password)
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = build_client()?;

    match cmd {
        AuthCommands::Login { email, password } => {
            let password = resolve_password(password).await?;
            match client.login(&email, &password).await {
                Ok(success) => {
                    let identity = &success.identity;
                    output_success(
                        &output_format,
                        &format!("Logged in as {}", identity.display_name()),
                        Some(json!({
                            "email": identity.email,
                            "roles": identity.roles,
                            "expires_at": identity.expires_at.to_rfc3339(),
                        })),
                    )
                }
                Err(e) => {
                    output_error(&output_format, &e.to_string(), Some("LOGIN_FAILED"))?;
                    Err(e.into())
                }
            }
        }
        AuthCommands::Logout => {
            client.logout().await?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => match client.current_state().await {
            AuthState::Authenticated(identity) => output_success(
                &output_format,
                &format!(
                    "Authenticated as {} until {}",
                    identity.display_name(),
                    identity.expires_at.format("%Y-%m-%d %H:%M UTC")
                ),
                Some(json!({
                    "authenticated": true,
                    "subject": identity.subject,
                    "email": identity.email,
                    "roles": identity.roles,
                    "expires_at": identity.expires_at.to_rfc3339(),
                })),
            ),
            AuthState::Anonymous => output_success(
                &output_format,
                "Not logged in",
                Some(json!({ "authenticated": false })),
            ),
        },
        AuthCommands::Whoami => {
            let session = client
                .session()
                .await
                .ok_or_else(|| anyhow::anyhow!("Not logged in"))?;
            output_record(&output_format, codec::encode(session.user())?)
        }
    }
}
