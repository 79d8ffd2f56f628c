use std::{path::Path, sync::Arc};

use anyhow::Result;
use clap::Subcommand;

use crate::{local::gate::NotificationGate, remote::session::SessionConfig};

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    #[command(about = "Write the backend credentials used by all commands")]
    Set {
        #[arg(long, help = "Backend base url, e.g. https://<project>.supabase.co")]
        url: String,
        #[arg(long = "api-key", help = "Public api key of the project")]
        api_key: String,
        #[arg(long, help = "Access token of the signed-in user")]
        token: String,
        #[arg(long, help = "Id of the signed-in user; all queries are scoped to it")]
        user: String,
    },
    #[command(about = "Show the configured backend and user")]
    Show,
}

pub fn process_session_command(command: SessionCommand, app_dir: &Path) -> Result<()> {
    match command {
        SessionCommand::Set {
            url,
            api_key,
            token,
            user,
        } => {
            let session = SessionConfig {
                base_url: url,
                api_key,
                access_token: token,
                user_id: Arc::from(user.as_str()),
            };
            session.save(app_dir)?;
            println!("Session saved for {}", session.user_id);
        }
        SessionCommand::Show => {
            let session = SessionConfig::load(app_dir)?;
            println!("Backend: {}", session.base_url);
            println!("User: {}", session.user_id);
        }
    }
    Ok(())
}

/// Forgets the credentials and clears the notification gate, so a future
/// session starts with a clean slate.
pub fn process_logout(app_dir: &Path) -> Result<()> {
    let removed = SessionConfig::clear(app_dir)?;
    NotificationGate::in_dir(app_dir).clear()?;
    if removed {
        println!("Logged out");
    } else {
        println!("No session was configured");
    }
    Ok(())
}
