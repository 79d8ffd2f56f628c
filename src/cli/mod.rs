pub mod activities;
pub mod dates;
pub mod edit;
pub mod grid;
pub mod process;
pub mod session;
pub mod stats;

use std::path::PathBuf;

use activities::ActivitiesCommand;
use anyhow::Result;
use clap::{Parser, Subcommand};
use edit::{BulkCommand, SetCommand};
use grid::GridCommand;
use process::{daemon_executable, kill_running_daemons, restart_daemon};
use session::SessionCommand;
use stats::StatsCommand;
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::start_daemon,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Slotwise", version, long_about = None)]
#[command(about = "Half-hour habit logger with a weekly time-block grid", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start the prompt daemon in the background")]
    Init {},
    #[command(
        about = "Run the prompt daemon directly in the current console. Lets you answer prompts interactively and is used for debugging"
    )]
    Serve {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Stop a running prompt daemon")]
    Stop {},
    #[command(about = "Display the weekly time-block grid")]
    Grid {
        #[command(flatten)]
        command: GridCommand,
    },
    #[command(about = "Fill or edit a single 30-minute slot")]
    Set {
        #[command(flatten)]
        command: SetCommand,
    },
    #[command(about = "Fill every slot in a time range with one activity")]
    Bulk {
        #[command(flatten)]
        command: BulkCommand,
    },
    #[command(about = "Show aggregate statistics")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
    #[command(about = "Manage the activity presets offered by the prompt")]
    Activities {
        #[command(subcommand)]
        command: ActivitiesCommand,
    },
    #[command(about = "Manage the backend session credentials")]
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
    #[command(about = "Forget the session and clear the notification gate")]
    Logout {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = create_application_default_path()?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init {} => {
            restart_daemon()?;
            Ok(())
        }
        Commands::Stop {} => {
            kill_running_daemons(&daemon_executable()?);
            Ok(())
        }
        Commands::Serve { dir } => {
            start_daemon(dir.unwrap_or(app_dir)).await?;
            Ok(())
        }
        Commands::Grid { command } => grid::process_grid_command(command, &app_dir).await,
        Commands::Set { command } => edit::process_set_command(command, &app_dir).await,
        Commands::Bulk { command } => edit::process_bulk_command(command, &app_dir).await,
        Commands::Stats { command } => stats::process_stats_command(command, &app_dir).await,
        Commands::Activities { command } => {
            activities::process_activities_command(command, &app_dir)
        }
        Commands::Session { command } => session::process_session_command(command, &app_dir),
        Commands::Logout {} => session::process_logout(&app_dir),
    }
}
