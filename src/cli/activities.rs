use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use crate::local::presets::ActivityPresets;

#[derive(Debug, Subcommand)]
pub enum ActivitiesCommand {
    #[command(about = "List the activity presets offered by the prompt")]
    List,
    #[command(about = "Add a preset")]
    Add { label: String },
    #[command(about = "Remove a preset")]
    Remove { label: String },
}

pub fn process_activities_command(command: ActivitiesCommand, app_dir: &Path) -> Result<()> {
    let presets = ActivityPresets::in_dir(app_dir);
    match command {
        ActivitiesCommand::List => {
            for label in presets.load()? {
                println!("{label}");
            }
        }
        ActivitiesCommand::Add { label } => {
            if presets.add(&label)? {
                println!("Added {label}");
            } else {
                println!("{label} is already a preset");
            }
        }
        ActivitiesCommand::Remove { label } => {
            if presets.remove(&label)? {
                println!("Removed {label}");
            } else {
                println!("{label} is not a preset");
            }
        }
    }
    Ok(())
}
