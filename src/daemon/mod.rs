use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use prompt::{PromptModule, TerminalInteractor, PROMPT_COUNTDOWN};
use scheduler::{SchedulerModule, SlotAlert, DEFAULT_TICK_PERIOD};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    local::{gate::NotificationGate, presets::ActivityPresets},
    remote::{session::SessionConfig, store::RestLogStore},
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod prompt;
pub mod scheduler;
pub mod shutdown;

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    let session = SessionConfig::load(&dir)?;
    let presets = ActivityPresets::in_dir(&dir).load()?;
    let gate = NotificationGate::in_dir(&dir);

    std::env::set_current_dir("/")?;

    let (sender, receiver) = mpsc::channel::<SlotAlert>(10);

    let shutdown_token = CancellationToken::new();

    let scheduler = create_scheduler(sender, gate, &shutdown_token, DEFAULT_TICK_PERIOD, DefaultClock);

    let prompter = PromptModule::new(
        receiver,
        RestLogStore::new(session.clone()),
        session.user_id.clone(),
        TerminalInteractor::new(presets),
        PROMPT_COUNTDOWN,
    );

    let (_, scheduler_result, prompt_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        scheduler.run(),
        prompter.run(),
    );

    if let Err(scheduler_result) = scheduler_result {
        error!("Scheduler module got an error {:?}", scheduler_result);
    }

    if let Err(prompt_result) = prompt_result {
        error!("Prompt module got an error {:?}", prompt_result);
    }

    Ok(())
}

fn create_scheduler(
    sender: mpsc::Sender<SlotAlert>,
    gate: NotificationGate,
    shutdown_token: &CancellationToken,
    tick_period: Duration,
    clock: impl Clock,
) -> SchedulerModule {
    SchedulerModule::new(
        sender,
        gate,
        shutdown_token.clone(),
        tick_period,
        Box::new(clock),
    )
}
