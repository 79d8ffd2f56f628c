use std::{sync::Arc, time::Duration};

use ansi_term::{Colour, Style};
use anyhow::Result;
use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::Receiver,
};
use tracing::{debug, error, info, warn};

use crate::remote::{entities::NewLogEntry, store::LogStore};

use super::scheduler::SlotAlert;

/// An unanswered prompt auto-submits a skipped entry after this long.
pub const PROMPT_COUNTDOWN: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    Submitted(String),
    Skipped,
    Expired,
}

/// Contract for surfacing a prompt and collecting its answer. Mirrors the
/// window-manager seam on the collection side: the pipeline never talks to a
/// terminal directly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromptInteractor: Send {
    /// Surfaces the prompt (message, tone, device notification). Failures
    /// here degrade silently; they must not swallow the slot.
    async fn announce(&mut self, alert: &SlotAlert) -> Result<()>;

    /// Collects the user's answer, resolving to [PromptResponse::Expired]
    /// once the countdown runs out.
    async fn collect(&mut self, alert: &SlotAlert, countdown: Duration) -> Result<PromptResponse>;
}

/// Receives slot alerts and turns the collected answers into inserts. One
/// failed insert is reported and dropped; the loop carries on with the next
/// alert.
pub struct PromptModule<S, I> {
    receiver: Receiver<SlotAlert>,
    store: S,
    user_id: Arc<str>,
    interactor: I,
    countdown: Duration,
}

impl<S: LogStore, I: PromptInteractor> PromptModule<S, I> {
    pub fn new(
        receiver: Receiver<SlotAlert>,
        store: S,
        user_id: Arc<str>,
        interactor: I,
        countdown: Duration,
    ) -> Self {
        Self {
            receiver,
            store,
            user_id,
            interactor,
            countdown,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(alert) = self.receiver.recv().await {
            debug!("Handling alert {:?}", alert);
            match self.handle(alert).await {
                Ok(_) => {
                    info!("Prompt resolved")
                }
                Err(e) => {
                    error!("Error handling prompt: {e:?}")
                }
            }
        }

        self.receiver.close();
        Ok(())
    }

    async fn handle(&mut self, alert: SlotAlert) -> Result<()> {
        if let Err(e) = self.interactor.announce(&alert).await {
            warn!("Failed to announce prompt {e:?}");
        }

        let response = self.interactor.collect(&alert, self.countdown).await?;
        let entry = match response {
            PromptResponse::Submitted(label) => {
                NewLogEntry::logged(self.user_id.clone(), alert.timestamp, label)
            }
            PromptResponse::Skipped | PromptResponse::Expired => {
                NewLogEntry::skipped(self.user_id.clone(), alert.timestamp)
            }
        };

        self.store.insert(entry).await.inspect_err(|e| {
            // No retry; the user resubmits from the grid.
            eprintln!(
                "{}",
                Colour::Red.paint(format!(
                    "Could not save the entry for slot {}: {e}",
                    alert.slot_key
                ))
            );
        })?;
        Ok(())
    }
}

/// Prompt surface for an attached terminal. Detached daemons get an EOF from
/// stdin, wait out the countdown and let the entry auto-skip.
pub struct TerminalInteractor {
    presets: Vec<String>,
}

impl TerminalInteractor {
    pub fn new(presets: Vec<String>) -> Self {
        Self { presets }
    }
}

#[async_trait]
impl PromptInteractor for TerminalInteractor {
    async fn announce(&mut self, alert: &SlotAlert) -> Result<()> {
        // \x07 rings the terminal bell where the terminal supports one.
        print!("\x07");
        println!(
            "{} {}",
            Style::new().bold().paint("What did you do?"),
            Colour::Fixed(8).paint(format!("(slot {})", alert.slot_key))
        );
        println!("Log your activity for the last 30 minutes.");
        for (index, preset) in self.presets.iter().enumerate() {
            println!("  {}. {preset}", index + 1);
        }
        println!("Type a preset number or a label; an empty line skips.");
        Ok(())
    }

    async fn collect(&mut self, _alert: &SlotAlert, countdown: Duration) -> Result<PromptResponse> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        match tokio::time::timeout(countdown, lines.next_line()).await {
            Err(_) => Ok(PromptResponse::Expired),
            Ok(Ok(None)) => {
                // No terminal attached; hold the prompt open for its
                // countdown and let it expire.
                tokio::time::sleep(countdown).await;
                Ok(PromptResponse::Expired)
            }
            Ok(Ok(Some(line))) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return Ok(PromptResponse::Skipped);
                }
                if let Ok(index) = trimmed.parse::<usize>() {
                    if (1..=self.presets.len()).contains(&index) {
                        return Ok(PromptResponse::Submitted(self.presets[index - 1].clone()));
                    }
                }
                Ok(PromptResponse::Submitted(trimmed.to_string()))
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }
}
