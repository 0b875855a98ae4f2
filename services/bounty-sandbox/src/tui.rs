use std::time::Duration;

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Select};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::{error::ReadlineError, DefaultEditor};
use tracing::instrument;

use bounty_runtime::Notification;

pub struct Tui {
    rl: DefaultEditor,
}

impl Tui {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rl: DefaultEditor::new()?,
        })
    }

    #[instrument(skip(self, items))]
    pub async fn select_item<S: ToString>(&self, prompt: &str, items: &[S]) -> Result<usize> {
        let theme = ColorfulTheme::default();
        let owned_items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        let prompt_owned = prompt.to_string();

        let selection = tokio::task::spawn_blocking(move || {
            Select::with_theme(&theme)
                .with_prompt(&prompt_owned)
                .default(0)
                .items(&owned_items)
                .interact()
        })
        .await?
        .context("User did not make a selection")?;
        Ok(selection)
    }

    pub fn get_user_input(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        let rl = &mut self.rl;
        tokio::task::block_in_place(move || {
            let line = rl.readline(prompt)?;
            if !line.trim().is_empty() {
                rl.add_history_entry(line.trim())?;
            }
            Ok(line)
        })
    }

    pub fn create_spinner(&self, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(120));
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        pb.set_message(msg.to_string());
        pb
    }

    pub fn print_notification(&self, notification: &Notification) {
        match notification {
            Notification::Success(msg) => println!("{}", msg.green()),
            Notification::Error(msg) => println!("{}", msg.red()),
        }
    }
}
