//! # Console
//!
//! Line-oriented shell around [`App`]: one command per input line, the
//! current page rendered to the output after every command. Toasts are
//! printed before any navigation they trigger, so a delayed redirect shows its
//! message first.

mod app;
mod command;

pub use app::{App, Screen};
pub use command::{Command, HELP};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{info, instrument, warn};

use crate::error::{AdminError, AdminResult};
use crate::views::{Confirm, Outcome};

pub struct Console<R, W> {
    app: App,
    lines: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(app: App, input: R, out: W) -> Self {
        Self {
            app,
            lines: input.lines(),
            out,
        }
    }

    /// Runs until `quit` or end of input. Returns the output sink.
    #[instrument(name = "console", skip(self))]
    pub async fn run(mut self) -> AdminResult<W> {
        info!("Console started");
        self.present().await?;

        while let Some(line) = self.lines.next_line().await.map_err(console_io)? {
            if line.trim().is_empty() {
                continue;
            }
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    write(&mut self.out, &format!("{}\n", e)).await?;
                    continue;
                }
            };

            match command {
                Command::Quit => break,
                Command::Help => {
                    write(&mut self.out, HELP).await?;
                    continue;
                }
                command => {
                    self.app.sync_session().await;
                    let mut prompt = LinePrompt {
                        lines: &mut self.lines,
                        out: &mut self.out,
                    };
                    let outcome = self.app.execute(command, &mut prompt).await;
                    self.show(outcome).await?;
                }
            }
            self.present().await?;
        }

        info!("Console stopped");
        Ok(self.out)
    }

    /// Renders the page, showing the loading state first if a fetch is still
    /// in flight.
    async fn present(&mut self) -> AdminResult<()> {
        let mut outcome = self.app.poll();
        loop {
            self.show(outcome).await?;
            if !self.app.is_busy() {
                break;
            }
            write(&mut self.out, &self.app.render()).await?;
            outcome = self.app.settle().await;
        }
        write(&mut self.out, &self.app.render()).await
    }

    async fn show(&mut self, outcome: Outcome) -> AdminResult<()> {
        for toast in &outcome.toasts {
            write(&mut self.out, &format!("{}\n", toast)).await?;
        }
        self.app.follow(outcome.navigation).await;
        Ok(())
    }
}

/// Answers a confirmation from the next input line.
struct LinePrompt<'a, R, W> {
    lines: &'a mut Lines<R>,
    out: &'a mut W,
}

#[async_trait]
impl<'a, R, W> Confirm for LinePrompt<'a, R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn confirm(&mut self, prompt: &str) -> bool {
        if let Err(e) = write(&mut *self.out, &format!("{} [y/N] ", prompt)).await {
            warn!(error = %e, "Could not show confirmation");
            return false;
        }
        match self.lines.next_line().await {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Could not read confirmation");
                false
            }
        }
    }
}

async fn write<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> AdminResult<()> {
    out.write_all(text.as_bytes()).await.map_err(console_io)?;
    out.flush().await.map_err(console_io)
}

fn console_io(err: std::io::Error) -> AdminError {
    AdminError::Console(err.to_string())
}
