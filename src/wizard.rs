//! The interactive three step wizard: URL, resolution, destination.
//!
//! Every step moves forward only; there is no way back to an earlier step. Once a
//! download has completed or failed the wizard starts over at the URL step, and it
//! stops when the input is closed.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::download::catalog::fetch_resolutions;
use crate::download::orchestrator::{status_message, DownloadRequest, Downloader};

/// Selection used when the user does not pick one of the listed resolutions.
pub const PLACEHOLDER_RESOLUTION: &str = "Select Quality";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    AwaitingUrl,
    AwaitingResolution { url: String, choices: Vec<String> },
    AwaitingDestination { url: String, resolution: String },
    Downloading(DownloadRequest),
    Completed(PathBuf),
    Failed(String),
    /// input closed
    Aborted,
}

/// Maps the user's answer to a resolution label: a list number or a label itself.
pub fn pick_resolution(answer: &str, choices: &[String]) -> String {
    let answer = answer.trim();

    if let Ok(index) = answer.parse::<usize>() {
        if let Some(choice) = index.checked_sub(1).and_then(|i| choices.get(i)) {
            return choice.clone();
        }
    }

    match choices.iter().find(|choice| choice.as_str() == answer) {
        Some(choice) => choice.clone(),
        None => PLACEHOLDER_RESOLUTION.to_string(),
    }
}

fn start_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Downloading...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub struct Wizard<R, W> {
    downloader: Downloader,
    input: R,
    output: W,
    status: String,
}

impl<R, W> Wizard<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(downloader: Downloader, input: R, output: W) -> Self {
        Self {
            downloader,
            input,
            output,
            status: String::new(),
        }
    }

    /// Last status line shown to the user.
    pub fn status(&self) -> &str {
        &self.status
    }

    async fn prompt(&mut self, text: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "{}: ", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().to_string()))
    }

    fn set_status(&mut self, status: String) -> std::io::Result<()> {
        writeln!(self.output, "{}", status)?;
        self.status = status;
        Ok(())
    }

    pub async fn step(&mut self, state: WizardState) -> std::io::Result<WizardState> {
        match state {
            WizardState::AwaitingUrl => {
                let url = match self.prompt("Input video URL to begin").await? {
                    Some(url) => url,
                    None => return Ok(WizardState::Aborted),
                };
                if url.is_empty() {
                    return Ok(WizardState::AwaitingUrl);
                }

                let listed = fetch_resolutions(self.downloader.resolver(), &url).await;
                match listed {
                    Ok(choices) if choices.is_empty() => {
                        self.set_status("No downloadable resolutions for this video.".to_string())?;
                        Ok(WizardState::AwaitingUrl)
                    }
                    Ok(choices) => Ok(WizardState::AwaitingResolution { url, choices }),
                    Err(err) => {
                        tracing::error!("Listing resolutions failed: {}", err);
                        self.set_status(err.user_message())?;
                        Ok(WizardState::AwaitingUrl)
                    }
                }
            }
            WizardState::AwaitingResolution { url, choices } => {
                writeln!(self.output, "Select video export quality")?;
                for (i, choice) in choices.iter().enumerate() {
                    writeln!(self.output, "  {}) {}", i + 1, choice)?;
                }

                match self.prompt("Quality").await? {
                    Some(answer) => Ok(WizardState::AwaitingDestination {
                        url,
                        resolution: pick_resolution(&answer, &choices),
                    }),
                    None => Ok(WizardState::Aborted),
                }
            }
            WizardState::AwaitingDestination { url, resolution } => {
                let default_output = self.downloader.options().default_output.clone();
                let text = format!("Edit video destination [{}]", default_output.display());

                let destination = match self.prompt(&text).await? {
                    Some(answer) if answer.is_empty() => default_output,
                    Some(answer) => PathBuf::from(answer),
                    None => return Ok(WizardState::Aborted),
                };

                Ok(WizardState::Downloading(DownloadRequest {
                    url,
                    resolution,
                    destination,
                }))
            }
            WizardState::Downloading(request) => {
                let handle = match self.downloader.start(request) {
                    Ok(handle) => handle,
                    Err(err) => {
                        let status = err.user_message();
                        self.set_status(status.clone())?;
                        return Ok(WizardState::Failed(status));
                    }
                };

                let spinner = self.downloader.options().show_progress.then(start_spinner);
                let joined = handle.await;
                if let Some(spinner) = spinner {
                    spinner.finish_and_clear();
                }

                let result = match joined {
                    Ok(result) => result,
                    Err(err) => {
                        tracing::error!("Download task stopped: {}", err);
                        let status = format!("An error occurred: {}", err);
                        self.set_status(status.clone())?;
                        return Ok(WizardState::Failed(status));
                    }
                };

                let status = status_message(&result);
                self.set_status(status.clone())?;

                Ok(match result {
                    Ok(path) => WizardState::Completed(path),
                    Err(_) => WizardState::Failed(status),
                })
            }
            finished => Ok(finished),
        }
    }

    /// Runs the wizard until the input is closed, starting over after every download.
    ///
    /// Returns the outcome of the last download, or `Aborted` if none was triggered.
    pub async fn run(&mut self) -> std::io::Result<WizardState> {
        let mut state = WizardState::AwaitingUrl;
        let mut last = WizardState::Aborted;

        loop {
            state = match self.step(state).await? {
                WizardState::Aborted => return Ok(last),
                finished @ (WizardState::Completed(_) | WizardState::Failed(_)) => {
                    last = finished;
                    writeln!(self.output)?;
                    WizardState::AwaitingUrl
                }
                next => next,
            };
        }
    }
}
