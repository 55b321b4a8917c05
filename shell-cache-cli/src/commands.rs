use std::path::Path;
use std::sync::Arc;

use shell_cache::{
    ActivationOutcome, AgentStatus, AssetAgent, AssetRequest, DownloadReport, FetchDisposition,
    MessageOutcome,
};
use tracing::{info, warn};

use crate::error::AppError;

pub struct CommandExecutor {
    agent: Arc<AssetAgent>,
}

impl CommandExecutor {
    pub fn new(agent: AssetAgent) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }

    pub async fn install(&self) -> Result<(), AppError> {
        let files = self.agent.install().await?;
        println!("Installed {files} core files into staging");
        Ok(())
    }

    pub async fn activate(&self) -> Result<(), AppError> {
        match self.agent.activate().await {
            ActivationOutcome::Fresh { copied } => {
                println!("Activated from scratch: {copied} files copied");
            }
            ActivationOutcome::Upgraded {
                retained,
                evicted,
                copied,
            } => {
                println!("Upgraded: {retained} kept, {evicted} evicted, {copied} copied");
            }
            ActivationOutcome::Reset => {
                warn!("Activation reset every store");
                println!("Activation failed, all stores were deleted");
            }
        }
        Ok(())
    }

    pub async fn lifecycle(&self) -> Result<(), AppError> {
        self.install().await?;
        self.activate().await
    }

    pub async fn fetch(&self, target: &str, output: Option<&Path>) -> Result<(), AppError> {
        let url = if target.contains("://") {
            target.to_string()
        } else if target == "/" {
            self.agent.config().origin.resolve(target)
        } else {
            self.agent.config().origin.resolve(target.trim_start_matches('/'))
        };

        let response = match self.agent.handle_fetch(&AssetRequest::get(url.as_str())).await? {
            FetchDisposition::Passthrough => {
                println!("{url}: not intercepted");
                return Ok(());
            }
            FetchDisposition::Respond(response) => response,
        };

        println!(
            "{url}: {} {} ({} bytes)",
            response.status,
            response.content_type().unwrap_or("-"),
            response.body.len()
        );

        if let Some(path) = output {
            tokio::fs::write(path, &response.body).await?;
            info!(path = %path.display(), "Wrote response body");
        }
        Ok(())
    }

    pub async fn message(&self, value: &str) -> Result<(), AppError> {
        match self.agent.handle_message(value)? {
            MessageOutcome::Ignored => println!("Ignored message {value:?}"),
            MessageOutcome::SkippedWaiting => println!("Skipped the waiting phase"),
            MessageOutcome::DownloadStarted(handle) => {
                let report = handle.await??;
                print_report(&report);
            }
        }
        Ok(())
    }

    pub async fn download_offline(&self) -> Result<(), AppError> {
        let report = self.agent.download_offline().await?;
        print_report(&report);
        Ok(())
    }

    pub async fn status(&self) -> Result<(), AppError> {
        let AgentStatus { stores, recorded } = self.agent.status().await?;

        for (name, entries) in &stores {
            match entries {
                Some(count) => println!("{name:<24} {count} entries"),
                None => println!("{name:<24} absent"),
            }
        }

        match recorded {
            None => println!("No manifest recorded"),
            Some(diff) if diff.is_empty() => {
                println!("Recorded manifest matches this build ({} assets)", diff.unchanged.len());
            }
            Some(diff) => {
                println!("Recorded manifest differs from this build:");
                for (label, keys) in [
                    ("unchanged", &diff.unchanged),
                    ("changed", &diff.changed),
                    ("new", &diff.added),
                    ("removed", &diff.removed),
                ] {
                    println!("  {label:<10} {}", keys.len());
                    if label != "unchanged" {
                        for key in keys {
                            println!("    {key}");
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn print_report(report: &DownloadReport) {
    println!(
        "Offline download: {} fetched, {} failed, {} already cached",
        report.fetched, report.failed, report.skipped
    );
}
