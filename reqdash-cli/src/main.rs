mod cli;
mod output;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use reqdash_core::{
    DashboardConfig, HttpRequirementsService, LifecycleController, PendingUpload, SessionStorage,
    StatusChange, UploadFile,
};

use crate::cli::{Cli, Command};
use crate::prompts::MenuAction;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = DashboardConfig::resolve(cli.config.as_deref())?;
    if let Some(url) = &cli.service_url {
        config.service_url = url.clone();
    }

    let service = HttpRequirementsService::new(&config)
        .context("Failed to create requirements service client")?;
    let dashboard = LifecycleController::new(Arc::new(service), config.stats_source);
    let session = SessionStorage::new(config.session_path()?);

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Dashboard => run_dashboard(&dashboard, &session).await?,
        Command::Upload { file } => upload_document(&dashboard, &session, &file).await?,
        Command::Analyze { filename } => analyze_upload(&dashboard, &session, filename).await?,
        Command::Import { file } => import_document(&dashboard, &file).await?,
        Command::Classify { text } => {
            let record = dashboard.classify_and_append(&text).await?;
            output::print_record(&record);
        }
        Command::Stats => {
            if !dashboard.refresh_stats().await {
                anyhow::bail!("Failed to fetch stats from {}", config.service_url);
            }
            output::print_stats(&dashboard.stats());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

async fn upload_document(
    dashboard: &LifecycleController,
    session: &SessionStorage,
    path: &Path,
) -> Result<()> {
    let file = UploadFile::from_path(path).await?;
    let filename = dashboard.upload_only(Some(file)).await?;
    session.save_pending(&PendingUpload::new(&filename)).await?;

    println!("{}", "File uploaded successfully.".green());
    println!("Stored as: {}", filename);
    println!("Run `reqdash analyze` to analyze it.");
    Ok(())
}

async fn analyze_upload(
    dashboard: &LifecycleController,
    session: &SessionStorage,
    filename: Option<String>,
) -> Result<()> {
    let saved = session.load_pending().await?;
    let filename = match filename {
        Some(f) => f,
        None => saved
            .as_ref()
            .map(|p| p.filename.clone())
            .context("No pending upload. Run `reqdash upload <FILE>` first.")?,
    };

    dashboard.restore_pending(filename.as_str());
    let result = dashboard.analyze_pending().await;

    if saved.is_some_and(|p| p.filename == filename) {
        if let Err(e) = session.clear_pending().await {
            report("Could not clear the saved upload", &e);
        }
    }

    let count = result?;
    println!("{}", format!("Extracted {} requirements.", count).green());
    output::print_requirements(&dashboard.visible_records());
    output::print_stats(&dashboard.stats());
    Ok(())
}

async fn import_document(dashboard: &LifecycleController, path: &Path) -> Result<()> {
    let file = UploadFile::from_path(path).await?;
    dashboard.select_file(file);
    let count = dashboard.submit_selected().await?;

    println!("{}", format!("Extracted {} requirements.", count).green());
    output::print_requirements(&dashboard.visible_records());
    output::print_stats(&dashboard.stats());
    Ok(())
}

async fn run_dashboard(dashboard: &LifecycleController, session: &SessionStorage) -> Result<()> {
    println!("{}", "Requirements Dashboard".bold());
    println!("Manage and track all your project requirements\n");

    let saved = match session.load_pending().await {
        Ok(saved) => saved,
        Err(e) => {
            report("Could not read the saved upload", &e);
            None
        }
    };
    if let Some(pending) = saved {
        println!(
            "Pending upload: {} (uploaded {})",
            pending.filename.cyan(),
            pending.uploaded_at.format("%Y-%m-%d %H:%M")
        );
        dashboard.restore_pending(pending.filename);
    }

    dashboard.refresh_stats().await;

    loop {
        println!();
        output::print_stats(&dashboard.stats());

        match prompts::prompt_action()? {
            MenuAction::NewRequirement => {
                let Some(text) = prompts::prompt_requirement_text()? else {
                    continue;
                };
                match dashboard.classify_and_append(&text).await {
                    Ok(record) => output::print_record(&record),
                    Err(e) => report("Failed to classify new requirement", &e),
                }
            }
            MenuAction::ImportAndAnalyze => {
                let Some(path) = prompts::prompt_document_path()? else {
                    continue;
                };
                match UploadFile::from_path(&path).await {
                    Ok(file) => dashboard.select_file(file),
                    Err(e) => {
                        report("Could not read document", &e);
                        continue;
                    }
                }
                println!("{}", "Analyzing... Please wait".yellow());
                let result = dashboard.submit_selected().await;
                sync_session(dashboard, session).await;
                match result {
                    Ok(_) => output::print_requirements(&dashboard.visible_records()),
                    Err(e) => report("An error occurred while importing the file", &e),
                }
            }
            MenuAction::AnalyzePending => {
                let Some(filename) = dashboard.pending_upload() else {
                    println!("{}", "No pending upload.".yellow());
                    continue;
                };
                println!("{}", "Analyzing... Please wait".yellow());
                let result = dashboard.analyze_pending().await;
                sync_session(dashboard, session).await;
                match result {
                    Ok(_) => output::print_requirements(&dashboard.visible_records()),
                    Err(e) => report(&format!("An error occurred analyzing {}", filename), &e),
                }
            }
            MenuAction::SetStatus => {
                let records = dashboard.visible_records();
                if records.is_empty() {
                    println!("{}", "No requirements found.".yellow());
                    continue;
                }
                let Some((index, status)) = prompts::prompt_status_change(&records)? else {
                    continue;
                };
                match dashboard.set_status(index, status).await {
                    Ok(StatusChange::Confirmed) => {
                        println!("Status set to {}", output::status_label(status))
                    }
                    Ok(StatusChange::Skipped) => {}
                    Err(e) => {
                        report("Failed to update requirement status", &e);
                        println!("The local status was kept; it will reconcile on the next refresh.");
                    }
                }
            }
            MenuAction::ShowRequirements => {
                output::print_requirements(&dashboard.visible_records());
            }
            MenuAction::RefreshStats => {
                if !dashboard.refresh_stats().await {
                    println!("{}", "Stats unavailable, showing last known counts.".yellow());
                }
            }
            MenuAction::Quit => break,
        }
    }

    Ok(())
}

/// Mirrors the in-memory pending slot into the session file
async fn sync_session(dashboard: &LifecycleController, session: &SessionStorage) {
    let pending = dashboard.pending_upload();
    if let Err(e) = session.sync_pending(pending.as_deref()).await {
        report("Could not update the saved upload", &e);
    }
}

fn report(context: &str, error: &dyn std::fmt::Display) {
    println!("{}", format!("{}: {}", context, error).red());
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqdash_core::StatsSource;

    fn offline_dashboard() -> LifecycleController {
        let service = HttpRequirementsService::new(&DashboardConfig::default()).unwrap();
        LifecycleController::new(Arc::new(service), StatsSource::Remote)
    }

    #[tokio::test]
    async fn test_session_follows_pending_slot() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionStorage::new(dir.path().join("session.yaml"));
        session
            .save_pending(&PendingUpload::new("restored.pdf"))
            .await
            .unwrap();

        let dashboard = offline_dashboard();
        dashboard.restore_pending("replacement.pdf");
        sync_session(&dashboard, &session).await;
        let saved = session.load_pending().await.unwrap().unwrap();
        assert_eq!(saved.filename, "replacement.pdf");

        // An emptied slot forgets the saved upload
        sync_session(&offline_dashboard(), &session).await;
        assert_eq!(session.load_pending().await.unwrap(), None);
    }
}
