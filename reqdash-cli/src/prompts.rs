use anyhow::Result;
use inquire::{Select, Text};
use std::fmt;
use std::path::PathBuf;

use reqdash_core::{RequirementRecord, ReviewStatus};

/// Actions offered by the interactive dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    NewRequirement,
    ImportAndAnalyze,
    AnalyzePending,
    SetStatus,
    ShowRequirements,
    RefreshStats,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 7] = [
        MenuAction::NewRequirement,
        MenuAction::ImportAndAnalyze,
        MenuAction::AnalyzePending,
        MenuAction::SetStatus,
        MenuAction::ShowRequirements,
        MenuAction::RefreshStats,
        MenuAction::Quit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuAction::NewRequirement => write!(f, "New requirement"),
            MenuAction::ImportAndAnalyze => write!(f, "Import & analyze a document"),
            MenuAction::AnalyzePending => write!(f, "Analyze pending upload"),
            MenuAction::SetStatus => write!(f, "Set requirement status"),
            MenuAction::ShowRequirements => write!(f, "Show requirements"),
            MenuAction::RefreshStats => write!(f, "Refresh stats"),
            MenuAction::Quit => write!(f, "Quit"),
        }
    }
}

/// A listed requirement offered for selection
struct RecordChoice {
    index: usize,
    label: String,
}

impl fmt::Display for RecordChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Prompts for the next dashboard action. Escape quits.
pub fn prompt_action() -> Result<MenuAction> {
    let action = Select::new("Action:", MenuAction::ALL.to_vec()).prompt_skippable()?;
    Ok(action.unwrap_or(MenuAction::Quit))
}

/// Prompts for a new requirement; `None` when the user backs out
pub fn prompt_requirement_text() -> Result<Option<String>> {
    let text = Text::new("Requirement:")
        .with_help_message("Enter your requirement here (Esc to cancel)")
        .prompt_skippable()?;
    Ok(text)
}

/// Prompts for a document to import
pub fn prompt_document_path() -> Result<Option<PathBuf>> {
    let path = Text::new("Document path:")
        .with_help_message("PDF or TXT file (Esc to cancel)")
        .prompt_skippable()?;
    Ok(path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from))
}

/// Prompts for a requirement and its new status
pub fn prompt_status_change(
    records: &[(usize, RequirementRecord)],
) -> Result<Option<(usize, ReviewStatus)>> {
    let choices: Vec<RecordChoice> = records
        .iter()
        .map(|(index, record)| RecordChoice {
            index: *index,
            label: format!("[{}] {} - {}", record.status, index, record.text),
        })
        .collect();

    let Some(choice) = Select::new("Requirement:", choices).prompt_skippable()? else {
        return Ok(None);
    };

    let status = Select::new("Status:", ReviewStatus::ALL.to_vec()).prompt_skippable()?;
    Ok(status.map(|s| (choice.index, s)))
}
