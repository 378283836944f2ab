use colored::{ColoredString, Colorize};

use reqdash_core::{RequirementRecord, ReviewStatus, StatsSnapshot};

pub fn status_label(status: ReviewStatus) -> ColoredString {
    match status {
        ReviewStatus::Approved => "Approved".green(),
        ReviewStatus::Review => "Review".yellow(),
        ReviewStatus::Disapproved => "Disapproved".red(),
    }
}

pub fn print_stats(stats: &StatsSnapshot) {
    println!(
        "{} {}   {} {}   {} {}   {} {}",
        "Total:".bold(),
        stats.total,
        "Approved:".green(),
        stats.approved,
        "In Review:".yellow(),
        stats.in_review,
        "Disapproved:".red(),
        stats.disapproved()
    );
}

/// Prints listable records; `#` is the collection index used by set-status
pub fn print_requirements(records: &[(usize, RequirementRecord)]) {
    if records.is_empty() {
        println!("{}", "No requirements found.".yellow());
        return;
    }

    println!("{:<4} | {:<30} | {:<12} | Requirement", "#", "Category", "Status");
    println!("{}", "-".repeat(100));

    for (index, record) in records {
        let categories = record.category_tags().join(" | ");
        println!(
            "{:<4} | {:<30} | {:<12} | {}",
            index,
            truncate(&categories, 30).cyan(),
            status_label(record.status),
            record.text
        );
    }
}

pub fn print_record(record: &RequirementRecord) {
    println!("{}", "Requirement added successfully!".green());
    if let Some(id) = &record.id {
        println!("ID: {}", id);
    }
    println!("Categories: {}", record.category_tags().join(", ").cyan());
    println!("Status: {}", status_label(record.status));
    println!("Requirement: {}", record.text);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}
