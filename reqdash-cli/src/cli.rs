use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Requirements analysis dashboard")]
pub struct Cli {
    /// Path to a config file (defaults to the reqdash config directory)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the requirements service
    #[clap(long)]
    pub service_url: Option<String>,

    /// Show debug logging
    #[clap(long, short = 'v')]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive dashboard (default)
    Dashboard,

    /// Upload a document and remember it for a later `analyze`
    Upload {
        /// Document to upload (PDF or TXT)
        file: PathBuf,
    },

    /// Analyze the remembered upload
    Analyze {
        /// Analyze this stored filename instead of the remembered one
        #[clap(long)]
        filename: Option<String>,
    },

    /// Upload a document and analyze it right away
    Import {
        /// Document to upload (PDF or TXT)
        file: PathBuf,
    },

    /// Classify a single requirement statement
    Classify {
        /// The requirement text
        text: String,
    },

    /// Show requirement counts by status
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_dashboard() {
        let cli = Cli::try_parse_from(["reqdash"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_analyze_with_filename() {
        let cli = Cli::try_parse_from([
            "reqdash",
            "--service-url",
            "http://analysis:5000",
            "analyze",
            "--filename",
            "reqs.docx",
        ])
        .unwrap();
        assert_eq!(cli.service_url.as_deref(), Some("http://analysis:5000"));
        match cli.command {
            Some(Command::Analyze { filename }) => assert_eq!(filename.as_deref(), Some("reqs.docx")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_classify_takes_text() {
        let cli = Cli::try_parse_from(["reqdash", "classify", "The system must support SSO"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Classify { ref text }) if text == "The system must support SSO"
        ));
    }
}
