//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use shartnoma_domain::{ContractType, Language};

/// Shartnoma CLI - Legal review of contracts under Uzbek law.
#[derive(Debug, Parser)]
#[command(name = "shartnoma")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHARTNOMA_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (status and score only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a contract
    Analyze(AnalyzeArgs),

    /// Detect the language and type of a document
    Detect(FileArgs),

    /// Show the sections of a document
    Sections(FileArgs),

    /// Manage the statute store
    Laws(LawsArgs),

    /// Inspect the configuration
    Config(ConfigArgs),
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Contract file (.docx, .pdf, .txt, or an image)
    pub file: String,

    /// Contract type, detected when omitted
    #[arg(short = 't', long = "type", value_enum)]
    pub contract_type: Option<ContractTypeArg>,

    /// Document language, detected when omitted
    #[arg(short, long, value_enum)]
    pub language: Option<LanguageArg>,

    /// Skip the spellchecking services and the model review
    #[arg(long)]
    pub offline: bool,
}

/// Arguments of commands that only read a document.
#[derive(Debug, Parser)]
pub struct FileArgs {
    /// Document file
    pub file: String,

    /// Document language, detected when omitted
    #[arg(short, long, value_enum)]
    pub language: Option<LanguageArg>,
}

/// Arguments for statute store management.
#[derive(Debug, Parser)]
pub struct LawsArgs {
    #[command(subcommand)]
    pub action: LawsAction,
}

/// Statute store actions.
#[derive(Debug, Subcommand)]
pub enum LawsAction {
    /// Import laws from a JSON file
    Import {
        /// JSON file with laws and their articles
        file: String,
    },

    /// Show how many articles are stored
    Count,
}

/// Arguments for configuration inspection.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Contract type argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ContractTypeArg {
    /// Services
    Service,
    /// Supply of goods
    Supply,
    /// Work / construction
    Work,
    /// Employment
    Labor,
    /// Lease
    Lease,
    /// Public procurement
    Procurement,
    /// Loan
    Loan,
}

/// Language argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LanguageArg {
    /// Uzbek, Latin script
    UzLatin,
    /// Uzbek, Cyrillic script
    UzCyrillic,
    /// Russian
    Ru,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<ContractTypeArg> for ContractType {
    fn from(arg: ContractTypeArg) -> Self {
        match arg {
            ContractTypeArg::Service => ContractType::Service,
            ContractTypeArg::Supply => ContractType::Supply,
            ContractTypeArg::Work => ContractType::Work,
            ContractTypeArg::Labor => ContractType::Labor,
            ContractTypeArg::Lease => ContractType::Lease,
            ContractTypeArg::Procurement => ContractType::Procurement,
            ContractTypeArg::Loan => ContractType::Loan,
        }
    }
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::UzLatin => Language::UzLatin,
            LanguageArg::UzCyrillic => Language::UzCyrillic,
            LanguageArg::Ru => Language::Ru,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_command() {
        let cli = Cli::parse_from([
            "shartnoma",
            "analyze",
            "shartnoma.docx",
            "--type",
            "service",
            "--language",
            "uz-latin",
            "--format",
            "json",
        ]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.file, "shartnoma.docx");
                assert!(matches!(args.contract_type, Some(ContractTypeArg::Service)));
                assert!(matches!(args.language, Some(LanguageArg::UzLatin)));
                assert!(!args.offline);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_laws_import_command() {
        let cli = Cli::parse_from(["shartnoma", "laws", "import", "laws.json"]);
        match cli.command {
            Command::Laws(LawsArgs {
                action: LawsAction::Import { file },
            }) => assert_eq!(file, "laws.json"),
            _ => panic!("Expected Laws Import command"),
        }
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["shartnoma"]).is_err());
    }

    #[test]
    fn test_argument_conversions() {
        let contract_type: ContractType = ContractTypeArg::Procurement.into();
        assert_eq!(contract_type, ContractType::Procurement);
        let language: Language = LanguageArg::Ru.into();
        assert_eq!(language, Language::Ru);
    }
}
