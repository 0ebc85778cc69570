//! CLI command and subcommand definitions

use clap::{Parser, Subcommand};

use crate::demos::progress::{DEFAULT_COUNT, MAX_COUNT, MIN_COUNT};

/// Firestore Tools
///
/// Walk a Firestore database tree and try out a few terminal UI demos.
#[derive(Parser, Debug)]
#[command(name = "firestore-tools")]
#[command(version, about = "Firestore CLI tools", long_about = None)]
pub struct Cli {
    /// Output format (overrides config file)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Don't load config file
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Config file path (default: ~/.config/firestore-tools/cli.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Project id (overrides the credential file)
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Firestore emulator host:port
    #[arg(long, global = true)]
    pub emulator_host: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress lines with node ids
    Text,
    /// One JSON object per node
    Json,
    /// One path per line
    Paths,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        crate::format::OutputFormat::from(self).as_str()
    }
}

impl From<&OutputFormat> for crate::format::OutputFormat {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Text => crate::format::OutputFormat::Text,
            OutputFormat::Json => crate::format::OutputFormat::Json,
            OutputFormat::Paths => crate::format::OutputFormat::Paths,
        }
    }
}

impl From<crate::format::OutputFormat> for OutputFormat {
    fn from(format: crate::format::OutputFormat) -> Self {
        match format {
            crate::format::OutputFormat::Text => OutputFormat::Text,
            crate::format::OutputFormat::Json => OutputFormat::Json,
            crate::format::OutputFormat::Paths => OutputFormat::Paths,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every collection and document under PATH
    Read {
        /// Service-account credential (JSON) file
        #[arg(long)]
        cred: Option<String>,

        /// Output folder
        #[arg(long, default_value = ".")]
        output: String,

        /// Do not expand nodes deeper than this
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_depth: Option<u64>,

        /// Collection or document path; `/` reads the whole database
        #[arg(default_value = "/", value_name = "PATH")]
        path: String,
    },

    /// Write data to Firestore (placeholder)
    Write {
        /// Service-account credential (JSON) file
        #[arg(long, default_value = "credential.json")]
        cred: String,

        /// Data to write
        #[arg(long, default_value = "")]
        data: String,
    },

    /// Concatenate files into OUTPUT, like `cat` (`-` is stdin/stdout)
    CopyFile {
        /// Input files
        #[arg(value_name = "INPUT", required = true, num_args = 1..)]
        inputs: Vec<String>,

        /// Output file
        #[arg(value_name = "OUTPUT")]
        output: String,
    },

    /// Show every terminal color
    Color,

    /// Show long output through a pager
    Pager,

    /// Show several progress bars
    Progress {
        /// The number of items to process
        #[arg(
            long,
            default_value_t = DEFAULT_COUNT,
            value_parser = clap::value_parser!(u64).range(MIN_COUNT..=MAX_COUNT)
        )]
        count: u64,
    },

    /// Clear the entire screen
    Clear,

    /// Wait for a keypress
    Pause,

    /// Show a simple menu
    Menu,

    /// Show or manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_read_defaults() {
        let cli = Cli::parse_from(["firestore-tools", "read"]);
        match cli.command {
            Commands::Read {
                cred,
                output,
                max_depth,
                path,
            } => {
                assert!(cred.is_none());
                assert_eq!(output, ".");
                assert!(max_depth.is_none());
                assert_eq!(path, "/");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "firestore-tools",
            "read",
            "users/alice",
            "--format",
            "paths",
            "--emulator-host",
            "localhost:8080",
        ]);
        assert_eq!(cli.format, Some(OutputFormat::Paths));
        assert_eq!(cli.emulator_host.as_deref(), Some("localhost:8080"));
    }

    #[test]
    fn test_output_format_from_config_value() {
        let format =
            |value: &str| OutputFormat::from(crate::format::OutputFormat::from_config(value));
        assert_eq!(format("json"), OutputFormat::Json);
        assert_eq!(format("paths"), OutputFormat::Paths);
        assert_eq!(format("text"), OutputFormat::Text);
        assert_eq!(format("yaml"), OutputFormat::Text);
        assert_eq!(format("paths").as_str(), "paths");
    }

    #[test]
    fn test_progress_count_range() {
        let cli = Cli::parse_from(["firestore-tools", "progress"]);
        assert!(matches!(cli.command, Commands::Progress { count: 8000 }));

        assert!(Cli::try_parse_from(["firestore-tools", "progress", "--count", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["firestore-tools", "progress", "--count", "100001"]).is_err()
        );
    }

    #[test]
    fn test_copy_file_needs_input_and_output() {
        let cli = Cli::parse_from(["firestore-tools", "copy-file", "a.txt", "b.txt", "-"]);
        match cli.command {
            Commands::CopyFile { inputs, output } => {
                assert_eq!(inputs, vec!["a.txt", "b.txt"]);
                assert_eq!(output, "-");
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["firestore-tools", "copy-file", "-"]).is_err());
    }
}
