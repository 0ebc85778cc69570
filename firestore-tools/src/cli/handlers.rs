//! Command execution handlers

use anyhow::{Context, Result};
use firestore_tools_core::{DocumentStore, NodePath, TreeWalker, WalkOptions, WalkSummary};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::client::{ConnectionSettings, FirestoreClient};
use crate::config::CliConfig;
use crate::demos;
use crate::format::{format_config, format_success, format_summary, LinePrinter};
use crate::remote::FirestoreStore;

use super::commands::*;

/// Resolve `path` against the current directory.
fn absolute(path: &str) -> Result<PathBuf> {
    let path = Path::new(path);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

/// Walk `store` from `start`, streaming every visit to `out`.
pub async fn run_walk<S, W>(
    store: &S,
    start: &NodePath,
    options: WalkOptions,
    out: W,
    format: &OutputFormat,
) -> Result<WalkSummary>
where
    S: DocumentStore,
    W: Write + Send,
{
    let mut printer = LinePrinter::new(out, format.into());
    let summary = TreeWalker::new(options)
        .walk(store, start, &mut printer)
        .await?;
    Ok(summary)
}

/// Handle read command
pub async fn handle_read(
    cred: Option<String>,
    output: &str,
    max_depth: Option<u64>,
    path: &str,
    config: &CliConfig,
    format: &OutputFormat,
) -> Result<()> {
    let cred = cred.unwrap_or_else(|| config.credential.clone());
    let start = NodePath::parse(path)?;
    let output = absolute(output)?;

    if *format == OutputFormat::Text {
        println!("Reading from Firestore, credential file: {}", cred);
        println!("Document path: {}", start);
        println!("Output path: {}", output.display());
    }

    let settings = ConnectionSettings::from_config(config, absolute(&cred)?);
    let client = FirestoreClient::connect(&settings)?;
    info!(
        project = client.project(),
        emulator = client.is_emulator(),
        "Connected to Firestore"
    );

    let store = FirestoreStore::new(client);
    let options = WalkOptions {
        max_depth: max_depth.map(|d| d as usize),
    };
    let summary = run_walk(&store, &start, options, std::io::stdout(), format).await?;

    if *format == OutputFormat::Text {
        println!("{}", format_summary(&summary));
    }

    Ok(())
}

/// Handle write command
pub fn handle_write(cred: &str, data: &str) -> Result<()> {
    debug!(cred, bytes = data.len(), "Write requested");
    println!("Dropped the database");
    Ok(())
}

/// Handle config commands
pub fn handle_config(
    command: ConfigCommands,
    current_config: &CliConfig,
    config_path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("{}", format_config(current_config, &format.into())?);
        }
        ConfigCommands::Set { key, value } => {
            // Only the file's own values are persisted, never env or CLI overrides
            let mut config = CliConfig::load_from(config_path)?;
            config.set_value(&key, &value)?;
            config.save_to(config_path)?;
            println!("{}", format_success(&format!("Set {} = {}", key, value)));
        }
        ConfigCommands::Reset => {
            CliConfig::default().save_to(config_path)?;
            println!("{}", format_success("Configuration reset to defaults"));
        }
        ConfigCommands::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Handle copy-file command
pub fn handle_copy_file(inputs: &[String], output: &str) -> Result<()> {
    let copied = demos::copy::run(inputs, output)?;
    debug!(bytes = copied, "Copy finished");
    Ok(())
}

/// Handle color command
pub fn handle_color() -> Result<()> {
    demos::color::run(&mut std::io::stdout())
}

/// Handle pager command
pub fn handle_pager(config: &CliConfig) -> Result<()> {
    demos::pager::run(config.pager.as_deref())
}

/// Handle progress command
pub async fn handle_progress(count: u64) -> Result<()> {
    let committed = demos::progress::ProgressDemo::new(count)?.run().await?;
    debug!(count, committed, "Progress demo finished");
    Ok(())
}

/// Handle clear command
pub fn handle_clear() -> Result<()> {
    demos::screen::clear(&console::Term::stdout())
}

/// Handle pause command
pub fn handle_pause() -> Result<()> {
    demos::screen::pause(&console::Term::stdout())?;
    Ok(())
}

/// Handle menu command
pub fn handle_menu() -> Result<()> {
    demos::menu::run(&console::Term::stdout())
}

/// Generate shell completion scripts
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use firestore_tools_core::{FirestoreToolsError, MemoryCollection, MemoryDocument, MemoryStore};

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_collection(
                MemoryCollection::new("A")
                    .with_document(MemoryDocument::new("b").with_collection(
                        MemoryCollection::new("C").with_document(MemoryDocument::new("d")),
                    ))
                    .with_document(MemoryDocument::new("e")),
            )
            .with_collection(MemoryCollection::new("F"))
    }

    #[tokio::test]
    async fn test_run_walk_paths() {
        let mut out = Vec::new();
        let summary = run_walk(
            &store(),
            &NodePath::root(),
            WalkOptions::default(),
            &mut out,
            &OutputFormat::Paths,
        )
        .await
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "/A\n/A/b\n/A/b/C\n/A/b/C/d\n/A/e\n/F\n"
        );
        assert_eq!(summary.collections, 3);
        assert_eq!(summary.documents, 3);
    }

    #[tokio::test]
    async fn test_run_walk_keeps_output_before_failure() {
        let store = MemoryStore::new().with_collection(
            MemoryCollection::new("A")
                .with_document(MemoryDocument::new("a1"))
                .with_document(MemoryDocument::new("a2").failing())
                .with_document(MemoryDocument::new("a3")),
        );

        let mut out = Vec::new();
        let err = run_walk(
            &store,
            &NodePath::root(),
            WalkOptions::default(),
            &mut out,
            &OutputFormat::Paths,
        )
        .await
        .unwrap_err();

        assert_eq!(String::from_utf8(out).unwrap(), "/A\n/A/a1\n/A/a2\n");
        let core = err.downcast_ref::<FirestoreToolsError>().unwrap();
        assert_eq!(core.failing_path(), Some("/A/a2"));
    }

    #[tokio::test]
    async fn test_run_walk_text_from_document() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        run_walk(
            &store(),
            &NodePath::parse("/A/b").unwrap(),
            WalkOptions::default(),
            &mut out,
            &OutputFormat::Text,
        )
        .await
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Reading document: /A/b\nb\nReading collection: /A/b/C\nC\nReading document: /A/b/C/d\nd\n"
        );
    }

    #[test]
    fn test_handle_write() {
        assert!(handle_write("credential.json", "payload").is_ok());
    }

    #[test]
    fn test_absolute() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute(".").unwrap(), cwd.join("."));
        assert_eq!(absolute("/tmp").unwrap(), PathBuf::from("/tmp"));
    }

    #[test]
    fn test_handle_config_set_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.toml");
        let current = CliConfig::default();

        handle_config(
            ConfigCommands::Set {
                key: "project".to_string(),
                value: "demo".to_string(),
            },
            &current,
            &path,
            &OutputFormat::Text,
        )
        .unwrap();
        let saved = CliConfig::load_from(&path).unwrap();
        assert_eq!(saved.project.as_deref(), Some("demo"));

        let err = handle_config(
            ConfigCommands::Set {
                key: "timeout".to_string(),
                value: "999".to_string(),
            },
            &current,
            &path,
            &OutputFormat::Text,
        );
        assert!(err.is_err());

        handle_config(ConfigCommands::Reset, &current, &path, &OutputFormat::Text).unwrap();
        assert_eq!(CliConfig::load_from(&path).unwrap(), CliConfig::default());
    }

    #[test]
    fn test_handle_config_show_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.toml");

        handle_config(
            ConfigCommands::Show,
            &CliConfig::default(),
            &path,
            &OutputFormat::Json,
        )
        .unwrap();
        assert!(!path.exists());
    }
}
