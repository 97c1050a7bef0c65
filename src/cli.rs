//! Command-line interface module for mediasort.
//!
//! This module handles:
//! - Argument parsing (clap)
//! - Loading settings and opening sessions
//! - The interactive key loop that drives a session
//! - Reporting results through [`OutputFormatter`]

use crate::category::CategoryRegistry;
use crate::config::Settings;
use crate::error::SortError;
use crate::output::OutputFormatter;
use crate::scanner;
use crate::session::{Session, SessionOptions};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "mediasort")]
#[command(about = "Triage media files into numbered category folders, with undo", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to .mediasortrc.toml, then ~/.config/mediasort/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the category folders (overrides the settings file)
    #[arg(long, global = true)]
    pub sorted_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sort a folder interactively, reading one key per line from stdin
    Session {
        /// Folder with the files to sort
        source: PathBuf,
    },

    /// List the files that still need sorting
    Scan {
        /// Folder with the files to sort
        source: PathBuf,

        /// Print JSON instead of a list
        #[arg(long)]
        json: bool,
    },

    /// List the category folders
    Categories {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Create the next category folder
    NewCategory {
        /// Optional description appended to the folder name
        description: Vec<String>,
    },

    /// Print the effective settings as TOML
    Config,
}

/// One line of input in an interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCommand {
    /// `0`-`9`: copy the current file into that category
    Classify(u32),
    /// `n [description]`: create a category
    NewCategory(Option<String>),
    /// `u`: undo the last copy
    Undo,
    /// `c`: list categories
    Categories,
    /// `h`: show undo history
    History,
    /// `r`: rescan the source folder
    Rescan,
    /// `?`: show the key help
    Help,
    /// `q` or `esc`: end the session
    Quit,
}

impl KeyCommand {
    /// Parses one input line. Returns `None` for anything unrecognised.
    ///
    /// ```
    /// use mediasort::cli::KeyCommand;
    ///
    /// assert_eq!(KeyCommand::parse("7"), Some(KeyCommand::Classify(7)));
    /// assert_eq!(
    ///     KeyCommand::parse("n cute cats"),
    ///     Some(KeyCommand::NewCategory(Some("cute cats".to_string())))
    /// );
    /// assert_eq!(KeyCommand::parse("12"), None);
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        if head.len() == 1
            && rest.is_empty()
            && let Some(digit) = head.chars().next().and_then(|c| c.to_digit(10))
        {
            return Some(Self::Classify(digit));
        }

        match (head, rest.is_empty()) {
            ("n", _) => Some(Self::NewCategory(
                (!rest.is_empty()).then(|| rest.to_string()),
            )),
            ("u", true) => Some(Self::Undo),
            ("c", true) => Some(Self::Categories),
            ("h", true) => Some(Self::History),
            ("r", true) => Some(Self::Rescan),
            ("?", true) => Some(Self::Help),
            ("q" | "esc" | "quit", true) => Some(Self::Quit),
            _ => None,
        }
    }
}

const KEY_HELP: &str = "Keys: 0-9 copy to category | n [desc] new category | u undo | c categories | h history | r rescan | q quit";

/// Runs a parsed command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use mediasort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["mediasort", "scan", "/home/me/Camera"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let mut settings = Settings::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    if let Some(sorted_root) = cli.sorted_root {
        settings.session.sorted_root = sorted_root;
    }
    let sorted_root = settings.sorted_root();

    match cli.command {
        Command::Session { source } => {
            let mut session = open_session(&source, &settings)?;
            let stdin = std::io::stdin();
            run_interactive(&mut session, stdin.lock())
        }
        Command::Scan { source, json } => scan_directory(&source, &settings, json),
        Command::Categories { json } => list_categories(&sorted_root, json),
        Command::NewCategory { description } => {
            let description = description.join(" ");
            let folder = CategoryRegistry::create_category(&sorted_root, Some(description.as_str()))
                .map_err(|e| e.to_string())?;
            OutputFormatter::success(&format!(
                "Created {} (key {})",
                folder.path.display(),
                folder.id
            ));
            Ok(())
        }
        Command::Config => {
            let text = settings.to_toml().map_err(|e| e.to_string())?;
            OutputFormatter::plain(&text);
            Ok(())
        }
    }
}

/// Opens a session over `source` using the loaded settings.
pub fn open_session(source: &Path, settings: &Settings) -> Result<Session, String> {
    let options = SessionOptions::from_settings(settings)
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    Session::open(source, &settings.sorted_root(), options).map_err(|e| e.to_string())
}

/// Drives a session from line-oriented input until `q` or end of input.
///
/// Unknown category numbers are ignored silently; every other failure is
/// reported and the loop carries on.
pub fn run_interactive<R: BufRead>(session: &mut Session, input: R) -> Result<(), String> {
    OutputFormatter::info(&format!(
        "Sorting {} into {}",
        session.source_dir().display(),
        session.sorted_root().display()
    ));
    OutputFormatter::plain(KEY_HELP);
    OutputFormatter::current_entry(session.current_entry(), session.position());

    for line in input.lines() {
        let line = line.map_err(|e| format!("Error reading input: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = KeyCommand::parse(&line) else {
            OutputFormatter::warning(&format!("Unknown key '{}'. Type ? for help.", line.trim()));
            continue;
        };
        if command == KeyCommand::Quit {
            break;
        }
        apply_key(session, command);
    }

    OutputFormatter::info("Session ended.");
    Ok(())
}

fn apply_key(session: &mut Session, command: KeyCommand) {
    match command {
        KeyCommand::Classify(number) => match session.classify(number) {
            Ok(Some(action)) => OutputFormatter::classified(&action),
            Ok(None) => {}
            Err(e) if e.is_ignorable() => {}
            Err(e) => OutputFormatter::error(&e.to_string()),
        },
        KeyCommand::Undo => match session.undo_last() {
            Ok(Some(action)) => OutputFormatter::undone(&action),
            Ok(None) => OutputFormatter::info("Nothing to undo."),
            Err(e @ SortError::UndoTargetMissing { .. }) => {
                OutputFormatter::warning(&e.to_string())
            }
            Err(e) => OutputFormatter::error(&e.to_string()),
        },
        KeyCommand::NewCategory(description) => {
            match session.create_category(description.as_deref()) {
                Ok(folder) => OutputFormatter::success(&format!(
                    "Created {} (key {})",
                    folder.name(),
                    folder.id
                )),
                Err(e) => OutputFormatter::error(&e.to_string()),
            }
            return;
        }
        KeyCommand::Categories => {
            match session.categories() {
                Ok(folders) => OutputFormatter::category_table(&folders),
                Err(e) => OutputFormatter::error(&e.to_string()),
            }
            return;
        }
        KeyCommand::History => {
            OutputFormatter::history(session.history());
            return;
        }
        KeyCommand::Rescan => {
            if let Err(e) = session.rescan() {
                OutputFormatter::error(&e.to_string());
            }
        }
        KeyCommand::Help => {
            OutputFormatter::plain(KEY_HELP);
            return;
        }
        KeyCommand::Quit => return,
    }
    OutputFormatter::current_entry(session.current_entry(), session.position());
}

fn scan_directory(source: &Path, settings: &Settings, json: bool) -> Result<(), String> {
    let filters = settings
        .filters
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let entries = scanner::scan(
        source,
        &settings.sorted_root(),
        &settings.kind_mapper(),
        &filters,
    )
    .map_err(|e| e.to_string())?;

    if json {
        let text = serde_json::to_string_pretty(&entries).map_err(|e| e.to_string())?;
        OutputFormatter::plain(&text);
    } else {
        OutputFormatter::info(&format!("Files to sort in {}:", source.display()));
        OutputFormatter::entry_list(&entries);
    }
    Ok(())
}

fn list_categories(sorted_root: &Path, json: bool) -> Result<(), String> {
    let folders = CategoryRegistry::list_categories(sorted_root).map_err(|e| e.to_string())?;
    if json {
        let text = serde_json::to_string_pretty(&folders).map_err(|e| e.to_string())?;
        OutputFormatter::plain(&text);
    } else {
        OutputFormatter::category_table(&folders);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_parse_digits() {
        assert_eq!(KeyCommand::parse("0"), Some(KeyCommand::Classify(0)));
        assert_eq!(KeyCommand::parse(" 9 "), Some(KeyCommand::Classify(9)));
        assert_eq!(KeyCommand::parse("10"), None);
        assert_eq!(KeyCommand::parse("1 x"), None);
    }

    #[test]
    fn test_parse_words() {
        assert_eq!(KeyCommand::parse("n"), Some(KeyCommand::NewCategory(None)));
        assert_eq!(
            KeyCommand::parse("n   dogs "),
            Some(KeyCommand::NewCategory(Some("dogs".to_string())))
        );
        assert_eq!(KeyCommand::parse("u"), Some(KeyCommand::Undo));
        assert_eq!(KeyCommand::parse("esc"), Some(KeyCommand::Quit));
        assert_eq!(KeyCommand::parse("u now"), None);
        assert_eq!(KeyCommand::parse("x"), None);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["mediasort", "--sorted-root", "/tmp/s", "scan", "/tmp/in"]);
        assert_eq!(cli.sorted_root, Some(PathBuf::from("/tmp/s")));
        assert!(matches!(cli.command, Command::Scan { json: false, .. }));

        let cli = Cli::parse_from(["mediasort", "new-category", "cute", "cats"]);
        match cli.command {
            Command::NewCategory { description } => assert_eq!(description, ["cute", "cats"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_interactive_loop_drives_session() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("inbox");
        let sorted = temp_dir.path().join("Sorted_Media");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("a.jpg"), "a").unwrap();
        fs::write(source.join("b.mp3"), "b").unwrap();

        let mut session = Session::open(&source, &sorted, SessionOptions::default()).unwrap();
        let input = Cursor::new("n cats\n5\n1\nbogus\n1\nu\nh\nq\n1\n");
        run_interactive(&mut session, input).expect("loop failed");

        // "5" is ignored, both files are copied, the second copy is undone,
        // and input after "q" is never read.
        assert!(sorted.join("Category_1_cats").join("a.jpg").exists());
        assert!(!sorted.join("Category_1_cats").join("b.mp3").exists());
        assert_eq!(
            session.current_entry().map(|e| e.file_name()).as_deref(),
            Some("b.mp3")
        );
    }
}
