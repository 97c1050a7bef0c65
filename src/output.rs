//! Output formatting and styling module.
//!
//! Every message the command line prints goes through [`OutputFormatter`], so
//! the engine modules themselves never write to the terminal.

use crate::category::CategoryFolder;
use crate::classifier::Action;
use crate::media_kind::MediaKind;
use crate::scanner::MediaEntry;
use colored::*;

/// Prints CLI messages with consistent styling.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use mediasort::output::OutputFormatter;
    /// OutputFormatter::success("Copied a.jpg to Category_1_cats");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the file under review with its position in the working set.
    pub fn current_entry(entry: Option<&MediaEntry>, position: (usize, usize)) {
        match entry {
            Some(entry) => {
                let (index, total) = position;
                println!(
                    "[{}/{}] {}: {}",
                    index + 1,
                    total,
                    Self::kind_label(entry.kind),
                    entry.file_name().bold()
                );
            }
            None => Self::info("Nothing left to sort."),
        }
    }

    /// Prints one line per entry of a working set.
    pub fn entry_list(entries: &[MediaEntry]) {
        if entries.is_empty() {
            Self::info("No files waiting to be sorted.");
            return;
        }
        for entry in entries {
            println!(" - {} {}", Self::kind_label(entry.kind), entry.file_name());
        }
        println!("{} file(s) to sort", entries.len().to_string().green());
    }

    /// Prints the category folders with the number of files in each.
    pub fn category_table(folders: &[CategoryFolder]) {
        Self::header("CATEGORIES");
        if folders.is_empty() {
            println!("No categories yet.");
            return;
        }

        let max_name_len = folders
            .iter()
            .map(|folder| folder.name().len())
            .max()
            .unwrap_or(0)
            .max(6); // At least "Folder" width

        println!(
            "{:>4} | {:<width$} | {}",
            "Key".bold(),
            "Folder".bold(),
            "Files".bold(),
            width = max_name_len
        );
        println!("{}", "-".repeat(max_name_len + 17));

        for folder in folders {
            let count = folder.file_count();
            println!(
                "{:>4} | {:<width$} | {} {}",
                folder.id,
                folder.name(),
                count.to_string().green(),
                if count == 1 { "file" } else { "files" },
                width = max_name_len
            );
        }
    }

    /// Prints the undo history, newest first.
    pub fn history<'a>(actions: impl Iterator<Item = &'a Action>) {
        Self::header("UNDO HISTORY");
        let mut empty = true;
        for action in actions {
            empty = false;
            println!(
                "  {} {} → Category {}",
                action.performed_at.format("%H:%M:%S").to_string().dimmed(),
                action.file_name(),
                action.category_id
            );
        }
        if empty {
            println!("Nothing to undo.");
        }
    }

    /// Confirms a classification.
    pub fn classified(action: &Action) {
        let folder = action
            .destination_path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::success(&format!("Copied {} to {}/", action.file_name(), folder));
    }

    /// Confirms an undo.
    pub fn undone(action: &Action) {
        Self::success(&format!("Undid: {}", action.file_name()));
    }

    fn kind_label(kind: MediaKind) -> ColoredString {
        match kind {
            MediaKind::Image => kind.label().magenta(),
            MediaKind::Video => kind.label().blue(),
            MediaKind::Audio => kind.label().yellow(),
        }
    }
}
