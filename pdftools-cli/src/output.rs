//! Message formatting and display.
//!
//! Status lines go to stdout, warnings and errors to stderr. Quiet mode keeps
//! only warnings and errors; verbose mode adds per-item details.
//!
//! # Examples
//!
//! ```ignore
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Processing files...");
//! formatter.success("Operation completed");
//! ```

use std::io::{self, IsTerminal, Write};
use std::ops::ControlFlow;

use pdftools::io::format_file_size;
use pdftools::{CancelFlag, Progress, ProgressSink};

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

/// Output formatter with configurable verbosity.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    quiet: bool,
    verbose: bool,
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - Suppress non-error output
    /// * `verbose` - Show verbose output
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: Self::should_use_color(),
        }
    }

    /// Create a quiet formatter (only warnings and errors).
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    /// Returns true if stdout is a TTY and TERM is set.
    fn should_use_color() -> bool {
        io::stdout().is_terminal() && std::env::var("TERM").is_ok()
    }

    /// Print an informational message. Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message. Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a warning message, even in quiet mode.
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    /// Print a debug message. Only displayed in verbose mode.
    pub fn debug(&self, message: &str) {
        if self.verbose {
            self.print_message(MessageLevel::Debug, message);
        }
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        let (prefix, color_code) = match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"), // Green
            MessageLevel::Warning => ("⚠ ", "\x1b[33m"), // Yellow
            MessageLevel::Error => ("✗ ", "\x1b[31m"),   // Red
            MessageLevel::Debug => ("→ ", "\x1b[36m"),   // Cyan
        };

        let line = if self.colored && !color_code.is_empty() {
            format!("{color_code}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        };

        match level {
            MessageLevel::Warning | MessageLevel::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }

    /// Print a section header. Suppressed in quiet mode.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n{title}");
        }
    }

    /// Print a labelled value. Only shown in verbose mode.
    pub fn detail(&self, label: &str, value: &str) {
        if self.verbose {
            println!("  {label}: {value}");
        }
    }

    /// Print a progress indicator. Suppressed in quiet mode.
    pub fn progress(&self, current: usize, total: usize, message: Option<&str>) {
        if !self.quiet {
            let msg = message.unwrap_or("");
            print!("\r\x1b[K  [{current}/{total}] {msg}");
            io::stdout().flush().ok();

            if current == total {
                println!();
            }
        }
    }

    /// Print a blank line. Suppressed in quiet mode.
    pub fn blank_line(&self) {
        if !self.quiet {
            println!();
        }
    }

    /// Print a numbered list item. Suppressed in quiet mode.
    pub fn list_item(&self, index: usize, message: &str) {
        if !self.quiet {
            println!("  {index}. {message}");
        }
    }

    pub fn should_print(&self) -> bool {
        !self.quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// Progress sink that prints checkpoints and honours a cancel flag.
#[derive(Debug, Clone)]
pub struct ConsoleProgress {
    formatter: OutputFormatter,
    cancel: CancelFlag,
}

impl ConsoleProgress {
    pub fn new(formatter: OutputFormatter, cancel: CancelFlag) -> Self {
        Self { formatter, cancel }
    }

    fn describe(&self, event: &Progress<'_>) {
        match *event {
            Progress::DocumentLoaded {
                index,
                total,
                path,
                pages,
            } => {
                let name = display_name(path);
                self.formatter
                    .progress(index + 1, total, Some(&format!("{name} ({pages} pages)")));
            }
            Progress::ImageOccurrence { page, object_id } => {
                self.formatter.debug(&format!(
                    "Page {page}: image {} {} R",
                    object_id.0, object_id.1
                ));
            }
            Progress::ImageProcessed { from, to, .. } => {
                self.formatter.debug(&format!(
                    "  {}x{} -> {}x{}",
                    from.0, from.1, to.0, to.1
                ));
            }
            Progress::ImagePlaced {
                index,
                total,
                path,
                width,
                height,
            } => {
                let name = display_name(path);
                self.formatter
                    .progress(index + 1, total, Some(&format!("{name} ({width}x{height})")));
            }
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&mut self, event: &Progress<'_>) -> ControlFlow<()> {
        if self.cancel.is_cancelled() {
            return ControlFlow::Break(());
        }
        self.describe(event);
        ControlFlow::Continue(())
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable size of a file on disk, or "unknown".
pub fn file_size_label(path: &std::path::Path) -> String {
    std::fs::metadata(path)
        .map(|meta| format_file_size(meta.len()))
        .unwrap_or_else(|_| "unknown".to_string())
}
