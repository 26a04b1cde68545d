//! Output formatting module for claude-server
//!
//! Human-readable colored output, or one JSON object per line with
//! `--output json`.

use colored::Colorize;
use serde_json::{json, Value};
use std::time::Instant;

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Verbosity level
    verbosity: u8,
    /// Start time for duration calculations
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            json_mode,
            verbosity,
            start_time: Instant::now(),
        }
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        if self.json_mode {
            return;
        }

        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {}  ", title).bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{}", line);
            println!("  {}  ", title);
            println!("{}\n", line);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print a success message (always shown)
    pub fn success(&self, message: &str) {
        if self.json_mode {
            println!("{}", json!({ "type": "success", "message": message }));
            return;
        }

        if self.use_color {
            println!("{} {}", "OK:".green().bold(), message);
        } else {
            println!("OK: {}", message);
        }
    }

    /// Print a key/value pair, such as a stack output (always shown)
    pub fn field(&self, key: &str, value: &str) {
        if self.json_mode {
            println!("{}", json!({ "type": "field", "key": key, "value": value }));
            return;
        }

        if self.use_color {
            println!("  {} {}", format!("{}:", key).bold(), value);
        } else {
            println!("  {}: {}", key, value);
        }
    }

    /// Print a structured document (always shown)
    pub fn document(&self, value: &Value) {
        if self.json_mode {
            println!("{}", value);
            return;
        }

        match serde_yaml::to_string(value) {
            Ok(yaml) => print!("{}", yaml),
            Err(_) => println!("{:#}", value),
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.json_mode {
            eprintln!("{}", json!({ "type": "error", "message": message }));
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            eprintln!("{}", json!({ "type": "warning", "message": message }));
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print a hint message
    pub fn hint(&self, message: &str) {
        if self.json_mode {
            eprintln!("{}", json!({ "type": "hint", "message": message }));
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "HINT:".cyan().bold(), message);
        } else {
            eprintln!("HINT: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 {
            return;
        }

        if self.json_mode {
            println!("{}", json!({ "type": "info", "message": message }));
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a debug message (requires higher verbosity)
    pub fn debug(&self, message: &str) {
        if self.verbosity < 2 {
            return;
        }

        if self.json_mode {
            println!("{}", json!({ "type": "debug", "message": message }));
            return;
        }

        if self.use_color {
            println!("{} {}", "DEBUG:".magenta(), message);
        } else {
            println!("DEBUG: {}", message);
        }
    }

    /// Print how long the command took (respects verbosity)
    pub fn elapsed(&self) {
        let secs = self.start_time.elapsed().as_secs_f64();
        self.info(&format!("Finished in {:.1}s", secs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_flag() {
        let output = OutputFormatter::new(false, false, 0);
        assert!(!output.use_color);
        assert!(!output.json_mode);
    }

    #[test]
    fn test_json_mode() {
        let output = OutputFormatter::new(true, true, 1);
        assert!(output.json_mode);
        assert_eq!(output.verbosity, 1);
    }
}
