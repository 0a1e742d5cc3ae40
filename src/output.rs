//! # Output Configuration
//!
//! Controls how the CLI decorates what it prints: emoji markers and colored
//! `+`/`-` lines for plans.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colors
//! - `CLICOLOR_FORCE=1` forces colors even in non-TTY
//! - `TERM=dumb` disables colors
//!
//! ```rust,ignore
//! use community_sync::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Planning teams...", emoji(&out, "🔍", "[PLAN]"));
//! println!("{}", out.added("grant push on site"));
//! ```

use std::env;

use console::style;

/// Whether colors and emojis are used.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolves the `--color` flag against the environment.
    ///
    /// `always` and `never` win over the environment; anything else is
    /// treated as `auto`.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables, even when empty.
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// A planned addition, `+ text`, green when colored.
    pub fn added(&self, text: &str) -> String {
        let line = format!("  + {}", text);
        if self.use_color {
            style(line).green().force_styling(true).to_string()
        } else {
            line
        }
    }

    /// A planned removal, `- text`, red when colored.
    pub fn removed(&self, text: &str) -> String {
        let line = format!("  - {}", text);
        if self.use_color {
            style(line).red().force_styling(true).to_string()
        } else {
            line
        }
    }

    /// A bold heading line.
    pub fn heading(&self, text: &str) -> String {
        if self.use_color {
            style(text).bold().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colors are enabled, the plain marker otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}
