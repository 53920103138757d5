use std::path::Path;

use crate::error::Error;

/// Name of the config file looked up in the document root.
pub const CONFIG_FILE: &str = ".docxref.toml";

/// Project configuration loaded from `.docxref.toml`.
/// Include/exclude patterns are path prefixes applied to document files.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path prefixes excluded from loading.
    #[serde(default)]
    exclude: Vec<String>,
    /// Footnote labelling.
    #[serde(default)]
    pub footnotes: FootnoteConfig,
    /// Target id assignment.
    #[serde(default)]
    pub ids: IdConfig,
    /// Path prefixes included in loading; empty means everything.
    #[serde(default)]
    include: Vec<String>,
}

/// `[footnotes]` table.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FootnoteConfig {
    /// Symbols handed out to auto-symbol footnotes, in order.
    /// Once exhausted they repeat doubled, then tripled, and so on.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
}

/// `[ids]` table.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdConfig {
    /// Derive ids from header text when no explicit id is given.
    #[serde(default = "default_true")]
    pub derive_header_ids: bool,
    /// Precedence of explicit ids over derived ones.
    #[serde(default = "default_explicit_precedence")]
    pub explicit_precedence: i32,
}

impl Config {
    /// Load config from `.docxref.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed.
    pub fn parse(content: &str) -> Result<Self, Error> {
        return Ok(toml::from_str(content)?);
    }

    /// Check whether a document path (relative to the root) should be loaded.
    ///
    /// A path is included if no include patterns are set (load everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_load(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

impl Default for FootnoteConfig {
    fn default() -> Self {
        return Self {
            symbols: default_symbols(),
        };
    }
}

impl FootnoteConfig {
    /// The label for the auto-symbol footnote at `index` (0-based).
    /// Symbols repeat with growing width once the list is exhausted:
    /// `*`, `†`, ..., `**`, `††`, ...
    pub fn symbol_at(&self, index: usize) -> String {
        let Some(count) = std::num::NonZeroUsize::new(self.symbols.len()) else {
            return index.saturating_add(1).to_string();
        };
        let width = (index / count).saturating_add(1);
        let symbol = self.symbols.get(index % count).map_or("*", String::as_str);
        return symbol.repeat(width);
    }
}

impl Default for IdConfig {
    fn default() -> Self {
        return Self {
            derive_header_ids: true,
            explicit_precedence: default_explicit_precedence(),
        };
    }
}

/// Explicit ids outrank derived ones.
const fn default_explicit_precedence() -> i32 {
    return 1;
}

/// Classic footnote symbol set.
fn default_symbols() -> Vec<String> {
    return ["*", "\u{2020}", "\u{2021}", "\u{a7}", "\u{b6}", "#", "\u{2660}", "\u{2665}", "\u{2666}", "\u{2663}"]
        .iter()
        .map(|s| return (*s).to_string())
        .collect();
}

/// Serde default for boolean switches that are on unless disabled.
const fn default_true() -> bool {
    return true;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.ids.derive_header_ids, "header ids not derived by default");
        assert_eq!(config.ids.explicit_precedence, 1);
        assert!(config.should_load("anything.json"), "default config filters documents");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "include = [").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))), "malformed config accepted");
    }

    #[test]
    fn include_and_exclude_prefixes() {
        let config = Config::parse("include = [\"guide/\"]\nexclude = [\"guide/drafts/\"]").unwrap();
        assert!(config.should_load("guide/intro.json"), "included path rejected");
        assert!(!config.should_load("guide/drafts/wip.json"), "excluded path accepted");
        assert!(!config.should_load("api/index.json"), "path outside include accepted");
    }

    #[test]
    fn tables_override_defaults() {
        let config = Config::parse("[ids]\nderive_header_ids = false\n\n[footnotes]\nsymbols = [\"a\", \"b\"]").unwrap();
        assert!(!config.ids.derive_header_ids, "derive_header_ids not overridden");
        assert_eq!(config.ids.explicit_precedence, 1);
        assert_eq!(config.footnotes.symbol_at(0), "a");
        assert_eq!(config.footnotes.symbol_at(3), "bb");
    }

    #[test]
    fn default_symbols_repeat_with_growing_width() {
        let footnotes = FootnoteConfig::default();
        assert_eq!(footnotes.symbol_at(0), "*");
        assert_eq!(footnotes.symbol_at(10), "**");
        assert_eq!(footnotes.symbol_at(21), "\u{2020}\u{2020}\u{2020}");
    }
}
