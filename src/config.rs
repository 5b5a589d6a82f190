use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::typed::{TypeStyle, DEFAULT_TYPE_CAPACITY};

/// Name of the optional per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = ".insertdox.json";

/// Run-wide settings. Loaded from `.insertdox.json` when present; command-line
/// flags override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File streamed verbatim into every generated or reformatted file header.
    pub boilerplate: Option<PathBuf>,
    /// Emit only function comments and prototypes.
    pub only_prototypes: bool,
    /// Bytes accumulated before a flush is forced regardless of lexical state.
    pub buffer_capacity: usize,
    /// Maximum length of a rendered type phrase; longer phrases are cut.
    pub type_capacity: usize,
    /// Render plain types as `a long` / `an int`.
    pub article_prefix: bool,
    /// Render mined `note:`/`nb:` comments as `@note` lines.
    pub render_notes: bool,
    pub temp_suffix: String,
    pub backup_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            boilerplate: None,
            only_prototypes: false,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            type_capacity: DEFAULT_TYPE_CAPACITY,
            article_prefix: false,
            render_notes: false,
            temp_suffix: ".tmp".to_string(),
            backup_suffix: ".bak".to_string(),
        }
    }
}

impl Config {
    /// Per-file options; `filename` feeds the generated `@file` tag.
    pub fn options_for(&self, filename: Option<&str>) -> Options {
        Options {
            filename: filename.map(str::to_string),
            boilerplate: self.boilerplate.clone(),
            only_prototypes: self.only_prototypes,
            render_notes: self.render_notes,
            buffer_capacity: self.buffer_capacity,
            type_style: TypeStyle {
                capacity: self.type_capacity,
                article: self.article_prefix,
            },
        }
    }
}

/// Immutable settings for processing one input stream.
#[derive(Debug, Clone)]
pub struct Options {
    pub filename: Option<String>,
    pub boilerplate: Option<PathBuf>,
    pub only_prototypes: bool,
    pub render_notes: bool,
    pub buffer_capacity: usize,
    pub type_style: TypeStyle,
}

impl Default for Options {
    fn default() -> Self {
        Config::default().options_for(None)
    }
}

pub fn load_config(dir: &Path) -> Config {
    let primary = dir.join(CONFIG_FILE_NAME);

    let text = std::fs::read_to_string(&primary);
    let Ok(text) = text else { return Config::default() };

    match serde_json::from_str::<Config>(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(path = %primary.display(), error = %e, "ignoring malformed config");
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(tmp.path());
        assert!(!cfg.only_prototypes);
        assert_eq!(cfg.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(cfg.backup_suffix, ".bak");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"{ "only_prototypes": true, "type_capacity": 32, "render_notes": true }"#,
        )
        .unwrap();
        let cfg = load_config(tmp.path());
        assert!(cfg.only_prototypes);
        assert_eq!(cfg.type_capacity, 32);
        assert!(cfg.render_notes);
        assert_eq!(cfg.temp_suffix, ".tmp");
    }

    #[test]
    fn malformed_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "{ nope").unwrap();
        assert!(!load_config(tmp.path()).only_prototypes);
    }

    #[test]
    fn options_carry_the_filename() {
        let cfg = Config {
            article_prefix: true,
            ..Config::default()
        };
        let opts = cfg.options_for(Some("main.c"));
        assert_eq!(opts.filename.as_deref(), Some("main.c"));
        assert!(opts.type_style.article);
        assert_eq!(opts.type_style.capacity, DEFAULT_TYPE_CAPACITY);
    }
}
