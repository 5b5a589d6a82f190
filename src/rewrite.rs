//! Runs the annotator over standard streams or over files in place.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use crate::annotate::process;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::text::filename_from_path;

/// Standard input to standard output. The header names the file `<unknown>`.
pub fn rewrite_stdio(config: &Config) -> Result<()> {
    let options = config.options_for(None);
    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    process(stdin, stdout, &options)?;
    Ok(())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Rewrites `path` through a temporary sibling, keeping the original as a
/// backup. Nothing is renamed unless processing completed.
pub fn rewrite_file(path: &Path, config: &Config) -> Result<()> {
    let display = path.to_string_lossy();
    let options = config.options_for(Some(filename_from_path(&display)));

    let input = File::open(path).map_err(|source| Error::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    let temp = with_suffix(path, &config.temp_suffix);
    let output = File::create(&temp).map_err(|source| Error::OpenOutput {
        path: temp.clone(),
        source,
    })?;

    tracing::info!(path = %path.display(), "annotating");
    process(input, BufWriter::new(output), &options)?
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?;

    let backup = with_suffix(path, &config.backup_suffix);
    fs::rename(path, &backup).map_err(|source| Error::Backup {
        from: path.to_path_buf(),
        to: backup.clone(),
        source,
    })?;
    fs::rename(&temp, path).map_err(|source| Error::Rename {
        from: temp.clone(),
        to: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), backup = %backup.display(), "annotated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SOURCE: &str = "int add(int a, int b) { return a+b; }\n";

    fn scratch(name: &str, text: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(name);
        fs::write(&path, text).unwrap();
        (tmp, path)
    }

    #[test]
    fn rewrites_in_place_and_keeps_a_backup() {
        let (_tmp, path) = scratch("add.c", SOURCE);
        rewrite_file(&path, &Config::default()).unwrap();

        let out = fs::read_to_string(&path).unwrap();
        assert!(out.starts_with("/**\n\t@file add.c\n"));
        assert!(out.contains("\t@retval a+b\n"));
        assert!(out.ends_with(SOURCE));
        assert_eq!(fs::read_to_string(with_suffix(&path, ".bak")).unwrap(), SOURCE);
        assert!(!with_suffix(&path, ".tmp").exists());
    }

    #[test]
    fn suffixes_come_from_config() {
        let (_tmp, path) = scratch("s.c", SOURCE);
        let cfg = Config {
            temp_suffix: ".work".to_string(),
            backup_suffix: ".orig".to_string(),
            ..Config::default()
        };
        rewrite_file(&path, &cfg).unwrap();
        assert!(with_suffix(&path, ".orig").exists());
        assert!(!with_suffix(&path, ".bak").exists());
        assert!(!with_suffix(&path, ".work").exists());
    }

    #[test]
    fn missing_input_is_an_open_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.c");
        let err = rewrite_file(&path, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::OpenInput { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(!with_suffix(&path, ".tmp").exists());
    }

    #[test]
    fn unwritable_temp_leaves_original_alone() {
        let (_tmp, path) = scratch("busy.c", SOURCE);
        fs::create_dir(with_suffix(&path, ".tmp")).unwrap();

        let err = rewrite_file(&path, &Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
        assert!(!with_suffix(&path, ".bak").exists());
    }

    #[test]
    fn failed_processing_renames_nothing() {
        let (tmp, path) = scratch("bp.c", SOURCE);
        let cfg = Config {
            boilerplate: Some(tmp.path().join("missing.txt")),
            ..Config::default()
        };
        let err = rewrite_file(&path, &cfg).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
        assert!(!with_suffix(&path, ".bak").exists());
        assert!(with_suffix(&path, ".tmp").exists());
    }

    #[test]
    fn suffix_is_appended_not_substituted() {
        assert_eq!(with_suffix(Path::new("dir/a.c"), ".bak"), PathBuf::from("dir/a.c.bak"));
    }
}
