use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use insertdox::config::load_config;
use insertdox::error::Error;
use insertdox::rewrite::{rewrite_file, rewrite_stdio};
use std::ffi::OsString;
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "insertdox")]
#[command(version, disable_version_flag = true, disable_help_flag = true)]
#[command(about = "Insert Doxygen comment blocks into C sources")]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    /// Print version and usage information
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
    help: bool,

    /// Only output function comments and prototypes
    #[arg(short = 'p', long = "prototypes")]
    prototypes: bool,

    /// File copied into every file header
    #[arg(short = 'b', long = "boilerplate", value_name = "FILE", allow_hyphen_values = true)]
    boilerplate: Option<PathBuf>,

    /// Files to rewrite in place; standard input is used when none are given
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,
}

/// Recognises `-p`, `-vp`, `-pb FILE`, `-bFILE` and the like. Returns whether
/// the `-b` value is the next argument.
fn short_cluster(arg: &str) -> Option<bool> {
    let flags = arg.strip_prefix('-').filter(|f| !f.is_empty() && !f.starts_with('-'))?;
    for (i, c) in flags.char_indices() {
        match c {
            'v' | 'h' | 'p' => {}
            'b' => return Some(i + 1 == flags.len()),
            _ => return None,
        }
    }
    Some(false)
}

/// Drops unrecognised options (reporting each one) so that a typo never stops
/// the files that follow from being processed.
fn strip_unknown_options(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut kept = Vec::new();
    let mut args = args.into_iter();
    if let Some(program) = args.next() {
        kept.push(program);
    }
    while let Some(arg) = args.next() {
        let text = arg.to_string_lossy().into_owned();
        if text == "--" {
            kept.push(arg);
            kept.extend(args.by_ref());
            break;
        }
        if !text.starts_with('-') || text == "-" {
            kept.push(arg);
            continue;
        }
        match text.as_str() {
            "--boilerplate" => {
                kept.push(arg);
                kept.extend(args.next());
            }
            "--version" | "--help" | "--prototypes" => kept.push(arg),
            t if t.starts_with("--boilerplate=") => kept.push(arg),
            t => match short_cluster(t) {
                Some(value_follows) => {
                    kept.push(arg);
                    if value_follows {
                        kept.extend(args.next());
                    }
                }
                None => eprintln!("### error: unknown option '{t}' given to insertdox"),
            },
        }
    }
    kept
}

fn print_version() {
    eprintln!("{}, version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}

fn run() -> Result<i32> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("insertdox=warn".parse()?))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<OsString> = std::env::args_os().collect();
    let any_args = args.len() > 1;
    let cli = Cli::parse_from(strip_unknown_options(args));

    if cli.version || cli.help {
        print_version();
    }
    if cli.help {
        eprintln!("{}", Cli::command().render_help());
    }
    // Arguments that were only informational (or unknown) mean there is
    // nothing to process, not "read standard input".
    if any_args && cli.files.is_empty() && !cli.prototypes && cli.boilerplate.is_none() {
        return Ok(0);
    }

    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let mut config = load_config(&cwd);
    if cli.prototypes {
        config.only_prototypes = true;
    }
    if cli.boilerplate.is_some() {
        config.boilerplate = cli.boilerplate;
    }

    if let Some(path) = &config.boilerplate {
        if let Err(source) = File::open(path) {
            let err = Error::Boilerplate {
                path: path.clone(),
                source,
            };
            eprintln!("### error: {err}");
            return Ok(err.exit_code());
        }
    }

    if cli.files.is_empty() {
        return Ok(match rewrite_stdio(&config) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("### error: {err}");
                err.exit_code()
            }
        });
    }

    let mut status = 0;
    for path in &cli.files {
        let Err(err) = rewrite_file(path, &config) else {
            continue;
        };
        eprintln!("### error: {err}");
        if status == 0 {
            status = err.exit_code();
        }
        if err.is_fatal() {
            break;
        }
    }
    Ok(status)
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("### error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(args: &[&str]) -> Vec<String> {
        strip_unknown_options(args.iter().map(OsString::from))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn unknown_flags_are_dropped() {
        assert_eq!(strip(&["insertdox", "-x", "a.c", "--frob"]), vec!["insertdox", "a.c"]);
    }

    #[test]
    fn boilerplate_value_is_kept_even_if_it_looks_like_a_flag() {
        assert_eq!(
            strip(&["insertdox", "-b", "-odd.txt", "-p", "a.c"]),
            vec!["insertdox", "-b", "-odd.txt", "-p", "a.c"]
        );
        assert_eq!(strip(&["insertdox", "--boilerplate=x"]), vec!["insertdox", "--boilerplate=x"]);
    }

    #[test]
    fn short_flags_may_be_clustered() {
        assert_eq!(short_cluster("-p"), Some(false));
        assert_eq!(short_cluster("-pb"), Some(true));
        assert_eq!(short_cluster("-bhdr.txt"), Some(false));
        assert_eq!(short_cluster("-px"), None);
        assert_eq!(short_cluster("--p"), None);
        assert_eq!(
            strip(&["insertdox", "-pb", "hdr.txt", "a.c"]),
            vec!["insertdox", "-pb", "hdr.txt", "a.c"]
        );
    }

    #[test]
    fn double_dash_ends_option_parsing() {
        assert_eq!(strip(&["insertdox", "--", "-weird.c"]), vec!["insertdox", "--", "-weird.c"]);
    }

    #[test]
    fn informational_flags_do_not_exit() {
        let cli = Cli::parse_from(["insertdox", "-v", "-h", "a.c"]);
        assert!(cli.version && cli.help);
        assert_eq!(cli.files, vec![PathBuf::from("a.c")]);
    }

    #[test]
    fn cli_parses_known_flags() {
        let cli = Cli::parse_from(["insertdox", "-p", "-b", "bp.txt", "a.c", "b.c"]);
        assert!(cli.prototypes);
        assert_eq!(cli.boilerplate, Some(PathBuf::from("bp.txt")));
        assert_eq!(cli.files.len(), 2);
    }
}
