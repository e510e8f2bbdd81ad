//! Sitebot CLI: runs the site directory bot over stdin/stdout.
//!
//! # Usage
//!
//! ```text
//! sitebot [--config <path>] [--log-level <filter>] [run]
//! sitebot [--config <path>] check
//! sitebot [--config <path>] exec <line...>
//! ```
//!
//! `run` reads one chat line per stdin line and writes each outbound
//! message on its own stdout line. Logs go to stderr.

mod host;

use std::io;
use std::path::PathBuf;
use std::process;

use sitebot_core::schema::SchemaRegistry;
use sitebot_core::settings;
use sitebot_core::transport::{LineSink, Plaintext};
use tracing_subscriber::EnvFilter;

use host::Host;


#[derive(Debug, PartialEq)]
enum Mode {
    Run,
    Check,
    Exec(String),
}

#[derive(Debug, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    log_level: Option<String>,
    mode: Mode,
}


fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("sitebot: {}", e);
            process::exit(2);
        }
    };
    init_logging(args.log_level.as_deref());

    let config_path = args.config.clone().unwrap_or_else(resolve_config_path);

    if args.mode == Mode::Check {
        match check_config(&config_path) {
            Ok(()) => println!("{}: ok", config_path.display()),
            Err(e) => {
                eprintln!("sitebot: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let mut host = match Host::start(&config_path, Box::new(Plaintext)) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("sitebot: failed to start: {}", e);
            process::exit(1);
        }
    };

    let mut sink = LineSink::new(io::stdout());
    let result = match args.mode {
        Mode::Exec(line) => host.handle(&line, &mut sink).map(|_| ()),
        _ => host.run(io::stdin().lock(), &mut sink),
    };
    if let Err(e) = result {
        eprintln!("sitebot: {}", e);
        process::exit(1);
    }
}


fn parse_args(argv: &[String]) -> Result<Args, String> {
    let mut config = None;
    let mut log_level = None;
    let mut mode = None;

    let mut i = 0;
    while i < argv.len() {
        match argv[i].as_str() {
            "--config" => {
                i += 1;
                config = Some(PathBuf::from(take_arg(argv, i, "--config")?));
            }
            "--log-level" => {
                i += 1;
                log_level = Some(take_arg(argv, i, "--log-level")?);
            }
            "run" => mode = Some(Mode::Run),
            "check" => mode = Some(Mode::Check),
            "exec" => {
                if i + 1 >= argv.len() {
                    return Err("Usage: sitebot exec <line...>".into());
                }
                mode = Some(Mode::Exec(argv[i + 1..].join(" ")));
                break;
            }
            other => return Err(format!("Unknown argument: '{}'", other)),
        }
        i += 1;
    }

    Ok(Args {
        config,
        log_level,
        mode: mode.unwrap_or(Mode::Run),
    })
}


fn take_arg(args: &[String], index: usize, flag: &str) -> Result<String, String> {
    args.get(index)
        .cloned()
        .ok_or_else(|| format!("{} requires a value", flag))
}


fn resolve_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("SITEBOT_CONFIG") {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("sitebot")
        .join("settings.yaml")
}


fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(l) => EnvFilter::try_new(l).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}


fn check_config(path: &std::path::Path) -> Result<(), String> {
    let settings = settings::load_or_default(path).map_err(|e| e.to_string())?;
    SchemaRegistry::from_settings(&settings).map_err(|e| e.to_string())?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn defaults_to_run() {
        let args = parse_args(&[]).unwrap();
        assert_eq!(args.mode, Mode::Run);
        assert!(args.config.is_none());
    }

    #[test]
    fn flags_and_exec() {
        let args = parse_args(&argv(&["--config", "/tmp/s.yaml", "exec", "!site", "foo"])).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/s.yaml")));
        assert_eq!(args.mode, Mode::Exec("!site foo".into()));
    }

    #[test]
    fn missing_flag_value() {
        assert!(parse_args(&argv(&["--config"])).is_err());
        assert!(parse_args(&argv(&["exec"])).is_err());
        assert!(parse_args(&argv(&["bogus"])).is_err());
    }

    #[test]
    fn check_reports_bad_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut s = settings::default_settings();
        s.layout.push(vec!["ghost".into()]);
        settings::save(&path, &s).unwrap();
        let err = check_config(&path).unwrap_err();
        assert!(err.contains("ghost"));
        assert!(check_config(&dir.path().join("absent.yaml")).is_ok());
    }

    #[test]
    fn resolve_config_path_from_env() {
        std::env::set_var("SITEBOT_CONFIG", "/tmp/test-sitebot.yaml");
        assert_eq!(resolve_config_path(), PathBuf::from("/tmp/test-sitebot.yaml"));
        std::env::remove_var("SITEBOT_CONFIG");
    }
}
