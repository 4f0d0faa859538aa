//! tracing-subscriber setup for the desk.
//!
//! A plain level (`[service] log_level`, `RECEPCION_LOG_LEVEL` or `-v`)
//! applies to this crate's own events. Dependencies (hyper, reqwest, axum,
//! rusqlite) are held at `warn` or quieter, so request plumbing does not
//! bury desk events at `debug`. A full `EnvFilter` directive is used as given.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Target of every event emitted by this crate, library and binary alike.
const CRATE_TARGET: &str = "recepcion_bot";

/// Loudest level a dependency may log at.
const DEPENDENCY_CEILING: LevelFilter = LevelFilter::WARN;

/// Install the global subscriber, writing to stderr.
///
/// `from_cli` marks a level given on the command line, which beats
/// `RUST_LOG`; a configured level yields to `RUST_LOG`. A second call keeps
/// the subscriber already installed.
pub fn init(level: &str, from_cli: bool) -> Result<(), AppError> {
    let env = EnvFilter::try_from_default_env().ok();
    let filter = match (filter_for(level), env) {
        (Ok(_), Some(env)) if !from_cli => env,
        (Ok(configured), _) => configured,
        (Err(_), Some(env)) => env,
        (Err(e), None) => return Err(e),
    };

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("subscriber already installed");
    }
    Ok(())
}

/// `EnvFilter` directive for `level`: the crate at `level`, everything else
/// at the quieter of `level` and `warn`.
pub fn directive(level: &str) -> String {
    let level = level.trim();
    match parse_level(level) {
        Ok(own) => {
            let rest = own.min(DEPENDENCY_CEILING);
            format!("{},{CRATE_TARGET}={}", name(rest), name(own))
        }
        Err(_) => level.to_string(),
    }
}

fn filter_for(level: &str) -> Result<EnvFilter, AppError> {
    EnvFilter::try_new(directive(level))
        .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
}

fn name(level: LevelFilter) -> String {
    level.to_string().to_lowercase()
}

/// Parse a plain level string (`"error"` … `"trace"`, `"off"`).
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_level_scopes_to_the_crate() {
        assert_eq!(directive("debug"), "warn,recepcion_bot=debug");
        assert_eq!(directive(" TRACE "), "warn,recepcion_bot=trace");
        assert_eq!(directive("info"), "warn,recepcion_bot=info");
    }

    #[test]
    fn quiet_levels_stay_quiet_everywhere() {
        assert_eq!(directive("error"), "error,recepcion_bot=error");
        assert_eq!(directive("off"), "off,recepcion_bot=off");
    }

    #[test]
    fn full_directives_pass_through() {
        assert_eq!(directive("recepcion_bot=trace,axum=info"), "recepcion_bot=trace,axum=info");
        assert!(filter_for("recepcion_bot=trace,axum=info").is_ok());
        assert!(filter_for("recepcion_bot=verbose").is_err());
    }

    #[test]
    fn parse_level_rejects_unknown() {
        assert!(parse_level("warn").is_ok());
        assert!(parse_level("verbose").is_err());
        assert!(parse_level("").is_err());
    }

    #[test]
    fn second_init_is_harmless() {
        init("info", true).unwrap();
        init("debug", true).unwrap();
    }
}
