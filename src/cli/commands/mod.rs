pub mod collectors;

use crate::cli::built_info;
use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

fn long_version() -> &'static str {
    let version = built_info::GIT_COMMIT_HASH_SHORT.map_or_else(
        || env!("CARGO_PKG_VERSION").to_string(),
        |hash| format!("{} - {hash}", env!("CARGO_PKG_VERSION")),
    );
    Box::leak(version.into_boxed_str())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let cmd = Command::new("mariadb_integration")
        .about("MariaDB/MySQL metrics and inventory sampler")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version())
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("hostname")
                .long("hostname")
                .help("Hostname or IP where the server is running")
                .env("MARIADB_HOSTNAME")
                .default_value("localhost"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .help("Port on which the server is listening")
                .env("MARIADB_PORT")
                .default_value("3306")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("username")
                .long("username")
                .help("Username for accessing the database")
                .env("MARIADB_USERNAME")
                .default_value(""),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Password for the given user")
                .env("MARIADB_PASSWORD")
                .hide_env_values(true)
                .default_value(""),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .help("Database name")
                .env("MARIADB_DATABASE")
                .default_value(""),
        )
        .arg(
            Arg::new("remote-monitoring")
                .long("remote-monitoring")
                .help("Publish under a host:port entity instead of the local host")
                .env("MARIADB_REMOTE_MONITORING")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("extended-metrics")
                .long("extended-metrics")
                .help("Enable extended metrics (handlers, temporary tables, sorts)")
                .env("MARIADB_EXTENDED_METRICS")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("old-passwords")
                .long("old-passwords")
                .help("Allow legacy password authentication")
                .env("MARIADB_OLD_PASSWORDS")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("all")
                .long("all")
                .help("Publish metrics and inventory [default]")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("metrics")
                .long("metrics")
                .help("Publish only metrics")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("inventory")
                .long("inventory")
                .help("Publish only inventory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .help("Pretty-print the JSON output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cache-path")
                .long("cache-path")
                .help("File holding previous counter values [default: <temp dir>/mariadb_integration/<entity>.json]")
                .env("NRIA_CACHE_PATH"),
        )
        .arg(
            Arg::new("cache-ttl")
                .long("cache-ttl")
                .help("Seconds after which cached counter values are discarded")
                .env("NRIA_CACHE_TTL")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("counter-reset")
                .long("counter-reset")
                .help("What to publish when a counter went backwards")
                .value_parser(["zero", "skip"])
                .default_value("zero"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity, -vv for debug")
                .action(ArgAction::Count),
        );

    collectors::add_collectors_args(cmd)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(
            [
                "MARIADB_HOSTNAME",
                "MARIADB_PORT",
                "MARIADB_USERNAME",
                "NRIA_CACHE_PATH",
                "NRIA_CACHE_TTL",
            ],
            || {
                let matches = new().get_matches_from(vec!["mariadb_integration"]);

                assert_eq!(
                    matches.get_one::<String>("hostname").map(String::as_str),
                    Some("localhost")
                );
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(3306));
                assert_eq!(
                    matches.get_one::<String>("username").map(String::as_str),
                    Some("")
                );
                assert_eq!(matches.get_one::<u64>("cache-ttl").copied(), Some(3600));
                assert!(matches.get_one::<String>("cache-path").is_none());
                assert_eq!(
                    matches.get_one::<String>("counter-reset").map(String::as_str),
                    Some("zero")
                );
                assert!(!matches.get_flag("remote-monitoring"));
                assert_eq!(matches.get_count("verbose"), 0);
            },
        );
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("MARIADB_HOSTNAME", Some("db.example.com")),
                ("MARIADB_PORT", Some("3307")),
                ("MARIADB_REMOTE_MONITORING", Some("true")),
                ("NRIA_CACHE_PATH", Some("/var/cache/mysql.json")),
            ],
            || {
                let matches = new().get_matches_from(vec!["mariadb_integration"]);

                assert_eq!(
                    matches.get_one::<String>("hostname").map(String::as_str),
                    Some("db.example.com")
                );
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(3307));
                assert!(matches.get_flag("remote-monitoring"));
                assert_eq!(
                    matches.get_one::<String>("cache-path").map(String::as_str),
                    Some("/var/cache/mysql.json")
                );
            },
        );
    }

    #[test]
    fn test_invalid_port() {
        let result = new().try_get_matches_from(vec!["mariadb_integration", "--port", "70000"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_cache_ttl_rejected() {
        let result = new().try_get_matches_from(vec!["mariadb_integration", "--cache-ttl", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_counter_reset_rejected() {
        let result =
            new().try_get_matches_from(vec!["mariadb_integration", "--counter-reset", "wrap"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_count() {
        let matches = new().get_matches_from(vec!["mariadb_integration", "-vv"]);
        assert_eq!(matches.get_count("verbose"), 2);
    }

    #[test]
    fn test_version_is_set() {
        assert!(new().get_version().is_some());
    }
}
