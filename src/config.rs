use crate::player::{EngineKind, VENDOR_SCRIPT_URL};
use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const API_URL_ENV: &str = "IVS_API_URL";
pub const TOKEN_ENV: &str = "IVS_CONSOLE_TOKEN";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    /// Backend base URL, no trailing slash.
    pub api_url: String,
    pub token_file: Option<PathBuf>,
    pub token: Option<String>,
    pub player_engine: EngineKind,
    pub player_script_url: String,
    /// Mounted pages with no request for this long are unmounted.
    pub idle_unmount: Duration,
}

pub fn command() -> Command {
    Command::new("ivs-console")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Operator console for Amazon IVS channels and live streams.")
        .arg(
            Arg::new("listen")
                .short('l')
                .long("listen")
                .value_parser(value_parser!(SocketAddr))
                .default_value("0.0.0.0:8888")
                .help("Address the console listens on"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("IVS backend base URL (falls back to $IVS_API_URL)"),
        )
        .arg(
            Arg::new("token-file")
                .long("token-file")
                .value_parser(value_parser!(PathBuf))
                .help("File holding the bearer token; removed on 401"),
        )
        .arg(
            Arg::new("player-engine")
                .long("player-engine")
                .value_parser(["native", "vendor", "mock"])
                .default_value("vendor")
                .help("Video engine behind the player page"),
        )
        .arg(
            Arg::new("player-script-url")
                .long("player-script-url")
                .default_value(VENDOR_SCRIPT_URL)
                .help("Script loaded once by the vendor engine"),
        )
        .arg(
            Arg::new("idle-unmount-secs")
                .long("idle-unmount-secs")
                .value_parser(value_parser!(u64))
                .default_value("30")
                .help("Unmount pages nobody has requested for this many seconds"),
        )
}

impl Config {
    pub fn from_args() -> anyhow::Result<Self> {
        Self::from_matches(&command().get_matches(), |key| std::env::var(key).ok())
    }

    /// `env` is consulted for `IVS_API_URL` and `IVS_CONSOLE_TOKEN` only.
    pub fn from_matches(
        matches: &ArgMatches,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let api_url = matches
            .get_one::<String>("api-url")
            .cloned()
            .or_else(|| env(API_URL_ENV).filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url::Url::parse(&api_url).with_context(|| format!("invalid API URL {:?}", api_url))?;

        let engine = matches
            .get_one::<String>("player-engine")
            .map(String::as_str)
            .unwrap_or("vendor");

        Ok(Self {
            listen: matches
                .get_one::<SocketAddr>("listen")
                .copied()
                .context("missing listen address")?,
            api_url: api_url.trim_end_matches('/').to_string(),
            token_file: matches.get_one::<PathBuf>("token-file").cloned(),
            token: env(TOKEN_ENV).filter(|v| !v.trim().is_empty()),
            player_engine: engine
                .parse()
                .map_err(|e| anyhow::anyhow!("{}", e))?,
            player_script_url: matches
                .get_one::<String>("player-script-url")
                .cloned()
                .unwrap_or_else(|| VENDOR_SCRIPT_URL.to_string()),
            idle_unmount: Duration::from_secs(
                matches.get_one::<u64>("idle-unmount-secs").copied().unwrap_or(30),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str], env: &[(&str, &str)]) -> anyhow::Result<Config> {
        let mut argv = vec!["ivs-console"];
        argv.extend_from_slice(args);
        let matches = command().try_get_matches_from(argv)?;
        let env: Vec<(String, String)> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_matches(&matches, |key| {
            env.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn defaults() {
        let config = parse(&[], &[]).unwrap();
        assert_eq!(config.listen, "0.0.0.0:8888".parse().unwrap());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.player_engine, EngineKind::Vendor);
        assert_eq!(config.player_script_url, VENDOR_SCRIPT_URL);
        assert_eq!(config.idle_unmount, Duration::from_secs(30));
        assert_eq!(config.token, None);
    }

    #[test]
    fn env_supplies_api_url_and_token() {
        let config = parse(
            &[],
            &[(API_URL_ENV, "https://ivs.example.com/api/"), (TOKEN_ENV, "abc")],
        )
        .unwrap();
        assert_eq!(config.api_url, "https://ivs.example.com/api");
        assert_eq!(config.token.as_deref(), Some("abc"));
    }

    #[test]
    fn flag_overrides_env() {
        let config = parse(
            &["--api-url", "http://10.0.0.5:8080/api", "--player-engine", "mock"],
            &[(API_URL_ENV, "https://ivs.example.com/api")],
        )
        .unwrap();
        assert_eq!(config.api_url, "http://10.0.0.5:8080/api");
        assert_eq!(config.player_engine, EngineKind::Mock);
    }

    #[test]
    fn rejects_unparsable_url_and_unknown_engine() {
        assert!(parse(&["--api-url", "not a url"], &[]).is_err());
        assert!(parse(&["--player-engine", "flash"], &[]).is_err());
    }
}
