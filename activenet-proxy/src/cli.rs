use std::env;
use std::net::SocketAddr;
use std::process;
use std::time::Duration;

use getopts::{Matches, Options};

use crate::client::ClientConfig;

pub const DEFAULT_BASE_URL: &str =
    "https://anc.apm.activecommunities.com/santamonicarecreation/rest";

const BASE_URL_ENV: &str = "ACTIVENET_BASE_URL";
const SESSION_COOKIE_ENV: &str = "ACTIVENET_SESSION_COOKIE";
const CSRF_TOKEN_ENV: &str = "ACTIVENET_CSRF_TOKEN";

pub struct Args {
    pub address: SocketAddr,
    pub session_capacity: usize,
    pub verbose: bool,
    pub client: ClientConfig,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8000]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "b",
        "base-url",
        concat!(
            "Base URL of the upstream REST API [Env: ACTIVENET_BASE_URL] [Default: ",
            "https://anc.apm.activecommunities.com/santamonicarecreation/rest]"
        ),
        "URL",
    );
    opts.optopt(
        "s",
        "session-capacity",
        "Maximum number of concurrent visitor sessions [Default: 10000]",
        "COUNT",
    );
    opts.optopt(
        "t",
        "timeout",
        "Seconds to wait for any single upstream request [Default: 5]",
        "SECONDS",
    );
    opts.optflag("v", "verbose", "Enable debug logging");
    opts
}

#[derive(Debug)]
pub enum ParseOutcome {
    Run(Args),
    Help(String),
    Invalid(String),
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("address", &self.address)
            .field("session_capacity", &self.session_capacity)
            .field("verbose", &self.verbose)
            .field("base_url", &self.client.base_url)
            .finish_non_exhaustive()
    }
}

/// Parses `args` (without the program name), consulting `env` for values not
/// given on the command line.
pub fn try_parse<F>(args: Vec<String>, env: F) -> ParseOutcome
where
    F: Fn(&str) -> Option<String>,
{
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => return ParseOutcome::Invalid(fail.to_string()),
    };

    if matches.opt_present("help") {
        return ParseOutcome::Help(opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
    }

    match args_from(&matches, env) {
        Ok(args) => ParseOutcome::Run(args),
        Err(message) => ParseOutcome::Invalid(message),
    }
}

fn args_from<F>(matches: &Matches, env: F) -> Result<Args, String>
where
    F: Fn(&str) -> Option<String>,
{
    let address = matches
        .opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 8000)))
        .map_err(|err| format!("Provided value for option 'address' is invalid: {err}"))?;

    let session_capacity = matches
        .opt_get_default("session-capacity", 10_000usize)
        .map_err(|err| format!("Provided value for option 'session-capacity' is invalid: {err}"))?;

    if session_capacity == 0 {
        return Err("Provided value for option 'session-capacity' must be positive".into());
    }

    let timeout = matches
        .opt_get_default("timeout", 5u64)
        .map_err(|err| format!("Provided value for option 'timeout' is invalid: {err}"))?;

    if timeout == 0 {
        return Err("Provided value for option 'timeout' must be positive".into());
    }

    let base_url = matches
        .opt_str("base-url")
        .or_else(|| env(BASE_URL_ENV))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(format!("Provided value for option 'base-url' is not an http(s) URL: {base_url}"));
    }

    let non_empty = |key| env(key).filter(|value: &String| !value.is_empty());

    Ok(Args {
        address,
        session_capacity,
        verbose: matches.opt_present("verbose"),
        client: ClientConfig::new(base_url)
            .with_timeout(Duration::from_secs(timeout))
            .with_session_cookie(non_empty(SESSION_COOKIE_ENV))
            .with_csrf_token(non_empty(CSRF_TOKEN_ENV)),
    })
}

/// Parses the process arguments, printing help or errors and exiting where
/// appropriate.
pub fn parse(args: Vec<String>) -> Args {
    match try_parse(args, |key| env::var(key).ok()) {
        ParseOutcome::Run(args) => args,
        ParseOutcome::Help(usage) => {
            println!("{usage}");
            process::exit(0);
        }
        ParseOutcome::Invalid(message) => {
            eprintln!("{message}");
            process::exit(1);
        }
    }
}
