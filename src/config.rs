use std::ffi::OsString;

use clap::Parser;
use lib_utils::endpoint::websocket_url;

pub const DEFAULT_ADDR: &str = "localhost:8080";
pub const DEFAULT_PATH: &str = "/echo";
pub const DEFAULT_COMMAND: &str = "ping -n 10 google.com";

/// Streams the output of a local command to a websocket server, line by line.
#[derive(Parser, Debug, Clone)]
#[command(name = "wscmd", version)]
pub struct Config {
    /// host:port of the websocket server
    #[arg(short, long, default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Path where the websocket handler listens
    #[arg(short, long, default_value = DEFAULT_PATH)]
    pub path: String,

    /// Command to run; its stdout is sent one line per text frame
    #[arg(short, long, default_value = DEFAULT_COMMAND)]
    pub cmd: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Long flags that may also be spelled with a single dash (`-cmd`, `-addr=...`).
const SINGLE_DASH_FLAGS: [&str; 4] = ["addr", "path", "cmd", "log-level"];

impl Config {
    /// Parses `args` (program name first), accepting `-addr`, `-path`,
    /// `-cmd` and `-log-level` as well as their `--` spellings.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Config::parse_from(args.into_iter().map(|arg| with_long_prefix(arg.into())))
    }

    pub fn endpoint(&self) -> String {
        websocket_url(&self.addr, &self.path)
    }
}

/// Rewrites `-name` and `-name=value` to `--name...` for the known long
/// flags; every other argument passes through untouched.
fn with_long_prefix(arg: OsString) -> OsString {
    let Some(text) = arg.to_str() else {
        return arg;
    };
    let Some(rest) = text.strip_prefix('-') else {
        return arg;
    };
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    if SINGLE_DASH_FLAGS.contains(&name) {
        format!("-{}", text).into()
    } else {
        arg
    }
}
