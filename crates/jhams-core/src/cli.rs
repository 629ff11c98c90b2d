use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "jhams",
    version,
    about = "JHAMS Academy: student calendar, checklist and alerts",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "academyrc", global = true)]
    pub academyrc: Option<PathBuf>,

    /// TOML seed file replacing the built-in academy data.
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today.
    #[arg(long = "today", global = true)]
    pub today: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Month grid with markers for today, the selection and event days.
    Month(MonthArgs),
    /// Events on one day, earliest first.
    Day(DayArgs),
    /// Next events from today on.
    Upcoming {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Study checklist; toggles apply before printing.
    Checklist {
        #[arg(long = "toggle", action = ArgAction::Append)]
        toggle: Vec<u64>,
    },
    /// Notifications, optionally filtered and updated.
    Alerts(AlertsArgs),
    /// Effective configuration.
    Config,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthArgs {
    /// Month to show as YYYY-MM. Defaults to the month of today.
    #[arg(long)]
    pub month: Option<String>,

    /// Whole months to move from the shown month.
    #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
    pub shift: i32,

    /// Selected day as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    pub select: Option<String>,

    /// Pad the last week so every row has seven cells.
    #[arg(long)]
    pub pad: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DayArgs {
    pub date: String,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertsArgs {
    /// all, unread, or a notification kind.
    #[arg(long, default_value = "all")]
    pub filter: String,

    #[arg(long = "read", action = ArgAction::Append)]
    pub read: Vec<u64>,

    #[arg(long = "read-all")]
    pub read_all: bool,

    #[arg(long = "delete", action = ArgAction::Append)]
    pub delete: Vec<u64>,

    /// Turn a notification setting on (a kind, `email` or `push`).
    #[arg(long = "enable", action = ArgAction::Append)]
    pub enable: Vec<String>,

    #[arg(long = "disable", action = ArgAction::Append)]
    pub disable: Vec<String>,

    /// Show notification settings instead of the list.
    #[arg(long)]
    pub settings: bool,
}

impl Command {
    /// Command used when none is given on the command line.
    pub fn from_default(cfg: &Config) -> anyhow::Result<Self> {
        let name = cfg
            .get("default.command")
            .unwrap_or_else(|| "month".to_string());
        debug!(command = %name, "no explicit command, using default");

        match name.trim() {
            "month" => Ok(Command::Month(MonthArgs::default())),
            "upcoming" => Ok(Command::Upcoming { limit: None }),
            "checklist" => Ok(Command::Checklist { toggle: vec![] }),
            "alerts" => Ok(Command::Alerts(AlertsArgs {
                filter: "all".to_string(),
                ..AlertsArgs::default()
            })),
            other => Err(anyhow!("unsupported default.command: {other}")),
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` (or `rc.key:value`) overrides out of argv.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest
                .split_once('=')
                .or_else(|| rest.split_once(':'))
                .map(|(k, v)| (format!("rc.{k}"), v.to_string()));

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let pre = preprocess_args(&os(&["jhams", "rc.color=off", "month", "rc.calendar.locale:en"]))
            .expect("preprocess");
        assert_eq!(pre.cleaned_args, os(&["jhams", "month"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.calendar.locale".to_string(), "en".to_string()),
            ]
        );
    }

    #[test]
    fn parses_month_with_negative_shift() {
        let cli = GlobalCli::try_parse_from(["jhams", "month", "--month", "2024-06", "--shift", "-2", "--pad"])
            .expect("parse");
        let Some(Command::Month(args)) = cli.command else {
            panic!("expected month command");
        };
        assert_eq!(args.month.as_deref(), Some("2024-06"));
        assert_eq!(args.shift, -2);
        assert!(args.pad);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = GlobalCli::try_parse_from([
            "jhams",
            "alerts",
            "--filter",
            "unread",
            "--read",
            "1",
            "--read",
            "2",
            "--rc",
            "color=off",
            "-vv",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides.len(), 1);
        let Some(Command::Alerts(args)) = cli.command else {
            panic!("expected alerts command");
        };
        assert_eq!(args.read, vec![1, 2]);
        assert_eq!(args.filter, "unread");
    }

    #[test]
    fn default_command_comes_from_config() {
        let mut cfg = Config::default();
        assert_eq!(
            Command::from_default(&cfg).expect("default"),
            Command::Month(MonthArgs::default())
        );

        cfg.apply_overrides(vec![("default.command".to_string(), "tea".to_string())]);
        assert!(Command::from_default(&cfg).is_err());
    }
}
