use std::path::PathBuf;
use std::time::Duration;

use binday_core::calendar::CalendarOptions;
use binday_core::model::{CouncilId, Councils};
use binday_provider_bolton::{BrowserOptions, FORM_URL};
use chrono::{NaiveTime, TimeDelta};
use chrono_tz::Tz;
use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "binday")]
#[command(
    version,
    about = "Export household bin collection dates to an iCalendar file",
    long_about = None
)]
pub(crate) struct Cli {
    #[arg(
        long,
        env = "BIN_POSTCODE",
        hide_env_values = true,
        help = "Postcode of the household"
    )]
    pub(crate) postcode: String,

    #[arg(
        long,
        env = "BIN_HOUSE_NUMBER",
        hide_env_values = true,
        help = "House number or name used to pick the address"
    )]
    pub(crate) house_number: String,

    #[arg(
        long,
        env = "BIN_COUNCIL",
        default_value_t = Councils::Bolton.to_string(),
        help = "Council whose collection form is queried"
    )]
    pub(crate) council: String,

    #[arg(
        short = 'o',
        long,
        env = "BIN_OUTPUT",
        default_value = "bolton_bins.ics",
        help = "Where to write the calendar file"
    )]
    pub(crate) output: PathBuf,

    #[arg(
        long,
        env = "BIN_SCREENSHOT",
        default_value = "error_screenshot.png",
        help = "Where to save a screenshot when the lookup fails"
    )]
    pub(crate) screenshot: PathBuf,

    #[arg(long, help = "Do not save a screenshot on failure")]
    pub(crate) no_screenshot: bool,

    #[arg(
        long,
        env = "BIN_FORM_URL",
        default_value = FORM_URL,
        help = "Start page of the council's collection form"
    )]
    pub(crate) url: String,

    #[arg(
        long,
        env = "BIN_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds to wait for each form element"
    )]
    pub(crate) timeout_secs: u64,

    #[arg(long, env = "BIN_CHROME_PATH", help = "Chrome binary to launch")]
    pub(crate) chrome_path: Option<PathBuf>,

    #[arg(long, help = "Show the browser window instead of running headless")]
    pub(crate) headed: bool,

    #[arg(
        long,
        value_name = "HH:MM",
        default_value = "07:00",
        value_parser = parse_time,
        help = "Time of day each reminder starts"
    )]
    pub(crate) start_time: NaiveTime,

    #[arg(
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Length of each reminder in minutes"
    )]
    pub(crate) duration_minutes: u32,

    #[arg(
        long,
        value_name = "IANA_ZONE",
        default_value = "Europe/London",
        value_parser = parse_timezone,
        help = "Time zone the start time is expressed in"
    )]
    pub(crate) timezone: Tz,

    #[arg(long, help = "Write floating times without a time zone")]
    pub(crate) floating: bool,

    #[arg(
        long,
        default_value = "Bin collections",
        help = "Display name of the calendar"
    )]
    pub(crate) calendar_name: String,

    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    pub(crate) log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Cli {
    pub(crate) fn council_id(&self) -> CouncilId {
        CouncilId(self.council.trim().to_lowercase())
    }

    pub(crate) fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            url: self.url.clone(),
            headless: !self.headed,
            timeout: Duration::from_secs(self.timeout_secs),
            chrome_path: self.chrome_path.clone(),
            screenshot_path: (!self.no_screenshot).then(|| self.screenshot.clone()),
            ..BrowserOptions::default()
        }
    }

    pub(crate) fn calendar_options(&self) -> CalendarOptions {
        CalendarOptions {
            name: self.calendar_name.clone(),
            start_time: self.start_time,
            duration: TimeDelta::minutes(i64::from(self.duration_minutes)),
            timezone: (!self.floating).then_some(self.timezone),
            ..CalendarOptions::default()
        }
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|err| format!("expected HH:MM: {err}"))
}

fn parse_timezone(raw: &str) -> Result<Tz, String> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|err| format!("unknown time zone '{raw}': {err}"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        let mut args = vec!["binday", "--postcode", "BL1 1AA", "--house-number", "12"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).expect("arguments parse")
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_produce_headless_london_calendar() {
        let cli = parse(&[]);

        let browser = cli.browser_options();
        assert!(browser.headless, "headless unless --headed");
        assert_eq!(browser.timeout, Duration::from_secs(cli.timeout_secs), "timeout carried over");
        assert_eq!(
            browser.screenshot_path,
            Some(cli.screenshot.clone()),
            "screenshot enabled by default"
        );

        let calendar = cli.calendar_options();
        assert_eq!(
            calendar.start_time,
            NaiveTime::from_hms_opt(7, 0, 0).expect("valid time"),
            "reminders start at 07:00"
        );
        assert_eq!(calendar.duration, TimeDelta::hours(1), "one hour events");
        assert_eq!(calendar.timezone, Some(Tz::Europe__London), "London zone");
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--headed",
            "--no-screenshot",
            "--floating",
            "--start-time",
            "06:45",
            "--duration-minutes",
            "30",
            "--council",
            " Bolton ",
        ]);

        assert!(!cli.browser_options().headless, "visible window");
        assert_eq!(cli.browser_options().screenshot_path, None, "screenshots off");

        let calendar = cli.calendar_options();
        assert_eq!(calendar.timezone, None, "floating times");
        assert_eq!(calendar.duration, TimeDelta::minutes(30), "custom duration");
        assert_eq!(
            calendar.start_time,
            NaiveTime::from_hms_opt(6, 45, 0).expect("valid time"),
            "custom start"
        );
        assert_eq!(cli.council_id(), CouncilId::from(Councils::Bolton), "normalized council");
    }

    #[test]
    fn timezone_is_validated() {
        let cli = parse(&["--timezone", "America/New_York"]);
        assert_eq!(
            cli.calendar_options().timezone,
            Some(Tz::America__New_York),
            "known zone accepted"
        );

        let result = Cli::try_parse_from([
            "binday",
            "--postcode",
            "BL1 1AA",
            "--house-number",
            "12",
            "--timezone",
            "Not/AZone",
        ]);
        assert!(result.is_err(), "unknown zone must be rejected");
    }

    #[test]
    fn malformed_start_time_is_rejected() {
        let result = Cli::try_parse_from([
            "binday",
            "--postcode",
            "BL1 1AA",
            "--house-number",
            "12",
            "--start-time",
            "7am",
        ]);
        assert!(result.is_err(), "start time must be HH:MM");
    }
}
