//! Terminal front end: the commands a user types and the alarm list printed
//! back after every change.

use std::{fmt::Write, str::FromStr};

use crate::{
    alarm::{Alarm, AlarmId, TimeOfDay},
    registry::Presenter,
};

pub const HELP: &str = "\
commands:
  record        start recording a clip
  stop          stop recording
  add HH:MM     set an alarm with the last recording
  cancel ID     cancel an alarm
  play ID       play an alarm's recording now
  list          show alarms
  time          show the current time
  help          show this message
  quit          exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Record,
    Stop,
    Add(String),
    Cancel(AlarmId),
    Play(AlarmId),
    List,
    Time,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCommandError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),

    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    #[error("`{0}` is not an alarm id")]
    BadId(String),
}

impl FromStr for ConsoleCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = words.next().unwrap_or_default().to_lowercase();
        let mut argument = |name: &'static str| {
            words
                .next()
                .map(str::to_string)
                .ok_or(ParseCommandError::MissingArgument(name))
        };
        let id = |arg: String| {
            arg.parse::<AlarmId>()
                .map_err(|_| ParseCommandError::BadId(arg))
        };
        Ok(match command.as_str() {
            "record" => Self::Record,
            "stop" => Self::Stop,
            "add" => Self::Add(argument("add")?),
            "cancel" => Self::Cancel(id(argument("cancel")?)?),
            "play" => Self::Play(id(argument("play")?)?),
            "list" | "ls" => Self::List,
            "time" => Self::Time,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        })
    }
}

/// `time` in `time_format`, or as `HH:MM` if the format can't show it
#[must_use]
pub fn format_time(time: TimeOfDay, time_format: &str) -> String {
    let mut text = String::new();
    match write!(text, "{}", time.as_naive().format(time_format)) {
        Ok(()) => text,
        Err(_) => time.to_string(),
    }
}

/// one line per alarm, in list order
#[must_use]
pub fn render_alarms(alarms: &[Alarm], time_format: &str) -> Vec<String> {
    if alarms.is_empty() {
        return vec!["no alarms set".to_string()];
    }
    alarms
        .iter()
        .map(|alarm| {
            format!(
                "[{}] {} (next: {}, {} bytes)",
                alarm.id(),
                format_time(alarm.time(), time_format),
                alarm.fires_at().format("%a %H:%M"),
                alarm.audio().len()
            )
        })
        .collect()
}

/// Prints the alarm list to stdout whenever it changes.
#[derive(Debug, Clone)]
pub struct TerminalPresenter {
    time_format: String,
}

impl TerminalPresenter {
    #[must_use]
    pub const fn new(time_format: String) -> Self {
        Self { time_format }
    }
}

impl Presenter for TerminalPresenter {
    fn alarms_changed(&mut self, alarms: &[Alarm]) {
        println!("alarms:");
        for line in render_alarms(alarms, &self.time_format) {
            println!("  {line}");
        }
    }
}
