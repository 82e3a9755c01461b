use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use voice_alarm::{
    capture::{self, AudioCapture, CpalRecorder},
    config::Config,
    console::{format_time, ConsoleCommand, TerminalPresenter, HELP},
    AlarmClock, AlarmError, AudioArtifact, Clock, RodioPlayer, SystemClock,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// config file to use instead of the one in the user's config directory
    #[clap(long, short)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// list the microphones that can be recorded from
    Devices,
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("voice_alarm")
        .map_err(|e| format!("couldn't initialize logger: {e:?}"))?;

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    match args.command {
        Some(Command::Init { force }) => {
            if force || !config_path.exists() {
                Config::new().save(&config_path)?;
                println!("wrote {}", config_path.display());
            } else {
                println!(
                    "{} already exists, use --force to overwrite it",
                    config_path.display()
                );
            }
            Ok(())
        }
        Some(Command::Devices) => {
            for name in capture::list_input_devices()? {
                println!("{name}");
            }
            Ok(())
        }
        None => run(&Config::load_or_default(&config_path)?),
    }
}

/// the interactive session: record clips and set alarms until `quit`
fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let player = RodioPlayer::spawn(config.volume)?;
    let alarms = AlarmClock::spawn(
        SystemClock,
        player,
        TerminalPresenter::new(config.time_format.clone()),
    )?;
    let mut session = Session {
        config,
        alarms: &alarms,
        recorder: None,
        recording: None,
    };
    info!("session started");
    println!("{HELP}");

    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            prompt()?;
            continue;
        }
        match line.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Quit) => break,
            Ok(command) => session.handle(command),
            Err(e) => println!("{e}"),
        }
        prompt()?;
    }
    drop(session);
    alarms.shutdown();
    info!("session ended");
    Ok(())
}

fn prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}

struct Session<'a> {
    config: &'a Config,
    alarms: &'a AlarmClock,
    /// opened on first use so the session works without a microphone
    recorder: Option<CpalRecorder>,
    /// the latest recording, used by the next `add`
    recording: Option<AudioArtifact>,
}

impl Session<'_> {
    fn handle(&mut self, command: ConsoleCommand) {
        let result = match command {
            ConsoleCommand::Record => {
                self.record();
                Ok(())
            }
            ConsoleCommand::Stop => {
                self.stop();
                Ok(())
            }
            ConsoleCommand::Add(time) => self.add(&time),
            ConsoleCommand::Cancel(id) => self.alarms.cancel(id).map(|cancelled| {
                if !cancelled {
                    println!("no alarm {id}");
                }
            }),
            ConsoleCommand::Play(id) => self.alarms.play(id).map(|played| {
                if !played {
                    println!("no alarm {id}");
                }
            }),
            ConsoleCommand::List => self.alarms.list().map(|alarms| {
                if alarms.is_empty() {
                    println!("no alarms set");
                }
                for alarm in alarms {
                    println!(
                        "[{}] {}",
                        alarm.id,
                        format_time(alarm.time, &self.config.time_format)
                    );
                }
            }),
            ConsoleCommand::Time => {
                println!("{}", SystemClock.now().format("%H:%M:%S"));
                Ok(())
            }
            ConsoleCommand::Help => {
                println!("{HELP}");
                Ok(())
            }
            ConsoleCommand::Quit => Ok(()),
        };
        if let Err(e) = result {
            error!("{e}");
            println!("{e}");
        }
    }

    fn record(&mut self) {
        if self.recorder.is_none() {
            match CpalRecorder::new(self.config.input_device.as_deref()) {
                Ok(recorder) => self.recorder = Some(recorder),
                Err(e) => {
                    warn!("couldn't open microphone: {e}");
                    println!("couldn't access the microphone: {e}");
                    return;
                }
            }
        }
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        match recorder.start() {
            Ok(()) => println!("recording... type `stop` when done"),
            Err(e) => println!("{e}"),
        }
    }

    fn stop(&mut self) {
        let Some(recorder) = self.recorder.as_mut().filter(|r| r.is_recording()) else {
            println!("not recording");
            return;
        };
        match recorder.stop() {
            Ok(audio) => {
                println!("recorded {} bytes", audio.len());
                self.recording = Some(audio);
            }
            Err(e) => {
                warn!("recording failed: {e}");
                println!("{e}");
            }
        }
    }

    fn add(&mut self, time: &str) -> Result<(), AlarmError> {
        match self.alarms.submit(time, self.recording.clone()) {
            Ok(id) => {
                // each recording is used for one alarm
                self.recording = None;
                println!("alarm {id} set for {time}");
                Ok(())
            }
            Err(AlarmError::InvalidInput(e)) => {
                println!("{e}: please record audio and set a time");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
