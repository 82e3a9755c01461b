//! Error types for scheduling, recording and playing alarms.

use std::io;

/// Errors reported by the alarm registry and the alarm service.
#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    /// The submission was rejected before any state changed.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// Manual playback could not be started.
    #[error("playback failed: {0}")]
    Playback(#[from] PlaybackError),

    /// The worker thread owning the registry has exited.
    #[error("alarm service is no longer running")]
    ServiceStopped,

    /// The worker thread could not be started.
    #[error("couldn't start alarm thread: {0}")]
    Spawn(#[source] io::Error),
}

/// A `(time, audio)` submission that never reaches the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("no audio has been recorded")]
    MissingAudio,

    #[error("invalid time of day `{0}`, expected HH:MM")]
    Time(String),
}

/// Microphone capture failures. No alarm is created when one of these occurs.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no audio input device available")]
    NoInputDevice,

    #[error("audio input device error: {0}")]
    Device(String),

    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("recording captured no audio")]
    NoAudio,

    #[error("couldn't encode recording: {0}")]
    Encode(#[from] hound::Error),
}

/// Failures of the playback trigger.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("couldn't open audio output: {0}")]
    Output(String),

    #[error("couldn't decode audio: {0}")]
    Decode(String),

    #[error("audio thread has stopped")]
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("couldn't access config file: {0}")]
    Io(#[from] io::Error),

    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("couldn't determine the config directory")]
    NoProjectDirs,

    #[error("`{0}` is not a usable time format")]
    TimeFormat(String),
}
