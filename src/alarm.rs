use std::{fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};

use crate::{error::InvalidInput, scheduler::PendingActionHandle};

/// identifies an alarm for as long as it is in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmId(pub(crate) u64);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AlarmId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// a wall-clock time of day with minute precision and no date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    #[must_use]
    pub const fn as_naive(self) -> NaiveTime {
        self.0
    }
}

impl From<TimeOfDay> for NaiveTime {
    fn from(time: TimeOfDay) -> Self {
        time.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidInput;

    /// accepts `HH:MM`, and `HH:MM:SS` with the seconds dropped
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .ok()
            .and_then(|time| Self::new(time.hour(), time.minute()))
            .ok_or_else(|| InvalidInput::Time(trimmed.to_string()))
    }
}

/// Recorded audio content.
///
/// The bytes are never inspected or changed after capture; clones share them.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioArtifact(Arc<[u8]>);

impl AudioArtifact {
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for AudioArtifact {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for AudioArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioArtifact({} bytes)", self.0.len())
    }
}

/// Checks a submission before it is handed to the registry.
///
/// # Errors
/// [`InvalidInput::MissingAudio`] if there is no (or an empty) recording,
/// [`InvalidInput::Time`] if the time can't be parsed.
pub fn validate_submission(
    time: &str,
    audio: Option<AudioArtifact>,
) -> Result<(TimeOfDay, AudioArtifact), InvalidInput> {
    let audio = audio
        .filter(|audio| !audio.is_empty())
        .ok_or(InvalidInput::MissingAudio)?;
    Ok((time.parse()?, audio))
}

/// represents an alarm
/// contains the time it goes off at, the recording it plays
/// and the timer that is armed for it
#[derive(Debug)]
pub struct Alarm {
    pub(crate) id: AlarmId,
    pub(crate) time: TimeOfDay,
    pub(crate) audio: AudioArtifact,
    pub(crate) pending: PendingActionHandle,
}

impl Alarm {
    #[must_use]
    pub const fn id(&self) -> AlarmId {
        self.id
    }

    #[must_use]
    pub const fn time(&self) -> TimeOfDay {
        self.time
    }

    #[must_use]
    pub const fn audio(&self) -> &AudioArtifact {
        &self.audio
    }

    /// the wall-clock instant the alarm was armed for
    #[must_use]
    pub const fn fires_at(&self) -> DateTime<FixedOffset> {
        self.pending.fires_at()
    }
}

/// An owned copy of an alarm's public state, handed out by the alarm service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSnapshot {
    pub id: AlarmId,
    pub time: TimeOfDay,
    pub fires_at: DateTime<FixedOffset>,
    pub audio: AudioArtifact,
}

impl From<&Alarm> for AlarmSnapshot {
    fn from(alarm: &Alarm) -> Self {
        Self {
            id: alarm.id,
            time: alarm.time,
            fires_at: alarm.fires_at(),
            audio: alarm.audio.clone(),
        }
    }
}
