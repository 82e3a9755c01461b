#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! Record a short voice clip and have it played back at a time of day.
//!
//! An alarm pairs a [`TimeOfDay`] with a recorded [`AudioArtifact`]. The
//! [`AlarmRegistry`] arms a single-shot timer for the next occurrence of that
//! time (tomorrow's if today's has passed), plays the recording when the timer
//! fires and then forgets the alarm. [`AlarmClock`] runs a registry on its own
//! thread so it can be driven from anywhere.

pub mod alarm;
pub mod capture;
pub mod clock;
mod communication;
pub mod config;
pub mod console;
pub mod error;
pub mod playback;
pub mod registry;
pub mod scheduler;
pub mod service;

pub use alarm::{validate_submission, Alarm, AlarmId, AlarmSnapshot, AudioArtifact, TimeOfDay};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AlarmError, CaptureError, ConfigError, InvalidInput, PlaybackError};
pub use playback::{Player, RodioPlayer};
pub use registry::{AlarmRegistry, Presenter};
pub use scheduler::{fire_delay, next_occurrence, PendingActionHandle, Scheduler};
pub use service::AlarmClock;
