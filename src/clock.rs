//! Sources of the current time.
//!
//! A clock supplies two readings: the zoned wall-clock time, which alarms are
//! expressed in, and a monotonic instant that armed timers count down on.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use chrono::{DateTime, Local, TimeZone, Utc};

pub trait Clock {
    /// the time zone wall-clock readings are in
    type Tz: TimeZone;

    /// Current wall-clock time.
    fn now(&self) -> DateTime<Self::Tz>;

    /// Current reading of the timer basis.
    fn instant(&self) -> Instant;
}

/// The host's clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and move another
/// into a scheduler or onto the service thread.
#[derive(Debug, Clone)]
pub struct ManualClock<Tz: TimeZone = Utc> {
    state: Arc<Mutex<ManualState<Tz>>>,
}

#[derive(Debug)]
struct ManualState<Tz: TimeZone> {
    wall: DateTime<Tz>,
    instant: Instant,
}

impl<Tz: TimeZone> ManualClock<Tz> {
    #[must_use]
    pub fn at(wall: DateTime<Tz>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                wall,
                instant: Instant::now(),
            })),
        }
    }

    /// Moves both the wall clock and the timer basis forward.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // a std duration too large for chrono leaves the wall clock where it is
        if let Ok(delta) = chrono::TimeDelta::from_std(by) {
            state.wall = state.wall.clone() + delta;
        }
        state.instant += by;
    }

    /// Moves only the wall clock, like a manual adjustment of the host clock.
    pub fn set_wall(&self, wall: DateTime<Tz>) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .wall = wall;
    }
}

impl<Tz: TimeZone> Clock for ManualClock<Tz> {
    type Tz = Tz;

    fn now(&self) -> DateTime<Tz> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .wall
            .clone()
    }

    fn instant(&self) -> Instant {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .instant
    }
}
