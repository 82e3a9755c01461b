//! Single-shot timers armed for a wall-clock time of day.
//!
//! The delay to the next occurrence of a time of day is computed from the
//! zoned wall clock once, when the timer is armed, as the real time between
//! two instants. From then on the timer counts down on the clock's monotonic
//! basis, so a later change of the host clock (sleep/resume, manual
//! adjustment) does not move the fire instant.

use std::{collections::BTreeMap, time::Duration, time::Instant};

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use log::{debug, info};

use crate::{alarm::TimeOfDay, clock::Clock};

/// length of the wrap-around added when today's occurrence has already passed
pub const DAY_MS: i64 = 86_400_000;

/// The next instant, at or after `now`, whose time of day is `target`.
///
/// Today's occurrence is used unless it is strictly before `now`, in which case
/// exactly [`DAY_MS`] of real time is added to it. Across a daylight saving
/// change that lands an hour off the same wall-clock time tomorrow.
///
/// When the clock goes back and today's target happens twice, the first one
/// counts. When the clock skips over today's target, it is read with the
/// offset in force at `now`.
#[must_use]
pub fn next_occurrence<Tz: TimeZone>(target: TimeOfDay, now: &DateTime<Tz>) -> DateTime<Tz> {
    let today = resolve_local(now.date_naive().and_time(target.into()), now);
    if today < *now {
        today + TimeDelta::milliseconds(DAY_MS)
    } else {
        today
    }
}

fn resolve_local<Tz: TimeZone>(local: NaiveDateTime, now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    match tz.from_local_datetime(&local) {
        LocalResult::Single(time) => time,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz.from_utc_datetime(&(local - now.offset().fix())),
    }
}

/// How long from `now` until `target` next comes around.
#[must_use]
pub fn fire_delay<Tz: TimeZone>(target: TimeOfDay, now: &DateTime<Tz>) -> TimeDelta {
    next_occurrence(target, now).signed_duration_since(now)
}

/// Refers to one armed action. Owned by whoever armed it; consumed by
/// [`Scheduler::disarm`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PendingActionHandle {
    key: u64,
    fires_at: DateTime<FixedOffset>,
    delay: TimeDelta,
}

impl PendingActionHandle {
    /// the wall-clock time the action was armed for
    #[must_use]
    pub const fn fires_at(&self) -> DateTime<FixedOffset> {
        self.fires_at
    }

    /// the delay computed when the action was armed
    #[must_use]
    pub const fn delay(&self) -> TimeDelta {
        self.delay
    }
}

struct Pending<A> {
    deadline: Instant,
    action: A,
}

/// Holds armed actions until they come due.
///
/// Nothing runs on its own: the owner calls [`Scheduler::take_due`] and runs
/// what it gets back. An action is removed when it is returned or disarmed,
/// so it is handed out at most once.
pub struct Scheduler<C, A> {
    clock: C,
    pending: BTreeMap<u64, Pending<A>>,
    next_key: u64,
}

impl<C: Clock, A> Scheduler<C, A> {
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            pending: BTreeMap::new(),
            next_key: 0,
        }
    }

    /// Arms `on_fire` to come due at the next occurrence of `target`.
    pub fn arm(&mut self, target: TimeOfDay, on_fire: A) -> PendingActionHandle {
        let now = self.clock.now();
        let fires_at = next_occurrence(target, &now);
        let delay = fires_at.clone().signed_duration_since(&now);
        let fires_at = fires_at.fixed_offset();
        let deadline = self.clock.instant() + delay.to_std().unwrap_or(Duration::ZERO);

        let key = self.next_key;
        self.next_key += 1;
        self.pending.insert(
            key,
            Pending {
                deadline,
                action: on_fire,
            },
        );
        info!(
            "armed timer {key} for {fires_at} ({}s from now)",
            delay.num_seconds()
        );
        PendingActionHandle {
            key,
            fires_at,
            delay,
        }
    }

    /// Cancels the action if it has not been handed out yet, returning it.
    pub fn disarm(&mut self, handle: PendingActionHandle) -> Option<A> {
        let removed = self.pending.remove(&handle.key).map(|pending| pending.action);
        if removed.is_some() {
            info!("disarmed timer {}", handle.key);
        } else {
            debug!("timer {} already fired, nothing to disarm", handle.key);
        }
        removed
    }

    #[must_use]
    pub fn is_armed(&self, handle: &PendingActionHandle) -> bool {
        self.pending.contains_key(&handle.key)
    }

    /// Removes and returns every action whose delay has elapsed, earliest first.
    pub fn take_due(&mut self) -> Vec<A> {
        let now = self.clock.instant();
        let mut due: Vec<(Instant, u64)> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(key, pending)| (pending.deadline, *key))
            .collect();
        due.sort_unstable();
        due.into_iter()
            .filter_map(|(_, key)| {
                debug!("timer {key} fired");
                self.pending.remove(&key).map(|pending| pending.action)
            })
            .collect()
    }

    /// Time left until the earliest armed action comes due.
    #[must_use]
    pub fn until_next(&self) -> Option<Duration> {
        let now = self.clock.instant();
        self.pending
            .values()
            .map(|pending| pending.deadline.saturating_duration_since(now))
            .min()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
