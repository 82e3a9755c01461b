//! The set of scheduled alarms.
//!
//! Every alarm in the registry has exactly one armed timer. An alarm leaves
//! the registry either when it is cancelled, which disarms its timer, or right
//! after its timer fires and its recording has been started.

use std::time::Duration;

use log::{error, info, warn};

use crate::{
    alarm::{Alarm, AlarmId, AudioArtifact, TimeOfDay},
    clock::Clock,
    error::{AlarmError, InvalidInput, PlaybackError},
    playback::Player,
    scheduler::Scheduler,
};

/// Receives the full list of alarms after every change to it.
pub trait Presenter {
    fn alarms_changed(&mut self, alarms: &[Alarm]);
}

impl<F: FnMut(&[Alarm])> Presenter for F {
    fn alarms_changed(&mut self, alarms: &[Alarm]) {
        self(alarms);
    }
}

pub struct AlarmRegistry<C> {
    /// in insertion order
    alarms: Vec<Alarm>,
    scheduler: Scheduler<C, AlarmId>,
    player: Box<dyn Player + Send>,
    presenter: Box<dyn Presenter + Send>,
    last_id: u64,
}

impl<C: Clock> AlarmRegistry<C> {
    pub fn new(
        clock: C,
        player: impl Player + Send + 'static,
        presenter: impl Presenter + Send + 'static,
    ) -> Self {
        Self {
            alarms: Vec::new(),
            scheduler: Scheduler::new(clock),
            player: Box::new(player),
            presenter: Box::new(presenter),
            last_id: 0,
        }
    }

    /// Arms a new alarm for the next occurrence of `time`.
    ///
    /// # Errors
    /// [`InvalidInput::MissingAudio`] for an empty recording; nothing is
    /// changed in that case.
    pub fn add(&mut self, time: TimeOfDay, audio: AudioArtifact) -> Result<AlarmId, AlarmError> {
        if audio.is_empty() {
            return Err(InvalidInput::MissingAudio.into());
        }
        self.last_id += 1;
        let id = AlarmId(self.last_id);
        let pending = self.scheduler.arm(time, id);
        info!("added alarm {id} for {time}, fires at {}", pending.fires_at());
        self.alarms.push(Alarm {
            id,
            time,
            audio,
            pending,
        });
        self.notify();
        Ok(id)
    }

    /// Disarms and removes an alarm. Returns `false` when there is no such
    /// alarm, which is not an error: it may already have fired.
    pub fn cancel(&mut self, id: AlarmId) -> bool {
        let Some(alarm) = self.take(id) else {
            info!("alarm {id} not found, nothing to cancel");
            return false;
        };
        if self.scheduler.disarm(alarm.pending).is_none() {
            warn!("alarm {id} was cancelled after its timer fired");
        }
        info!("cancelled alarm {id}");
        self.notify();
        true
    }

    /// Removes an alarm whose timer has already fired, without disarming it.
    pub fn remove(&mut self, id: AlarmId) -> bool {
        if self.take(id).is_none() {
            return false;
        }
        info!("removed alarm {id}");
        self.notify();
        true
    }

    #[must_use]
    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|alarm| alarm.id == id)
    }

    #[must_use]
    pub fn list(&self) -> &[Alarm] {
        &self.alarms
    }

    /// Plays an alarm's recording now, leaving the alarm armed.
    /// Returns `false` when there is no such alarm.
    ///
    /// # Errors
    /// if the player can't start playback
    pub fn play(&self, id: AlarmId) -> Result<bool, PlaybackError> {
        match self.get(id) {
            Some(alarm) => self.player.play(&alarm.audio).map(|()| true),
            None => Ok(false),
        }
    }

    /// Runs the fire sequence for every alarm whose timer has come due:
    /// start its recording, then remove it. Returns the ids that fired.
    pub fn fire_due(&mut self) -> Vec<AlarmId> {
        let due = self.scheduler.take_due();
        due.into_iter().filter(|&id| self.fire(id)).collect()
    }

    fn fire(&mut self, id: AlarmId) -> bool {
        let Some(alarm) = self.get(id) else {
            return false;
        };
        info!("alarm {id} ({}) going off", alarm.time);
        // the alarm is used up even if it couldn't be heard
        if let Err(e) = self.player.play(&alarm.audio) {
            error!("couldn't play alarm {id}: {e}");
        }
        self.remove(id)
    }

    /// Time left until the next alarm fires.
    #[must_use]
    pub fn until_next_fire(&self) -> Option<Duration> {
        self.scheduler.until_next()
    }

    fn take(&mut self, id: AlarmId) -> Option<Alarm> {
        let index = self.alarms.iter().position(|alarm| alarm.id == id)?;
        Some(self.alarms.remove(index))
    }

    fn notify(&mut self) {
        self.presenter.alarms_changed(&self.alarms);
    }
}
