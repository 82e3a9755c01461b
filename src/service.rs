//! Runs an [`AlarmRegistry`] on its own thread.
//!
//! Every request goes through one queue to the thread that owns the registry,
//! so registry changes (adding, cancelling and removal after an alarm fires)
//! never overlap. While waiting for the next request the thread sleeps no
//! longer than the time left until the next alarm.

use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
};

use log::{debug, error, info};

use crate::{
    alarm::{validate_submission, AlarmId, AlarmSnapshot, AudioArtifact, TimeOfDay},
    clock::Clock,
    communication::Message,
    error::AlarmError,
    playback::Player,
    registry::{AlarmRegistry, Presenter},
};

/// Handle to the alarm thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct AlarmClock {
    sender: Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

impl AlarmClock {
    /// Starts the alarm thread.
    ///
    /// # Errors
    /// [`AlarmError::Spawn`] if the OS refuses to start a thread
    pub fn spawn<C>(
        clock: C,
        player: impl Player + Send + 'static,
        presenter: impl Presenter + Send + 'static,
    ) -> Result<Self, AlarmError>
    where
        C: Clock + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let registry = AlarmRegistry::new(clock, player, presenter);
        let worker = thread::Builder::new()
            .name("voice_alarm-alarms".to_string())
            .spawn(move || run(registry, &receiver))
            .map_err(AlarmError::Spawn)?;
        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    /// # Errors
    /// [`AlarmError::InvalidInput`] for an empty recording
    pub fn add(&self, time: TimeOfDay, audio: AudioArtifact) -> Result<AlarmId, AlarmError> {
        self.request(|reply| Message::Add { time, audio, reply })?
    }

    /// Validates a raw submission and adds it.
    ///
    /// # Errors
    /// [`AlarmError::InvalidInput`] if the recording is missing or the time
    /// can't be parsed; the registry is not touched in that case.
    pub fn submit(&self, time: &str, audio: Option<AudioArtifact>) -> Result<AlarmId, AlarmError> {
        let (time, audio) = validate_submission(time, audio)?;
        self.add(time, audio)
    }

    /// `Ok(false)` if there was no such alarm.
    ///
    /// # Errors
    /// [`AlarmError::ServiceStopped`]
    pub fn cancel(&self, id: AlarmId) -> Result<bool, AlarmError> {
        self.request(|reply| Message::Cancel { id, reply })
    }

    /// # Errors
    /// [`AlarmError::ServiceStopped`]
    pub fn get(&self, id: AlarmId) -> Result<Option<AlarmSnapshot>, AlarmError> {
        self.request(|reply| Message::Get { id, reply })
    }

    /// # Errors
    /// [`AlarmError::ServiceStopped`]
    pub fn list(&self) -> Result<Vec<AlarmSnapshot>, AlarmError> {
        self.request(|reply| Message::List { reply })
    }

    /// Plays an alarm's recording now. `Ok(false)` if there was no such alarm.
    ///
    /// # Errors
    /// if playback can't be started or the service has stopped
    pub fn play(&self, id: AlarmId) -> Result<bool, AlarmError> {
        Ok(self.request(|reply| Message::Play { id, reply })??)
    }

    /// Stops the alarm thread, dropping every alarm that hasn't fired.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn request<T>(&self, message: impl FnOnce(Sender<T>) -> Message) -> Result<T, AlarmError> {
        let (reply, response) = mpsc::channel();
        self.sender
            .send(message(reply))
            .map_err(|_| AlarmError::ServiceStopped)?;
        response.recv().map_err(|_| AlarmError::ServiceStopped)
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.sender.send(Message::Shutdown);
            if worker.join().is_err() {
                error!("alarm thread panicked");
            }
        }
    }
}

impl Drop for AlarmClock {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<C: Clock>(mut registry: AlarmRegistry<C>, receiver: &Receiver<Message>) {
    info!("alarm thread started");
    loop {
        let message = match registry.until_next_fire() {
            Some(wait) => receiver.recv_timeout(wait),
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        // alarms that came due while waiting fire before the message is handled
        let fired = registry.fire_due();
        if !fired.is_empty() {
            debug!("fired {fired:?}");
        }
        match message {
            Ok(Message::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(message) => handle(&mut registry, message),
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
    info!(
        "alarm thread stopped with {} alarms pending",
        registry.list().len()
    );
}

fn handle<C: Clock>(registry: &mut AlarmRegistry<C>, message: Message) {
    debug!("handling {message:?}");
    // a requester that hung up doesn't need its answer
    match message {
        Message::Add { time, audio, reply } => {
            let _ = reply.send(registry.add(time, audio));
        }
        Message::Cancel { id, reply } => {
            let _ = reply.send(registry.cancel(id));
        }
        Message::Get { id, reply } => {
            let _ = reply.send(registry.get(id).map(AlarmSnapshot::from));
        }
        Message::List { reply } => {
            let _ = reply.send(registry.list().iter().map(AlarmSnapshot::from).collect());
        }
        Message::Play { id, reply } => {
            let _ = reply.send(registry.play(id));
        }
        Message::Shutdown => {}
    }
}
