//! Starting playback of recorded audio.

use std::{
    io::Cursor,
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use log::{error, info};
use rodio::{Decoder, OutputStreamBuilder, Sink};

use crate::{alarm::AudioArtifact, error::PlaybackError};

/// Starts audible playback of an artifact and returns without waiting for it
/// to finish. Every call starts an independent stream.
pub trait Player {
    /// # Errors
    /// if playback could not be started
    fn play(&self, audio: &AudioArtifact) -> Result<(), PlaybackError>;
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn play(&self, audio: &AudioArtifact) -> Result<(), PlaybackError> {
        (**self).play(audio)
    }
}

/// Plays through the default output device.
///
/// The output stream lives on its own thread for as long as the player does;
/// each artifact gets a detached sink on the stream's mixer.
#[derive(Debug, Clone)]
pub struct RodioPlayer {
    sender: Sender<AudioArtifact>,
}

impl RodioPlayer {
    /// Opens the default output device and starts the audio thread.
    /// `volume` is a percentage.
    ///
    /// # Errors
    /// if the output stream can't be opened
    pub fn spawn(volume: f32) -> Result<Self, PlaybackError> {
        let (sender, receiver) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        thread::Builder::new()
            .name("voice_alarm-playback".to_string())
            .spawn(move || run_output(volume, &receiver, &ready_tx))
            .map_err(|e| PlaybackError::Output(e.to_string()))?;
        // the thread drops `ready_tx` without sending only if it panicked
        ready_rx.recv().map_err(|_| PlaybackError::Stopped)??;
        Ok(Self { sender })
    }
}

impl Player for RodioPlayer {
    fn play(&self, audio: &AudioArtifact) -> Result<(), PlaybackError> {
        self.sender
            .send(audio.clone())
            .map_err(|_| PlaybackError::Stopped)
    }
}

fn run_output(
    volume: f32,
    receiver: &Receiver<AudioArtifact>,
    ready: &Sender<Result<(), PlaybackError>>,
) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(PlaybackError::Output(e.to_string())));
            return;
        }
    };
    // exits once every `RodioPlayer` clone is gone
    for audio in receiver {
        match Decoder::new(Cursor::new(audio.clone())) {
            Ok(source) => {
                let sink = Sink::connect_new(stream.mixer());
                sink.set_volume(volume / 100.0);
                sink.append(source);
                sink.detach();
                info!("playing {} bytes of audio", audio.len());
            }
            Err(e) => error!("{}", PlaybackError::Decode(e.to_string())),
        }
    }
}
