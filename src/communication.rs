use std::sync::mpsc::Sender;

use crate::{
    alarm::{AlarmId, AlarmSnapshot, AudioArtifact, TimeOfDay},
    error::{AlarmError, PlaybackError},
};

/// requests sent to the thread that owns the alarm registry
/// each carries the sender its answer goes back on
#[derive(Debug)]
pub enum Message {
    Add {
        time: TimeOfDay,
        audio: AudioArtifact,
        reply: Sender<Result<AlarmId, AlarmError>>,
    },
    Cancel {
        id: AlarmId,
        reply: Sender<bool>,
    },
    Get {
        id: AlarmId,
        reply: Sender<Option<AlarmSnapshot>>,
    },
    List {
        reply: Sender<Vec<AlarmSnapshot>>,
    },
    // manual playback, the alarm stays armed
    Play {
        id: AlarmId,
        reply: Sender<Result<bool, PlaybackError>>,
    },
    Shutdown,
}
