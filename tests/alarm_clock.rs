use std::{
    sync::mpsc::{self, Receiver, Sender},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use voice_alarm::{
    console::render_alarms, Alarm, AlarmClock, AlarmError, AlarmId, AudioArtifact, InvalidInput,
    ManualClock, PlaybackError, Player, TimeOfDay,
};

const WAIT: Duration = Duration::from_secs(2);

/// sends every artifact it is asked to play down a channel
struct ChannelPlayer(Sender<AudioArtifact>);

impl Player for ChannelPlayer {
    fn play(&self, audio: &AudioArtifact) -> Result<(), PlaybackError> {
        self.0.send(audio.clone()).map_err(|_| PlaybackError::Stopped)
    }
}

fn two_pm() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap()
}

fn blob(name: &str) -> AudioArtifact {
    AudioArtifact::new(name.as_bytes().to_vec())
}

fn start() -> (
    ManualClock,
    AlarmClock,
    Receiver<AudioArtifact>,
    Receiver<Vec<AlarmId>>,
) {
    let clock = ManualClock::at(two_pm());
    let (played_tx, played) = mpsc::channel();
    let (shown_tx, shown) = mpsc::channel();
    let alarms = AlarmClock::spawn(
        clock.clone(),
        ChannelPlayer(played_tx),
        move |alarms: &[Alarm]| {
            let _ = shown_tx.send(alarms.iter().map(Alarm::id).collect());
        },
    )
    .unwrap();
    (clock, alarms, played, shown)
}

#[test]
fn due_alarm_fires_on_its_own() {
    let (_clock, alarms, played, _shown) = start();
    let id = alarms.submit("14:00", Some(blob("now"))).unwrap();
    assert_eq!(played.recv_timeout(WAIT).unwrap(), blob("now"));
    assert!(alarms.get(id).unwrap().is_none());
    assert!(alarms.list().unwrap().is_empty());
    assert!(played.try_recv().is_err());
}

#[test]
fn alarm_fires_after_its_delay() {
    let (clock, alarms, played, _shown) = start();
    let id = alarms.submit("14:30", Some(blob("blob1"))).unwrap();
    let listed = alarms.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].time, TimeOfDay::new(14, 30).unwrap());
    assert!(played.try_recv().is_err());

    clock.advance(Duration::from_secs(30 * 60));
    // the alarm fires before the request is answered
    assert!(alarms.list().unwrap().is_empty());
    assert_eq!(played.recv_timeout(WAIT).unwrap(), blob("blob1"));

    clock.advance(Duration::from_secs(24 * 60 * 60));
    assert!(alarms.list().unwrap().is_empty());
    assert!(played.try_recv().is_err());
}

#[test]
fn passed_time_stays_listed() {
    let (_clock, alarms, played, _shown) = start();
    let id = alarms.submit("13:00", Some(blob("blob2"))).unwrap();
    let alarm = alarms.get(id).unwrap().unwrap();
    assert_eq!(alarm.fires_at, two_pm() + TimeDelta::hours(23));
    assert_eq!(alarms.list().unwrap().len(), 1);
    assert!(played.try_recv().is_err());
}

#[test]
fn cancelled_alarm_is_never_played() {
    let (clock, alarms, played, _shown) = start();
    let id = alarms.submit("09:00", Some(blob("blobX"))).unwrap();
    assert!(alarms.cancel(id).unwrap());
    assert!(!alarms.cancel(id).unwrap());
    clock.advance(Duration::from_secs(24 * 60 * 60));
    assert!(alarms.list().unwrap().is_empty());
    assert!(played.try_recv().is_err());
}

#[test]
fn unknown_ids_are_not_errors() {
    let (_clock, alarms, _played, _shown) = start();
    let id = alarms.submit("20:00", Some(blob("keep"))).unwrap();
    let missing = "999".parse::<AlarmId>().unwrap();
    assert!(!alarms.cancel(missing).unwrap());
    assert!(!alarms.play(missing).unwrap());
    assert!(alarms.get(missing).unwrap().is_none());
    assert_eq!(alarms.list().unwrap().len(), 1);
    assert_eq!(alarms.list().unwrap()[0].id, id);
}

#[test]
fn invalid_submissions_change_nothing() {
    let (_clock, alarms, _played, shown) = start();
    assert!(matches!(
        alarms.submit("14:30", None),
        Err(AlarmError::InvalidInput(InvalidInput::MissingAudio))
    ));
    assert!(matches!(
        alarms.submit("half past", Some(blob("clip"))),
        Err(AlarmError::InvalidInput(InvalidInput::Time(_)))
    ));
    assert!(alarms.list().unwrap().is_empty());
    assert!(shown.try_recv().is_err());
}

#[test]
fn manual_play_leaves_alarm_armed() {
    let (_clock, alarms, played, _shown) = start();
    let id = alarms.submit("18:00", Some(blob("review"))).unwrap();
    assert!(alarms.play(id).unwrap());
    assert_eq!(played.recv_timeout(WAIT).unwrap(), blob("review"));
    assert_eq!(alarms.list().unwrap().len(), 1);
}

#[test]
fn presenter_gets_full_list_after_each_change() {
    let (clock, alarms, _played, shown) = start();
    let first = alarms.submit("14:10", Some(blob("a"))).unwrap();
    let second = alarms.submit("15:00", Some(blob("b"))).unwrap();
    alarms.cancel(second).unwrap();
    clock.advance(Duration::from_secs(10 * 60));
    alarms.list().unwrap();

    let updates: Vec<Vec<AlarmId>> = shown.try_iter().collect();
    assert_eq!(
        updates,
        vec![vec![first], vec![first, second], vec![first], vec![]]
    );
}

#[test]
fn ids_are_unique() {
    let (_clock, alarms, _played, _shown) = start();
    let mut ids = Vec::new();
    for time in ["08:00", "08:00", "21:15", "08:00"] {
        ids.push(alarms.submit(time, Some(blob(time))).unwrap());
    }
    alarms.cancel(ids[1]).unwrap();
    ids.push(alarms.submit("08:00", Some(blob("again"))).unwrap());
    let mut listed: Vec<AlarmId> = alarms.list().unwrap().iter().map(|a| a.id).collect();
    assert_eq!(listed.len(), 4);
    listed.sort();
    listed.dedup();
    assert_eq!(listed.len(), 4);
}

#[test]
fn shutdown_stops_the_service() {
    let (_clock, alarms, played, _shown) = start();
    alarms.submit("23:00", Some(blob("late"))).unwrap();
    alarms.shutdown();
    assert!(played.try_recv().is_err());
}

#[test]
fn unusable_time_format_keeps_the_service_running() {
    let clock = ManualClock::at(two_pm());
    let (played_tx, played) = mpsc::channel();
    let (shown_tx, shown) = mpsc::channel();
    let alarms = AlarmClock::spawn(
        clock.clone(),
        ChannelPlayer(played_tx),
        move |alarms: &[Alarm]| {
            let _ = shown_tx.send(render_alarms(alarms, "%Q"));
        },
    )
    .unwrap();

    let id = alarms.submit("14:30", Some(blob("clip"))).unwrap();
    assert_eq!(
        shown.recv_timeout(WAIT).unwrap(),
        vec![format!("[{id}] 14:30 (next: Wed 14:30, 4 bytes)")]
    );
    let second = alarms.submit("16:00", Some(blob("more"))).unwrap();
    assert_eq!(alarms.list().unwrap().len(), 2);

    clock.advance(Duration::from_secs(30 * 60));
    assert_eq!(alarms.list().unwrap()[0].id, second);
    assert_eq!(played.recv_timeout(WAIT).unwrap(), blob("clip"));
}
