use std::path::Path;

use rhythm_core::audio::{AudioBackend, ManualAudio};
use rhythm_core::time::{AudioClock, ClockState, ManualTime};

fn loaded_clock() -> (AudioClock<ManualAudio, ManualTime>, ManualAudio, ManualTime) {
    let mut audio = ManualAudio::with_duration_ms(60_000);
    audio.load(Path::new("song.ogg")).unwrap();
    let time = ManualTime::new();
    time.set(10_000);
    let clock = AudioClock::new(audio.clone(), time.clone());
    (clock, audio, time)
}

#[test]
fn zero_until_loaded_and_started() {
    let time = ManualTime::new();
    let clock = AudioClock::new(ManualAudio::new(), time.clone());
    time.advance(5_000);
    assert_eq!(clock.position_ms(), 0);

    let (clock, _audio, time) = loaded_clock();
    time.advance(5_000);
    assert_eq!(clock.state(), ClockState::Stopped);
    assert_eq!(clock.position_ms(), 0);
}

#[test]
fn small_drift_trusts_the_stream() {
    let (mut clock, audio, time) = loaded_clock();
    clock.start(0);

    time.advance(500);
    audio.advance(500);
    assert_eq!(clock.position_ms(), 500);

    // Buffer-sized lag: the stream is 60ms behind the wall clock.
    time.advance(60);
    assert_eq!(clock.position_ms(), 500);

    // Exactly at the threshold still trusts the stream.
    time.advance(40);
    assert_eq!(clock.position_ms(), 500);
}

#[test]
fn large_drift_trusts_the_wall_clock() {
    let (mut clock, audio, time) = loaded_clock();
    clock.start(0);
    time.advance(1_000);
    audio.advance(1_000);

    // Stream stalls after a seek.
    time.advance(101);
    assert_eq!(clock.position_ms(), 1_101);

    // Stream jumps ahead of the wall clock.
    audio.set_position_ms(1_500);
    assert_eq!(clock.position_ms(), 1_101);
    audio.set_position_ms(1_150);
    assert_eq!(clock.position_ms(), 1_150);
}

#[test]
fn custom_drift_threshold() {
    let (clock, audio, time) = loaded_clock();
    let mut clock = clock.with_drift_threshold_ms(20);
    clock.start(0);
    time.advance(200);
    audio.advance(170);
    assert_eq!(clock.position_ms(), 200);
}

#[test]
fn start_offset_and_latency_bias() {
    let (mut clock, audio, time) = loaded_clock();
    clock.start(2_000);
    assert_eq!(clock.position_ms(), 2_000);

    time.advance(250);
    audio.advance(250);
    clock.set_offset_ms(30);
    assert_eq!(clock.offset_ms(), 30);
    assert_eq!(clock.position_ms(), 2_280);

    clock.set_offset_ms(-40);
    assert_eq!(clock.position_ms(), 2_210);
}

#[test]
fn pause_and_resume_keep_position_continuous() {
    let (mut clock, audio, time) = loaded_clock();
    clock.start(0);
    time.advance(800);
    audio.advance(800);

    clock.pause();
    assert_eq!(clock.state(), ClockState::Paused);
    assert!(!audio.is_playing());

    time.advance(3_000);
    audio.advance(3_000);
    assert_eq!(clock.position_ms(), 800);

    clock.resume();
    assert!(clock.is_playing());
    assert_eq!(clock.position_ms(), 800);

    time.advance(200);
    audio.advance(200);
    assert_eq!(clock.position_ms(), 1_000);
}

#[test]
fn stop_returns_to_zero() {
    let (mut clock, audio, time) = loaded_clock();
    clock.start(0);
    time.advance(400);
    audio.advance(400);
    clock.stop();
    clock.stop();
    assert_eq!(clock.state(), ClockState::Stopped);
    assert_eq!(clock.position_ms(), 0);
    assert_eq!(clock.duration_ms(), 60_000);
}
