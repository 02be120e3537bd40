use beatmap_model::{BeatmapModel, LANE_COUNT};
use beatmap_parser::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::EngineConfig;
use super::events::{GameEvent, GameEventListener, NullListener};
use super::lane::{JudgementResult, Lane};
use super::note::{Note, NoteId, NotePool, NoteState};
use super::score::SessionStats;
use crate::audio::AudioBackend;
use crate::input::InputEvent;
use crate::time::{AudioClock, SystemTimeSource, TimeSource};
use crate::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Idle,
    Loaded,
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("beatmap rejected: {0}")]
    Validation(#[from] ValidationError),
    #[error("audio failed to load: {0}")]
    AudioLoad(String),
    #[error("a song is still {0:?}; stop it first")]
    SessionActive(SessionPhase),
    #[error("no song is loaded")]
    NotLoaded,
}

/// Outcome of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongResult {
    pub title: String,
    pub final_score: u64,
    pub accuracy: f64,
    pub stats: SessionStats,
}

/// Drives one song at a time: spawns notes ahead of the clock, sweeps misses,
/// resolves input through the lanes and keeps the score.
///
/// Everything runs on the caller's thread. Call [`tick`](Self::tick) about every
/// `tick_interval_ms` and feed key presses in between with
/// [`handle_input`](Self::handle_input).
pub struct JudgementEngine<B, T = SystemTimeSource> {
    config: EngineConfig,
    time: T,
    listener: Box<dyn GameEventListener>,
    phase: SessionPhase,
    beatmap: Option<BeatmapModel>,
    clock: Option<AudioClock<B, T>>,
    lanes: Vec<Lane>,
    notes: NotePool,
    /// Judged last tick or since; destroyed at the next advancement step.
    retiring: Vec<NoteId>,
    stats: SessionStats,
    next_unspawned: usize,
    spawned: usize,
    current_time_ms: Millis,
    last_result: Option<SongResult>,
}

impl<B: AudioBackend, T: TimeSource + Clone> JudgementEngine<B, T> {
    pub fn new(config: EngineConfig, time: T) -> Self {
        let lanes = lanes_for(&config);
        Self {
            config,
            time,
            listener: Box::new(NullListener),
            phase: SessionPhase::Idle,
            beatmap: None,
            clock: None,
            lanes,
            notes: NotePool::new(),
            retiring: Vec::new(),
            stats: SessionStats::default(),
            next_unspawned: 0,
            spawned: 0,
            current_time_ms: 0,
            last_result: None,
        }
    }

    pub fn with_listener(mut self, listener: impl GameEventListener + 'static) -> Self {
        self.set_listener(listener);
        self
    }

    pub fn set_listener(&mut self, listener: impl GameEventListener + 'static) {
        self.listener = Box::new(listener);
    }

    /// Validates the map and loads its audio. Nothing changes unless both succeed.
    pub fn load(&mut self, beatmap: BeatmapModel, mut audio: B) -> Result<(), StartError> {
        if matches!(self.phase, SessionPhase::Playing | SessionPhase::Paused) {
            return Err(StartError::SessionActive(self.phase));
        }
        beatmap_parser::check(&beatmap)?;
        let audio_path = beatmap
            .audio_path()
            .ok_or(StartError::Validation(ValidationError::MissingAudioFilename))?;
        audio
            .load(&audio_path)
            .map_err(|e| StartError::AudioLoad(format!("{e:#}")))?;

        let mut clock = AudioClock::new(audio, self.time.clone())
            .with_drift_threshold_ms(self.config.drift_threshold_ms);
        clock.set_offset_ms(self.config.audio_offset_ms);

        self.reset_session(beatmap.hit_objects.len());
        log::info!(
            "loaded \"{}\" ({} notes, audio {})",
            beatmap.title(),
            beatmap.hit_objects.len(),
            audio_path.display()
        );
        self.beatmap = Some(beatmap);
        self.clock = Some(clock);
        self.phase = SessionPhase::Loaded;
        Ok(())
    }

    /// Starts the loaded song from the top and runs the first tick.
    pub fn play(&mut self) -> Result<(), StartError> {
        if self.phase != SessionPhase::Loaded {
            return Err(StartError::NotLoaded);
        }
        let (Some(clock), Some(beatmap)) = (self.clock.as_mut(), self.beatmap.as_ref()) else {
            return Err(StartError::NotLoaded);
        };
        clock.start(0);
        let metadata = beatmap.metadata.clone();

        self.phase = SessionPhase::Playing;
        self.emit(GameEvent::SongStarted { metadata });
        self.tick();
        Ok(())
    }

    pub fn start_song(&mut self, beatmap: BeatmapModel, audio: B) -> Result<(), StartError> {
        self.load(beatmap, audio)?;
        self.play()
    }

    /// One simulation step: spawn scan, miss sweep, then note state advancement.
    /// Does nothing unless playing.
    pub fn tick(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        let Some(clock) = self.clock.as_ref() else {
            return;
        };
        let now = clock.position_ms();
        self.current_time_ms = now;

        let spawned_before = self.next_unspawned;
        self.spawn_due(now);
        let missed = self.sweep_misses(now);
        self.advance_notes(now, spawned_before, missed);

        if self.config.auto_finish && self.song_complete(now) {
            log::info!("all notes judged at {now}ms; finishing");
            self.stop();
        }
    }

    fn spawn_due(&mut self, now: Millis) {
        let Some(beatmap) = self.beatmap.as_ref() else {
            return;
        };
        let horizon = now.saturating_add(self.config.note_travel_ms);

        while let Some(obj) = beatmap.hit_objects.get(self.next_unspawned) {
            if obj.time_ms > horizon {
                break;
            }
            let note = Note::new(NoteId(self.next_unspawned), obj);
            if let Some(lane) = self.lanes.get_mut(note.lane as usize) {
                lane.register(&note);
            }
            self.notes.insert(note);
            self.next_unspawned += 1;
            self.spawned += 1;
        }
    }

    fn sweep_misses(&mut self, now: Millis) -> Vec<NoteId> {
        let mut missed = Vec::new();
        for lane in self.lanes.iter_mut() {
            for id in lane.check_missed_notes(now, &mut self.notes) {
                missed.push((lane.index(), id));
            }
        }

        missed.sort_by_key(|(lane, id)| {
            (self.notes.get(*id).map(|n| n.target_time_ms), *lane)
        });
        let ids = missed.iter().map(|(_, id)| *id).collect();
        for (lane, _) in missed {
            self.apply_miss(lane);
        }
        ids
    }

    /// Retires last tick's judged notes and starts moving the ones spawned
    /// before this tick.
    fn advance_notes(&mut self, now: Millis, spawned_before: usize, missed_this_tick: Vec<NoteId>) {
        for id in std::mem::replace(&mut self.retiring, missed_this_tick) {
            if let Some(note) = self.notes.get_mut(id) {
                if let Err(e) = note.destroy() {
                    log::debug!("{e}");
                }
            }
        }
        self.notes.sweep_destroyed();

        for note in self.notes.iter_mut() {
            if note.id.0 < spawned_before && note.state() == NoteState::Spawning {
                if let Err(e) = note.begin_moving(now) {
                    log::debug!("{e}");
                }
            }
        }
    }

    fn song_complete(&self, now: Millis) -> bool {
        let Some(beatmap) = self.beatmap.as_ref() else {
            return false;
        };
        let audio_end = self.clock.as_ref().map_or(0, AudioClock::duration_ms);
        self.next_unspawned >= beatmap.hit_objects.len()
            && self.stats.all_judged()
            && now >= audio_end.max(beatmap.last_time_ms())
    }

    /// Resolves a key press immediately. Returns None when nothing was in range.
    pub fn handle_input(&mut self, event: InputEvent) -> Option<JudgementResult> {
        if self.phase != SessionPhase::Playing {
            log::debug!("input on lane {} ignored while {:?}", event.lane, self.phase);
            return None;
        }
        let lane = self.lanes.get_mut(event.lane as usize)?;
        let result = lane.on_input(event.time_ms, &mut self.notes)?;

        self.retiring.push(result.note);
        self.apply_hit(&result);
        Some(result)
    }

    pub fn press(&mut self, lane: u8, time_ms: Millis) -> Option<JudgementResult> {
        self.handle_input(InputEvent::new(lane, time_ms))
    }

    /// Misses a Moving note now, regardless of its timing.
    pub fn force_miss(&mut self, id: NoteId) -> bool {
        if self.phase != SessionPhase::Playing {
            return false;
        }
        let Some(lane_idx) = self.notes.get(id).map(|n| n.lane) else {
            return false;
        };
        let Some(lane) = self.lanes.get_mut(lane_idx as usize) else {
            return false;
        };
        if !lane.force_miss(id, &mut self.notes) {
            return false;
        }
        self.retiring.push(id);
        self.apply_miss(lane_idx);
        true
    }

    fn apply_hit(&mut self, result: &JudgementResult) {
        let points = self.stats.record_hit(result.tier);
        self.emit(GameEvent::NoteJudged {
            lane: result.lane,
            tier: result.tier,
            points,
            time_diff_ms: result.time_diff_ms,
        });
        self.emit(GameEvent::ComboChanged {
            combo: self.stats.combo,
            max_combo: self.stats.max_combo,
        });
        let every = self.config.combo_milestone_every;
        if every > 0 && self.stats.combo % every == 0 {
            self.emit(GameEvent::ComboMilestone {
                combo: self.stats.combo,
            });
        }
        self.emit(GameEvent::ScoreChanged {
            score: self.stats.score,
        });
    }

    fn apply_miss(&mut self, lane: u8) {
        let had_combo = self.stats.combo > 0;
        self.stats.record_miss();
        self.emit(GameEvent::NoteMissed { lane });
        if had_combo {
            self.emit(GameEvent::ComboChanged {
                combo: 0,
                max_combo: self.stats.max_combo,
            });
        }
    }

    pub fn pause(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        if let Some(clock) = self.clock.as_mut() {
            clock.pause();
        }
        self.phase = SessionPhase::Paused;
        log::info!("paused at {}ms", self.current_time_ms);
    }

    pub fn resume(&mut self) {
        if self.phase != SessionPhase::Paused {
            return;
        }
        if let Some(clock) = self.clock.as_mut() {
            clock.resume();
        }
        self.phase = SessionPhase::Playing;
        log::info!("resumed at {}ms", self.current_time_ms);
    }

    /// Ends the session and reports the result once. Later calls return None.
    ///
    /// A song that was loaded but never played is unloaded without a result.
    pub fn stop(&mut self) -> Option<SongResult> {
        match self.phase {
            SessionPhase::Playing | SessionPhase::Paused => {}
            SessionPhase::Loaded => {
                self.unload();
                return None;
            }
            SessionPhase::Idle | SessionPhase::Stopped => return None,
        }

        if let Some(clock) = self.clock.as_mut() {
            clock.stop();
        }
        self.phase = SessionPhase::Stopped;
        self.clear_notes();

        let result = SongResult {
            title: self
                .beatmap
                .as_ref()
                .map(|b| b.title().to_string())
                .unwrap_or_default(),
            final_score: self.stats.final_score(),
            accuracy: self.stats.accuracy(),
            stats: self.stats.clone(),
        };
        log::info!(
            "finished \"{}\": score {} accuracy {:.2}% max combo {}",
            result.title,
            result.final_score,
            result.accuracy,
            result.stats.max_combo
        );
        self.emit(GameEvent::SongFinished {
            final_score: result.final_score,
            stats: result.stats.clone(),
            accuracy: result.accuracy,
        });
        self.last_result = Some(result.clone());
        Some(result)
    }

    /// Drops the song and returns to Idle; the last result stays readable.
    pub fn unload(&mut self) {
        if matches!(self.phase, SessionPhase::Playing | SessionPhase::Paused) {
            self.stop();
        }
        self.clear_notes();
        self.beatmap = None;
        self.clock = None;
        self.phase = SessionPhase::Idle;
    }

    pub fn set_audio_offset_ms(&mut self, offset_ms: Millis) {
        self.config.audio_offset_ms = offset_ms;
        if let Some(clock) = self.clock.as_mut() {
            clock.set_offset_ms(offset_ms);
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        if let Some(clock) = self.clock.as_mut() {
            clock.backend_mut().set_volume(volume);
        }
    }

    fn reset_session(&mut self, total_notes: usize) {
        self.clear_notes();
        self.stats = SessionStats::new(total_notes as u32);
        self.next_unspawned = 0;
        self.spawned = 0;
        self.current_time_ms = 0;
        self.last_result = None;
    }

    fn clear_notes(&mut self) {
        self.notes.clear();
        self.retiring.clear();
        for lane in self.lanes.iter_mut() {
            lane.reset();
        }
    }

    fn emit(&mut self, event: GameEvent) {
        self.listener.on_event(&event);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn beatmap(&self) -> Option<&BeatmapModel> {
        self.beatmap.as_ref()
    }

    /// Clock position sampled at the last tick.
    pub fn current_time_ms(&self) -> Millis {
        self.current_time_ms
    }

    pub fn clock(&self) -> Option<&AudioClock<B, T>> {
        self.clock.as_ref()
    }

    /// Live notes, including ones judged since the last tick.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn next_unspawned_index(&self) -> usize {
        self.next_unspawned
    }

    /// Notes created this session; never exceeds the map's hit object count.
    pub fn spawned_count(&self) -> usize {
        self.spawned
    }

    pub fn last_result(&self) -> Option<&SongResult> {
        self.last_result.as_ref()
    }

    /// Song progress in `[0, 1]` against the audio length, or the last note when unknown.
    pub fn progress(&self) -> f64 {
        let Some(beatmap) = self.beatmap.as_ref() else {
            return 0.0;
        };
        let audio_end = self.clock.as_ref().map_or(0, AudioClock::duration_ms);
        let end = if audio_end > 0 { audio_end } else { beatmap.last_time_ms() };
        if end <= 0 {
            return 0.0;
        }
        (self.current_time_ms as f64 / end as f64).clamp(0.0, 1.0)
    }
}

fn lanes_for(config: &EngineConfig) -> Vec<Lane> {
    (0..LANE_COUNT as u8).map(|i| Lane::new(i, config)).collect()
}
