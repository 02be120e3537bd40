use anyhow::Context;
use beatmap_model::{BeatmapModel, Millis};
use crossbeam_channel::unbounded;
use rhythm_core::audio::ManualAudio;
use rhythm_core::gameplay::{
    ChannelListener, EngineConfig, JudgementEngine, SessionPhase, SongResult,
};
use rhythm_core::time::ManualTime;

#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    /// Even notes are pressed this late, odd notes this early.
    pub jitter_ms: Millis,
    /// Every Nth note (1-based) is left for the miss sweep.
    pub skip_every: Option<usize>,
    /// Print each engine event as a JSON line.
    pub print_events: bool,
}

struct Press {
    lane: u8,
    time_ms: Millis,
}

/// Plays the whole map against a hand-driven clock, pressing each note on
/// schedule between ticks.
pub fn run_simulation(
    beatmap: BeatmapModel,
    config: EngineConfig,
    options: &SimulateOptions,
) -> anyhow::Result<SongResult> {
    let mut presses: Vec<Press> = beatmap
        .hit_objects
        .iter()
        .enumerate()
        .filter(|(idx, _)| !options.skip_every.is_some_and(|n| (idx + 1) % n == 0))
        .map(|(idx, obj)| {
            let jitter = if idx % 2 == 0 {
                options.jitter_ms
            } else {
                -options.jitter_ms
            };
            Press {
                lane: obj.lane,
                time_ms: obj.time_ms.saturating_add(jitter),
            }
        })
        .collect();
    presses.sort_by_key(|p| p.time_ms);

    let step = config.tick_interval_ms.max(1);
    let deadline = beatmap
        .last_time_ms()
        .saturating_add(config.miss_after_ms())
        .saturating_add(4 * step);

    let time = ManualTime::new();
    let audio = ManualAudio::new();
    let (tx, rx) = unbounded();
    let mut engine =
        JudgementEngine::new(config, time.clone()).with_listener(ChannelListener::new(tx));
    engine
        .start_song(beatmap, audio.clone())
        .context("song failed to start")?;

    let mut pending = presses.into_iter().peekable();
    while engine.phase() == SessionPhase::Playing {
        time.advance(step);
        audio.advance(step);
        let now = engine
            .clock()
            .map(|c| c.position_ms())
            .unwrap_or_default();

        while let Some(press) = pending.next_if(|p| p.time_ms <= now) {
            if engine.press(press.lane, press.time_ms).is_none() {
                log::debug!("press on lane {} at {}ms matched nothing", press.lane, press.time_ms);
            }
        }
        engine.tick();

        if engine.current_time_ms() > deadline {
            engine.stop();
        }
        if options.print_events {
            for event in rx.try_iter() {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    }

    engine
        .last_result()
        .cloned()
        .context("session ended without a result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatmap_model::{keys, HitObject, Metadata};
    use rhythm_core::gameplay::COMBO_BONUS_PER_STEP;
    use serde_json::json;

    fn beatmap() -> BeatmapModel {
        let mut metadata = Metadata::new();
        metadata.insert(keys::TITLE.to_string(), json!("Sim"));
        metadata.insert(keys::AUDIO_FILENAME.to_string(), json!("sim.ogg"));
        BeatmapModel {
            metadata,
            hit_objects: (0..4).map(|i| HitObject::tap(1_000 + i * 250, i)).collect(),
            ..BeatmapModel::default()
        }
    }

    #[test]
    fn clean_run_is_all_perfect() {
        let result =
            run_simulation(beatmap(), EngineConfig::default(), &SimulateOptions::default()).unwrap();
        assert_eq!(result.stats.perfect, 4);
        assert_eq!(result.final_score, 4 * 300 + 4 * COMBO_BONUS_PER_STEP);
    }

    #[test]
    fn skipped_notes_are_missed() {
        let options = SimulateOptions {
            skip_every: Some(2),
            ..SimulateOptions::default()
        };
        let result = run_simulation(beatmap(), EngineConfig::default(), &options).unwrap();
        // Notes 1 and 3 are swept only after note 2 was already hit.
        assert_eq!(result.stats.miss, 2);
        assert_eq!(result.stats.max_combo, 2);
        assert!((result.accuracy - 50.0).abs() < 1e-9);
    }

    #[test]
    fn runs_to_completion_without_auto_finish() {
        let config = EngineConfig {
            auto_finish: false,
            ..EngineConfig::default()
        };
        let options = SimulateOptions {
            jitter_ms: 120,
            ..SimulateOptions::default()
        };
        let result = run_simulation(beatmap(), config, &options).unwrap();
        assert_eq!(result.stats.good, 4);
        assert_eq!(result.stats.notes_judged(), 4);
    }
}
