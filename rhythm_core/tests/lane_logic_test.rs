#[cfg(test)]
mod tests {
    use beatmap_model::HitObject;
    use rhythm_core::gameplay::{EngineConfig, Lane, Note, NoteId, NotePool, NoteState, Tier};

    /// Lane 1: notes at 1000 and 2000. Lane 2: a note at 1500.
    fn create_test_lanes() -> (Vec<Lane>, NotePool) {
        let config = EngineConfig::default();
        let objects = [
            HitObject::tap(1_000, 1),
            HitObject::tap(1_500, 2),
            HitObject::tap(2_000, 1),
        ];
        let mut lanes: Vec<Lane> = (0..4).map(|i| Lane::new(i, &config)).collect();
        let mut pool = NotePool::new();
        for (idx, obj) in objects.iter().enumerate() {
            let mut note = Note::new(NoteId(idx), obj);
            note.begin_moving(0).unwrap();
            assert!(lanes[obj.lane as usize].register(&note));
            pool.insert(note);
        }
        (lanes, pool)
    }

    #[test]
    fn test_perfect_judgment() {
        let (mut lanes, mut pool) = create_test_lanes();

        let result = lanes[1].on_input(1_000, &mut pool).expect("Should trigger judgment");
        assert_eq!(result.tier, Tier::Perfect);
        assert_eq!(result.note, NoteId(0));
        assert_eq!(result.time_diff_ms, 0);
        assert_eq!(pool.get(NoteId(0)).unwrap().state(), NoteState::Hit);
    }

    #[test]
    fn test_tier_edges() {
        for (input, tier) in [
            (1_050, Tier::Perfect),
            (1_051, Tier::Great),
            (949, Tier::Great),
            (1_100, Tier::Great),
            (1_101, Tier::Good),
            (850, Tier::Good),
        ] {
            let (mut lanes, mut pool) = create_test_lanes();
            let result = lanes[1].on_input(input, &mut pool).expect("in window");
            assert_eq!(result.tier, tier, "input at {input}");
        }

        let (mut lanes, mut pool) = create_test_lanes();
        assert!(lanes[1].on_input(1_151, &mut pool).is_none());
        assert!(lanes[1].on_input(849, &mut pool).is_none());
    }

    #[test]
    fn test_ignored_input_too_early() {
        let (mut lanes, mut pool) = create_test_lanes();

        let result = lanes[1].on_input(500, &mut pool);
        assert!(result.is_none());

        // Nothing consumed, nothing missed.
        assert_eq!(lanes[1].active_notes().len(), 2);
        assert_eq!(pool.get(NoteId(0)).unwrap().state(), NoteState::Moving);
    }

    #[test]
    fn test_check_missed_notes() {
        let (mut lanes, mut pool) = create_test_lanes();

        assert!(lanes[1].check_missed_notes(1_000, &mut pool).is_empty());
        assert!(lanes[1].check_missed_notes(1_350, &mut pool).is_empty());

        let misses = lanes[1].check_missed_notes(1_351, &mut pool);
        assert_eq!(misses, vec![NoteId(0)]);
        assert_eq!(pool.get(NoteId(0)).unwrap().state(), NoteState::Missed);

        // Reported once.
        assert!(lanes[1].check_missed_notes(1_352, &mut pool).is_empty());

        let mut all = Vec::new();
        for lane in lanes.iter_mut() {
            all.extend(lane.check_missed_notes(2_351, &mut pool));
        }
        assert_eq!(all, vec![NoteId(2), NoteId(1)]);
    }

    #[test]
    fn test_lane_independence_out_of_order_input() {
        let (mut lanes, mut pool) = create_test_lanes();

        let result = lanes[2].on_input(1_500, &mut pool).expect("Hit Lane 2");
        assert_eq!(result.note, NoteId(1));

        let result = lanes[1].on_input(1_000, &mut pool).expect("Hit Lane 1");
        assert_eq!(result.note, NoteId(0));

        for lane in lanes.iter_mut() {
            assert!(lane.check_missed_notes(1_600, &mut pool).is_empty());
        }
    }

    #[test]
    fn test_reset_clears_lane() {
        let (mut lanes, mut pool) = create_test_lanes();
        lanes[1].on_input(1_000, &mut pool).unwrap();
        assert_eq!(lanes[1].combo(), 1);

        lanes[1].reset();
        assert_eq!(lanes[1].combo(), 0);
        assert!(lanes[1].active_notes().is_empty());
        assert!(lanes[1].on_input(2_000, &mut pool).is_none());
    }
}
