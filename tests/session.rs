// Integration tests for `letter-leap`: whole sessions driven through the
// public API the way a host would drive them.

use glam::Vec2;
use letter_leap::LevelConfig;
use letter_leap::config::{ComponentSpec, PlatformSubtype};
use letter_leap::consts::*;
use letter_leap::sim::{
    Aabb, CollectibleValue, EntityId, EntityRegistry, GameEvent, GamePhase, GameSession, GoalKind, GoalValue,
    OccupancyMap, Occupant, PlatformKind, TickInput, WallRole, WallState, build_level,
    overlapping_collectibles, tick,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Two segments: 20 letters then the default number segment
fn two_segment_level() -> LevelConfig {
    let mut config = LevelConfig::default();
    config.segments.truncate(2);
    config.segments[0].components = vec![
        ComponentSpec::Character {
            x: 100.0,
            y: LEVEL_HEIGHT - 150.0,
        },
        ComponentSpec::Letter { count: 20 },
        ComponentSpec::Platform {
            subtype: PlatformSubtype::Ground,
        },
        ComponentSpec::Platform {
            subtype: PlatformSubtype::Floating,
        },
    ];
    config.validate().expect("valid two-segment level");
    config
}

fn host_input(pos: Vec2, overlaps: Vec<EntityId>) -> TickInput {
    TickInput {
        player_pos: Some(pos),
        overlaps: Some(overlaps),
        ..Default::default()
    }
}

fn run_autopilot(seed: u64, max_ticks: u32) -> (GameSession, Vec<GameEvent>) {
    let mut session = GameSession::new(LevelConfig::default(), seed);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut events = session.drain_events();
    for _ in 0..max_ticks {
        tick(&mut session, &input, SIM_DT);
        events.extend(session.drain_events());
        if session.phase == GamePhase::Finished {
            break;
        }
    }
    (session, events)
}

#[test]
fn letter_goal_clears_segment_then_crossing_advances() {
    let mut session = GameSession::new(two_segment_level(), 2024);
    assert_eq!(session.registry.collectible_count(), 20 + 100);

    let goal = *session.current_goal().expect("segment 0 goal");
    let GoalValue::Letter(letter) = goal.value else {
        panic!("segment 0 only allows letter goals, got {}", goal);
    };
    let target = session
        .registry
        .active_in_segment(0)
        .find(|c| c.value == CollectibleValue::Letter(letter))
        .map(|c| c.id)
        .expect("goal is satisfiable");
    let spawn = session.player.pos;
    session.drain_events();

    tick(&mut session, &host_input(spawn, vec![target]), SIM_DT);

    let events = session.drain_events();
    assert!(events.contains(&GameEvent::SegmentCleared { segment: 0 }));
    assert!(events.contains(&GameEvent::CelebrationStarted));
    assert!(events.iter().any(|e| matches!(e, GameEvent::WallFadeOut { .. })));
    assert!(session.progress.goals_satisfied);
    assert_eq!(
        session.registry.exit_wall(0).map(|w| w.state),
        Some(WallState::FadingOut)
    );
    // Cleared but not yet crossed
    assert_eq!(session.progress.index, 0);

    let boundary = session.current_layout().end_x;
    tick(&mut session, &host_input(Vec2::new(boundary - 10.0, spawn.y), vec![]), SIM_DT);
    assert_eq!(session.progress.index, 0);

    tick(&mut session, &host_input(Vec2::new(boundary + 50.0, spawn.y), vec![]), SIM_DT);
    assert_eq!(session.progress.index, 1);
    let goal = session.current_goal().expect("segment 1 goal");
    assert!(session.config.segments[1].goals.contains(&goal.kind));

    let events = session.drain_events();
    assert!(events.contains(&GameEvent::SegmentEntered { segment: 1 }));
    assert!(events.iter().any(|e| matches!(e, GameEvent::WallFadeIn { .. })));

    // The exit wall despawns once its fade finishes
    for _ in 0..WALL_FADE_TICKS {
        tick(&mut session, &host_input(Vec2::new(boundary + 200.0, spawn.y), vec![]), SIM_DT);
    }
    assert!(session.registry.exit_wall(0).is_none());
    let entry = session
        .registry
        .walls()
        .find(|w| w.role == WallRole::Entry)
        .expect("entry wall behind the player");
    assert_eq!(entry.state, WallState::Solid);

    // Backtracking is blocked
    tick(&mut session, &host_input(Vec2::new(boundary - 10.0, spawn.y), vec![]), SIM_DT);
    assert!(session.player.pos.x - session.player.size.x / 2.0 >= boundary);
}

#[test]
fn second_goal_required_before_wall_opens() {
    let mut session = GameSession::new(two_segment_level(), 7);
    // Walk segment 0 through to segment 1
    let letter = match session.current_goal().map(|g| g.value) {
        Some(GoalValue::Letter(c)) => c,
        other => panic!("unexpected goal {:?}", other),
    };
    let id = session
        .registry
        .active_in_segment(0)
        .find(|c| c.value == CollectibleValue::Letter(letter))
        .map(|c| c.id)
        .expect("goal letter placed");
    let y = session.player.pos.y;
    tick(&mut session, &host_input(Vec2::new(200.0, y), vec![id]), SIM_DT);
    tick(&mut session, &host_input(Vec2::new(1400.0, y), vec![]), SIM_DT);
    assert_eq!(session.progress.index, 1);
    assert_eq!(session.progress.goals_required, 2);

    for expected in 1..=2 {
        let goal = *session.current_goal().expect("goal");
        let id = session
            .registry
            .active_in_segment(1)
            .find(|c| goal.matches(&c.value))
            .map(|c| c.id)
            .expect("redraw keeps goals satisfiable");
        tick(&mut session, &host_input(Vec2::new(1400.0, y), vec![id]), SIM_DT);
        assert_eq!(session.progress.goals_completed, expected);
        assert_eq!(session.progress.goals_satisfied, expected == 2);
        assert_eq!(
            session.registry.exit_wall(1).map(|w| w.is_blocking()),
            Some(expected == 1)
        );
    }
    assert_eq!(session.progress.index, 1);

    // Leftover numbers are wiped on clear
    assert_eq!(session.registry.active_in_segment(1).count(), 0);
}

#[test]
fn autopilot_finishes_default_level() {
    let (session, events) = run_autopilot(42, 20_000);

    assert_eq!(session.phase, GamePhase::Finished);
    assert_eq!(session.progress.index, 2);
    assert!(!session.player.control_enabled);
    assert!(session.player.pos.x > session.current_layout().end_x);

    let cleared: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::SegmentCleared { segment } => Some(*segment),
            _ => None,
        })
        .collect();
    assert_eq!(cleared, vec![0, 1, 2]);
    let achieved = events
        .iter()
        .filter(|e| matches!(e, GameEvent::GoalAchieved { .. }))
        .count();
    assert_eq!(achieved, 1 + 2 + 3);
    assert!(events.contains(&GameEvent::EndSequenceStarted));
    assert!(events.contains(&GameEvent::PlayerControl { enabled: false }));
    assert_eq!(events.last(), Some(&GameEvent::LevelFinished));
}

#[test]
fn same_seed_same_session() {
    let (a, events_a) = run_autopilot(1234, 3_000);
    let (b, events_b) = run_autopilot(1234, 3_000);

    assert_eq!(a.time_ticks, b.time_ticks);
    assert_eq!(a.player.pos, b.player.pos);
    assert_eq!(a.progress, b.progress);
    assert_eq!(events_a, events_b);

    let platforms = |s: &GameSession| -> Vec<Vec2> { s.registry.platforms().map(|p| p.pos).collect() };
    assert_eq!(platforms(&a), platforms(&b));

    let other = GameSession::new(LevelConfig::default(), 4321);
    assert_ne!(platforms(&a), platforms(&other));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn level_build_never_double_books_tiles(seed in any::<u64>()) {
        let config = LevelConfig::default();
        let mut registry = EntityRegistry::new();
        let mut occupancy = OccupancyMap::new();
        let mut rng = Pcg32::seed_from_u64(seed);

        let builds = build_level(&config, &mut registry, &mut occupancy, &mut rng);

        prop_assert_eq!(occupancy.conflicts(), 0);

        let ground_rows = config.platform_config.ground_height_tiles as usize;
        let mut expected = 0;
        for build in &builds {
            let cols = build.layout.cols as usize;
            expected += cols * ground_rows + build.layout.ground_top as usize + build.reserved_tiles;
        }
        let floating = registry
            .platforms()
            .filter(|p| p.kind == PlatformKind::Floating)
            .count();
        expected += floating + registry.collectible_count();
        prop_assert_eq!(occupancy.len(), expected);

        for collectible in registry.collectibles() {
            prop_assert_eq!(
                occupancy.get(collectible.tile),
                Some(Occupant::Collectible(collectible.id))
            );
        }
    }

    #[test]
    fn nothing_is_placed_under_a_spawn(seed in any::<u64>()) {
        let mut session = GameSession::new(LevelConfig::default(), seed);
        let size = session.player.size;
        let respawns: Vec<Vec2> = session
            .layouts
            .iter()
            .map(|l| l.spawn_point(&session.config.character))
            .collect();

        for spawn in std::iter::once(session.player.pos).chain(respawns) {
            let under = overlapping_collectibles(&session.registry, &Aabb::from_center_size(spawn, size));
            prop_assert!(under.is_empty(), "{:?} under spawn {:?}", under, spawn);
        }

        // Standing still on the first frame touches nothing
        session.drain_events();
        tick(&mut session, &TickInput::default(), SIM_DT);
        let events = session.drain_events();
        prop_assert!(
            !events.iter().any(|e| matches!(e, GameEvent::Collected { .. })),
            "{:?}", events
        );
    }

    #[test]
    fn new_goals_respect_segment_kinds(seed in any::<u64>()) {
        let session = GameSession::new(LevelConfig::default(), seed);
        let goal = session.current_goal().copied();
        prop_assert!(matches!(goal.map(|g| g.kind), Some(GoalKind::Letter)));
    }
}
