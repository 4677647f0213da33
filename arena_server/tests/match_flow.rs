// Whole-match scenarios driven through the controller with a seeded world.

use arena_server::domain::items::Upgrade;
use arena_server::domain::systems::{bombs, players};
use arena_server::domain::tuning::MatchTuning;
use arena_server::domain::{ArenaEvent, Cell, ItemKind, Phase};
use arena_server::use_cases::{MatchCommand, MatchController};

fn join(c: &mut MatchController, player_id: u64, name: &str, cell: Cell) {
    c.handle_command(MatchCommand::Join {
        player_id,
        display_name: name.to_string(),
    })
    .expect("join");
    let world = c.world_mut();
    let idx = world
        .players
        .iter()
        .position(|p| p.id == player_id)
        .expect("joined player");
    world.players[idx].cell = cell;
}

fn phase_changes(events: &[ArenaEvent], phase: Phase) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ArenaEvent::PhaseChanged { phase: p, .. } if *p == phase))
        .count()
}

#[test]
fn sudden_death_fires_exactly_once_at_threshold() {
    let mut c = MatchController::new(MatchTuning::default(), 7);
    c.handle_command(MatchCommand::StartMatch).unwrap();

    let mut events = Vec::new();
    for _ in 0..79 {
        events.extend(c.advance(1.0).events);
    }
    assert_eq!(c.clock(), 41.0);
    assert_eq!(c.phase(), Phase::Active);
    assert!(c.world().spawner.is_running());

    events.extend(c.advance(1.0).events);
    assert_eq!(c.clock(), 40.0);
    assert_eq!(c.phase(), Phase::SuddenDeath);
    assert!(!c.world().spawner.is_running());

    for _ in 0..10 {
        events.extend(c.advance(1.0).events);
    }
    assert_eq!(phase_changes(&events, Phase::SuddenDeath), 1);
}

#[test]
fn bounds_only_shrink_and_stop_at_final_size() {
    let mut c = MatchController::new(MatchTuning::default(), 13);
    c.handle_command(MatchCommand::StartMatch).unwrap();

    let mut prev = c.world().bounds;
    while c.phase() != Phase::Ended {
        c.advance(0.05);
        let b = c.world().bounds;
        assert!(b.min_x <= b.max_x && b.min_y <= b.max_y);
        assert!(b.min_x >= prev.min_x && b.max_x <= prev.max_x);
        assert!(b.min_y >= prev.min_y && b.max_y <= prev.max_y);
        prev = b;
    }

    let b = c.world().bounds;
    assert!(b.width() <= 15 && b.height() <= 15);
}

#[test]
fn match_end_declares_winner_and_clears_items() {
    let mut c = MatchController::new(MatchTuning::default(), 5);
    join(&mut c, 1, "Ana", Cell::new(0, 0));
    join(&mut c, 2, "Bo", Cell::new(4, 4));
    c.handle_command(MatchCommand::StartMatch).unwrap();

    c.world_mut().adjust_score(2, 12);
    c.world_mut().adjust_score(1, 3);
    c.advance(10.0);
    assert!(c.world().grid.coins().count() > 0);

    let mut events = Vec::new();
    for _ in 0..200 {
        events.extend(c.advance(1.0).events);
    }

    assert_eq!(c.phase(), Phase::Ended);
    assert_eq!(c.clock(), 0.0);
    assert_eq!(c.world().grid.coins().count(), 0);
    assert_eq!(phase_changes(&events, Phase::Ended), 1);

    let winners: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ArenaEvent::WinnerDeclared {
                player_id,
                display_name,
                ..
            } => Some((*player_id, display_name.clone())),
            _ => None,
        })
        .collect();
    // Both players stand inside the final arena, so no wall costs them points.
    assert_eq!(winners, vec![(Some(2), Some("Bo".to_string()))]);

    // Ended is terminal: more ticks change nothing.
    c.advance(5.0);
    assert_eq!(c.phase(), Phase::Ended);
    assert_eq!(c.clock(), 0.0);
}

#[test]
fn tied_scores_go_to_first_registered() {
    let mut tuning = MatchTuning::default();
    tuning.arena.game_duration = 1.0;
    tuning.arena.sudden_death_time = 0.0;
    let mut c = MatchController::new(tuning, 3);
    join(&mut c, 1, "A", Cell::new(-5, -5));
    join(&mut c, 2, "B", Cell::new(5, 5));
    c.handle_command(MatchCommand::StartMatch).unwrap();
    c.world_mut().adjust_score(1, 10);
    c.world_mut().adjust_score(2, 10);

    let update = c.advance(1.0);

    let winner = update.events.iter().find_map(|e| match e {
        ArenaEvent::WinnerDeclared {
            player_id,
            display_name,
            score,
        } => Some((*player_id, display_name.clone(), *score)),
        _ => None,
    });
    assert_eq!(winner, Some((Some(1), Some("A".to_string()), 10)));
}

#[test]
fn empty_match_ends_without_a_winner() {
    let mut tuning = MatchTuning::default();
    tuning.arena.game_duration = 0.5;
    let mut c = MatchController::new(tuning, 1);
    c.handle_command(MatchCommand::StartMatch).unwrap();

    let update = c.advance(1.0);
    assert!(update.events.contains(&ArenaEvent::WinnerDeclared {
        player_id: None,
        display_name: None,
        score: 0,
    }));
}

#[test]
fn adjacent_bombs_chain_on_first_fuse() {
    let mut c = MatchController::new(MatchTuning::default(), 9);
    join(&mut c, 1, "A", Cell::new(0, 0));
    join(&mut c, 2, "B", Cell::new(1, 0));
    c.handle_command(MatchCommand::PlaceBomb { player_id: 1 })
        .unwrap();
    c.advance(1.0);
    c.handle_command(MatchCommand::PlaceBomb { player_id: 2 })
        .unwrap();

    let update = c.advance(1.0);

    let explosions = update
        .events
        .iter()
        .filter(|e| {
            matches!(
                e,
                ArenaEvent::EntitySpawned {
                    kind: arena_server::domain::EntityKind::Explosion,
                    ..
                }
            )
        })
        .count();
    assert_eq!(explosions, 2);
    assert!(c.world().bombs.is_empty());
    for id in [1, 2] {
        let p = c.world().player(id).unwrap();
        assert!(!p.is_alive());
        assert_eq!(p.active_bombs(), 0);
    }

    // The second bomb's own fuse fires later and finds nothing.
    let late = c.advance(1.0);
    assert!(
        !late
            .events
            .iter()
            .any(|e| matches!(e, ArenaEvent::EntitySpawned { .. }))
    );
}

#[test]
fn double_detonation_restores_one_slot() {
    let mut c = MatchController::new(MatchTuning::default(), 2);
    join(&mut c, 1, "A", Cell::new(0, 0));
    players::apply_upgrade(c.world_mut(), 1, Upgrade::BombUp).unwrap();
    let bomb = bombs::place_bomb(c.world_mut(), 1).unwrap();
    c.world_mut().players[0].cell = Cell::new(5, 5);
    bombs::place_bomb(c.world_mut(), 1).unwrap();
    assert_eq!(c.world().player(1).unwrap().active_bombs(), 2);

    let first = bombs::detonate(c.world_mut(), bomb);
    let second = bombs::detonate(c.world_mut(), bomb);

    assert!(!first.is_empty());
    assert!(second.is_empty());
    assert_eq!(c.world().explosions.len(), 1);
    assert_eq!(c.world().player(1).unwrap().active_bombs(), 1);
}

#[test]
fn rare_pickup_boosts_then_restores() {
    let mut c = MatchController::new(MatchTuning::default(), 4);
    join(&mut c, 1, "A", Cell::new(0, 0));
    c.world_mut()
        .grid
        .insert_coin(Cell::new(1, 0), 500, ItemKind::Rare);

    c.handle_command(MatchCommand::Position {
        player_id: 1,
        cell: Cell::new(1, 0),
    })
    .unwrap();
    let p = c.world().player(1).unwrap();
    assert!(p.is_rare_mode());
    assert_eq!((p.max_bombs(), p.explosion_range()), (6, 6));
    assert_eq!(p.effective_speed_level(), 5);

    c.advance(4.9);
    assert!(c.world().player(1).unwrap().is_rare_mode());
    c.advance(0.2);

    let p = c.world().player(1).unwrap();
    assert!(!p.is_rare_mode());
    assert_eq!((p.max_bombs(), p.explosion_range()), (1, 1));
}

#[test]
fn dead_player_respawns_after_delay() {
    let mut c = MatchController::new(MatchTuning::default(), 6);
    join(&mut c, 1, "A", Cell::new(0, 0));
    c.handle_command(MatchCommand::PlaceBomb { player_id: 1 })
        .unwrap();

    c.advance(2.0);
    assert!(!c.world().player(1).unwrap().is_alive());
    assert_eq!(
        c.handle_command(MatchCommand::PlaceBomb { player_id: 1 }),
        Err(arena_server::domain::RejectedAction::PlayerDead)
    );

    c.advance(2.9);
    assert!(!c.world().player(1).unwrap().is_alive());
    c.advance(0.2);
    assert!(c.world().player(1).unwrap().is_alive());
}
