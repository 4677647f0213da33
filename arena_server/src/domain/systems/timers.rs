use super::{bombs, coins, explosions, players, shrink};
use crate::domain::schedule::Timer;
use crate::domain::world::World;

/// Fires every timer due at `world.now`, including ones scheduled by the
/// handlers themselves with zero delay.
pub fn run_due_timers(world: &mut World) -> usize {
    let mut fired = 0;
    while let Some(timer) = world.timers.pop_due(world.now) {
        dispatch(world, timer);
        fired += 1;
    }
    fired
}

fn dispatch(world: &mut World, timer: Timer) {
    match timer {
        Timer::Fuse { bomb_id } => bombs::fuse_expired(world, bomb_id),
        Timer::ExplosionExpired { explosion_id } => explosions::expire(world, explosion_id),
        Timer::BoostExpired { player_id, epoch } => players::end_boost(world, player_id, epoch),
        Timer::Respawn {
            player_id,
            life_epoch,
        } => players::respawn(world, player_id, life_epoch),
        Timer::CoinSpawn { generation } => coins::spawn_tick(world, generation),
        Timer::ShrinkStep => shrink::shrink_step(world),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Cell;
    use crate::domain::tuning::MatchTuning;

    #[test]
    fn fuse_fires_at_its_deadline() {
        let mut world = World::new(MatchTuning::default(), 6);
        players::join(&mut world, 1, "A").unwrap();
        world.players[0].cell = Cell::new(0, 0);
        bombs::place_bomb(&mut world, 1).unwrap();

        world.now = 1.9;
        run_due_timers(&mut world);
        assert_eq!(world.bombs.len(), 1);

        world.now = 2.0;
        run_due_timers(&mut world);
        assert!(world.bombs.is_empty());
        assert_eq!(world.explosions.len(), 1);

        world.now = 2.5;
        run_due_timers(&mut world);
        assert!(world.explosions.is_empty());
    }
}
