// Per-player stats, life cycle and the rare-mode boost.

use super::errors::RejectedAction;
use super::items::Upgrade;
use super::tuning::player::{MAX_BOMBS, MAX_RANGE, MAX_SPEED_LEVEL};
use super::{Cell, PlayerId};

const BASE_BOMBS: u8 = 1;
const BASE_RANGE: u8 = 1;

/// Replicated player fields that produce `StatChanged` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Alive,
    SpeedLevel,
    MaxBombs,
    ExplosionRange,
    RareMode,
}

/// Point-in-time copy of the replicated stats, used to diff before/after an
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatSheet {
    pub alive: bool,
    pub speed_level: u8,
    pub max_bombs: u8,
    pub explosion_range: u8,
    pub rare_mode: bool,
}

impl StatSheet {
    /// Fields that differ in `after`, with their new values.
    pub fn changes(&self, after: &StatSheet) -> Vec<(Stat, i32)> {
        let mut out = Vec::new();
        if self.alive != after.alive {
            out.push((Stat::Alive, after.alive as i32));
        }
        if self.speed_level != after.speed_level {
            out.push((Stat::SpeedLevel, after.speed_level as i32));
        }
        if self.max_bombs != after.max_bombs {
            out.push((Stat::MaxBombs, after.max_bombs as i32));
        }
        if self.explosion_range != after.explosion_range {
            out.push((Stat::ExplosionRange, after.explosion_range as i32));
        }
        if self.rare_mode != after.rare_mode {
            out.push((Stat::RareMode, after.rare_mode as i32));
        }
        out
    }
}

/// Result of a successful upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Applied,
    /// A rare boost began; its expiry must be scheduled with this epoch.
    BoostStarted { epoch: u64 },
    AlreadyBoosted,
}

#[derive(Debug, Clone, Copy)]
struct BoostSnapshot {
    saved_max_bombs: u8,
    saved_explosion_range: u8,
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub display_name: String,
    pub cell: Cell,

    alive: bool,
    speed_level: u8,
    max_bombs: u8,
    explosion_range: u8,
    active_bombs: u8,

    // Present only while rare mode is running.
    boost: Option<BoostSnapshot>,
    // Bumped whenever a boost starts; stale expiry timers compare against it.
    boost_epoch: u64,
    // Bumped on every death; stale respawn timers compare against it.
    life_epoch: u64,
}

impl PlayerState {
    pub fn new(id: PlayerId, display_name: impl Into<String>, cell: Cell) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            cell,
            alive: true,
            speed_level: 0,
            max_bombs: BASE_BOMBS,
            explosion_range: BASE_RANGE,
            active_bombs: 0,
            boost: None,
            boost_epoch: 0,
            life_epoch: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn speed_level(&self) -> u8 {
        self.speed_level
    }

    /// Speed level the motion collaborator should use; rare mode runs at the cap.
    pub fn effective_speed_level(&self) -> u8 {
        if self.is_rare_mode() {
            MAX_SPEED_LEVEL
        } else {
            self.speed_level
        }
    }

    pub fn max_bombs(&self) -> u8 {
        self.max_bombs
    }

    pub fn explosion_range(&self) -> u8 {
        self.explosion_range
    }

    pub fn active_bombs(&self) -> u8 {
        self.active_bombs
    }

    pub fn is_rare_mode(&self) -> bool {
        self.boost.is_some()
    }

    pub fn sheet(&self) -> StatSheet {
        StatSheet {
            alive: self.alive,
            speed_level: self.speed_level,
            max_bombs: self.max_bombs,
            explosion_range: self.explosion_range,
            rare_mode: self.is_rare_mode(),
        }
    }

    pub fn upgrade(&mut self, upgrade: Upgrade) -> Result<UpgradeOutcome, RejectedAction> {
        match upgrade {
            Upgrade::Speed => {
                bump(&mut self.speed_level, MAX_SPEED_LEVEL)?;
            }
            Upgrade::BombUp => {
                // While boosted the gain goes to the snapshot so it survives expiry.
                match self.boost.as_mut() {
                    Some(snapshot) => bump(&mut snapshot.saved_max_bombs, MAX_BOMBS)?,
                    None => bump(&mut self.max_bombs, MAX_BOMBS)?,
                }
            }
            Upgrade::Fire => match self.boost.as_mut() {
                Some(snapshot) => bump(&mut snapshot.saved_explosion_range, MAX_RANGE)?,
                None => bump(&mut self.explosion_range, MAX_RANGE)?,
            },
            Upgrade::Rare => return Ok(self.begin_boost()),
        }
        Ok(UpgradeOutcome::Applied)
    }

    fn begin_boost(&mut self) -> UpgradeOutcome {
        if self.boost.is_some() {
            return UpgradeOutcome::AlreadyBoosted;
        }

        self.boost = Some(BoostSnapshot {
            saved_max_bombs: self.max_bombs,
            saved_explosion_range: self.explosion_range,
        });
        self.max_bombs = MAX_BOMBS;
        self.explosion_range = MAX_RANGE;
        self.boost_epoch += 1;
        UpgradeOutcome::BoostStarted {
            epoch: self.boost_epoch,
        }
    }

    /// Ends the boost started at `epoch`. Returns false for stale timers.
    pub fn end_boost(&mut self, epoch: u64) -> bool {
        if epoch != self.boost_epoch {
            return false;
        }
        self.restore_snapshot()
    }

    fn restore_snapshot(&mut self) -> bool {
        match self.boost.take() {
            Some(snapshot) => {
                self.max_bombs = snapshot.saved_max_bombs;
                self.explosion_range = snapshot.saved_explosion_range;
                true
            }
            None => false,
        }
    }

    /// Marks the player dead. Returns the life epoch a respawn timer must
    /// present, or `None` if the player was already dead.
    pub fn kill(&mut self) -> Option<u64> {
        if !self.alive {
            return None;
        }

        self.alive = false;
        self.restore_snapshot();
        self.life_epoch += 1;
        Some(self.life_epoch)
    }

    pub fn respawn(&mut self, life_epoch: u64, cell: Cell) -> bool {
        if self.alive || life_epoch != self.life_epoch {
            return false;
        }

        self.alive = true;
        self.cell = cell;
        true
    }

    /// Claims an ammo slot and returns the range the new bomb should carry.
    pub fn reserve_bomb(&mut self) -> Result<u8, RejectedAction> {
        if !self.alive {
            return Err(RejectedAction::PlayerDead);
        }
        if self.active_bombs >= self.max_bombs {
            return Err(RejectedAction::BombLimitReached);
        }

        self.active_bombs += 1;
        Ok(self.explosion_range)
    }

    pub fn release_bomb(&mut self) {
        self.active_bombs = self.active_bombs.saturating_sub(1);
    }

    /// Returns to base stats for a fresh match. Pending timers are invalidated.
    pub fn reset(&mut self, cell: Cell) {
        self.alive = true;
        self.cell = cell;
        self.speed_level = 0;
        self.max_bombs = BASE_BOMBS;
        self.explosion_range = BASE_RANGE;
        self.active_bombs = 0;
        self.boost = None;
        self.boost_epoch += 1;
        self.life_epoch += 1;
    }
}

fn bump(value: &mut u8, max: u8) -> Result<(), RejectedAction> {
    if *value >= max {
        return Err(RejectedAction::StatAtMaximum);
    }
    *value += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerState {
        PlayerState::new(1, "Tester", Cell::new(0, 0))
    }

    #[test]
    fn upgrades_stop_at_their_ceilings() {
        let mut p = player();
        for _ in 0..20 {
            let _ = p.upgrade(Upgrade::Speed);
            let _ = p.upgrade(Upgrade::BombUp);
            let _ = p.upgrade(Upgrade::Fire);
        }

        assert_eq!(p.speed_level(), MAX_SPEED_LEVEL);
        assert_eq!(p.max_bombs(), MAX_BOMBS);
        assert_eq!(p.explosion_range(), MAX_RANGE);
        assert_eq!(
            p.upgrade(Upgrade::Speed),
            Err(RejectedAction::StatAtMaximum)
        );
    }

    #[test]
    fn boost_forces_maxima_and_restores_snapshot() {
        let mut p = player();
        p.upgrade(Upgrade::Fire).unwrap();

        let UpgradeOutcome::BoostStarted { epoch } = p.upgrade(Upgrade::Rare).unwrap() else {
            panic!("boost should start");
        };
        assert!(p.is_rare_mode());
        assert_eq!(p.max_bombs(), MAX_BOMBS);
        assert_eq!(p.explosion_range(), MAX_RANGE);
        assert_eq!(p.effective_speed_level(), MAX_SPEED_LEVEL);

        assert!(p.end_boost(epoch));
        assert_eq!(p.max_bombs(), 1);
        assert_eq!(p.explosion_range(), 2);

        // A second expiry for the same boost restores nothing.
        assert!(!p.end_boost(epoch));
        assert_eq!(p.explosion_range(), 2);
    }

    #[test]
    fn second_rare_pickup_is_a_no_op() {
        let mut p = player();
        p.upgrade(Upgrade::Rare).unwrap();
        assert_eq!(
            p.upgrade(Upgrade::Rare),
            Ok(UpgradeOutcome::AlreadyBoosted)
        );
    }

    #[test]
    fn upgrades_during_boost_survive_expiry() {
        let mut p = player();
        let UpgradeOutcome::BoostStarted { epoch } = p.upgrade(Upgrade::Rare).unwrap() else {
            panic!("boost should start");
        };

        p.upgrade(Upgrade::BombUp).unwrap();
        p.upgrade(Upgrade::Fire).unwrap();
        assert_eq!(p.max_bombs(), MAX_BOMBS);

        p.end_boost(epoch);
        assert_eq!(p.max_bombs(), 2);
        assert_eq!(p.explosion_range(), 2);
    }

    #[test]
    fn death_cancels_boost_and_stale_expiry_is_ignored() {
        let mut p = player();
        let UpgradeOutcome::BoostStarted { epoch } = p.upgrade(Upgrade::Rare).unwrap() else {
            panic!("boost should start");
        };

        let life = p.kill().expect("first death counts");
        assert!(!p.is_rare_mode());
        assert_eq!(p.max_bombs(), 1);
        assert_eq!(p.kill(), None);

        assert!(p.respawn(life, Cell::new(3, 3)));

        // New boost, then the first boost's timer fires late.
        let UpgradeOutcome::BoostStarted { epoch: second } = p.upgrade(Upgrade::Rare).unwrap()
        else {
            panic!("boost should start");
        };
        assert!(!p.end_boost(epoch));
        assert!(p.is_rare_mode());
        assert!(p.end_boost(second));
    }

    #[test]
    fn respawn_requires_matching_life() {
        let mut p = player();
        let first = p.kill().unwrap();
        assert!(p.respawn(first, Cell::new(1, 1)));
        let second = p.kill().unwrap();

        assert!(!p.respawn(first, Cell::new(2, 2)));
        assert!(!p.is_alive());
        assert!(p.respawn(second, Cell::new(2, 2)));
        assert_eq!(p.cell, Cell::new(2, 2));
    }

    #[test]
    fn ammo_is_bounded_by_max_bombs() {
        let mut p = player();
        assert_eq!(p.reserve_bomb(), Ok(1));
        assert_eq!(p.reserve_bomb(), Err(RejectedAction::BombLimitReached));

        p.release_bomb();
        p.release_bomb();
        assert_eq!(p.active_bombs(), 0);

        p.kill();
        assert_eq!(p.reserve_bomb(), Err(RejectedAction::PlayerDead));
    }

    #[test]
    fn sheet_diff_lists_only_changed_fields() {
        let mut p = player();
        let before = p.sheet();
        p.upgrade(Upgrade::Rare).unwrap();

        let changes = before.changes(&p.sheet());
        assert_eq!(
            changes,
            vec![
                (Stat::MaxBombs, 6),
                (Stat::ExplosionRange, 6),
                (Stat::RareMode, 1)
            ]
        );
    }
}
