// Collectible items and the loot table used by the coin spawner.

/// Item types that can be lying on the arena floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Score,
    Diamond,
    Trap,
    Speed,
    BombUp,
    Fire,
    Rare,
}

/// Stat effect granted by an item on pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    Speed,
    BombUp,
    Fire,
    Rare,
}

impl ItemKind {
    pub fn score_delta(self) -> i32 {
        match self {
            ItemKind::Score => 1,
            ItemKind::Diamond => 5,
            ItemKind::Trap => -3,
            _ => 0,
        }
    }

    pub fn upgrade(self) -> Option<Upgrade> {
        match self {
            ItemKind::Speed => Some(Upgrade::Speed),
            ItemKind::BombUp => Some(Upgrade::BombUp),
            ItemKind::Fire => Some(Upgrade::Fire),
            ItemKind::Rare => Some(Upgrade::Rare),
            ItemKind::Score | ItemKind::Diamond | ItemKind::Trap => None,
        }
    }
}

/// Scale of the uniform draw fed into [`roll_item`].
pub const LOOT_ROLL_MAX: f32 = 100.0;

// Checked top-down; a draw must be strictly above a threshold to match it.
const LOOT_TABLE: [(f32, ItemKind); 6] = [
    (95.0, ItemKind::Rare),
    (90.0, ItemKind::Diamond),
    (75.0, ItemKind::Trap),
    (65.0, ItemKind::Fire),
    (60.0, ItemKind::BombUp),
    (50.0, ItemKind::Speed),
];

/// Maps a draw in `0.0..100.0` to an item type. Anything that falls through
/// every threshold is a plain score coin.
pub fn roll_item(draw: f32) -> ItemKind {
    LOOT_TABLE
        .iter()
        .find(|(threshold, _)| draw > *threshold)
        .map(|(_, kind)| *kind)
        .unwrap_or(ItemKind::Score)
}
