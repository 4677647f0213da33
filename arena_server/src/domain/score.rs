// Score ledger and winner resolution.

use super::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub player_id: PlayerId,
    pub display_name: String,
    pub score: u32,
}

/// Outcome of [`ScoreBoard::declare_winner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Winner {
    Player(ScoreEntry),
    NoPlayers,
}

/// Ledger of player scores in registration order.
///
/// Scores are never negative: every adjustment is clamped at zero.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    entries: Vec<ScoreEntry>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a zero-score entry. Re-registering an id keeps the original entry.
    pub fn register(&mut self, player_id: PlayerId, display_name: impl Into<String>) {
        if self.entry(player_id).is_some() {
            return;
        }
        self.entries.push(ScoreEntry {
            player_id,
            display_name: display_name.into(),
            score: 0,
        });
    }

    pub fn unregister(&mut self, player_id: PlayerId) {
        self.entries.retain(|e| e.player_id != player_id);
    }

    /// Applies `delta` and returns the new score, or `None` for unknown ids.
    pub fn adjust(&mut self, player_id: PlayerId, delta: i32) -> Option<u32> {
        let entry = self.entries.iter_mut().find(|e| e.player_id == player_id)?;
        let next = (entry.score as i64 + delta as i64).max(0);
        entry.score = u32::try_from(next).unwrap_or(u32::MAX);
        Some(entry.score)
    }

    pub fn entry(&self, player_id: PlayerId) -> Option<&ScoreEntry> {
        self.entries.iter().find(|e| e.player_id == player_id)
    }

    pub fn score(&self, player_id: PlayerId) -> Option<u32> {
        self.entry(player_id).map(|e| e.score)
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Highest score wins; ties go to whoever registered first.
    pub fn declare_winner(&self) -> Winner {
        let mut best: Option<&ScoreEntry> = None;
        for entry in &self.entries {
            match best {
                Some(top) if entry.score <= top.score => {}
                _ => best = Some(entry),
            }
        }
        best.map_or(Winner::NoPlayers, |e| Winner::Player(e.clone()))
    }

    /// Zeroes every score while keeping registrations.
    pub fn reset_scores(&mut self) {
        for entry in &mut self.entries {
            entry.score = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_clamps_at_zero() {
        let mut board = ScoreBoard::new();
        board.register(1, "A");

        assert_eq!(board.adjust(1, 2), Some(2));
        assert_eq!(board.adjust(1, -10), Some(0));
        assert_eq!(board.adjust(1, -3), Some(0));
        assert_eq!(board.adjust(1, 5), Some(5));
    }

    #[test]
    fn adjust_unknown_player_is_a_no_op() {
        let mut board = ScoreBoard::new();
        board.register(1, "A");

        assert_eq!(board.adjust(2, 5), None);
        assert_eq!(board.entries().len(), 1);
        assert_eq!(board.score(1), Some(0));
    }

    #[test]
    fn tie_goes_to_first_registered() {
        let mut board = ScoreBoard::new();
        board.register(1, "A");
        board.register(2, "B");
        board.adjust(1, 10);
        board.adjust(2, 10);

        let Winner::Player(winner) = board.declare_winner() else {
            panic!("expected a winner");
        };
        assert_eq!(winner.player_id, 1);
        assert_eq!(winner.display_name, "A");
    }

    #[test]
    fn strictly_higher_score_wins() {
        let mut board = ScoreBoard::new();
        board.register(1, "A");
        board.register(2, "B");
        board.adjust(2, 1);

        assert!(matches!(
            board.declare_winner(),
            Winner::Player(ScoreEntry { player_id: 2, .. })
        ));
    }

    #[test]
    fn empty_board_has_no_winner() {
        assert_eq!(ScoreBoard::new().declare_winner(), Winner::NoPlayers);
    }

    #[test]
    fn duplicate_registration_keeps_score() {
        let mut board = ScoreBoard::new();
        board.register(1, "A");
        board.adjust(1, 4);
        board.register(1, "A again");

        assert_eq!(board.entries().len(), 1);
        assert_eq!(board.score(1), Some(4));
        board.unregister(1);
        assert_eq!(board.score(1), None);
    }
}
