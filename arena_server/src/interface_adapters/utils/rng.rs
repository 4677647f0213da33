use rand::Rng;
use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};

/// Process-unique id for connections and guest players.
///
/// Starts from a random offset so ids differ between restarts, then counts
/// up so two calls can never collide.
pub fn next_id() -> u64 {
    static NEXT: OnceLock<AtomicU64> = OnceLock::new();
    NEXT.get_or_init(|| AtomicU64::new(rand::rng().random_range(1..u64::from(u32::MAX))))
        .fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = next_id();
        let b = next_id();
        assert!(b > a);
    }
}
