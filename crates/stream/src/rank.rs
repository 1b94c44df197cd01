use std::cmp::Ordering;
use streamer_common::ItemId;

/// One item competing for a participant's slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: ItemId,
    /// Squared distance, or the static sentinel for always-visible items.
    pub rank: f32,
    pub priority: i32,
    /// Already holds a slot for this participant.
    pub incumbent: bool,
}

impl Candidate {
    /// Total order: closer first, then higher priority, then incumbents,
    /// then lower id.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.rank
            .total_cmp(&other.rank)
            .then_with(|| other.priority.cmp(&self.priority))
            .then_with(|| other.incumbent.cmp(&self.incumbent))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// The best `capacity` candidates, best first.
pub fn select_top(mut candidates: Vec<Candidate>, capacity: usize) -> Vec<Candidate> {
    if capacity == 0 {
        return Vec::new();
    }
    if candidates.len() > capacity {
        candidates.select_nth_unstable_by(capacity - 1, Candidate::compare);
        candidates.truncate(capacity);
    }
    candidates.sort_unstable_by(Candidate::compare);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: u32, rank: f32, priority: i32, incumbent: bool) -> Candidate {
        Candidate {
            id: ItemId(id),
            rank,
            priority,
            incumbent,
        }
    }

    fn ids(selected: &[Candidate]) -> Vec<u32> {
        selected.iter().map(|c| c.id.0).collect()
    }

    #[test]
    fn closer_wins() {
        let top = select_top(vec![c(1, 100.0, 0, false), c(2, 4.0, 0, false)], 1);
        assert_eq!(ids(&top), vec![2]);
    }

    #[test]
    fn priority_breaks_distance_ties() {
        let top = select_top(vec![c(1, 100.0, 1, false), c(2, 100.0, 5, false)], 1);
        assert_eq!(ids(&top), vec![2]);
    }

    #[test]
    fn incumbent_keeps_its_place_on_exact_ties() {
        let top = select_top(vec![c(1, 9.0, 0, false), c(2, 9.0, 0, true)], 1);
        assert_eq!(ids(&top), vec![2]);
        let fresh = select_top(vec![c(2, 9.0, 0, false), c(1, 9.0, 0, false)], 1);
        assert_eq!(ids(&fresh), vec![1]);
    }

    #[test]
    fn static_items_rank_first() {
        let top = select_top(vec![c(1, 0.0, 9, true), c(2, -1.0, 0, false)], 1);
        assert_eq!(ids(&top), vec![2]);
    }

    #[test]
    fn selection_is_deterministic() {
        let pool: Vec<Candidate> = (0..50)
            .map(|i| c(i, ((i * 7) % 5) as f32, (i % 3) as i32, i % 4 == 0))
            .collect();
        let mut reversed = pool.clone();
        reversed.reverse();
        let a = select_top(pool, 10);
        let b = select_top(reversed, 10);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.windows(2).all(|w| w[0].compare(&w[1]) == Ordering::Less));
    }

    #[test]
    fn zero_capacity_selects_nothing() {
        assert!(select_top(vec![c(1, 0.0, 0, false)], 0).is_empty());
    }
}
