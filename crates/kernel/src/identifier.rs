use std::collections::BTreeSet;
use streamer_common::ItemId;

/// Errors from identifier allocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier space exhausted (limit {limit})")]
    Exhausted { limit: u32 },
    #[error("identifier {0} is not in use")]
    NotInUse(ItemId),
}

/// Per-type dynamic id allocator.
///
/// Always hands out the smallest positive id not currently in use, so freed
/// ids are reused before the id space grows.
#[derive(Debug, Clone)]
pub struct Identifier {
    limit: u32,
    /// Next id never issued (or issued and since trimmed off the top).
    next: u32,
    /// Released ids below `next`.
    free: BTreeSet<u32>,
}

impl Identifier {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            next: 1,
            free: BTreeSet::new(),
        }
    }

    pub fn acquire(&mut self) -> Result<ItemId, IdentifierError> {
        if let Some(id) = self.free.pop_first() {
            return Ok(ItemId(id));
        }
        if self.next > self.limit {
            return Err(IdentifierError::Exhausted { limit: self.limit });
        }
        let id = self.next;
        self.next += 1;
        Ok(ItemId(id))
    }

    pub fn release(&mut self, id: ItemId) -> Result<(), IdentifierError> {
        if !self.is_live(id) {
            return Err(IdentifierError::NotInUse(id));
        }
        self.free.insert(id.0);
        // Keep `next` tight so `highest_live` is exact.
        while self.next > 1 && self.free.remove(&(self.next - 1)) {
            self.next -= 1;
        }
        Ok(())
    }

    pub fn is_live(&self, id: ItemId) -> bool {
        id.0 != 0 && id.0 < self.next && !self.free.contains(&id.0)
    }

    /// Highest id currently in use, or `None` when nothing is allocated.
    pub fn highest_live(&self) -> Option<ItemId> {
        (self.next > 1).then(|| ItemId(self.next - 1))
    }

    pub fn live_count(&self) -> usize {
        (self.next - 1) as usize - self.free.len()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_grow() {
        let mut ids = Identifier::new(100);
        assert_eq!(ids.acquire(), Ok(ItemId(1)));
        assert_eq!(ids.acquire(), Ok(ItemId(2)));
        assert_eq!(ids.highest_live(), Some(ItemId(2)));
        assert_eq!(ids.live_count(), 2);
    }

    #[test]
    fn smallest_free_id_is_reused() {
        let mut ids = Identifier::new(100);
        for _ in 0..5 {
            ids.acquire().unwrap();
        }
        ids.release(ItemId(4)).unwrap();
        ids.release(ItemId(2)).unwrap();
        assert_eq!(ids.acquire(), Ok(ItemId(2)));
        assert_eq!(ids.acquire(), Ok(ItemId(4)));
        assert_eq!(ids.acquire(), Ok(ItemId(6)));
    }

    #[test]
    fn highest_live_tracks_releases_at_the_top() {
        let mut ids = Identifier::new(100);
        for _ in 0..3 {
            ids.acquire().unwrap();
        }
        ids.release(ItemId(2)).unwrap();
        ids.release(ItemId(3)).unwrap();
        assert_eq!(ids.highest_live(), Some(ItemId(1)));
        ids.release(ItemId(1)).unwrap();
        assert_eq!(ids.highest_live(), None);
        assert_eq!(ids.live_count(), 0);
        assert_eq!(ids.acquire(), Ok(ItemId(1)));
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut ids = Identifier::new(2);
        ids.acquire().unwrap();
        ids.acquire().unwrap();
        assert_eq!(ids.acquire(), Err(IdentifierError::Exhausted { limit: 2 }));
        ids.release(ItemId(1)).unwrap();
        assert_eq!(ids.acquire(), Ok(ItemId(1)));
    }

    #[test]
    fn double_release_is_rejected() {
        let mut ids = Identifier::new(10);
        let id = ids.acquire().unwrap();
        ids.release(id).unwrap();
        assert_eq!(ids.release(id), Err(IdentifierError::NotInUse(id)));
        assert_eq!(ids.release(ItemId(0)), Err(IdentifierError::NotInUse(ItemId(0))));
    }
}
