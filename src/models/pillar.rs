use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Numbers issuable per partition: base+1 ..= base+PILLAR_CAPACITY.
pub const PILLAR_CAPACITY: i32 = 9_999;

/// Compute the partition base for a (main, sub) digit pair.
///
/// main ∈ 1..=9, sub ∈ 0..=9, so bases cover 100_000..=990_000 in steps of
/// 10_000 and every issued code is a six-digit number.
pub fn sub_pillar_base(main_digit: i32, sub_digit: i32) -> i32 {
    debug_assert!((1..=9).contains(&main_digit));
    debug_assert!((0..=9).contains(&sub_digit));
    (main_digit * 10 + sub_digit) * 10_000
}

/// Per-partition sequence state. One row per sub-pillar, created lazily and
/// mutated only under a row-level exclusive lock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PillarTracker {
    pub sub_pillar_base: i32,
    pub last_issued_number: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PillarTracker {
    /// A fresh tracker starts at the base; the first issued number is base+1.
    pub fn is_exhausted(&self) -> bool {
        self.last_issued_number >= self.sub_pillar_base + PILLAR_CAPACITY
    }

    /// Advance the sequence by one, returning the updated tracker and the
    /// issued number, or `None` when the partition is spent. Numbers within a
    /// partition are strictly increasing and never reused.
    pub fn issue_next(mut self) -> Option<(Self, i32)> {
        if self.is_exhausted() {
            return None;
        }
        self.last_issued_number += 1;
        let issued = self.last_issued_number;
        Some((self, issued))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(base: i32, last: i32) -> PillarTracker {
        let now = Utc::now();
        PillarTracker {
            sub_pillar_base: base,
            last_issued_number: last,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_base_computation() {
        assert_eq!(sub_pillar_base(1, 0), 100_000);
        assert_eq!(sub_pillar_base(5, 6), 560_000);
        assert_eq!(sub_pillar_base(9, 9), 990_000);
    }

    #[test]
    fn test_first_issue_is_base_plus_one() {
        let base = sub_pillar_base(5, 6);
        let (updated, issued) = tracker(base, base).issue_next().unwrap();
        assert_eq!(issued, 560_001);
        assert_eq!(updated.last_issued_number, 560_001);
    }

    #[test]
    fn test_sequence_is_strictly_increasing() {
        let base = sub_pillar_base(3, 2);
        let mut current = tracker(base, base);
        let mut previous = base;
        for _ in 0..100 {
            let (next, issued) = current.issue_next().unwrap();
            assert!(issued > previous);
            previous = issued;
            current = next;
        }
    }

    #[test]
    fn test_partition_exhausts_at_capacity() {
        let base = sub_pillar_base(1, 0);
        let nearly_spent = tracker(base, base + PILLAR_CAPACITY - 1);

        let (spent, issued) = nearly_spent.issue_next().unwrap();
        assert_eq!(issued, base + PILLAR_CAPACITY);
        assert!(spent.is_exhausted());
        assert!(spent.issue_next().is_none());
    }

    #[test]
    fn test_issued_numbers_are_six_digits() {
        for main in 1..=9 {
            for sub in 0..=9 {
                let base = sub_pillar_base(main, sub);
                assert!(base + 1 >= 100_001);
                assert!(base + PILLAR_CAPACITY <= 999_999);
            }
        }
    }
}
