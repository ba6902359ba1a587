/// Pillar Allocator
///
/// Produces unique six-digit account code numbers under concurrent load.
/// A random (main, sub) digit pair picks one of 90 partitions; the
/// partition's tracker row is locked for the read-increment-write, so two
/// concurrent allocations serialize only when they draw the same partition,
/// and only for the duration of that single-row update.
use crate::db;
use crate::error::{IdentityError, Result};
use crate::models::sub_pillar_base;
use rand::Rng;
use sqlx::PgPool;
use tracing::{debug, warn};

/// Redraw budget before allocation gives up with `CapacityExhausted`.
/// Unreachable under normal load given ~90 x 9,999 free numbers.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 100;

#[derive(Clone)]
pub struct PillarAllocator {
    db: PgPool,
}

impl PillarAllocator {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Allocate the next unique code number.
    ///
    /// An exhausted partition releases its lock and redraws rather than
    /// blocking on one hot row. Each attempt is its own short transaction;
    /// the unique index on `accounts.code_number` is the second line of
    /// defense against any residual race.
    pub async fn allocate(&self) -> Result<i32> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let (main_digit, sub_digit) = draw_digits();
            let base = sub_pillar_base(main_digit, sub_digit);

            let mut tx = self.db.begin().await?;
            let tracker = db::pillar_trackers::lock_or_create(&mut tx, base).await?;

            match tracker.issue_next() {
                Some((tracker, issued)) => {
                    db::pillar_trackers::advance(&mut tx, &tracker).await?;
                    tx.commit().await?;

                    debug!(
                        sub_pillar_base = base,
                        issued = issued,
                        attempt = attempt,
                        "Allocated code number"
                    );
                    return Ok(issued);
                }
                None => {
                    tx.rollback().await?;
                    debug!(
                        sub_pillar_base = base,
                        attempt = attempt,
                        "Partition exhausted; redrawing"
                    );
                }
            }
        }

        warn!(
            attempts = MAX_ALLOCATION_ATTEMPTS,
            "No partition yielded a free slot within the retry budget"
        );
        Err(IdentityError::CapacityExhausted)
    }
}

/// Draw the partition-selecting digit pair: main 1-9, sub 0-9.
fn draw_digits() -> (i32, i32) {
    let mut rng = rand::thread_rng();
    (rng.gen_range(1..=9), rng.gen_range(0..=9))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PILLAR_CAPACITY;

    #[test]
    fn test_drawn_digits_stay_in_range() {
        for _ in 0..1_000 {
            let (main, sub) = draw_digits();
            assert!((1..=9).contains(&main));
            assert!((0..=9).contains(&sub));
        }
    }

    #[test]
    fn test_drawn_bases_are_valid_partitions() {
        for _ in 0..1_000 {
            let (main, sub) = draw_digits();
            let base = sub_pillar_base(main, sub);
            assert!(base >= 100_000);
            assert!(base + PILLAR_CAPACITY <= 999_999);
            assert_eq!(base % 10_000, 0);
        }
    }
}
