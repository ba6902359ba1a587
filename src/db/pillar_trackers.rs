/// Pillar-tracker repository: the exclusive-lock-on-read primitive behind
/// the allocator.
use crate::error::Result;
use crate::models::PillarTracker;
use sqlx::{Postgres, Transaction};

/// Lock the tracker row for a partition, creating it at the base value on
/// first use. The caller holds the lock until its transaction ends, so the
/// read-increment-write below is race-free within the partition.
pub async fn lock_or_create(
    tx: &mut Transaction<'_, Postgres>,
    sub_pillar_base: i32,
) -> Result<PillarTracker> {
    sqlx::query(
        r#"
        INSERT INTO pillar_trackers (sub_pillar_base, last_issued_number)
        VALUES ($1, $1)
        ON CONFLICT (sub_pillar_base) DO NOTHING
        "#,
    )
    .bind(sub_pillar_base)
    .execute(tx.as_mut())
    .await?;

    let tracker = sqlx::query_as::<_, PillarTracker>(
        "SELECT * FROM pillar_trackers WHERE sub_pillar_base = $1 FOR UPDATE",
    )
    .bind(sub_pillar_base)
    .fetch_one(tx.as_mut())
    .await?;

    Ok(tracker)
}

/// Persist the advanced sequence value for a locked tracker row.
pub async fn advance(tx: &mut Transaction<'_, Postgres>, tracker: &PillarTracker) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE pillar_trackers
        SET last_issued_number = $2, updated_at = CURRENT_TIMESTAMP
        WHERE sub_pillar_base = $1
        "#,
    )
    .bind(tracker.sub_pillar_base)
    .bind(tracker.last_issued_number)
    .execute(tx.as_mut())
    .await?;

    Ok(())
}
