use crate::models::{DbAvailabilityProfile, DbDateOverride, DbWeeklyRule};
use chrono::Utc;
use eyre::Result;
use mentorbook_core::models::availability::{AvailabilityProfile, DateOverride, WeeklyRule};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Assembles a profile from its three tables. Rules come back in the order
/// they were submitted; overrides key by date.
pub async fn get_profile(
    pool: &Pool<Postgres>,
    mentor_id: Uuid,
) -> Result<Option<AvailabilityProfile>> {
    tracing::debug!("Getting availability profile: mentor_id={}", mentor_id);

    let row = sqlx::query_as::<_, DbAvailabilityProfile>(
        r#"
        SELECT mentor_id, timezone, is_active, created_at, updated_at
        FROM availability_profiles
        WHERE mentor_id = $1
        "#,
    )
    .bind(mentor_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        tracing::debug!("Availability profile not found: mentor_id={}", mentor_id);
        return Ok(None);
    };

    let rules = sqlx::query_as::<_, DbWeeklyRule>(
        r#"
        SELECT mentor_id, position, day_of_week, start_minutes, end_minutes, is_available
        FROM weekly_rules
        WHERE mentor_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(mentor_id)
    .fetch_all(pool)
    .await?;

    let overrides = sqlx::query_as::<_, DbDateOverride>(
        r#"
        SELECT mentor_id, date, is_available, start_minutes, end_minutes, note
        FROM date_overrides
        WHERE mentor_id = $1
        ORDER BY date ASC
        "#,
    )
    .bind(mentor_id)
    .fetch_all(pool)
    .await?;

    let mut profile = AvailabilityProfile::new(row.mentor_id, row.timezone, row.created_at);
    profile.is_active = row.is_active;
    profile.updated_at = row.updated_at;
    profile.weekly_rules = rules
        .into_iter()
        .map(DbWeeklyRule::into_core)
        .collect::<Result<_>>()?;
    for db_override in overrides {
        let date_override = db_override.into_core()?;
        profile.date_overrides.insert(date_override.date, date_override);
    }

    Ok(Some(profile))
}

/// Creates the profile row or, when it already exists, updates its timezone
/// if one was supplied.
pub async fn upsert_profile(
    pool: &Pool<Postgres>,
    mentor_id: Uuid,
    timezone: Option<&str>,
) -> Result<()> {
    let now = Utc::now();

    tracing::debug!(
        "Upserting availability profile: mentor_id={}, timezone={:?}",
        mentor_id,
        timezone
    );

    sqlx::query(
        r#"
        INSERT INTO availability_profiles (mentor_id, timezone, is_active, created_at, updated_at)
        VALUES ($1, $2, TRUE, $3, $3)
        ON CONFLICT (mentor_id) DO UPDATE
        SET timezone = COALESCE($2, availability_profiles.timezone), updated_at = $3
        "#,
    )
    .bind(mentor_id)
    .bind(timezone)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replaces the whole rule set in one transaction so readers never observe
/// a mix of old and new rules.
pub async fn replace_weekly_rules(
    pool: &Pool<Postgres>,
    mentor_id: Uuid,
    rules: &[WeeklyRule],
) -> Result<()> {
    tracing::debug!(
        "Replacing weekly rules: mentor_id={}, count={}",
        mentor_id,
        rules.len()
    );

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM weekly_rules WHERE mentor_id = $1")
        .bind(mentor_id)
        .execute(&mut *tx)
        .await?;

    for (position, rule) in rules.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO weekly_rules
                (mentor_id, position, day_of_week, start_minutes, end_minutes, is_available)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(mentor_id)
        .bind(position as i32)
        .bind(rule.day_of_week as i16)
        .bind(rule.start_time.minutes() as i16)
        .bind(rule.end_time.minutes() as i16)
        .bind(rule.is_available)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE availability_profiles SET updated_at = $2 WHERE mentor_id = $1")
        .bind(mentor_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Inserts or replaces the override for its date.
pub async fn upsert_date_override(
    pool: &Pool<Postgres>,
    mentor_id: Uuid,
    date_override: &DateOverride,
) -> Result<()> {
    tracing::debug!(
        "Upserting date override: mentor_id={}, date={}",
        mentor_id,
        date_override.date
    );

    sqlx::query(
        r#"
        INSERT INTO date_overrides (mentor_id, date, is_available, start_minutes, end_minutes, note)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (mentor_id, date) DO UPDATE
        SET is_available = $3, start_minutes = $4, end_minutes = $5, note = $6
        "#,
    )
    .bind(mentor_id)
    .bind(date_override.date)
    .bind(date_override.is_available)
    .bind(date_override.start_time.map(|t| t.minutes() as i16))
    .bind(date_override.end_time.map(|t| t.minutes() as i16))
    .bind(date_override.note.as_deref())
    .execute(pool)
    .await?;

    sqlx::query("UPDATE availability_profiles SET updated_at = $2 WHERE mentor_id = $1")
        .bind(mentor_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(())
}

/// Flips the active flag, returning whether a profile row was touched.
pub async fn set_active(pool: &Pool<Postgres>, mentor_id: Uuid, is_active: bool) -> Result<bool> {
    tracing::debug!(
        "Setting profile active flag: mentor_id={}, is_active={}",
        mentor_id,
        is_active
    );

    let result = sqlx::query(
        "UPDATE availability_profiles SET is_active = $2, updated_at = $3 WHERE mentor_id = $1",
    )
    .bind(mentor_id)
    .bind(is_active)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
