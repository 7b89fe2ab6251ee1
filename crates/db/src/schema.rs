use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Needed for the booking exclusion constraint below
    sqlx::query("CREATE EXTENSION IF NOT EXISTS btree_gist;")
        .execute(pool)
        .await?;

    // Create availability_profiles table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability_profiles (
            mentor_id UUID PRIMARY KEY,
            timezone VARCHAR(64) NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create weekly_rules table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weekly_rules (
            mentor_id UUID NOT NULL REFERENCES availability_profiles(mentor_id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            day_of_week SMALLINT NOT NULL,
            start_minutes SMALLINT NOT NULL,
            end_minutes SMALLINT NOT NULL,
            is_available BOOLEAN NOT NULL,
            PRIMARY KEY (mentor_id, position),
            CONSTRAINT valid_day CHECK (day_of_week BETWEEN 0 AND 6),
            CONSTRAINT valid_rule_range CHECK (
                start_minutes >= 0 AND end_minutes <= 1440 AND end_minutes > start_minutes
            )
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create date_overrides table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS date_overrides (
            mentor_id UUID NOT NULL REFERENCES availability_profiles(mentor_id) ON DELETE CASCADE,
            date DATE NOT NULL,
            is_available BOOLEAN NOT NULL,
            start_minutes SMALLINT NULL,
            end_minutes SMALLINT NULL,
            note TEXT NULL,
            PRIMARY KEY (mentor_id, date),
            CONSTRAINT paired_bounds CHECK ((start_minutes IS NULL) = (end_minutes IS NULL))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create bookings table. The exclusion constraint is a backstop behind
    // the advisory-locked overlap scan: no two blocking bookings for one
    // mentor may overlap, even if application code misbehaves.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY,
            mentor_id UUID NOT NULL,
            student_id UUID NOT NULL,
            start_utc TIMESTAMP WITH TIME ZONE NOT NULL,
            end_utc TIMESTAMP WITH TIME ZONE NOT NULL,
            status VARCHAR(32) NOT NULL,
            version BIGINT NOT NULL DEFAULT 0,
            proposed_start_utc TIMESTAMP WITH TIME ZONE NULL,
            proposed_end_utc TIMESTAMP WITH TIME ZONE NULL,
            proposal_reason TEXT NULL,
            proposal_initiated_by VARCHAR(16) NULL,
            proposal_requested_at TIMESTAMP WITH TIME ZONE NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_booking_range CHECK (end_utc > start_utc),
            CONSTRAINT no_double_booking EXCLUDE USING gist (
                mentor_id WITH =,
                tstzrange(start_utc, end_utc) WITH &&
            ) WHERE (status IN ('pending', 'confirmed', 'reschedule-pending'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_weekly_rules_mentor_id ON weekly_rules(mentor_id);
        CREATE INDEX IF NOT EXISTS idx_date_overrides_mentor_id ON date_overrides(mentor_id);
        CREATE INDEX IF NOT EXISTS idx_bookings_mentor_id ON bookings(mentor_id);
        CREATE INDEX IF NOT EXISTS idx_bookings_student_id ON bookings(student_id);
        CREATE INDEX IF NOT EXISTS idx_bookings_start_utc ON bookings(start_utc);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
