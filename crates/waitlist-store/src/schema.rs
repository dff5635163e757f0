//! Waitlist database schema.
//!
//! Mirrors `migrations/0001_waitlist.sql` for callers that bootstrap a
//! database without running migrations.

/// SQL to create the per-event summary table.
pub const CREATE_EVENT_WAITLISTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS event_waitlists (
    event_id          UUID PRIMARY KEY,
    max_attendees     INTEGER NOT NULL CHECK (max_attendees > 0),
    current_attendees INTEGER NOT NULL DEFAULT 0
        CHECK (current_attendees >= 0 AND current_attendees <= max_attendees),
    sample_size       INTEGER NOT NULL CHECK (sample_size > 0),
    created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

/// SQL to create the entrant table.
pub const CREATE_WAITLIST_ENTRANTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS waitlist_entrants (
    event_id   UUID NOT NULL REFERENCES event_waitlists (event_id),
    user_id    VARCHAR(255) NOT NULL,
    user_name  VARCHAR(255) NOT NULL,
    user_email VARCHAR(255) NOT NULL,
    status     VARCHAR(16) NOT NULL DEFAULT 'waiting'
        CHECK (status IN ('waiting', 'selected', 'confirmed', 'cancelled')),
    write_id   UUID,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (event_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_waitlist_entrants_status
    ON waitlist_entrants (event_id, status);
";

/// Every statement needed for a fresh database, in dependency order.
pub const ALL_TABLES: [&str; 2] = [CREATE_EVENT_WAITLISTS_TABLE, CREATE_WAITLIST_ENTRANTS_TABLE];
