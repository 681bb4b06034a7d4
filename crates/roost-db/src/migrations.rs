use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS species (
            id                  INTEGER PRIMARY KEY,
            common_name         TEXT NOT NULL UNIQUE,
            scientific_name     TEXT,
            conservation_status TEXT
        );

        CREATE TABLE IF NOT EXISTS checklists (
            id                  INTEGER PRIMARY KEY,
            event_code          TEXT NOT NULL UNIQUE,
            latitude            REAL NOT NULL,
            longitude           REAL NOT NULL,
            observation_date    TEXT NOT NULL,
            start_time          TEXT,
            observer            TEXT,
            duration_minutes    REAL,
            notes               TEXT
        );

        CREATE TABLE IF NOT EXISTS sightings (
            id                  INTEGER PRIMARY KEY,
            event_code          TEXT NOT NULL,
            species_name        TEXT NOT NULL,
            observation_count   INTEGER NOT NULL DEFAULT 0
                                CHECK (observation_count >= 0),
            observer_email      TEXT,
            observed_at         TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_sightings_event
            ON sightings(event_code);

        CREATE INDEX IF NOT EXISTS idx_sightings_species
            ON sightings(species_name);

        CREATE TABLE IF NOT EXISTS my_checklists (
            id                  INTEGER PRIMARY KEY,
            user_email          TEXT NOT NULL,
            event_code          TEXT NOT NULL UNIQUE,
            species_name        TEXT NOT NULL,
            latitude            REAL NOT NULL,
            longitude           REAL NOT NULL,
            observation_date    TEXT NOT NULL,
            start_time          TEXT,
            duration_minutes    REAL
        );

        CREATE INDEX IF NOT EXISTS idx_my_checklists_user
            ON my_checklists(user_email);

        CREATE TABLE IF NOT EXISTS hotspots (
            id          INTEGER PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            description TEXT,
            latitude    REAL NOT NULL,
            longitude   REAL NOT NULL,
            popularity  INTEGER NOT NULL DEFAULT 0
        );

        -- Aggregation queries join sightings against this view so seeded
        -- outings and live user submissions resolve through one target.
        CREATE VIEW IF NOT EXISTS all_checklists AS
            SELECT event_code, latitude, longitude, observation_date,
                   start_time, observer, duration_minutes
            FROM checklists
            UNION ALL
            SELECT event_code, latitude, longitude, observation_date,
                   start_time, user_email AS observer, duration_minutes
            FROM my_checklists;
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
