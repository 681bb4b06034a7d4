use crate::Database;
use crate::models::{
    BoundsSightingRow, ChecklistPatch, ChecklistRow, ContributorRow, DateCountRow, HotspotRow,
    MyChecklistRow, NewChecklist, NewSighting, SpeciesCountRow, SpeciesDurationRow,
    SpeciesLocationRow, SpeciesRow, UserRow,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

/// Window, in degrees, for matching checklists "at" a coordinate.
pub const COORD_TOLERANCE: f64 = 0.01;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)",
                (id, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Species --

    pub fn list_species(&self, filter: Option<&str>) -> Result<Vec<SpeciesRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, common_name, scientific_name, conservation_status
                 FROM species
                 WHERE ?1 IS NULL OR instr(lower(common_name), lower(?1)) > 0
                 ORDER BY common_name",
            )?;
            let rows = stmt
                .query_map(params![filter], |row| {
                    Ok(SpeciesRow {
                        id: row.get(0)?,
                        common_name: row.get(1)?,
                        scientific_name: row.get(2)?,
                        conservation_status: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Hotspots --

    pub fn list_hotspots(&self) -> Result<Vec<HotspotRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, latitude, longitude, popularity
                 FROM hotspots
                 ORDER BY popularity DESC, name",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(HotspotRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        latitude: row.get(3)?,
                        longitude: row.get(4)?,
                        popularity: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Checklists --

    pub fn list_checklists(&self) -> Result<Vec<ChecklistRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, event_code, latitude, longitude, observation_date,
                        start_time, observer, duration_minutes, notes
                 FROM checklists
                 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], map_checklist_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_my_checklists(&self, user_email: &str) -> Result<Vec<MyChecklistRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_email, event_code, species_name, latitude, longitude,
                        observation_date, start_time, duration_minutes
                 FROM my_checklists
                 WHERE user_email = ?1
                 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([user_email], map_my_checklist_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Insert one checklist plus its sightings in a single transaction.
    /// Either everything lands or nothing does. Returns the new row id.
    pub fn create_checklist(
        &self,
        user_email: &str,
        checklist: &NewChecklist,
        sightings: &[NewSighting],
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let event_code = Uuid::new_v4().to_string();
            let observed_at = chrono::Utc::now().to_rfc3339();

            tx.execute(
                "INSERT INTO my_checklists
                    (user_email, event_code, species_name, latitude, longitude,
                     observation_date, start_time, duration_minutes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user_email,
                    event_code,
                    checklist.species_name,
                    checklist.latitude,
                    checklist.longitude,
                    checklist.observation_date,
                    checklist.start_time,
                    checklist.duration_minutes,
                ],
            )?;
            let checklist_id = tx.last_insert_rowid();

            for sighting in sightings {
                tx.execute(
                    "INSERT INTO sightings
                        (event_code, species_name, observation_count, observer_email, observed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        event_code,
                        sighting.species_name,
                        sighting.count,
                        user_email,
                        observed_at,
                    ],
                )?;
            }

            tx.commit()?;
            Ok(checklist_id)
        })
    }

    /// Partial update of a user-owned checklist. Returns false when the id
    /// does not resolve to a row owned by `user_email`.
    pub fn update_my_checklist(
        &self,
        id: i64,
        user_email: &str,
        patch: &ChecklistPatch,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE my_checklists SET
                    species_name     = COALESCE(?1, species_name),
                    latitude         = COALESCE(?2, latitude),
                    longitude        = COALESCE(?3, longitude),
                    observation_date = COALESCE(?4, observation_date),
                    start_time       = COALESCE(?5, start_time),
                    duration_minutes = COALESCE(?6, duration_minutes)
                 WHERE id = ?7 AND user_email = ?8",
                params![
                    patch.species_name,
                    patch.latitude,
                    patch.longitude,
                    patch.observation_date,
                    patch.start_time,
                    patch.duration_minutes,
                    id,
                    user_email,
                ],
            )?;
            Ok(updated > 0)
        })
    }

    /// Delete a user-owned checklist and every sighting referencing it, in
    /// one transaction. Returns false when the row is absent or not owned.
    pub fn delete_my_checklist(&self, id: i64, user_email: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let event_code: Option<String> = tx
                .query_row(
                    "SELECT event_code FROM my_checklists WHERE id = ?1 AND user_email = ?2",
                    params![id, user_email],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(event_code) = event_code else {
                return Ok(false);
            };

            tx.execute("DELETE FROM sightings WHERE event_code = ?1", [&event_code])?;
            tx.execute("DELETE FROM my_checklists WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(true)
        })
    }

    // -- Aggregations --

    /// Sightings whose parent checklist falls inside the bounding box,
    /// boundary coordinates included.
    pub fn sightings_in_bounds(
        &self,
        north: f64,
        south: f64,
        east: f64,
        west: f64,
        species: Option<&str>,
    ) -> Result<Vec<BoundsSightingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.latitude, c.longitude, s.species_name,
                        COALESCE(s.observation_count, 0)
                 FROM sightings s
                 JOIN all_checklists c ON s.event_code = c.event_code
                 WHERE c.latitude BETWEEN ?1 AND ?2
                   AND c.longitude BETWEEN ?3 AND ?4
                   AND (?5 IS NULL OR s.species_name = ?5)",
            )?;
            let rows = stmt
                .query_map(params![south, north, west, east, species], |row| {
                    Ok(BoundsSightingRow {
                        latitude: row.get(0)?,
                        longitude: row.get(1)?,
                        species_name: row.get(2)?,
                        observation_count: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Per-species totals for checklists within COORD_TOLERANCE of a point.
    pub fn point_species_totals(
        &self,
        lat: f64,
        lon: f64,
        species: Option<&str>,
    ) -> Result<Vec<SpeciesCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.species_name, SUM(COALESCE(s.observation_count, 0)) AS total
                 FROM sightings s
                 JOIN all_checklists c ON s.event_code = c.event_code
                 WHERE ABS(c.latitude - ?1) <= ?3
                   AND ABS(c.longitude - ?2) <= ?3
                   AND (?4 IS NULL OR s.species_name = ?4)
                 GROUP BY s.species_name
                 ORDER BY total DESC",
            )?;
            let rows = stmt
                .query_map(params![lat, lon, COORD_TOLERANCE, species], map_species_count)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Per-species totals within a bounding box, descending by count.
    pub fn region_species_totals(
        &self,
        north: f64,
        south: f64,
        east: f64,
        west: f64,
    ) -> Result<Vec<SpeciesCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.species_name, SUM(COALESCE(s.observation_count, 0)) AS total
                 FROM sightings s
                 JOIN all_checklists c ON s.event_code = c.event_code
                 WHERE c.latitude BETWEEN ?1 AND ?2
                   AND c.longitude BETWEEN ?3 AND ?4
                 GROUP BY s.species_name
                 ORDER BY total DESC",
            )?;
            let rows = stmt
                .query_map(params![south, north, west, east], map_species_count)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn top_species(&self, limit: u32) -> Result<Vec<SpeciesCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT species_name, SUM(COALESCE(observation_count, 0)) AS total
                 FROM sightings
                 GROUP BY species_name
                 ORDER BY total DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], map_species_count)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn top_contributors(&self, limit: u32) -> Result<Vec<ContributorRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT observer, COUNT(*) AS n
                 FROM all_checklists
                 WHERE observer IS NOT NULL AND observer <> ''
                 GROUP BY observer
                 ORDER BY n DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(ContributorRow {
                        observer: row.get(0)?,
                        checklist_count: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Top species ranked by the summed duration of the outings they were
    /// observed on.
    pub fn top_species_by_duration(&self, limit: u32) -> Result<Vec<SpeciesDurationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.species_name, SUM(COALESCE(c.duration_minutes, 0)) AS total
                 FROM sightings s
                 JOIN all_checklists c ON s.event_code = c.event_code
                 GROUP BY s.species_name
                 ORDER BY total DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(SpeciesDurationRow {
                        species_name: row.get(0)?,
                        total_duration: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Per-date totals for one species, most recent dates first.
    pub fn species_time_series(&self, species: &str, limit: u32) -> Result<Vec<DateCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.observation_date, SUM(COALESCE(s.observation_count, 0)) AS total
                 FROM sightings s
                 JOIN all_checklists c ON s.event_code = c.event_code
                 WHERE s.species_name = ?1
                 GROUP BY c.observation_date
                 ORDER BY c.observation_date DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![species, limit], |row| {
                    Ok(DateCountRow {
                        date: row.get(0)?,
                        total_count: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Per-user statistics --

    pub fn user_species_totals(&self, user_email: &str) -> Result<Vec<SpeciesCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.species_name, SUM(COALESCE(s.observation_count, 0)) AS total
                 FROM sightings s
                 JOIN my_checklists m ON s.event_code = m.event_code
                 WHERE m.user_email = ?1
                 GROUP BY s.species_name
                 ORDER BY total DESC",
            )?;
            let rows = stmt
                .query_map([user_email], map_species_count)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn user_observation_range(
        &self,
        user_email: &str,
    ) -> Result<(Option<String>, Option<String>)> {
        self.with_conn(|conn| {
            let range = conn.query_row(
                "SELECT MIN(observation_date), MAX(observation_date)
                 FROM my_checklists
                 WHERE user_email = ?1",
                [user_email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(range)
        })
    }

    /// Observation totals per calendar month (YYYY-MM). Rows whose date does
    /// not parse as a month are skipped.
    pub fn user_monthly_trends(&self, user_email: &str) -> Result<Vec<DateCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT strftime('%Y-%m', m.observation_date) AS month,
                        SUM(COALESCE(s.observation_count, 0)) AS total
                 FROM sightings s
                 JOIN my_checklists m ON s.event_code = m.event_code
                 WHERE m.user_email = ?1
                 GROUP BY month
                 ORDER BY month",
            )?;
            let rows = stmt
                .query_map([user_email], |row| {
                    Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows
                .into_iter()
                .filter_map(|(month, total)| {
                    month.map(|date| DateCountRow {
                        date,
                        total_count: total,
                    })
                })
                .collect())
        })
    }

    pub fn user_species_locations(&self, user_email: &str) -> Result<Vec<SpeciesLocationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.species_name, AVG(m.latitude), AVG(m.longitude)
                 FROM sightings s
                 JOIN my_checklists m ON s.event_code = m.event_code
                 WHERE m.user_email = ?1
                 GROUP BY s.species_name",
            )?;
            let rows = stmt
                .query_map([user_email], |row| {
                    Ok(SpeciesLocationRow {
                        species_name: row.get(0)?,
                        avg_latitude: row.get(1)?,
                        avg_longitude: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, email, password, created_at FROM users WHERE email = ?1")?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn map_checklist_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChecklistRow> {
    Ok(ChecklistRow {
        id: row.get(0)?,
        event_code: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        observation_date: row.get(4)?,
        start_time: row.get(5)?,
        observer: row.get(6)?,
        duration_minutes: row.get(7)?,
        notes: row.get(8)?,
    })
}

fn map_my_checklist_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MyChecklistRow> {
    Ok(MyChecklistRow {
        id: row.get(0)?,
        user_email: row.get(1)?,
        event_code: row.get(2)?,
        species_name: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        observation_date: row.get(6)?,
        start_time: row.get(7)?,
        duration_minutes: row.get(8)?,
    })
}

fn map_species_count(row: &rusqlite::Row<'_>) -> rusqlite::Result<SpeciesCountRow> {
    Ok(SpeciesCountRow {
        species_name: row.get(0)?,
        total_count: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn new_checklist(species: &str, lat: f64, lon: f64, date: &str) -> NewChecklist {
        NewChecklist {
            species_name: species.to_string(),
            latitude: lat,
            longitude: lon,
            observation_date: date.to_string(),
            start_time: Some("07:30:00".to_string()),
            duration_minutes: Some(45.0),
        }
    }

    fn sighting(species: &str, count: i64) -> NewSighting {
        NewSighting {
            species_name: species.to_string(),
            count,
        }
    }

    /// Insert a seeded checklist + sighting pair directly, the way the CSV
    /// seeder would.
    fn seed_event(db: &Database, event: &str, lat: f64, lon: f64, date: &str, species: &str, count: i64) {
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO checklists
                    (event_code, latitude, longitude, observation_date, observer, duration_minutes)
                 VALUES (?1, ?2, ?3, ?4, 'obsr100', 30.0)",
                params![event, lat, lon, date],
            )?;
            conn.execute(
                "INSERT INTO sightings (event_code, species_name, observation_count)
                 VALUES (?1, ?2, ?3)",
                params![event, species, count],
            )?;
            Ok(())
        })
        .unwrap();
    }

    fn count_rows(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            let n = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
            Ok(n)
        })
        .unwrap()
    }

    #[test]
    fn create_inserts_checklist_and_sightings() {
        let db = test_db();
        let id = db
            .create_checklist(
                "ann@example.com",
                &new_checklist("American Robin", 40.0, -75.0, "2024-05-01"),
                &[sighting("American Robin", 3), sighting("Blue Jay", 2)],
            )
            .unwrap();

        assert!(id > 0);
        assert_eq!(count_rows(&db, "my_checklists"), 1);
        assert_eq!(count_rows(&db, "sightings"), 2);

        // Every sighting references the checklist's event code
        let distinct: i64 = db
            .with_conn(|conn| {
                let n = conn.query_row(
                    "SELECT COUNT(DISTINCT s.event_code)
                     FROM sightings s
                     JOIN my_checklists m ON s.event_code = m.event_code",
                    [],
                    |r| r.get(0),
                )?;
                Ok(n)
            })
            .unwrap();
        assert_eq!(distinct, 1);
    }

    #[test]
    fn create_rolls_back_when_a_sighting_fails() {
        let db = test_db();
        // Negative count violates the table CHECK constraint
        let result = db.create_checklist(
            "ann@example.com",
            &new_checklist("American Robin", 40.0, -75.0, "2024-05-01"),
            &[sighting("American Robin", 3), sighting("Blue Jay", -1)],
        );

        assert!(result.is_err());
        assert_eq!(count_rows(&db, "my_checklists"), 0);
        assert_eq!(count_rows(&db, "sightings"), 0);
    }

    #[test]
    fn delete_cascades_to_sightings() {
        let db = test_db();
        let id = db
            .create_checklist(
                "ann@example.com",
                &new_checklist("American Robin", 40.0, -75.0, "2024-05-01"),
                &[sighting("American Robin", 3)],
            )
            .unwrap();

        assert!(db.delete_my_checklist(id, "ann@example.com").unwrap());
        assert_eq!(count_rows(&db, "my_checklists"), 0);
        assert_eq!(count_rows(&db, "sightings"), 0);

        // No orphan shows up through the map query afterwards
        let rows = db
            .sightings_in_bounds(41.0, 39.0, -74.0, -76.0, None)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn delete_missing_or_foreign_row_is_not_found() {
        let db = test_db();
        assert!(!db.delete_my_checklist(999, "ann@example.com").unwrap());

        let id = db
            .create_checklist(
                "ann@example.com",
                &new_checklist("Blue Jay", 41.0, -74.0, "2024-05-02"),
                &[],
            )
            .unwrap();
        // Someone else's row reads as not found
        assert!(!db.delete_my_checklist(id, "bob@example.com").unwrap());
        assert_eq!(count_rows(&db, "my_checklists"), 1);
    }

    #[test]
    fn update_keeps_omitted_fields_and_is_idempotent() {
        let db = test_db();
        let id = db
            .create_checklist(
                "ann@example.com",
                &new_checklist("American Robin", 40.0, -75.0, "2024-05-01"),
                &[],
            )
            .unwrap();

        let patch = ChecklistPatch {
            latitude: Some(42.5),
            ..Default::default()
        };
        assert!(db.update_my_checklist(id, "ann@example.com", &patch).unwrap());
        assert!(db.update_my_checklist(id, "ann@example.com", &patch).unwrap());

        let rows = db.list_my_checklists("ann@example.com").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].latitude, 42.5);
        assert_eq!(rows[0].species_name, "American Robin");
        assert_eq!(rows[0].observation_date, "2024-05-01");
        assert_eq!(rows[0].start_time.as_deref(), Some("07:30:00"));
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let db = test_db();
        let patch = ChecklistPatch::default();
        assert!(!db.update_my_checklist(42, "ann@example.com", &patch).unwrap());
    }

    #[test]
    fn bounds_query_includes_boundary_coordinates() {
        let db = test_db();
        seed_event(&db, "S1", 41.0, -76.0, "2024-04-01", "American Robin", 4);
        seed_event(&db, "S2", 40.0, -75.0, "2024-04-02", "Blue Jay", 2);
        seed_event(&db, "S3", 45.0, -70.0, "2024-04-03", "Blue Jay", 7);

        // S1 sits exactly on the north and west edges
        let rows = db
            .sightings_in_bounds(41.0, 39.0, -74.0, -76.0, None)
            .unwrap();
        assert_eq!(rows.len(), 2);

        let robins: Vec<_> = rows
            .iter()
            .filter(|r| r.species_name == "American Robin")
            .collect();
        assert_eq!(robins.len(), 1);
        assert_eq!(robins[0].observation_count, 4);
    }

    #[test]
    fn bounds_query_filters_by_species() {
        let db = test_db();
        seed_event(&db, "S1", 40.0, -75.0, "2024-04-01", "American Robin", 4);
        seed_event(&db, "S2", 40.1, -75.1, "2024-04-02", "Blue Jay", 2);

        let rows = db
            .sightings_in_bounds(41.0, 39.0, -74.0, -76.0, Some("Blue Jay"))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].species_name, "Blue Jay");
    }

    #[test]
    fn bounds_query_sees_submitted_checklists() {
        let db = test_db();
        db.create_checklist(
            "ann@example.com",
            &new_checklist("American Robin", 40.0, -75.0, "2024-05-01"),
            &[sighting("American Robin", 3)],
        )
        .unwrap();

        let rows = db
            .sightings_in_bounds(41.0, 39.0, -74.0, -76.0, None)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].observation_count, 3);
    }

    #[test]
    fn region_totals_sorted_descending() {
        let db = test_db();
        seed_event(&db, "S1", 40.0, -75.0, "2024-04-01", "American Robin", 4);
        seed_event(&db, "S2", 40.1, -75.1, "2024-04-02", "Blue Jay", 9);
        seed_event(&db, "S3", 40.2, -75.2, "2024-04-03", "American Robin", 1);

        let rows = db.region_species_totals(41.0, 39.0, -74.0, -76.0).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].species_name, "Blue Jay");
        assert_eq!(rows[0].total_count, 9);
        assert_eq!(rows[1].total_count, 5);
    }

    #[test]
    fn empty_region_yields_no_rows() {
        let db = test_db();
        seed_event(&db, "S1", 40.0, -75.0, "2024-04-01", "American Robin", 4);

        let rows = db.region_species_totals(10.0, 5.0, 10.0, 5.0).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn point_lookup_uses_tolerance_window() {
        let db = test_db();
        seed_event(&db, "S1", 40.0, -75.0, "2024-04-01", "American Robin", 4);
        seed_event(&db, "S2", 40.005, -75.005, "2024-04-02", "Blue Jay", 2);
        seed_event(&db, "S3", 40.5, -75.5, "2024-04-03", "Blue Jay", 6);

        let rows = db.point_species_totals(40.0, -75.0, None).unwrap();
        assert_eq!(rows.len(), 2);
        let total: i64 = rows.iter().map(|r| r.total_count).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn top_contributors_counts_checklists() {
        let db = test_db();
        seed_event(&db, "S1", 40.0, -75.0, "2024-04-01", "American Robin", 4);
        seed_event(&db, "S2", 40.1, -75.1, "2024-04-02", "Blue Jay", 2);
        db.create_checklist(
            "ann@example.com",
            &new_checklist("Blue Jay", 41.0, -74.0, "2024-05-02"),
            &[],
        )
        .unwrap();

        let rows = db.top_contributors(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].observer, "obsr100");
        assert_eq!(rows[0].checklist_count, 2);
        assert_eq!(rows[1].observer, "ann@example.com");
    }

    #[test]
    fn time_series_most_recent_first() {
        let db = test_db();
        seed_event(&db, "S1", 40.0, -75.0, "2024-04-01", "American Robin", 4);
        seed_event(&db, "S2", 40.1, -75.1, "2024-04-03", "American Robin", 2);
        seed_event(&db, "S3", 40.2, -75.2, "2024-04-02", "Blue Jay", 9);

        let rows = db.species_time_series("American Robin", 30).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2024-04-03");
        assert_eq!(rows[1].date, "2024-04-01");
    }

    #[test]
    fn user_statistics_cover_only_their_checklists() {
        let db = test_db();
        db.create_checklist(
            "ann@example.com",
            &new_checklist("American Robin", 40.0, -75.0, "2024-05-01"),
            &[sighting("American Robin", 3), sighting("Blue Jay", 1)],
        )
        .unwrap();
        db.create_checklist(
            "ann@example.com",
            &new_checklist("Blue Jay", 41.0, -74.0, "2024-06-15"),
            &[sighting("Blue Jay", 4)],
        )
        .unwrap();
        db.create_checklist(
            "bob@example.com",
            &new_checklist("Osprey", 27.0, -82.0, "2024-06-20"),
            &[sighting("Osprey", 2)],
        )
        .unwrap();

        let totals = db.user_species_totals("ann@example.com").unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].species_name, "Blue Jay");
        assert_eq!(totals[0].total_count, 5);

        let (first, last) = db.user_observation_range("ann@example.com").unwrap();
        assert_eq!(first.as_deref(), Some("2024-05-01"));
        assert_eq!(last.as_deref(), Some("2024-06-15"));

        let months = db.user_monthly_trends("ann@example.com").unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].date, "2024-05");
        assert_eq!(months[0].total_count, 4);

        let locations = db.user_species_locations("ann@example.com").unwrap();
        let jay = locations
            .iter()
            .find(|l| l.species_name == "Blue Jay")
            .unwrap();
        assert!((jay.avg_latitude - 40.5).abs() < 1e-9);
    }

    #[test]
    fn user_observation_range_empty_is_none() {
        let db = test_db();
        let (first, last) = db.user_observation_range("nobody@example.com").unwrap();
        assert!(first.is_none());
        assert!(last.is_none());
    }

    #[test]
    fn species_search_is_case_insensitive_substring() {
        let db = test_db();
        db.with_conn(|conn| {
            conn.execute_batch(
                "INSERT INTO species (common_name) VALUES ('American Robin');
                 INSERT INTO species (common_name, scientific_name) VALUES ('Blue Jay', 'Cyanocitta cristata');
                 INSERT INTO species (common_name) VALUES ('European Robin');",
            )?;
            Ok(())
        })
        .unwrap();

        let all = db.list_species(None).unwrap();
        assert_eq!(all.len(), 3);

        let robins = db.list_species(Some("robin")).unwrap();
        assert_eq!(robins.len(), 2);
        assert_eq!(robins[0].common_name, "American Robin");
    }
}
