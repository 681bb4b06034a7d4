//! CSV fixture loading, run once at startup before the server begins
//! accepting traffic. A failed table never aborts the process; a failed row
//! never aborts its table.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::types::Value;
use tracing::{error, info, warn};

use crate::Database;

/// Fixture header names. These are the external file-format contract for the
/// uploaded eBird-style exports and must match the CSV files byte for byte.
pub mod headers {
    pub const COMMON_NAME: &str = "COMMON NAME";
    pub const SCIENTIFIC_NAME: &str = "SCIENTIFIC NAME";
    pub const CONSERVATION_STATUS: &str = "CONSERVATION STATUS";
    pub const SAMPLING_EVENT_IDENTIFIER: &str = "SAMPLING_EVENT_IDENTIFIER";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const OBSERVATION_DATE: &str = "OBSERVATION_DATE";
    pub const TIME_OBSERVATIONS_STARTED: &str = "TIME_OBSERVATIONS_STARTED";
    pub const OBSERVER_ID: &str = "OBSERVER_ID";
    pub const DURATION_MINUTES: &str = "DURATION_MINUTES";
    pub const OBSERVATION_COUNT: &str = "OBSERVATION_COUNT";
    pub const NAME: &str = "NAME";
    pub const DESCRIPTION: &str = "DESCRIPTION";
    pub const POPULARITY: &str = "POPULARITY";
}

/// Target table plus the columns the mapper produces values for, in order.
pub struct SeedTarget {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

impl SeedTarget {
    fn insert_sql(&self) -> String {
        let placeholders: Vec<String> =
            (1..=self.columns.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.columns.join(", "),
            placeholders.join(", ")
        )
    }
}

pub const SPECIES: SeedTarget = SeedTarget {
    table: "species",
    columns: &["common_name", "scientific_name", "conservation_status"],
};

pub const CHECKLISTS: SeedTarget = SeedTarget {
    table: "checklists",
    columns: &[
        "event_code",
        "latitude",
        "longitude",
        "observation_date",
        "start_time",
        "observer",
        "duration_minutes",
    ],
};

pub const SIGHTINGS: SeedTarget = SeedTarget {
    table: "sightings",
    columns: &["event_code", "species_name", "observation_count"],
};

pub const HOTSPOTS: SeedTarget = SeedTarget {
    table: "hotspots",
    columns: &["name", "description", "latitude", "longitude", "popularity"],
};

type CsvRow = HashMap<String, String>;

/// Replace the target table's contents with the mapped rows of one CSV file.
///
/// The table is cleared and reloaded inside a single transaction, committed
/// once at the end. A missing file is a logged no-op that leaves the table
/// empty; a row the mapper rejects is logged and skipped. Returns the number
/// of rows inserted.
pub fn seed_table<M>(db: &Database, target: &SeedTarget, path: &Path, mapper: M) -> Result<usize>
where
    M: Fn(&CsvRow) -> Result<Vec<Value>>,
{
    if !path.exists() {
        info!(
            "Seed file not found, leaving {} empty: {}",
            target.table,
            path.display()
        );
        db.with_conn(|conn| {
            conn.execute(&format!("DELETE FROM {}", target.table), [])?;
            Ok(())
        })?;
        return Ok(0);
    }

    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;

    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", target.table), [])?;

        let mut inserted = 0usize;
        let mut skipped = 0usize;
        {
            let mut stmt = tx.prepare(&target.insert_sql())?;
            for (idx, record) in reader.deserialize::<CsvRow>().enumerate() {
                // Header row is line 1, so data row N sits on line N+1
                let line = idx + 2;
                let row = match record {
                    Ok(row) => row,
                    Err(e) => {
                        warn!("{} line {}: unreadable row skipped: {}", target.table, line, e);
                        skipped += 1;
                        continue;
                    }
                };
                match mapper(&row) {
                    Ok(values) => {
                        stmt.execute(rusqlite::params_from_iter(values))?;
                        inserted += 1;
                    }
                    Err(e) => {
                        warn!("{} line {}: row skipped: {}", target.table, line, e);
                        skipped += 1;
                    }
                }
            }
        }
        tx.commit()?;

        info!(
            "Seeded {} rows into {} from {} ({} skipped)",
            inserted,
            target.table,
            path.display(),
            skipped
        );
        Ok(inserted)
    })
}

/// Seed every table from `uploads_dir`. Failures are logged per table and
/// never propagate; startup continues regardless.
pub fn run_all(db: &Database, uploads_dir: &Path) {
    let seeds: [(&SeedTarget, &str, fn(&CsvRow) -> Result<Vec<Value>>); 4] = [
        (&SPECIES, "species.csv", species_row),
        (&CHECKLISTS, "checklists.csv", checklist_row),
        (&SIGHTINGS, "sightings.csv", sighting_row),
        (&HOTSPOTS, "hotspots.csv", hotspot_row),
    ];

    for (target, file, mapper) in seeds {
        if let Err(e) = seed_table(db, target, &uploads_dir.join(file), mapper) {
            error!("Seeding {} failed: {:#}", target.table, e);
        }
    }
}

fn required<'a>(row: &'a CsvRow, header: &str) -> Result<&'a str> {
    row.get(header)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("missing value for column {header:?}"))
}

fn optional(row: &CsvRow, header: &str) -> Option<String> {
    row.get(header)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required_f64(row: &CsvRow, header: &str) -> Result<f64> {
    let raw = required(row, header)?;
    raw.parse::<f64>()
        .with_context(|| format!("column {header:?}: {raw:?} is not a number"))
}

pub fn species_row(row: &CsvRow) -> Result<Vec<Value>> {
    Ok(vec![
        Value::from(required(row, headers::COMMON_NAME)?.to_string()),
        Value::from(optional(row, headers::SCIENTIFIC_NAME)),
        Value::from(optional(row, headers::CONSERVATION_STATUS)),
    ])
}

pub fn checklist_row(row: &CsvRow) -> Result<Vec<Value>> {
    Ok(vec![
        Value::from(required(row, headers::SAMPLING_EVENT_IDENTIFIER)?.to_string()),
        Value::from(required_f64(row, headers::LATITUDE)?),
        Value::from(required_f64(row, headers::LONGITUDE)?),
        Value::from(required(row, headers::OBSERVATION_DATE)?.to_string()),
        Value::from(optional(row, headers::TIME_OBSERVATIONS_STARTED)),
        Value::from(optional(row, headers::OBSERVER_ID)),
        Value::from(required_f64(row, headers::DURATION_MINUTES)?),
    ])
}

pub fn sighting_row(row: &CsvRow) -> Result<Vec<Value>> {
    // eBird exports use "X" for present-but-uncounted; those load as 0,
    // matching the upstream fixture convention.
    let count = optional(row, headers::OBSERVATION_COUNT)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0)
        .max(0);

    Ok(vec![
        Value::from(required(row, headers::SAMPLING_EVENT_IDENTIFIER)?.to_string()),
        Value::from(required(row, headers::COMMON_NAME)?.to_string()),
        Value::from(count),
    ])
}

pub fn hotspot_row(row: &CsvRow) -> Result<Vec<Value>> {
    let popularity = optional(row, headers::POPULARITY)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);

    Ok(vec![
        Value::from(required(row, headers::NAME)?.to_string()),
        Value::from(optional(row, headers::DESCRIPTION)),
        Value::from(required_f64(row, headers::LATITUDE)?),
        Value::from(required_f64(row, headers::LONGITUDE)?),
        Value::from(popularity),
    ])
}
