/// Database row types — these map directly to SQLite rows.
/// Distinct from the roost-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct SpeciesRow {
    pub id: i64,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub conservation_status: Option<String>,
}

pub struct ChecklistRow {
    pub id: i64,
    pub event_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub observation_date: String,
    pub start_time: Option<String>,
    pub observer: Option<String>,
    pub duration_minutes: Option<f64>,
    pub notes: Option<String>,
}

pub struct MyChecklistRow {
    pub id: i64,
    pub user_email: String,
    pub event_code: String,
    pub species_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub observation_date: String,
    pub start_time: Option<String>,
    pub duration_minutes: Option<f64>,
}

pub struct HotspotRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub popularity: i64,
}

/// Fields for a new user-submitted checklist. The event code and timestamps
/// are generated by the insert itself.
pub struct NewChecklist {
    pub species_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub observation_date: String,
    pub start_time: Option<String>,
    pub duration_minutes: Option<f64>,
}

pub struct NewSighting {
    pub species_name: String,
    pub count: i64,
}

/// Partial update for a user-owned checklist; `None` keeps the stored value.
#[derive(Default)]
pub struct ChecklistPatch {
    pub species_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub observation_date: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<f64>,
}

// -- Aggregation results --

pub struct BoundsSightingRow {
    pub latitude: f64,
    pub longitude: f64,
    pub species_name: String,
    pub observation_count: i64,
}

pub struct SpeciesCountRow {
    pub species_name: String,
    pub total_count: i64,
}

pub struct ContributorRow {
    pub observer: String,
    pub checklist_count: i64,
}

pub struct SpeciesDurationRow {
    pub species_name: String,
    pub total_duration: f64,
}

pub struct DateCountRow {
    pub date: String,
    pub total_count: i64,
}

pub struct SpeciesLocationRow {
    pub species_name: String,
    pub avg_latitude: f64,
    pub avg_longitude: f64,
}
