use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims shared between the auth handlers and the REST middleware.
/// Canonical definition lives here in roost-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

// -- Species --

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesInfo {
    pub id: i64,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub conservation_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeciesListResponse {
    pub species: Vec<SpeciesInfo>,
}

// -- Checklists --

/// One species-count entry on a submitted checklist. The uppercase wire name
/// is the contract the original frontend sends.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesCount {
    #[serde(rename = "COMMON_NAME")]
    pub common_name: String,
    #[serde(default)]
    pub count: i64,
}

/// Checklist submission. Required fields are modelled as `Option` so the
/// handler can report every missing key by name instead of failing
/// deserialization wholesale.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitChecklistRequest {
    pub species_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub observation_date: Option<String>,
    pub time_observations_started: Option<String>,
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub species: Vec<SpeciesCount>,
}

#[derive(Debug, Serialize)]
pub struct SubmitChecklistResponse {
    pub status: String,
    pub checklist_id: i64,
}

/// Partial checklist edit. Wire names match the original frontend payload.
#[derive(Debug, Default, Deserialize)]
pub struct EditChecklistRequest {
    #[serde(rename = "COMMON_NAME")]
    pub species_name: Option<String>,
    #[serde(rename = "LATITUDE")]
    pub latitude: Option<f64>,
    #[serde(rename = "LONGITUDE")]
    pub longitude: Option<f64>,
    #[serde(rename = "OBSERVATION_DATE")]
    pub observation_date: Option<String>,
    #[serde(rename = "TIME_OBSERVATIONS_STARTED")]
    pub start_time: Option<String>,
    #[serde(rename = "DURATION_MINUTES")]
    pub duration_minutes: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub status: String,
    pub message: String,
}

impl MutationResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistInfo {
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

#[derive(Debug, Serialize)]
pub struct ChecklistsResponse {
    pub checklists: Vec<ChecklistInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyChecklistInfo {
    pub id: i64,
    pub event_code: String,
    pub species_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub observation_date: String,
    pub start_time: Option<String>,
    pub duration_minutes: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MyChecklistsResponse {
    pub checklists: Vec<MyChecklistInfo>,
}

// -- Map queries --

#[derive(Debug, Deserialize)]
pub struct BoundsRequest {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub species: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SightingPoint {
    pub lat: f64,
    pub lon: f64,
    pub species: String,
    pub intensity: i64,
}

#[derive(Debug, Serialize)]
pub struct BirdSightingsResponse {
    pub sightings: Vec<SightingPoint>,
}

#[derive(Debug, Deserialize)]
pub struct HotspotDetailsRequest {
    pub lat: f64,
    pub lon: f64,
    pub species: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesTotal {
    pub species: String,
    pub total_count: i64,
}

#[derive(Debug, Serialize)]
pub struct HotspotDetailsResponse {
    pub species_count: usize,
    pub species_details: Vec<SpeciesTotal>,
    pub total_observations: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HotspotInfo {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub popularity: i64,
}

#[derive(Debug, Serialize)]
pub struct HotspotsResponse {
    pub hotspots: Vec<HotspotInfo>,
}

// -- Statistics --

#[derive(Debug, Deserialize)]
pub struct RegionStatisticsQuery {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesShare {
    pub species: String,
    pub total_count: i64,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct RegionStatisticsResponse {
    pub species_summary: Vec<SpeciesShare>,
    pub total_observations: i64,
    pub unique_species: usize,
}

#[derive(Debug, Serialize)]
pub struct TopSpeciesResponse {
    pub top_species: Vec<SpeciesTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributorTotal {
    pub observer: String,
    pub checklist_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TopContributorsResponse {
    pub top_contributors: Vec<ContributorTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesDuration {
    pub species: String,
    pub total_duration: f64,
}

#[derive(Debug, Serialize)]
pub struct TopDurationResponse {
    pub top_species: Vec<SpeciesDuration>,
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesQuery {
    pub species: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateTotal {
    pub date: String,
    pub total_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TimeSeriesResponse {
    pub time_series: Vec<DateTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesLocation {
    pub species: String,
    pub avg_latitude: f64,
    pub avg_longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct UserStatisticsResponse {
    pub total_observations: i64,
    pub unique_species: usize,
    pub most_observed_species: Option<String>,
    pub first_observation_date: Option<String>,
    pub last_observation_date: Option<String>,
    pub species_summary: Vec<SpeciesTotal>,
    pub monthly_trends: BTreeMap<String, i64>,
    pub location_data: Vec<SpeciesLocation>,
}
