use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use roost_db::models::SpeciesCountRow;
use roost_types::api::{
    BirdSightingsResponse, BoundsRequest, Claims, ContributorTotal, DateTotal,
    HotspotDetailsRequest, HotspotDetailsResponse, HotspotInfo, HotspotsResponse,
    RegionStatisticsQuery, RegionStatisticsResponse, SightingPoint, SpeciesDuration,
    SpeciesLocation, SpeciesShare, SpeciesTotal, TimeSeriesQuery, TimeSeriesResponse,
    TopContributorsResponse, TopDurationResponse, TopSpeciesResponse, UserStatisticsResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;

/// Observation counts above this render at full heat on the map.
const MAX_INTENSITY: i64 = 10;

/// Rankings return at most this many rows.
const TOP_N: u32 = 10;

const DEFAULT_SERIES_LEN: u32 = 30;
const MAX_SERIES_LEN: u32 = 365;

/// Heat-map sightings within a bounding box.
pub async fn get_bird_sightings(
    State(state): State<AppState>,
    Json(req): Json<BoundsRequest>,
) -> Result<Json<BirdSightingsResponse>, ApiError> {
    let species = normalize(req.species.as_deref());

    // This query can touch every sighting in a dense region; run the
    // blocking DB work off the async runtime.
    let app = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        app.db
            .sightings_in_bounds(req.north, req.south, req.east, req.west, species.as_deref())
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    let sightings = rows
        .into_iter()
        .map(|row| SightingPoint {
            lat: row.latitude,
            lon: row.longitude,
            species: row.species_name,
            intensity: intensity(row.observation_count),
        })
        .collect();

    Ok(Json(BirdSightingsResponse { sightings }))
}

/// Aggregated species counts for checklists at (or just around) one point.
pub async fn get_hotspot_details(
    State(state): State<AppState>,
    Json(req): Json<HotspotDetailsRequest>,
) -> Result<Json<HotspotDetailsResponse>, ApiError> {
    let species = normalize(req.species.as_deref());
    let rows = state
        .db
        .point_species_totals(req.lat, req.lon, species.as_deref())?;

    let total_observations: i64 = rows.iter().map(|r| r.total_count).sum();
    let species_details: Vec<SpeciesTotal> = rows
        .into_iter()
        .map(|row| SpeciesTotal {
            species: row.species_name,
            total_count: row.total_count,
        })
        .collect();

    Ok(Json(HotspotDetailsResponse {
        species_count: species_details.len(),
        species_details,
        total_observations,
    }))
}

pub async fn get_region_statistics(
    State(state): State<AppState>,
    Query(query): Query<RegionStatisticsQuery>,
) -> Result<Json<RegionStatisticsResponse>, ApiError> {
    let rows = state
        .db
        .region_species_totals(query.north, query.south, query.east, query.west)?;

    let (species_summary, total_observations) = species_shares(rows);

    Ok(Json(RegionStatisticsResponse {
        unique_species: species_summary.len(),
        species_summary,
        total_observations,
    }))
}

pub async fn list_hotspots(
    State(state): State<AppState>,
) -> Result<Json<HotspotsResponse>, ApiError> {
    let rows = state.db.list_hotspots()?;

    let hotspots = rows
        .into_iter()
        .map(|row| HotspotInfo {
            id: row.id,
            name: row.name,
            description: row.description,
            latitude: row.latitude,
            longitude: row.longitude,
            popularity: row.popularity,
        })
        .collect();

    Ok(Json(HotspotsResponse { hotspots }))
}

pub async fn get_top_species(
    State(state): State<AppState>,
) -> Result<Json<TopSpeciesResponse>, ApiError> {
    let rows = state.db.top_species(TOP_N)?;

    let top_species = rows
        .into_iter()
        .map(|row| SpeciesTotal {
            species: row.species_name,
            total_count: row.total_count,
        })
        .collect();

    Ok(Json(TopSpeciesResponse { top_species }))
}

pub async fn get_top_contributors(
    State(state): State<AppState>,
) -> Result<Json<TopContributorsResponse>, ApiError> {
    let rows = state.db.top_contributors(TOP_N)?;

    let top_contributors = rows
        .into_iter()
        .map(|row| ContributorTotal {
            observer: row.observer,
            checklist_count: row.checklist_count,
        })
        .collect();

    Ok(Json(TopContributorsResponse { top_contributors }))
}

pub async fn get_top_species_by_duration(
    State(state): State<AppState>,
) -> Result<Json<TopDurationResponse>, ApiError> {
    let rows = state.db.top_species_by_duration(TOP_N)?;

    let top_species = rows
        .into_iter()
        .map(|row| SpeciesDuration {
            species: row.species_name,
            total_duration: row.total_duration,
        })
        .collect();

    Ok(Json(TopDurationResponse { top_species }))
}

pub async fn get_species_time_series(
    State(state): State<AppState>,
    Query(query): Query<TimeSeriesQuery>,
) -> Result<Json<TimeSeriesResponse>, ApiError> {
    let species = query.species.trim();
    if species.is_empty() {
        return Err(ApiError::Validation("species must not be empty".into()));
    }

    let limit = query
        .limit
        .unwrap_or(DEFAULT_SERIES_LEN)
        .min(MAX_SERIES_LEN);
    let rows = state.db.species_time_series(species, limit)?;

    let time_series = rows
        .into_iter()
        .map(|row| DateTotal {
            date: row.date,
            total_count: row.total_count,
        })
        .collect();

    Ok(Json(TimeSeriesResponse { time_series }))
}

/// Lifetime statistics for the requesting user.
pub async fn get_user_bird_statistics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserStatisticsResponse>, ApiError> {
    let totals = state.db.user_species_totals(&claims.email)?;
    let (first_observation_date, last_observation_date) =
        state.db.user_observation_range(&claims.email)?;
    let months = state.db.user_monthly_trends(&claims.email)?;
    let locations = state.db.user_species_locations(&claims.email)?;

    let total_observations: i64 = totals.iter().map(|r| r.total_count).sum();
    // Totals arrive sorted descending, so the first row is the favourite
    let most_observed_species = totals.first().map(|r| r.species_name.clone());

    let species_summary: Vec<SpeciesTotal> = totals
        .into_iter()
        .map(|row| SpeciesTotal {
            species: row.species_name,
            total_count: row.total_count,
        })
        .collect();

    let monthly_trends: BTreeMap<String, i64> = months
        .into_iter()
        .map(|row| (row.date, row.total_count))
        .collect();

    let location_data = locations
        .into_iter()
        .map(|row| SpeciesLocation {
            species: row.species_name,
            avg_latitude: row.avg_latitude,
            avg_longitude: row.avg_longitude,
        })
        .collect();

    Ok(Json(UserStatisticsResponse {
        total_observations,
        unique_species: species_summary.len(),
        most_observed_species,
        first_observation_date,
        last_observation_date,
        species_summary,
        monthly_trends,
        location_data,
    }))
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Cap a raw observation count for heat-map display scaling.
fn intensity(count: i64) -> i64 {
    count.min(MAX_INTENSITY)
}

/// Attach each species' percentage share of the region total. A zero total
/// yields zero percentages rather than a division error.
fn species_shares(rows: Vec<SpeciesCountRow>) -> (Vec<SpeciesShare>, i64) {
    let total: i64 = rows.iter().map(|r| r.total_count).sum();

    let shares = rows
        .into_iter()
        .map(|row| {
            let percentage = if total > 0 {
                row.total_count as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            SpeciesShare {
                species: row.species_name,
                total_count: row.total_count,
                percentage,
            }
        })
        .collect();

    (shares, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_row(species: &str, total: i64) -> SpeciesCountRow {
        SpeciesCountRow {
            species_name: species.to_string(),
            total_count: total,
        }
    }

    #[test]
    fn intensity_caps_at_ten() {
        assert_eq!(intensity(0), 0);
        assert_eq!(intensity(3), 3);
        assert_eq!(intensity(10), 10);
        assert_eq!(intensity(250), 10);
    }

    #[test]
    fn shares_sum_to_one_hundred() {
        let (shares, total) = species_shares(vec![
            count_row("Blue Jay", 9),
            count_row("American Robin", 5),
            count_row("Osprey", 1),
        ]);

        assert_eq!(total, 15);
        let sum: f64 = shares.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((shares[0].percentage - 60.0).abs() < 1e-9);
    }

    #[test]
    fn empty_region_yields_zero_total_and_no_shares() {
        let (shares, total) = species_shares(Vec::new());
        assert_eq!(total, 0);
        assert!(shares.is_empty());
    }

    #[test]
    fn all_zero_counts_do_not_divide_by_zero() {
        let (shares, total) = species_shares(vec![count_row("Blue Jay", 0)]);
        assert_eq!(total, 0);
        assert_eq!(shares[0].percentage, 0.0);
    }
}
