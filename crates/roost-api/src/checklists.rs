use axum::{
    Extension, Json,
    extract::{Path, State},
};

use roost_db::models::{ChecklistPatch, NewChecklist, NewSighting};
use roost_types::api::{
    ChecklistInfo, ChecklistsResponse, Claims, EditChecklistRequest, MutationResponse,
    MyChecklistInfo, MyChecklistsResponse, SubmitChecklistRequest, SubmitChecklistResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;

/// All seeded checklists, for the admin listing.
pub async fn list_checklists(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<ChecklistsResponse>, ApiError> {
    let rows = state.db.list_checklists()?;

    let checklists = rows
        .into_iter()
        .map(|row| ChecklistInfo {
            id: row.id,
            event_code: row.event_code,
            latitude: row.latitude,
            longitude: row.longitude,
            observation_date: row.observation_date,
            start_time: row.start_time,
            observer: row.observer,
            duration_minutes: row.duration_minutes,
            notes: row.notes,
        })
        .collect();

    Ok(Json(ChecklistsResponse { checklists }))
}

/// The requesting user's own checklists.
pub async fn list_my_checklists(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MyChecklistsResponse>, ApiError> {
    let rows = state.db.list_my_checklists(&claims.email)?;

    let checklists = rows
        .into_iter()
        .map(|row| MyChecklistInfo {
            id: row.id,
            event_code: row.event_code,
            species_name: row.species_name,
            latitude: row.latitude,
            longitude: row.longitude,
            observation_date: row.observation_date,
            start_time: row.start_time,
            duration_minutes: row.duration_minutes,
        })
        .collect();

    Ok(Json(MyChecklistsResponse { checklists }))
}

pub async fn submit_checklist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitChecklistRequest>,
) -> Result<Json<SubmitChecklistResponse>, ApiError> {
    let missing = missing_required(&req);
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    let (Some(species_name), Some(latitude), Some(longitude), Some(observation_date)) = (
        req.species_name.as_deref(),
        req.latitude,
        req.longitude,
        req.observation_date.as_deref(),
    ) else {
        return Err(ApiError::missing_fields(&missing_required(&req)));
    };

    check_latitude(latitude)?;
    check_longitude(longitude)?;

    let checklist = NewChecklist {
        species_name: species_name.trim().to_string(),
        latitude,
        longitude,
        observation_date: observation_date.trim().to_string(),
        start_time: normalize(req.time_observations_started.as_deref()),
        duration_minutes: req.duration_minutes,
    };

    let sightings: Vec<NewSighting> = req
        .species
        .iter()
        .map(|entry| NewSighting {
            species_name: entry.common_name.clone(),
            count: entry.count.max(0),
        })
        .collect();

    let checklist_id = state
        .db
        .create_checklist(&claims.email, &checklist, &sightings)?;

    Ok(Json(SubmitChecklistResponse {
        status: "success".into(),
        checklist_id,
    }))
}

pub async fn edit_checklist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(checklist_id): Path<i64>,
    Json(req): Json<EditChecklistRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    if let Some(lat) = req.latitude {
        check_latitude(lat)?;
    }
    if let Some(lon) = req.longitude {
        check_longitude(lon)?;
    }

    let patch = ChecklistPatch {
        species_name: normalize(req.species_name.as_deref()),
        latitude: req.latitude,
        longitude: req.longitude,
        observation_date: normalize(req.observation_date.as_deref()),
        start_time: normalize(req.start_time.as_deref()),
        duration_minutes: req.duration_minutes,
    };

    let updated = state
        .db
        .update_my_checklist(checklist_id, &claims.email, &patch)?;
    if !updated {
        return Err(ApiError::NotFound("Checklist"));
    }

    Ok(Json(MutationResponse::success(
        "Checklist updated successfully",
    )))
}

pub async fn delete_checklist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(checklist_id): Path<i64>,
) -> Result<Json<MutationResponse>, ApiError> {
    let deleted = state.db.delete_my_checklist(checklist_id, &claims.email)?;
    if !deleted {
        return Err(ApiError::NotFound("Checklist"));
    }

    Ok(Json(MutationResponse::success(
        "Checklist deleted successfully",
    )))
}

/// Wire names of the required submission fields that are absent or blank.
fn missing_required(req: &SubmitChecklistRequest) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if blank(req.species_name.as_deref()) {
        missing.push("speciesName");
    }
    if req.latitude.is_none() {
        missing.push("latitude");
    }
    if req.longitude.is_none() {
        missing.push("longitude");
    }
    if blank(req.observation_date.as_deref()) {
        missing.push("observationDate");
    }
    missing
}

fn blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_latitude(latitude: f64) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ApiError::Validation(format!(
            "latitude {latitude} out of range [-90, 90]"
        )));
    }
    Ok(())
}

fn check_longitude(longitude: f64) -> Result<(), ApiError> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ApiError::Validation(format!(
            "longitude {longitude} out of range [-180, 180]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> SubmitChecklistRequest {
        serde_json::from_value(serde_json::json!({
            "speciesName": "American Robin",
            "latitude": 40.0,
            "longitude": -75.0,
            "observationDate": "2024-05-01",
            "species": [{"COMMON_NAME": "American Robin", "count": 3}]
        }))
        .unwrap()
    }

    #[test]
    fn complete_request_has_no_missing_fields() {
        assert!(missing_required(&valid_request()).is_empty());
    }

    #[test]
    fn missing_fields_reported_by_wire_name() {
        let req: SubmitChecklistRequest =
            serde_json::from_value(serde_json::json!({ "speciesName": "  " })).unwrap();
        assert_eq!(
            missing_required(&req),
            vec!["speciesName", "latitude", "longitude", "observationDate"]
        );
    }

    #[test]
    fn uppercase_species_entries_deserialize() {
        let req = valid_request();
        assert_eq!(req.species.len(), 1);
        assert_eq!(req.species[0].common_name, "American Robin");
        assert_eq!(req.species[0].count, 3);
    }

    #[test]
    fn coordinates_outside_range_rejected() {
        assert!(check_latitude(90.0).is_ok());
        assert!(check_latitude(-90.0).is_ok());
        assert!(check_latitude(90.5).is_err());
        assert!(check_longitude(180.0).is_ok());
        assert!(check_longitude(-180.5).is_err());
    }

    #[test]
    fn edit_request_accepts_legacy_uppercase_keys() {
        let req: EditChecklistRequest = serde_json::from_value(serde_json::json!({
            "LATITUDE": 42.5,
            "COMMON_NAME": "Blue Jay"
        }))
        .unwrap();
        assert_eq!(req.latitude, Some(42.5));
        assert_eq!(req.species_name.as_deref(), Some("Blue Jay"));
        assert!(req.observation_date.is_none());
    }
}
