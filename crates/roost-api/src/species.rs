use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use roost_types::api::{SpeciesInfo, SpeciesListResponse};

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SpeciesQuery {
    pub q: Option<String>,
}

/// List the species reference table, optionally narrowed to names containing
/// the `q` substring (case-insensitive).
pub async fn list_species(
    State(state): State<AppState>,
    Query(query): Query<SpeciesQuery>,
) -> Result<Json<SpeciesListResponse>, ApiError> {
    let filter = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let rows = state.db.list_species(filter)?;

    let species = rows
        .into_iter()
        .map(|row| SpeciesInfo {
            id: row.id,
            common_name: row.common_name,
            scientific_name: row.scientific_name,
            conservation_status: row.conservation_status,
        })
        .collect();

    Ok(Json(SpeciesListResponse { species }))
}
