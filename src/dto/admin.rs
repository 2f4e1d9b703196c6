//! DTO definitions used by the admin mutation endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::validate_entity_ref;

/// Request recording a new point entry for a (team, round) pair.
///
/// A zero count is accepted: it awards nothing but is still kept as an
/// audit entry. The admin UI screens zeros before calling this.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPointRequest {
    /// Team receiving the points.
    pub team_id: Uuid,
    /// Round the points count towards.
    pub round_id: Uuid,
    /// Signed number of points to record.
    pub count: i32,
}

impl Validate for AddPointRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_entity_ref(&self.team_id) {
            errors.add("teamId", e);
        }
        if let Err(e) = validate_entity_ref(&self.round_id) {
            errors.add("roundId", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Request overwriting the count of an existing point entry.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePointRequest {
    /// Point entry to mutate.
    pub point_id: Uuid,
    /// New signed count.
    pub count: i32,
}

/// Request removing a point entry.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletePointRequest {
    /// Point entry to remove.
    pub point_id: Uuid,
}

/// Request bulk-applying team visibility flags.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateTeamsRequest {
    /// Teams to update; must not be empty.
    #[validate(length(min = 1, message = "at least one team is required"))]
    pub teams: Vec<TeamVisibilityInput>,
}

/// One visibility flag of an [`UpdateTeamsRequest`].
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TeamVisibilityInput {
    /// Team to update.
    pub id: Uuid,
    /// Whether to exclude the team from the public board.
    pub hidden: bool,
}
