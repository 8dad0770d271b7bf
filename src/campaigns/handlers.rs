use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{
        format_campaigns, CampaignDetailFormatter, CampaignFormatter, CampaignListQuery,
        CreateCampaignInput,
    },
    services,
};
use crate::{
    auth::extractors::CurrentUser,
    response::{success, ApiError, ApiResponse},
    state::AppState,
    users::handlers::bad_json,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn campaign_routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns", get(get_campaigns).post(create_campaign))
        .route("/campaigns/:id", get(get_campaign))
}

#[instrument(skip(state))]
pub async fn get_campaigns(
    State(state): State<AppState>,
    Query(query): Query<CampaignListQuery>,
) -> ApiResult<Vec<CampaignFormatter>> {
    // absent or unparsable owner id lists everything
    let user_id = query
        .user_id
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0);

    let campaigns = services::get_campaigns(state.campaigns.as_ref(), user_id)
        .await
        .map_err(|e| ApiError::from_app(e, "Error to get campaigns"))?;

    Ok(success("List of campaigns", format_campaigns(&campaigns)))
}

#[instrument(skip(state, id))]
pub async fn get_campaign(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<CampaignDetailFormatter> {
    const FAILED: &str = "Failed to get detail of campaign";
    let Path(id) = id.map_err(|r| {
        warn!(error = %r.body_text(), "bad campaign id");
        ApiError::new(StatusCode::BAD_REQUEST, FAILED)
    })?;

    let (campaign, owner) =
        services::get_campaign_detail(state.campaigns.as_ref(), state.users.as_ref(), id)
            .await
            .map_err(|e| ApiError::from_app(e, FAILED))?;

    Ok(success(
        "Campaign detail",
        CampaignDetailFormatter::new(&campaign, owner.as_ref()),
    ))
}

#[instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn create_campaign(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateCampaignInput>, JsonRejection>,
) -> ApiResult<CampaignFormatter> {
    const FAILED: &str = "Failed to create campaign";
    let Json(input) = payload.map_err(|r| bad_json(r, FAILED))?;

    let campaign = services::create_campaign(state.campaigns.as_ref(), &user.0, input)
        .await
        .map_err(|e| ApiError::from_app(e, FAILED))?;

    Ok(success(
        "Campaign has been created",
        CampaignFormatter::from(&campaign),
    ))
}
