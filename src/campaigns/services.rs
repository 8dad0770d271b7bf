use tracing::{info, warn};

use super::{
    dto::CreateCampaignInput,
    repo::{Campaign, CampaignRepository, NewCampaign},
};
use crate::{
    error::{AppError, AppResult},
    users::repo::{User, UserRepository},
};

/// Lower-case, every run of non-alphanumerics collapsed to one `-`, no leading
/// or trailing `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub fn validate_create(input: &CreateCampaignInput) -> AppResult<()> {
    let mut errors = Vec::new();
    for (value, field) in [
        (&input.name, "Name"),
        (&input.short_description, "ShortDescription"),
        (&input.description, "Description"),
        (&input.perks, "Perks"),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("{} is required", field));
        }
    }
    if input.goal_amount <= 0 {
        errors.push("GoalAmount is required".into());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// `user_id == 0` lists every campaign.
pub async fn get_campaigns(
    campaigns: &dyn CampaignRepository,
    user_id: i64,
) -> AppResult<Vec<Campaign>> {
    let rows = if user_id != 0 {
        campaigns.find_by_user_id(user_id).await?
    } else {
        campaigns.find_all().await?
    };
    Ok(rows)
}

pub async fn get_campaign_by_id(
    campaigns: &dyn CampaignRepository,
    id: i64,
) -> AppResult<Campaign> {
    campaigns
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("campaign"))
}

/// Campaign plus its owner, when the owner still resolves.
pub async fn get_campaign_detail(
    campaigns: &dyn CampaignRepository,
    users: &dyn UserRepository,
    id: i64,
) -> AppResult<(Campaign, Option<User>)> {
    let campaign = get_campaign_by_id(campaigns, id).await?;
    let owner = match users.find_by_id(campaign.user_id).await {
        Ok(owner) => owner,
        Err(e) => {
            warn!(error = %e, campaign_id = id, "campaign owner lookup failed");
            None
        }
    };
    Ok((campaign, owner))
}

pub async fn create_campaign(
    campaigns: &dyn CampaignRepository,
    owner: &User,
    input: CreateCampaignInput,
) -> AppResult<Campaign> {
    validate_create(&input)?;

    // owner id keeps slugs apart across users; the same user may still collide
    let slug = slugify(&format!("{} {}", input.name, owner.id));
    let campaign = campaigns
        .create(NewCampaign {
            user_id: owner.id,
            name: input.name.trim().to_string(),
            short_description: input.short_description.trim().to_string(),
            description: input.description.trim().to_string(),
            goal_amount: input.goal_amount,
            perks: input.perks.trim().to_string(),
            slug,
        })
        .await?;

    info!(campaign_id = campaign.id, user_id = owner.id, "campaign created");
    Ok(campaign)
}
