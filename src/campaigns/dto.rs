use serde::{Deserialize, Serialize};

use super::repo::Campaign;
use crate::users::repo::User;

#[derive(Debug, Deserialize)]
pub struct CampaignListQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCampaignInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal_amount: i64,
    #[serde(default)]
    pub perks: String,
}

/// List item.
#[derive(Debug, Serialize)]
pub struct CampaignFormatter {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub short_description: String,
    pub image_url: String,
    pub goal_amount: i64,
    pub current_amount: i64,
    pub slug: String,
}

impl From<&Campaign> for CampaignFormatter {
    fn from(c: &Campaign) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            name: c.name.clone(),
            short_description: c.short_description.clone(),
            image_url: String::new(),
            goal_amount: c.goal_amount,
            current_amount: c.current_amount,
            slug: c.slug.clone(),
        }
    }
}

pub fn format_campaigns(campaigns: &[Campaign]) -> Vec<CampaignFormatter> {
    campaigns.iter().map(CampaignFormatter::from).collect()
}

#[derive(Debug, Serialize)]
pub struct CampaignUserFormatter {
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct CampaignDetailFormatter {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub image_url: String,
    pub goal_amount: i64,
    pub current_amount: i64,
    pub backer_count: i64,
    pub slug: String,
    pub perks: Vec<String>,
    pub user: CampaignUserFormatter,
}

impl CampaignDetailFormatter {
    /// `owner` is `None` when the owning user no longer resolves.
    pub fn new(c: &Campaign, owner: Option<&User>) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            name: c.name.clone(),
            short_description: c.short_description.clone(),
            description: c.description.clone(),
            image_url: String::new(),
            goal_amount: c.goal_amount,
            current_amount: c.current_amount,
            backer_count: c.backer_count,
            slug: c.slug.clone(),
            perks: split_perks(&c.perks),
            user: CampaignUserFormatter {
                name: owner.map(|u| u.name.clone()).unwrap_or_default(),
                image_url: owner
                    .and_then(|u| u.avatar_file_name.clone())
                    .unwrap_or_default(),
            },
        }
    }
}

fn split_perks(perks: &str) -> Vec<String> {
    perks
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
