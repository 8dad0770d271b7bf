use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, FromRow)]
pub struct Campaign {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub goal_amount: i64,
    pub current_amount: i64,
    pub backer_count: i64,
    pub perks: String, // comma separated
    pub slug: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub user_id: i64,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub goal_amount: i64,
    pub perks: String,
    pub slug: String,
}

#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn find_all(&self) -> anyhow::Result<Vec<Campaign>>;
    async fn find_by_user_id(&self, user_id: i64) -> anyhow::Result<Vec<Campaign>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Campaign>>;
    async fn create(&self, campaign: NewCampaign) -> anyhow::Result<Campaign>;
}

#[derive(Clone)]
pub struct PgCampaignRepository {
    db: PgPool,
}

impl PgCampaignRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CampaignRepository for PgCampaignRepository {
    async fn find_all(&self) -> anyhow::Result<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, user_id, name, short_description, description, goal_amount,
                   current_amount, backer_count, perks, slug, created_at, updated_at
              FROM campaigns
             ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list campaigns")?;
        Ok(rows)
    }

    async fn find_by_user_id(&self, user_id: i64) -> anyhow::Result<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, user_id, name, short_description, description, goal_amount,
                   current_amount, backer_count, perks, slug, created_at, updated_at
              FROM campaigns
             WHERE user_id = $1
             ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list campaigns by user")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Campaign>> {
        let row = sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, user_id, name, short_description, description, goal_amount,
                   current_amount, backer_count, perks, slug, created_at, updated_at
              FROM campaigns
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get campaign")?;
        Ok(row)
    }

    async fn create(&self, campaign: NewCampaign) -> anyhow::Result<Campaign> {
        let row = sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (user_id, name, short_description, description,
                                   goal_amount, perks, slug)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, name, short_description, description, goal_amount,
                      current_amount, backer_count, perks, slug, created_at, updated_at
            "#,
        )
        .bind(campaign.user_id)
        .bind(&campaign.name)
        .bind(&campaign.short_description)
        .bind(&campaign.description)
        .bind(campaign.goal_amount)
        .bind(&campaign.perks)
        .bind(&campaign.slug)
        .fetch_one(&self.db)
        .await
        .context("insert campaign")?;
        Ok(row)
    }
}
