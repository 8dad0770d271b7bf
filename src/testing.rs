//! In-memory stand-ins for Postgres, Redis and the avatar directory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;

use crate::auth::password::hash_password;
use crate::auth::session::SessionStore;
use crate::campaigns::repo::{Campaign, CampaignRepository, NewCampaign};
use crate::storage::{AvatarStorage, StagedAvatar};
use crate::users::repo::{NewUser, User, UserRepository};

/// Smallest header `detect_image_type` accepts as PNG.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

fn down() -> anyhow::Error {
    anyhow::anyhow!("store unavailable")
}

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
    unavailable: bool,
    reject_avatar_updates: AtomicBool,
}

impl MemoryUsers {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Make every later `update_avatar` fail while reads keep working.
    pub fn reject_avatar_updates(&self) {
        self.reject_avatar_updates.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.unavailable {
            Err(down())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        self.check()?;
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let user = User {
            id: rows.len() as i64 + 1,
            name: user.name,
            occupation: user.occupation,
            email: user.email,
            password_hash: user.password_hash,
            avatar_file_name: None,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn update_avatar(&self, id: i64, path: Option<&str>) -> anyhow::Result<Option<User>> {
        self.check()?;
        if self.reject_avatar_updates.load(Ordering::SeqCst) {
            return Err(down());
        }
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|u| u.id == id).map(|u| {
            u.avatar_file_name = path.map(str::to_string);
            u.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryCampaigns {
    rows: Mutex<Vec<Campaign>>,
}

#[async_trait]
impl CampaignRepository for MemoryCampaigns {
    async fn find_all(&self) -> anyhow::Result<Vec<Campaign>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find_by_user_id(&self, user_id: i64) -> anyhow::Result<Vec<Campaign>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Campaign>> {
        Ok(self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, c: NewCampaign) -> anyhow::Result<Campaign> {
        let mut rows = self.rows.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let campaign = Campaign {
            id: rows.len() as i64 + 1,
            user_id: c.user_id,
            name: c.name,
            short_description: c.short_description,
            description: c.description,
            goal_amount: c.goal_amount,
            current_amount: 0,
            backer_count: 0,
            perks: c.perks,
            slug: c.slug,
            created_at: now,
            updated_at: now,
        };
        rows.push(campaign.clone());
        Ok(campaign)
    }
}

#[derive(Default)]
pub struct MemorySessions {
    entries: Mutex<HashMap<String, (String, Duration)>>,
    unavailable: bool,
}

impl MemorySessions {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<(String, Duration)> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        if self.unavailable {
            return Err(down());
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, ttl));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAvatars {
    staged: Mutex<HashMap<String, Bytes>>,
    next_key: AtomicUsize,
    files: Mutex<HashMap<String, Bytes>>,
    fail_publish: bool,
}

impl MemoryAvatars {
    pub fn failing_publish() -> Self {
        Self {
            fail_publish: true,
            ..Self::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.lock().unwrap().contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().unwrap().is_empty()
    }

    pub fn staged_count(&self) -> usize {
        self.staged.lock().unwrap().len()
    }
}

#[async_trait]
impl AvatarStorage for MemoryAvatars {
    async fn stage(&self, name: &str, body: Bytes) -> anyhow::Result<StagedAvatar> {
        let key = format!("{}#{}", name, self.next_key.fetch_add(1, Ordering::SeqCst));
        self.staged.lock().unwrap().insert(key.clone(), body);
        Ok(StagedAvatar::new(name, key))
    }

    async fn publish(&self, avatar: StagedAvatar) -> anyhow::Result<String> {
        let body = self
            .staged
            .lock()
            .unwrap()
            .remove(avatar.key())
            .ok_or_else(|| anyhow::anyhow!("nothing staged as {}", avatar.key()))?;
        if self.fail_publish {
            return Err(anyhow::anyhow!("publish failed"));
        }
        self.files
            .lock()
            .unwrap()
            .insert(avatar.name().to_string(), body);
        Ok(avatar.public_path())
    }

    async fn discard(&self, avatar: StagedAvatar) -> anyhow::Result<()> {
        self.staged
            .lock()
            .unwrap()
            .remove(avatar.key())
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("nothing staged as {}", avatar.key()))
    }
}

/// Persist a user whose password is `secret`.
pub async fn insert_user(users: &dyn UserRepository, email: &str) -> User {
    users
        .create(NewUser {
            name: "Test User".into(),
            occupation: "tester".into(),
            email: email.into(),
            password_hash: hash_password("secret").unwrap(),
        })
        .await
        .unwrap()
}
