//! User levels, records and the user store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use comet_common::ActorId;
use comet_config::ConfigCache;
use dashmap::DashMap;
use std::{collections::HashSet, sync::Arc};
use tracing::debug;

/// Privilege level of a user. Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserLevel {
    /// Anyone
    User = 0,
    /// Configured administrators
    Admin = 1,
    /// The bot owner
    Owner = 2,
}

impl UserLevel {
    /// Level name
    pub fn as_str(&self) -> &'static str {
        match self {
            UserLevel::User => "User",
            UserLevel::Admin => "Admin",
            UserLevel::Owner => "Owner",
        }
    }
}

/// Stored information about one actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Actor id
    pub id: ActorId,
    /// Privilege level
    pub level: UserLevel,
    /// Named permissions granted on top of the level
    pub permissions: HashSet<String>,
    /// First time the actor was seen
    pub registered_at: DateTime<Utc>,
}

impl UserRecord {
    /// A fresh record at `level` with no named permissions
    pub fn new(id: ActorId, level: UserLevel) -> Self {
        Self {
            id,
            level,
            permissions: HashSet::new(),
            registered_at: Utc::now(),
        }
    }

    /// Whether the named permission was granted. Owners hold every permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.level == UserLevel::Owner || self.permissions.contains(permission)
    }

    /// Grant a named permission
    pub fn grant(&mut self, permission: impl Into<String>) {
        self.permissions.insert(permission.into());
    }

    /// Whether the user is at least an administrator
    pub fn is_admin(&self) -> bool {
        self.level >= UserLevel::Admin
    }
}

/// Lookup of user records, registering unknown actors on demand
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Record for `id`, if the actor is known
    async fn get_user(&self, id: ActorId) -> Option<UserRecord>;

    /// Register `id` at user level, returning the stored record.
    /// Returns the existing record if `id` is already known.
    async fn quick_register(&self, id: ActorId) -> UserRecord;

    /// Record for `id`, registering the actor first if needed
    async fn get_or_register(&self, id: ActorId) -> UserRecord {
        match self.get_user(id).await {
            Some(user) => user,
            None => self.quick_register(id).await,
        }
    }
}

/// In-memory [`UserStore`].
///
/// When built with [`InMemoryUserStore::from_config`], owner and administrator
/// levels follow the live configuration instead of what was stored.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<ActorId, UserRecord>,
    config: Option<Arc<ConfigCache>>,
}

impl InMemoryUserStore {
    /// Store seeded with the owner and administrators
    pub fn new(owner: ActorId, admins: impl IntoIterator<Item = ActorId>) -> Self {
        let store = Self::default();
        for admin in admins {
            store.upsert(UserRecord::new(admin, UserLevel::Admin));
        }
        store.upsert(UserRecord::new(owner, UserLevel::Owner));
        store
    }

    /// Store whose owner and administrators come from `config` on every read
    pub fn from_config(config: Arc<ConfigCache>) -> Self {
        Self {
            users: DashMap::new(),
            config: Some(config),
        }
    }

    /// Insert or replace a record
    pub fn upsert(&self, user: UserRecord) {
        self.users.insert(user.id, user);
    }

    /// Number of known users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are known
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn with_live_level(&self, mut user: UserRecord) -> UserRecord {
        let Some(config) = &self.config else {
            return user;
        };
        let bot = &config.get().bot;
        if bot.owner() == user.id {
            user.level = UserLevel::Owner;
        } else if bot.admin_ids.contains(&user.id.0) {
            user.level = UserLevel::Admin;
        } else if user.level > UserLevel::User {
            // privileges granted by an earlier configuration
            user.level = UserLevel::User;
        }
        user
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, id: ActorId) -> Option<UserRecord> {
        let user = self.users.get(&id).map(|user| user.clone())?;
        Some(self.with_live_level(user))
    }

    async fn quick_register(&self, id: ActorId) -> UserRecord {
        let user = self
            .users
            .entry(id)
            .or_insert_with(|| {
                debug!(user = %id, "Registered new user");
                UserRecord::new(id, UserLevel::User)
            })
            .clone();
        self.with_live_level(user)
    }
}
