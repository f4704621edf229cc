use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{
    task::{NewTask, Task},
    user::{NewUser, User, UserChanges},
};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    avatar: Option<Vec<u8>>,
}

/// In-memory implementation of [`UserStore`] for development and testing
///
/// Mirrors the Postgres semantics that callers depend on: unique emails,
/// ordered tokens, avatar stored apart from the profile. Data is lost when
/// the process exits.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, StoredUser>>,
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, data: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if users.values().any(|stored| stored.user.email == data.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            age: data.age,
            tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        debug!(user_id = %user.id, "Creating user in memory");
        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                avatar: None,
            },
        );

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).map(|s| s.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|s| s.user.email == email)
            .map(|s| s.user.clone()))
    }

    async fn find_by_id_and_token(
        &self,
        id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .get(&id)
            .filter(|s| s.user.has_token(token))
            .map(|s| s.user.clone()))
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;

        if let Some(email) = &changes.email {
            let taken = users
                .values()
                .any(|s| s.user.id != id && &s.user.email == email);
            if taken {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let Some(stored) = users.get_mut(&id) else {
            return Ok(None);
        };

        let user = &mut stored.user;
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if changes.is_empty() {
            return Ok(Some(user.clone()));
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(age) = changes.age {
            user.age = age;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn push_token(&self, user_id: Uuid, token: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user_id) {
            Some(stored) => {
                stored.user.tokens.push(token.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_token(&self, user_id: Uuid, token: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let Some(stored) = users.get_mut(&user_id) else {
            return Ok(false);
        };

        let before = stored.user.tokens.len();
        stored.user.tokens.retain(|t| t != token);
        Ok(stored.user.tokens.len() != before)
    }

    async fn clear_tokens(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let Some(stored) = users.get_mut(&user_id) else {
            return Ok(0);
        };

        let removed = stored.user.tokens.len() as u64;
        stored.user.tokens.clear();
        Ok(removed)
    }

    async fn set_avatar(
        &self,
        user_id: Uuid,
        avatar: Option<Vec<u8>>,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user_id) {
            Some(stored) => {
                stored.avatar = avatar;
                stored.user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_avatar(&self, user_id: Uuid) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .get(&user_id)
            .and_then(|s| s.avatar.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn create_task(&self, data: NewTask) -> Result<Task, StoreError> {
        if !self.users.read().await.contains_key(&data.owner_id) {
            return Err(StoreError::Internal(format!(
                "Task owner {} does not exist",
                data.owner_id
            )));
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            description: data.description,
            completed: data.completed,
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.push(task.clone());

        Ok(task)
    }

    async fn tasks_owned_by(&self, owner_id: Uuid) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn delete_tasks_owned_by(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.owner_id != owner_id);
        Ok((before - tasks.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
