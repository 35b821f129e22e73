//! User repository

use crate::changes::ChangeNotifier;
use crate::messaging::ChangeEvent;
use crate::models::{new_id, timestamp_now, IndexedEntity, NewUser, User, UserPatch};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::index::{expect_one, require, IndexRepository};
use crate::repository::Created;
use crate::search::{build_filter, IndexedField, SearchConfig, SearchEngine, UpdateScript};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// CRUD over the user index plus email lookups
#[derive(Clone)]
pub struct UserRepository {
    index: IndexRepository<User>,
    notifier: ChangeNotifier,
}

impl UserRepository {
    pub fn new(engine: Arc<dyn SearchEngine>, config: &SearchConfig, notifier: ChangeNotifier) -> Self {
        Self {
            index: IndexRepository::new(engine, config.users.clone(), config),
            notifier,
        }
    }

    pub fn index(&self) -> &IndexRepository<User> {
        &self.index
    }

    /// The same repository with `deadline` replacing the configured request timeout
    ///
    /// `repository.with_deadline(d).get_by_id(id)` bounds a single call.
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        Self {
            index: self.index.with_timeout(deadline),
            notifier: self.notifier.clone(),
        }
    }

    /// Index a new user without checking email uniqueness
    pub async fn create(&self, user: NewUser) -> RepositoryResult<Created> {
        let user = user.into_user(new_id(), timestamp_now());

        self.index.run("create", self.index.insert(&user)).await?;
        info!(index = %self.index.index_name(), id = %user.id, "User created");

        let notification = self.notifier.notify(&ChangeEvent::user_created(&user)).await;

        Ok(Created {
            id: user.id,
            notification,
        })
    }

    /// Create a user unless the email is already registered
    ///
    /// The check and the write are separate requests, so two concurrent
    /// registrations of one email can both succeed.
    pub async fn register(&self, user: NewUser) -> RepositoryResult<Created> {
        if self.check_email_exists(&user.email).await? {
            warn!(index = %self.index.index_name(), "Registration rejected: email already in use");
            return Err(RepositoryError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        self.create(user).await
    }

    pub async fn get_by_id(&self, id: &str) -> RepositoryResult<User> {
        self.index
            .run("get_by_id", async {
                require("id", id)?;
                self.index
                    .find_one(build_filter(IndexedField::Id, id))
                    .await?
                    .ok_or_else(|| RepositoryError::not_found(User::KIND, id))
            })
            .await
    }

    pub async fn get_by_email(&self, email: &str) -> RepositoryResult<User> {
        self.index
            .run("get_by_email", async {
                require("email", email)?;
                self.index
                    .find_one(build_filter(IndexedField::Email, email))
                    .await?
                    .ok_or_else(|| RepositoryError::not_found(User::KIND, email))
            })
            .await
    }

    /// Whether any user has this email; never reports NotFound
    pub async fn check_email_exists(&self, email: &str) -> RepositoryResult<bool> {
        self.index
            .run("check_email_exists", async {
                require("email", email)?;
                let total = self
                    .index
                    .count(build_filter(IndexedField::Email, email))
                    .await?;
                Ok(total > 0)
            })
            .await
    }

    pub async fn update(&self, id: &str, patch: UserPatch) -> RepositoryResult<bool> {
        self.index
            .run("update", async {
                require("id", id)?;
                let script = UpdateScript::assign(patch.into_fields(), timestamp_now());
                let counts = self
                    .index
                    .update_where(build_filter(IndexedField::Id, id), script)
                    .await?;
                expect_one(User::KIND, id, counts, counts.updated)?;
                info!(index = %self.index.index_name(), id = %id, "User updated");
                Ok(true)
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        self.index
            .run("delete", async {
                require("id", id)?;
                let counts = self
                    .index
                    .delete_where(build_filter(IndexedField::Id, id))
                    .await?;
                expect_one(User::KIND, id, counts, counts.deleted)?;
                info!(index = %self.index.index_name(), id = %id, "User deleted");
                Ok(true)
            })
            .await
    }

    pub async fn get_all(&self) -> RepositoryResult<Vec<User>> {
        self.index.run("get_all", self.index.find_all()).await
    }
}
