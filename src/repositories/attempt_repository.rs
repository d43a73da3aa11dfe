use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Attempt,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>>;
    async fn find_by_assignment_and_user(
        &self,
        assignment_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Attempt>>;
    async fn list_for_assignment(&self, assignment_id: &str) -> AppResult<Vec<Attempt>>;
    async fn list_in_progress(&self) -> AppResult<Vec<Attempt>>;
    /// Compare-and-swap write: replaces the stored record only if its
    /// version still matches `attempt.version`, then bumps the version.
    async fn update_versioned(&self, attempt: Attempt) -> AppResult<Attempt>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

pub struct MongoAttemptRepository {
    collection: Collection<Attempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // at most one attempt per user per assignment
        let assignment_user_index = IndexModel::builder()
            .keys(doc! { "assignment_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("assignment_user_unique".to_string())
                    .build(),
            )
            .build();

        let status_index = IndexModel::builder()
            .keys(doc! { "status": 1 })
            .options(IndexOptions::builder().name("status".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(assignment_user_index).await?;
        self.collection.create_index(status_index).await?;

        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        self.collection.insert_one(&attempt).await?;
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_by_assignment_and_user(
        &self,
        assignment_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Attempt>> {
        let attempt = self
            .collection
            .find_one(doc! { "assignment_id": assignment_id, "user_id": user_id })
            .await?;
        Ok(attempt)
    }

    async fn list_for_assignment(&self, assignment_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! { "assignment_id": assignment_id })
            .sort(doc! { "user_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn list_in_progress(&self) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! { "status": "InProgress" })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn update_versioned(&self, attempt: Attempt) -> AppResult<Attempt> {
        let expected = attempt.version;
        let mut next = attempt;
        next.version += 1;

        let result = self
            .collection
            .replace_one(doc! { "id": &next.id, "version": expected }, &next)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::InternalError(format!(
                "attempt '{}' was modified concurrently",
                next.id
            )));
        }
        Ok(next)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
