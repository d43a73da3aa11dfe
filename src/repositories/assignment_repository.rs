use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::Assignment};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn create(&self, assignment: Assignment) -> AppResult<Assignment>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assignment>>;
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Assignment>>;
    /// Active (non-deleted) assignments offered to a group.
    async fn list_for_group(&self, group_id: &str) -> AppResult<Vec<Assignment>>;
    /// Soft delete: marks the record, preserving it for existing attempts.
    /// Returns false when no live assignment matched.
    async fn mark_deleted(&self, id: &str, at: DateTime<Utc>) -> AppResult<bool>;
}

pub struct MongoAssignmentRepository {
    collection: Collection<Assignment>,
}

impl MongoAssignmentRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("assignments");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for assignments collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let name_index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("name_unique".to_string())
                    .build(),
            )
            .build();

        let group_index = IndexModel::builder()
            .keys(doc! { "group_id": 1 })
            .options(IndexOptions::builder().name("group_id".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(name_index).await?;
        self.collection.create_index(group_index).await?;

        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for MongoAssignmentRepository {
    async fn create(&self, assignment: Assignment) -> AppResult<Assignment> {
        self.collection.insert_one(&assignment).await?;
        Ok(assignment)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assignment>> {
        let assignment = self.collection.find_one(doc! { "id": id }).await?;
        Ok(assignment)
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Assignment>> {
        let assignment = self.collection.find_one(doc! { "name": name }).await?;
        Ok(assignment)
    }

    async fn list_for_group(&self, group_id: &str) -> AppResult<Vec<Assignment>> {
        let assignments = self
            .collection
            .find(doc! { "group_id": group_id, "deleted_at": null })
            .sort(doc! { "window_start": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(assignments)
    }

    async fn mark_deleted(&self, id: &str, at: DateTime<Utc>) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "deleted_at": null },
                doc! { "$set": { "deleted_at": at.to_rfc3339() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}
