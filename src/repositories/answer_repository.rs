use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::AnswerEntry};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Append-only per (attempt_id, question_id); duplicate policy is the
    /// lifecycle engine's job, the store only persists.
    async fn insert(&self, entry: AnswerEntry) -> AppResult<AnswerEntry>;
    async fn find_by_attempt_and_question(
        &self,
        attempt_id: &str,
        question_id: &str,
    ) -> AppResult<Option<AnswerEntry>>;
    async fn list_for_attempt(&self, attempt_id: &str) -> AppResult<Vec<AnswerEntry>>;
    /// Cascade used only when an attempt's whole history is removed.
    async fn delete_for_attempt(&self, attempt_id: &str) -> AppResult<u64>;
}

pub struct MongoAnswerRepository {
    collection: Collection<AnswerEntry>,
}

impl MongoAnswerRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("answer_entries");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for answer_entries collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // a question is answered at most once per attempt
        let attempt_question_index = IndexModel::builder()
            .keys(doc! { "attempt_id": 1, "question_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("attempt_question_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(attempt_question_index).await?;

        Ok(())
    }
}

#[async_trait]
impl AnswerRepository for MongoAnswerRepository {
    async fn insert(&self, entry: AnswerEntry) -> AppResult<AnswerEntry> {
        self.collection.insert_one(&entry).await?;
        Ok(entry)
    }

    async fn find_by_attempt_and_question(
        &self,
        attempt_id: &str,
        question_id: &str,
    ) -> AppResult<Option<AnswerEntry>> {
        let entry = self
            .collection
            .find_one(doc! { "attempt_id": attempt_id, "question_id": question_id })
            .await?;
        Ok(entry)
    }

    async fn list_for_attempt(&self, attempt_id: &str) -> AppResult<Vec<AnswerEntry>> {
        let entries = self
            .collection
            .find(doc! { "attempt_id": attempt_id })
            .sort(doc! { "recorded_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(entries)
    }

    async fn delete_for_attempt(&self, attempt_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "attempt_id": attempt_id })
            .await?;
        Ok(result.deleted_count)
    }
}
