use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Collection};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    gateways::bounded,
};

/// Read side of the question/quiz catalog, which is owned and maintained by
/// the surrounding application. The engine asks for the correct option fresh
/// on every answer submission; correctness is frozen in the ledger at that
/// instant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// The ordered question ids of a quiz.
    async fn questions_of(&self, quiz_id: &str) -> AppResult<Vec<String>>;
    /// The correct option key of one question.
    async fn correct_option_of(&self, question_id: &str) -> AppResult<String>;
}

#[derive(Debug, Deserialize, Serialize)]
struct QuizQuestionLink {
    quiz_id: String,
    question_id: String,
    order: i32,
}

#[derive(Debug, Deserialize, Serialize)]
struct QuestionRecord {
    id: String,
    correct_option: String,
}

pub struct MongoCatalogGateway {
    links: Collection<QuizQuestionLink>,
    questions: Collection<QuestionRecord>,
    timeout: Duration,
}

impl MongoCatalogGateway {
    pub fn new(db: &Database, timeout: Duration) -> Self {
        Self {
            links: db.get_collection("quiz_questions"),
            questions: db.get_collection("questions"),
            timeout,
        }
    }
}

#[async_trait]
impl CatalogGateway for MongoCatalogGateway {
    async fn questions_of(&self, quiz_id: &str) -> AppResult<Vec<String>> {
        let links: Vec<QuizQuestionLink> = bounded("catalog.questions_of", self.timeout, async {
            let cursor = self
                .links
                .find(doc! { "quiz_id": quiz_id })
                .sort(doc! { "order": 1 })
                .await?;
            Ok(cursor.try_collect().await?)
        })
        .await?;

        Ok(links.into_iter().map(|link| link.question_id).collect())
    }

    async fn correct_option_of(&self, question_id: &str) -> AppResult<String> {
        let record = bounded("catalog.correct_option_of", self.timeout, async {
            Ok(self.questions.find_one(doc! { "id": question_id }).await?)
        })
        .await?;

        record
            .map(|q: QuestionRecord| q.correct_option)
            .ok_or_else(|| {
                AppError::NotFound(format!("Question with id '{}' not found", question_id))
            })
    }
}
