use async_trait::async_trait;
use mongodb::{bson::doc, Collection};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{db::Database, errors::AppResult, gateways::bounded};

/// Read side of the user/group directory. Only group membership is consumed
/// here; role policy stays with the surrounding application.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    async fn group_of(&self, user_id: &str) -> AppResult<Option<String>>;
}

#[derive(Debug, Deserialize, Serialize)]
struct DirectoryRecord {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_id: Option<String>,
}

pub struct MongoDirectoryGateway {
    users: Collection<DirectoryRecord>,
    timeout: Duration,
}

impl MongoDirectoryGateway {
    pub fn new(db: &Database, timeout: Duration) -> Self {
        Self {
            users: db.get_collection("users"),
            timeout,
        }
    }
}

#[async_trait]
impl DirectoryGateway for MongoDirectoryGateway {
    async fn group_of(&self, user_id: &str) -> AppResult<Option<String>> {
        let record = bounded("directory.group_of", self.timeout, async {
            Ok(self.users.find_one(doc! { "id": user_id }).await?)
        })
        .await?;

        Ok(record.and_then(|r: DirectoryRecord| r.group_id))
    }
}
