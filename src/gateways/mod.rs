pub mod catalog;
pub mod directory;

pub use catalog::{CatalogGateway, MongoCatalogGateway};
pub use directory::{DirectoryGateway, MongoDirectoryGateway};

#[cfg(test)]
pub use catalog::MockCatalogGateway;
#[cfg(test)]
pub use directory::MockDirectoryGateway;

use std::future::Future;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

/// Every gateway call runs under a bounded timeout; an expired deadline
/// surfaces as `GatewayUnavailable` instead of hanging the attempt lock.
pub(crate) async fn bounded<T, F>(what: &str, timeout: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::GatewayUnavailable(format!(
            "{} timed out after {:?}",
            what, timeout
        ))),
    }
}
