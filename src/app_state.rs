use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::Config,
    db::Database,
    errors::AppResult,
    gateways::{MongoCatalogGateway, MongoDirectoryGateway},
    repositories::{MongoAnswerRepository, MongoAssignmentRepository, MongoAttemptRepository},
    services::{AssignmentService, AttemptService},
};

#[derive(Clone)]
pub struct AppState {
    pub assignment_service: Arc<AssignmentService>,
    pub attempt_service: Arc<AttemptService>,
    pub config: Arc<Config>,
    pub db: Database,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let assignment_repository = Arc::new(MongoAssignmentRepository::new(&db));
        assignment_repository.ensure_indexes().await?;
        let attempt_repository = Arc::new(MongoAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;
        let answer_repository = Arc::new(MongoAnswerRepository::new(&db));
        answer_repository.ensure_indexes().await?;

        let catalog = Arc::new(MongoCatalogGateway::new(&db, config.gateway_timeout()));
        let directory = Arc::new(MongoDirectoryGateway::new(&db, config.gateway_timeout()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let assignment_service = Arc::new(AssignmentService::new(
            assignment_repository.clone(),
            catalog.clone(),
            directory.clone(),
            clock.clone(),
            config.gateway_retries,
        ));
        let attempt_service = Arc::new(AttemptService::new(
            attempt_repository,
            answer_repository,
            assignment_repository,
            catalog,
            directory,
            clock,
            config.gateway_retries,
        ));

        Ok(Self {
            assignment_service,
            attempt_service,
            config: Arc::new(config),
            db,
        })
    }
}
