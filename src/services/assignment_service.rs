use std::sync::Arc;

use validator::Validate;

use crate::{
    clock::Clock,
    errors::{AppError, AppResult},
    gateways::{CatalogGateway, DirectoryGateway},
    models::{domain::Assignment, dto::request::CreateAssignmentRequest},
    repositories::AssignmentRepository,
};

pub struct AssignmentService {
    assignments: Arc<dyn AssignmentRepository>,
    catalog: Arc<dyn CatalogGateway>,
    directory: Arc<dyn DirectoryGateway>,
    clock: Arc<dyn Clock>,
    gateway_retries: u32,
}

impl AssignmentService {
    pub fn new(
        assignments: Arc<dyn AssignmentRepository>,
        catalog: Arc<dyn CatalogGateway>,
        directory: Arc<dyn DirectoryGateway>,
        clock: Arc<dyn Clock>,
        gateway_retries: u32,
    ) -> Self {
        Self {
            assignments,
            catalog,
            directory,
            clock,
            gateway_retries,
        }
    }

    pub async fn create_assignment(
        &self,
        request: CreateAssignmentRequest,
        created_by: &str,
    ) -> AppResult<Assignment> {
        request.validate()?;

        if request.window_start > request.window_end {
            return Err(AppError::InvalidWindow(
                "window start is after window end".to_string(),
            ));
        }
        if request.daily_start >= request.daily_end {
            return Err(AppError::InvalidWindow(
                "daily activation time is not before deactivation time".to_string(),
            ));
        }
        if request.duration_seconds <= 0 {
            return Err(AppError::InvalidWindow(
                "attempt duration must be positive".to_string(),
            ));
        }

        let questions = self.questions_with_retry(&request.quiz_id).await?;
        if questions.is_empty() {
            return Err(AppError::InvalidQuiz(format!(
                "quiz '{}' has no questions and cannot be assigned",
                request.quiz_id
            )));
        }

        if self.assignments.find_by_name(&request.name).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "Assignment with name '{}' already exists",
                request.name
            )));
        }

        let assignment = Assignment::new(
            &request.quiz_id,
            &request.group_id,
            &request.name,
            request.window_start,
            request.window_end,
            request.daily_start,
            request.daily_end,
            request.duration_seconds,
            created_by,
            self.clock.now(),
        );

        log::info!(
            "Creating assignment '{}' of quiz {} for group {}",
            assignment.name,
            assignment.quiz_id,
            assignment.group_id
        );
        self.assignments.create(assignment).await
    }

    /// Soft-deleted assignments are invisible here; history endpoints that
    /// need them go through the repository directly.
    pub async fn get_assignment(&self, id: &str) -> AppResult<Assignment> {
        let assignment = self
            .assignments
            .find_by_id(id)
            .await?
            .filter(|a| !a.is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("Assignment with id '{}' not found", id)))?;
        Ok(assignment)
    }

    pub async fn find_by_name(&self, name: &str) -> AppResult<Assignment> {
        let assignment = self
            .assignments
            .find_by_name(name)
            .await?
            .filter(|a| !a.is_deleted())
            .ok_or_else(|| {
                AppError::NotFound(format!("Assignment with name '{}' not found", name))
            })?;
        Ok(assignment)
    }

    /// Assignments visible to a user: those offered to the user's group.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Assignment>> {
        let group = self
            .group_with_retry(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("user '{}' has no group", user_id)))?;
        self.assignments.list_for_group(&group).await
    }

    pub async fn list_for_group(&self, group_id: &str) -> AppResult<Vec<Assignment>> {
        self.assignments.list_for_group(group_id).await
    }

    /// Removes future eligibility without orphaning existing attempts.
    pub async fn delete_assignment(&self, id: &str) -> AppResult<()> {
        let deleted = self.assignments.mark_deleted(id, self.clock.now()).await?;
        if !deleted {
            return Err(AppError::NotFound(format!(
                "Assignment with id '{}' not found",
                id
            )));
        }
        log::info!("Assignment {} withdrawn", id);
        Ok(())
    }

    async fn questions_with_retry(&self, quiz_id: &str) -> AppResult<Vec<String>> {
        let mut result = self.catalog.questions_of(quiz_id).await;
        let mut tries = 0;
        while tries < self.gateway_retries
            && matches!(result, Err(AppError::GatewayUnavailable(_)))
        {
            tries += 1;
            log::warn!("catalog questions_of({}) retry {}", quiz_id, tries);
            result = self.catalog.questions_of(quiz_id).await;
        }
        result
    }

    async fn group_with_retry(&self, user_id: &str) -> AppResult<Option<String>> {
        let mut result = self.directory.group_of(user_id).await;
        let mut tries = 0;
        while tries < self.gateway_retries
            && matches!(result, Err(AppError::GatewayUnavailable(_)))
        {
            tries += 1;
            log::warn!("directory group_of({}) retry {}", user_id, tries);
            result = self.directory.group_of(user_id).await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gateways::{MockCatalogGateway, MockDirectoryGateway};
    use crate::repositories::MockAssignmentRepository;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn valid_request() -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            name: "Chapter 4 quiz".to_string(),
            quiz_id: "quiz-1".to_string(),
            group_id: "group-1".to_string(),
            window_start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            window_end: Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
            daily_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            daily_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            duration_seconds: 600,
        }
    }

    fn service(
        assignments: MockAssignmentRepository,
        catalog: MockCatalogGateway,
    ) -> AssignmentService {
        AssignmentService::new(
            Arc::new(assignments),
            Arc::new(catalog),
            Arc::new(MockDirectoryGateway::new()),
            Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2024, 2, 20, 12, 0, 0).unwrap(),
            )),
            1,
        )
    }

    #[tokio::test]
    async fn create_rejects_inverted_window() {
        let svc = service(MockAssignmentRepository::new(), MockCatalogGateway::new());

        let mut request = valid_request();
        request.window_start = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();

        let result = svc.create_assignment(request, "prof-1").await;
        assert!(matches!(result, Err(AppError::InvalidWindow(_))));
    }

    #[tokio::test]
    async fn create_rejects_inverted_daily_interval() {
        let svc = service(MockAssignmentRepository::new(), MockCatalogGateway::new());

        let mut request = valid_request();
        request.daily_start = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        request.daily_end = NaiveTime::from_hms_opt(8, 0, 0).unwrap();

        let result = svc.create_assignment(request, "prof-1").await;
        assert!(matches!(result, Err(AppError::InvalidWindow(_))));
    }

    #[tokio::test]
    async fn create_rejects_zero_question_quiz() {
        let mut catalog = MockCatalogGateway::new();
        catalog
            .expect_questions_of()
            .returning(|_| Ok(Vec::new()));

        let svc = service(MockAssignmentRepository::new(), catalog);

        let result = svc.create_assignment(valid_request(), "prof-1").await;
        assert!(matches!(result, Err(AppError::InvalidQuiz(_))));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let mut catalog = MockCatalogGateway::new();
        catalog
            .expect_questions_of()
            .returning(|_| Ok(vec!["q1".to_string()]));

        let mut assignments = MockAssignmentRepository::new();
        assignments.expect_find_by_name().returning(|name| {
            Ok(Some(Assignment::new(
                "quiz-1",
                "group-1",
                name,
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                600,
                "prof-1",
                Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            )))
        });

        let svc = service(assignments, catalog);

        let result = svc.create_assignment(valid_request(), "prof-1").await;
        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn create_persists_a_valid_assignment() {
        let mut catalog = MockCatalogGateway::new();
        catalog
            .expect_questions_of()
            .returning(|_| Ok(vec!["q1".to_string(), "q2".to_string()]));

        let mut assignments = MockAssignmentRepository::new();
        assignments.expect_find_by_name().returning(|_| Ok(None));
        assignments.expect_create().returning(Ok);

        let svc = service(assignments, catalog);

        let created = svc
            .create_assignment(valid_request(), "prof-1")
            .await
            .expect("creation should succeed");
        assert_eq!(created.name, "Chapter 4 quiz");
        assert_eq!(created.created_by, "prof-1");
        assert!(created.deleted_at.is_none());
    }

    #[tokio::test]
    async fn delete_missing_assignment_is_not_found() {
        let mut assignments = MockAssignmentRepository::new();
        assignments.expect_mark_deleted().returning(|_, _| Ok(false));

        let svc = service(assignments, MockCatalogGateway::new());

        let result = svc.delete_assignment("missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn gateway_failure_is_retried_then_surfaced() {
        let mut catalog = MockCatalogGateway::new();
        catalog
            .expect_questions_of()
            .times(2)
            .returning(|_| Err(AppError::GatewayUnavailable("catalog down".to_string())));

        let svc = service(MockAssignmentRepository::new(), catalog);

        let result = svc.create_assignment(valid_request(), "prof-1").await;
        assert!(matches!(result, Err(AppError::GatewayUnavailable(_))));
    }
}
