#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use tokio::sync::RwLock;

use prova_server::{
    clock::ManualClock,
    errors::{AppError, AppResult},
    gateways::{CatalogGateway, DirectoryGateway},
    models::{
        domain::{AnswerEntry, Assignment, Attempt, AttemptStatus},
        dto::request::CreateAssignmentRequest,
    },
    repositories::{AnswerRepository, AssignmentRepository, AttemptRepository},
    services::{AssignmentService, AttemptService},
};

pub struct InMemoryAssignmentRepository {
    items: RwLock<HashMap<String, Assignment>>,
}

impl InMemoryAssignmentRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn create(&self, assignment: Assignment) -> AppResult<Assignment> {
        let mut items = self.items.write().await;
        if items.contains_key(&assignment.id) {
            return Err(AppError::AlreadyExists(format!(
                "Assignment with id '{}' already exists",
                assignment.id
            )));
        }
        items.insert(assignment.id.clone(), assignment.clone());
        Ok(assignment)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assignment>> {
        let items = self.items.read().await;
        Ok(items.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Assignment>> {
        let items = self.items.read().await;
        Ok(items.values().find(|a| a.name == name).cloned())
    }

    async fn list_for_group(&self, group_id: &str) -> AppResult<Vec<Assignment>> {
        let items = self.items.read().await;
        let mut found: Vec<_> = items
            .values()
            .filter(|a| a.group_id == group_id && !a.is_deleted())
            .cloned()
            .collect();
        found.sort_by(|a, b| a.window_start.cmp(&b.window_start));
        Ok(found)
    }

    async fn mark_deleted(&self, id: &str, at: DateTime<Utc>) -> AppResult<bool> {
        let mut items = self.items.write().await;
        match items.get_mut(id) {
            Some(assignment) if assignment.deleted_at.is_none() => {
                assignment.deleted_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub struct InMemoryAttemptRepository {
    items: RwLock<HashMap<String, Attempt>>,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    pub async fn count(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut items = self.items.write().await;
        if items.contains_key(&attempt.id) {
            return Err(AppError::AlreadyExists(format!(
                "Attempt with id '{}' already exists",
                attempt.id
            )));
        }
        let duplicate_pair = items
            .values()
            .any(|a| a.assignment_id == attempt.assignment_id && a.user_id == attempt.user_id);
        if duplicate_pair {
            return Err(AppError::AlreadyExists(format!(
                "user '{}' already has an attempt on assignment '{}'",
                attempt.user_id, attempt.assignment_id
            )));
        }
        items.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let items = self.items.read().await;
        Ok(items.get(id).cloned())
    }

    async fn find_by_assignment_and_user(
        &self,
        assignment_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Attempt>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .find(|a| a.assignment_id == assignment_id && a.user_id == user_id)
            .cloned())
    }

    async fn list_for_assignment(&self, assignment_id: &str) -> AppResult<Vec<Attempt>> {
        let items = self.items.read().await;
        let mut found: Vec<_> = items
            .values()
            .filter(|a| a.assignment_id == assignment_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(found)
    }

    async fn list_in_progress(&self) -> AppResult<Vec<Attempt>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|a| a.status == AttemptStatus::InProgress)
            .cloned()
            .collect())
    }

    async fn update_versioned(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut items = self.items.write().await;
        let stored = items.get(&attempt.id).ok_or_else(|| {
            AppError::NotFound(format!("Attempt with id '{}' not found", attempt.id))
        })?;
        if stored.version != attempt.version {
            return Err(AppError::InternalError(format!(
                "attempt '{}' was modified concurrently",
                attempt.id
            )));
        }
        let mut next = attempt;
        next.version += 1;
        items.insert(next.id.clone(), next.clone());
        Ok(next)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let mut items = self.items.write().await;
        Ok(items.remove(id).is_some())
    }
}

pub struct InMemoryAnswerRepository {
    items: RwLock<Vec<AnswerEntry>>,
}

impl InMemoryAnswerRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AnswerRepository for InMemoryAnswerRepository {
    async fn insert(&self, entry: AnswerEntry) -> AppResult<AnswerEntry> {
        let mut items = self.items.write().await;
        let duplicate = items
            .iter()
            .any(|e| e.attempt_id == entry.attempt_id && e.question_id == entry.question_id);
        if duplicate {
            return Err(AppError::AlreadyExists(format!(
                "question '{}' already answered in attempt '{}'",
                entry.question_id, entry.attempt_id
            )));
        }
        items.push(entry.clone());
        Ok(entry)
    }

    async fn find_by_attempt_and_question(
        &self,
        attempt_id: &str,
        question_id: &str,
    ) -> AppResult<Option<AnswerEntry>> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .find(|e| e.attempt_id == attempt_id && e.question_id == question_id)
            .cloned())
    }

    async fn list_for_attempt(&self, attempt_id: &str) -> AppResult<Vec<AnswerEntry>> {
        let items = self.items.read().await;
        let mut found: Vec<_> = items
            .iter()
            .filter(|e| e.attempt_id == attempt_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Ok(found)
    }

    async fn delete_for_attempt(&self, attempt_id: &str) -> AppResult<u64> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|e| e.attempt_id != attempt_id);
        Ok((before - items.len()) as u64)
    }
}

/// Catalog fixture: quiz-1 has questions q1..q3 with correct keys A, B, C;
/// quiz-empty exists but has no questions. `set_unavailable` simulates a
/// catalog outage.
pub struct FakeCatalogGateway {
    questions: HashMap<String, Vec<String>>,
    correct: HashMap<String, String>,
    unavailable: AtomicBool,
}

impl FakeCatalogGateway {
    pub fn new() -> Self {
        let mut questions = HashMap::new();
        questions.insert(
            "quiz-1".to_string(),
            vec!["q1".to_string(), "q2".to_string(), "q3".to_string()],
        );
        questions.insert("quiz-empty".to_string(), Vec::new());

        let mut correct = HashMap::new();
        correct.insert("q1".to_string(), "A".to_string());
        correct.insert("q2".to_string(), "B".to_string());
        correct.insert("q3".to_string(), "C".to_string());

        Self {
            questions,
            correct,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::GatewayUnavailable("catalog is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogGateway for FakeCatalogGateway {
    async fn questions_of(&self, quiz_id: &str) -> AppResult<Vec<String>> {
        self.check_available()?;
        self.questions
            .get(quiz_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }

    async fn correct_option_of(&self, question_id: &str) -> AppResult<String> {
        self.check_available()?;
        self.correct.get(question_id).cloned().ok_or_else(|| {
            AppError::NotFound(format!("Question with id '{}' not found", question_id))
        })
    }
}

/// Directory fixture: students 1-3 are in group-1, outsider is in group-2.
pub struct FakeDirectoryGateway {
    groups: HashMap<String, String>,
}

impl FakeDirectoryGateway {
    pub fn new() -> Self {
        let mut groups = HashMap::new();
        groups.insert("student-1".to_string(), "group-1".to_string());
        groups.insert("student-2".to_string(), "group-1".to_string());
        groups.insert("student-3".to_string(), "group-1".to_string());
        groups.insert("outsider".to_string(), "group-2".to_string());
        groups.insert("prof-1".to_string(), "staff".to_string());
        Self { groups }
    }
}

#[async_trait]
impl DirectoryGateway for FakeDirectoryGateway {
    async fn group_of(&self, user_id: &str) -> AppResult<Option<String>> {
        Ok(self.groups.get(user_id).cloned())
    }
}

/// Fully wired lifecycle engine over in-memory stores, fake gateways and a
/// manual clock.
pub struct TestEngine {
    pub clock: Arc<ManualClock>,
    pub catalog: Arc<FakeCatalogGateway>,
    pub assignments: Arc<InMemoryAssignmentRepository>,
    pub attempts: Arc<InMemoryAttemptRepository>,
    pub answers: Arc<InMemoryAnswerRepository>,
    pub assignment_service: Arc<AssignmentService>,
    pub attempt_service: Arc<AttemptService>,
}

impl TestEngine {
    pub fn at(start: DateTime<Utc>) -> Self {
        let clock = Arc::new(ManualClock::new(start));
        let catalog = Arc::new(FakeCatalogGateway::new());
        let directory = Arc::new(FakeDirectoryGateway::new());
        let assignments = Arc::new(InMemoryAssignmentRepository::new());
        let attempts = Arc::new(InMemoryAttemptRepository::new());
        let answers = Arc::new(InMemoryAnswerRepository::new());

        let assignment_service = Arc::new(AssignmentService::new(
            assignments.clone(),
            catalog.clone(),
            directory.clone(),
            clock.clone(),
            1,
        ));
        let attempt_service = Arc::new(AttemptService::new(
            attempts.clone(),
            answers.clone(),
            assignments.clone(),
            catalog.clone(),
            directory.clone(),
            clock.clone(),
            1,
        ));

        Self {
            clock,
            catalog,
            assignments,
            attempts,
            answers,
            assignment_service,
            attempt_service,
        }
    }

    pub async fn create_default_assignment(&self) -> Assignment {
        self.assignment_service
            .create_assignment(default_request(), "prof-1")
            .await
            .expect("default assignment should be created")
    }
}

/// An instant on the given March 2024 day; the default window spans the 1st
/// through the 5th with all-day activation hours.
pub fn day(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, h, m, s).unwrap()
}

pub fn default_request() -> CreateAssignmentRequest {
    CreateAssignmentRequest {
        name: "March review quiz".to_string(),
        quiz_id: "quiz-1".to_string(),
        group_id: "group-1".to_string(),
        window_start: day(1, 0, 0, 0),
        window_end: day(5, 0, 0, 0),
        daily_start: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        daily_end: NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        duration_seconds: 600,
    }
}
