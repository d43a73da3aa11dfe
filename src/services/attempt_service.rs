use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    clock::Clock,
    errors::{AppError, AppResult},
    gateways::{CatalogGateway, DirectoryGateway},
    models::{
        domain::{AnswerEntry, Assignment, Attempt, AttemptStatus},
        dto::{
            request::{ReportTimeRequest, SubmitAnswerRequest},
            response::{AnswerOutcome, AttemptView, ScoreResult},
        },
    },
    repositories::{AnswerRepository, AssignmentRepository, AttemptRepository},
    services::{attempt_locks::AttemptLocks, scoring_service::ScoringService},
};

/// The lifecycle engine. Every state transition for one attempt runs inside
/// the per-(assignment, user) critical section, and every transition is a
/// single versioned document write, so a failure never leaves a half-applied
/// transition behind.
pub struct AttemptService {
    attempts: Arc<dyn AttemptRepository>,
    answers: Arc<dyn AnswerRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    catalog: Arc<dyn CatalogGateway>,
    directory: Arc<dyn DirectoryGateway>,
    clock: Arc<dyn Clock>,
    locks: AttemptLocks,
    gateway_retries: u32,
}

fn pair_key(assignment_id: &str, user_id: &str) -> String {
    format!("{}::{}", assignment_id, user_id)
}

impl AttemptService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        attempts: Arc<dyn AttemptRepository>,
        answers: Arc<dyn AnswerRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        catalog: Arc<dyn CatalogGateway>,
        directory: Arc<dyn DirectoryGateway>,
        clock: Arc<dyn Clock>,
        gateway_retries: u32,
    ) -> Self {
        Self {
            attempts,
            answers,
            assignments,
            catalog,
            directory,
            clock,
            locks: AttemptLocks::new(),
            gateway_retries,
        }
    }

    /// Start a fresh attempt, resume an abandoned one, or return the current
    /// state idempotently when the attempt is already running. A resumable
    /// attempt whose budget has run out finalizes instead.
    pub async fn start_or_resume(
        &self,
        assignment_id: &str,
        user_id: &str,
    ) -> AppResult<AttemptView> {
        let assignment = self.load_live_assignment(assignment_id).await?;

        let group = self.group_with_retry(user_id).await?;
        if group.as_deref() != Some(assignment.group_id.as_str()) {
            return Err(AppError::Unauthorized(format!(
                "user '{}' is not in group '{}'",
                user_id, assignment.group_id
            )));
        }

        let _guard = self.locks.acquire(&pair_key(assignment_id, user_id)).await;
        let now = self.clock.now();

        let existing = self
            .attempts
            .find_by_assignment_and_user(assignment_id, user_id)
            .await?;

        let Some(attempt) = existing else {
            if !assignment.accepts(now) {
                return Err(AppError::WindowClosed(format!(
                    "assignment '{}' is not open at {}",
                    assignment.name, now
                )));
            }
            let attempt = self
                .attempts
                .create(Attempt::started(&assignment, user_id, now))
                .await?;
            log::info!(
                "user {} started attempt {} on assignment {}",
                user_id,
                attempt.id,
                assignment_id
            );
            return Ok(AttemptView::of(&attempt, now));
        };

        match attempt.status {
            AttemptStatus::Completed => Err(AppError::AlreadyCompleted(format!(
                "attempt {} is already finished",
                attempt.id
            ))),
            AttemptStatus::InProgress => {
                let bound = attempt.remaining_bound(now);
                if bound == 0 {
                    let done = self.finalize(attempt, &assignment, 0, now).await?;
                    return Ok(AttemptView::of(&done, now));
                }
                // reload: re-anchor the countdown so the budget keeps shrinking
                let mut refreshed = attempt;
                refreshed.remaining_seconds = bound;
                refreshed.anchored_at = now;
                let refreshed = self.attempts.update_versioned(refreshed).await?;
                Ok(AttemptView::of(&refreshed, now))
            }
            AttemptStatus::NotStarted => {
                if !assignment.accepts(now) {
                    return Err(AppError::WindowClosed(format!(
                        "assignment '{}' is not open at {}",
                        assignment.name, now
                    )));
                }
                let mut started = attempt;
                started.status = AttemptStatus::InProgress;
                started.remaining_seconds = assignment.duration_seconds;
                started.anchored_at = now;
                started.started_at = Some(now);
                let started = self.attempts.update_versioned(started).await?;
                Ok(AttemptView::of(&started, now))
            }
            AttemptStatus::Abandoned => {
                if attempt.remaining_seconds <= 0 {
                    // exhausted budget promotes straight to Completed
                    let done = self.finalize(attempt, &assignment, 0, now).await?;
                    return Ok(AttemptView::of(&done, now));
                }
                if !assignment.accepts(now) {
                    return Err(AppError::WindowClosed(format!(
                        "assignment '{}' is not open at {}",
                        assignment.name, now
                    )));
                }
                let mut resumed = attempt;
                resumed.status = AttemptStatus::InProgress;
                resumed.anchored_at = now;
                let resumed = self.attempts.update_versioned(resumed).await?;
                log::info!(
                    "user {} resumed attempt {} with {}s remaining",
                    user_id,
                    resumed.id,
                    resumed.remaining_seconds
                );
                Ok(AttemptView::of(&resumed, now))
            }
        }
    }

    /// Record one answer. The correct option is fetched from the catalog at
    /// submit time; an identical retry is a no-op, a conflicting retry is
    /// rejected. Remaining time is not decremented here.
    pub async fn submit_answer(
        &self,
        attempt_id: &str,
        user_id: &str,
        request: SubmitAnswerRequest,
    ) -> AppResult<AnswerOutcome> {
        request.validate()?;

        let handle = self.load_attempt(attempt_id).await?;
        if handle.user_id != user_id {
            return Err(AppError::Unauthorized(format!(
                "attempt {} does not belong to user '{}'",
                attempt_id, user_id
            )));
        }
        let assignment = self.load_assignment(&handle.assignment_id).await?;

        let _guard = self
            .locks
            .acquire(&pair_key(&handle.assignment_id, &handle.user_id))
            .await;
        let now = self.clock.now();
        let attempt = self.load_attempt(attempt_id).await?;

        if attempt.status != AttemptStatus::InProgress {
            return Err(AppError::AttemptNotActive(format!(
                "attempt {} is not in progress",
                attempt_id
            )));
        }
        if attempt.remaining_bound(now) == 0 {
            self.finalize(attempt, &assignment, 0, now).await?;
            return Err(AppError::AttemptNotActive(format!(
                "attempt {} ran out of time",
                attempt_id
            )));
        }

        if let Some(existing) = self
            .answers
            .find_by_attempt_and_question(attempt_id, &request.question_id)
            .await?
        {
            if existing.selected_option == request.selected_option {
                return Ok(AnswerOutcome::retried(&existing));
            }
            return Err(AppError::DuplicateAnswer(format!(
                "question {} was already answered in attempt {}",
                request.question_id, attempt_id
            )));
        }

        let correct_option = self.correct_option_with_retry(&request.question_id).await?;
        let entry = self
            .answers
            .insert(AnswerEntry::record(
                &attempt.id,
                &attempt.user_id,
                &assignment.quiz_id,
                &request.question_id,
                &correct_option,
                &request.selected_option,
                now,
            ))
            .await?;

        Ok(AnswerOutcome::recorded(&entry))
    }

    /// Explicit completion. The reported remaining time is clamped against
    /// the server bound before it is persisted. A finish on an already
    /// completed attempt returns the winner's frozen score.
    pub async fn finish(
        &self,
        attempt_id: &str,
        user_id: &str,
        request: ReportTimeRequest,
    ) -> AppResult<ScoreResult> {
        request.validate()?;

        let handle = self.load_attempt(attempt_id).await?;
        if handle.user_id != user_id {
            return Err(AppError::Unauthorized(format!(
                "attempt {} does not belong to user '{}'",
                attempt_id, user_id
            )));
        }
        let assignment = self.load_assignment(&handle.assignment_id).await?;

        let _guard = self
            .locks
            .acquire(&pair_key(&handle.assignment_id, &handle.user_id))
            .await;
        let now = self.clock.now();
        let attempt = self.load_attempt(attempt_id).await?;

        match attempt.status {
            AttemptStatus::Completed => self.score_result_of(&attempt, &assignment).await,
            AttemptStatus::InProgress => {
                let accepted = attempt.clamp_reported(request.remaining_seconds, now);
                let done = self.finalize(attempt, &assignment, accepted, now).await?;
                self.score_result_of(&done, &assignment).await
            }
            AttemptStatus::NotStarted | AttemptStatus::Abandoned => {
                Err(AppError::AttemptNotActive(format!(
                    "attempt {} is not in progress",
                    attempt_id
                )))
            }
        }
    }

    /// The user walked away. Persists the clamped remaining time; the
    /// attempt stays resumable while its budget and window allow.
    pub async fn leave(
        &self,
        attempt_id: &str,
        user_id: &str,
        request: ReportTimeRequest,
    ) -> AppResult<AttemptView> {
        request.validate()?;

        let handle = self.load_attempt(attempt_id).await?;
        if handle.user_id != user_id {
            return Err(AppError::Unauthorized(format!(
                "attempt {} does not belong to user '{}'",
                attempt_id, user_id
            )));
        }

        let _guard = self
            .locks
            .acquire(&pair_key(&handle.assignment_id, &handle.user_id))
            .await;
        let now = self.clock.now();
        let attempt = self.load_attempt(attempt_id).await?;

        match attempt.status {
            AttemptStatus::Completed => Err(AppError::AlreadyCompleted(format!(
                "attempt {} is already finished",
                attempt_id
            ))),
            AttemptStatus::InProgress => {
                let accepted = attempt.clamp_reported(request.remaining_seconds, now);
                let mut left = attempt;
                left.status = AttemptStatus::Abandoned;
                left.remaining_seconds = accepted;
                left.anchored_at = now;
                let left = self.attempts.update_versioned(left).await?;
                log::info!(
                    "user {} left attempt {} with {}s remaining",
                    user_id,
                    left.id,
                    left.remaining_seconds
                );
                Ok(AttemptView::of(&left, now))
            }
            AttemptStatus::NotStarted | AttemptStatus::Abandoned => {
                Err(AppError::AttemptNotActive(format!(
                    "attempt {} is not in progress",
                    attempt_id
                )))
            }
        }
    }

    /// Frozen score for a completed attempt, live ledger recomputation for a
    /// running one. Visible to the attempt owner and the assigner.
    pub async fn score_of(&self, attempt_id: &str, user_id: &str) -> AppResult<ScoreResult> {
        let attempt = self.load_attempt(attempt_id).await?;
        let assignment = self.load_assignment(&attempt.assignment_id).await?;
        if attempt.user_id != user_id && assignment.created_by != user_id {
            return Err(AppError::Unauthorized(format!(
                "user '{}' may not read attempt {}",
                user_id, attempt_id
            )));
        }
        self.score_result_of(&attempt, &assignment).await
    }

    /// Recorded answers of an attempt, for result detail views.
    pub async fn answers_of(&self, attempt_id: &str, user_id: &str) -> AppResult<Vec<AnswerEntry>> {
        let attempt = self.load_attempt(attempt_id).await?;
        let assignment = self.load_assignment(&attempt.assignment_id).await?;
        if attempt.user_id != user_id && assignment.created_by != user_id {
            return Err(AppError::Unauthorized(format!(
                "user '{}' may not read attempt {}",
                user_id, attempt_id
            )));
        }
        self.answers.list_for_attempt(attempt_id).await
    }

    /// All attempts against one assignment, for the assigner's results view.
    pub async fn list_for_assignment(
        &self,
        assignment_id: &str,
        user_id: &str,
    ) -> AppResult<Vec<AttemptView>> {
        let assignment = self.load_assignment(assignment_id).await?;
        if assignment.created_by != user_id {
            return Err(AppError::Unauthorized(format!(
                "user '{}' did not create assignment {}",
                user_id, assignment_id
            )));
        }
        let now = self.clock.now();
        let attempts = self.attempts.list_for_assignment(assignment_id).await?;
        Ok(attempts.iter().map(|a| AttemptView::of(a, now)).collect())
    }

    /// Pre-seed a NotStarted attempt for a student, assigner-only.
    pub async fn seed_attempt(
        &self,
        assignment_id: &str,
        caller_id: &str,
        student_id: &str,
    ) -> AppResult<AttemptView> {
        let assignment = self.load_live_assignment(assignment_id).await?;
        if assignment.created_by != caller_id {
            return Err(AppError::Unauthorized(format!(
                "user '{}' did not create assignment {}",
                caller_id, assignment_id
            )));
        }
        let group = self.group_with_retry(student_id).await?;
        if group.as_deref() != Some(assignment.group_id.as_str()) {
            return Err(AppError::Unauthorized(format!(
                "user '{}' is not in group '{}'",
                student_id, assignment.group_id
            )));
        }

        let _guard = self
            .locks
            .acquire(&pair_key(assignment_id, student_id))
            .await;
        let now = self.clock.now();

        if self
            .attempts
            .find_by_assignment_and_user(assignment_id, student_id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(format!(
                "user '{}' already has an attempt on assignment {}",
                student_id, assignment_id
            )));
        }

        let attempt = self
            .attempts
            .create(Attempt::seeded(&assignment, student_id, now))
            .await?;
        Ok(AttemptView::of(&attempt, now))
    }

    /// Remove one attempt and its ledger entries. This is the only path that
    /// deletes answer history, and it cascades explicitly.
    pub async fn delete_attempt(&self, attempt_id: &str, caller_id: &str) -> AppResult<()> {
        let attempt = self.load_attempt(attempt_id).await?;
        let assignment = self.load_assignment(&attempt.assignment_id).await?;
        if assignment.created_by != caller_id {
            return Err(AppError::Unauthorized(format!(
                "user '{}' did not create assignment {}",
                caller_id, attempt.assignment_id
            )));
        }

        let _guard = self
            .locks
            .acquire(&pair_key(&attempt.assignment_id, &attempt.user_id))
            .await;

        let removed_answers = self.answers.delete_for_attempt(attempt_id).await?;
        self.attempts.delete(attempt_id).await?;
        log::info!(
            "attempt {} and {} answer entries removed",
            attempt_id,
            removed_answers
        );
        Ok(())
    }

    /// Abandon long-idle in-progress attempts whose window has closed,
    /// charging elapsed time only up to the window close instant. Takes the
    /// same per-attempt lock as the client-driven transitions.
    pub async fn sweep_expired(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let in_progress = self.attempts.list_in_progress().await?;
        let mut swept = 0;

        for stale in in_progress {
            let Some(assignment) = self.assignments.find_by_id(&stale.assignment_id).await? else {
                continue;
            };
            let close = assignment.window_close_instant();
            if now <= close {
                continue;
            }

            let _guard = self
                .locks
                .acquire(&pair_key(&stale.assignment_id, &stale.user_id))
                .await;
            let Some(current) = self.attempts.find_by_id(&stale.id).await? else {
                continue;
            };
            if current.status != AttemptStatus::InProgress {
                continue;
            }

            let remaining_at_close = current.remaining_bound(close);
            if remaining_at_close == 0 {
                match self.finalize(current, &assignment, 0, now).await {
                    Ok(_) => swept += 1,
                    Err(err) => log::warn!("sweep could not finalize attempt: {}", err),
                }
            } else {
                let mut abandoned = current;
                abandoned.status = AttemptStatus::Abandoned;
                abandoned.remaining_seconds = remaining_at_close;
                abandoned.anchored_at = now;
                self.attempts.update_versioned(abandoned).await?;
                swept += 1;
            }
        }

        if swept > 0 {
            log::info!("sweep transitioned {} expired attempts", swept);
        }
        Ok(swept)
    }

    /// Score the ledger and write the terminal record in one versioned
    /// update. Called under the per-attempt lock; nothing is persisted if
    /// scoring fails.
    async fn finalize(
        &self,
        attempt: Attempt,
        assignment: &Assignment,
        remaining_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<Attempt> {
        let entries = self.answers.list_for_attempt(&attempt.id).await?;
        let questions = self.questions_with_retry(&assignment.quiz_id).await?;
        let (score, correct) = ScoringService::score_from_entries(&entries, questions.len())?;

        let mut done = attempt;
        done.status = AttemptStatus::Completed;
        done.remaining_seconds = remaining_seconds.max(0);
        done.anchored_at = now;
        done.score = Some(score);
        done.completed_at = Some(now);

        let done = self.attempts.update_versioned(done).await?;
        log::info!(
            "attempt {} completed: {}/{} correct, score {}",
            done.id,
            correct,
            questions.len(),
            score
        );
        Ok(done)
    }

    async fn score_result_of(
        &self,
        attempt: &Attempt,
        assignment: &Assignment,
    ) -> AppResult<ScoreResult> {
        let entries = self.answers.list_for_attempt(&attempt.id).await?;
        let questions = self.questions_with_retry(&assignment.quiz_id).await?;
        let (computed, correct) = ScoringService::score_from_entries(&entries, questions.len())?;

        Ok(ScoreResult {
            attempt_id: attempt.id.clone(),
            // the score frozen at completion wins over any recomputation
            score: attempt.score.unwrap_or(computed),
            correct_count: correct,
            total_questions: questions.len(),
            completed_at: attempt.completed_at,
        })
    }

    async fn load_attempt(&self, attempt_id: &str) -> AppResult<Attempt> {
        self.attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id)))
    }

    async fn load_assignment(&self, assignment_id: &str) -> AppResult<Assignment> {
        self.assignments.find_by_id(assignment_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Assignment with id '{}' not found", assignment_id))
        })
    }

    /// Like `load_assignment`, but a withdrawn assignment no longer grants
    /// eligibility for new or resumed attempts.
    async fn load_live_assignment(&self, assignment_id: &str) -> AppResult<Assignment> {
        let assignment = self.load_assignment(assignment_id).await?;
        if assignment.is_deleted() {
            return Err(AppError::NotFound(format!(
                "Assignment with id '{}' is no longer offered",
                assignment_id
            )));
        }
        Ok(assignment)
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

    async fn correct_option_with_retry(&self, question_id: &str) -> AppResult<String> {
        let mut result = self.catalog.correct_option_of(question_id).await;
        let mut tries = 0;
        while tries < self.gateway_retries
            && matches!(result, Err(AppError::GatewayUnavailable(_)))
        {
            tries += 1;
            log::warn!("catalog correct_option_of({}) retry {}", question_id, tries);
            result = self.catalog.correct_option_of(question_id).await;
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
