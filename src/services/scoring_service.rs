use crate::{
    errors::{AppError, AppResult},
    models::domain::AnswerEntry,
};

pub struct ScoringService;

impl ScoringService {
    /// Percentage score of an attempt: 100 * correct / total questions,
    /// rounded to two decimal places (2/3 scores as 66.67). Unanswered
    /// questions count as incorrect; a zero-question quiz is a
    /// configuration defect, not a score.
    pub fn score_from_entries(
        entries: &[AnswerEntry],
        total_questions: usize,
    ) -> AppResult<(f64, usize)> {
        if total_questions == 0 {
            return Err(AppError::InvalidQuiz(
                "quiz has no questions to score".to_string(),
            ));
        }

        let correct = entries.iter().filter(|e| e.is_correct).count();
        let raw = correct as f64 * 100.0 / total_questions as f64;
        let score = (raw * 100.0).round() / 100.0;
        Ok((score, correct))
    }
}
