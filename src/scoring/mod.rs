//! Scorers for both instruments.
//!
//! Both scorers are pure and all-or-nothing: input is validated in full
//! before any arithmetic runs, and a rejected input yields no partial
//! result.

pub mod cvcq;
pub mod cvf;

pub use cvcq::{score_cvcq, CvcqRating};
pub use cvf::{score_cvf, CvfAllocation};

use crate::error::ValidationError;
use crate::quadrant::ScoreSet;
use crate::questionnaire::{ALLOCATION_TOTAL, CVCQ_QUESTIONS, CVF_QUESTIONS, RATING_MAX, RATING_MIN};

/// Allowed drift of a CVF total away from 100.
const TOTAL_TOLERANCE: f64 = 1e-9;

/// Score a full CVF questionnaire: one allocation per fixed question.
pub fn score_cvf_questionnaire(answers: &[CvfAllocation]) -> Result<ScoreSet, ValidationError> {
    if answers.len() != CVF_QUESTIONS.len() {
        return Err(ValidationError::QuestionCount {
            expected: CVF_QUESTIONS.len(),
            actual: answers.len(),
        });
    }
    score_cvf(answers)
}

/// Score a full CVCQ questionnaire. `answers[i]` is the rating given to the
/// i-th fixed question, `None` when left blank.
pub fn score_cvcq_questionnaire(answers: &[Option<u8>]) -> Result<ScoreSet, ValidationError> {
    if answers.len() != CVCQ_QUESTIONS.len() {
        return Err(ValidationError::QuestionCount {
            expected: CVCQ_QUESTIONS.len(),
            actual: answers.len(),
        });
    }
    let ratings: Vec<CvcqRating> = CVCQ_QUESTIONS
        .iter()
        .zip(answers)
        .map(|(q, value)| CvcqRating {
            quadrant: q.quadrant,
            value: *value,
        })
        .collect();
    score_cvcq(&ratings)
}

/// Check that `scores` could have come out of the CVF scorer: every value
/// in [0, 100] and a total of 100.
pub fn validate_cvf_scores(scores: &ScoreSet, field: &'static str) -> Result<(), ValidationError> {
    if !scores.is_finite() {
        return Err(ValidationError::NonFiniteScores { field });
    }
    let max = f64::from(ALLOCATION_TOTAL);
    if let Some((quadrant, value)) = scores.iter().find(|(_, v)| !(0.0..=max).contains(v)) {
        return Err(ValidationError::ScoreOutOfRange {
            field,
            quadrant,
            value,
            expected: "0..=100",
        });
    }
    let total = scores.total();
    if (total - max).abs() > TOTAL_TOLERANCE {
        return Err(ValidationError::ScoreTotal { field, total });
    }
    Ok(())
}

/// Check that `scores` could have come out of the CVCQ scorer: every value
/// a mean rating in [1, 7], or 0 for a quadrant without ratings.
pub fn validate_cvcq_scores(scores: &ScoreSet, field: &'static str) -> Result<(), ValidationError> {
    if !scores.is_finite() {
        return Err(ValidationError::NonFiniteScores { field });
    }
    let range = f64::from(RATING_MIN)..=f64::from(RATING_MAX);
    match scores.iter().find(|(_, v)| *v != 0.0 && !range.contains(v)) {
        Some((quadrant, value)) => Err(ValidationError::ScoreOutOfRange {
            field,
            quadrant,
            value,
            expected: "0 or 1..=7",
        }),
        None => Ok(()),
    }
}
