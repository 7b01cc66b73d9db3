//! Leadership (CVCQ) scorer: mean 1–7 rating per quadrant.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::quadrant::{Quadrant, ScoreSet};
use crate::questionnaire::{RATING_MAX, RATING_MIN};

/// A single answer, tagged with the quadrant of its question.
/// `value` is `None` while the question is unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvcqRating {
    pub quadrant: Quadrant,
    pub value: Option<u8>,
}

impl CvcqRating {
    pub fn answered(quadrant: Quadrant, value: u8) -> Self {
        Self {
            quadrant,
            value: Some(value),
        }
    }

    pub fn unanswered(quadrant: Quadrant) -> Self {
        Self {
            quadrant,
            value: None,
        }
    }
}

/// Mean rating per quadrant.
///
/// Every question must be answered. A quadrant without any question scores
/// 0, which callers must read as "no data" rather than lowest competency.
pub fn score_cvcq(ratings: &[CvcqRating]) -> Result<ScoreSet, ValidationError> {
    let answered = ratings.iter().filter(|r| r.value.is_some()).count();
    if ratings.is_empty() || answered < ratings.len() {
        return Err(ValidationError::Incomplete {
            answered,
            expected: ratings.len(),
        });
    }

    let mut sums = [0u32; 4];
    let mut counts = [0u32; 4];
    for (idx, rating) in ratings.iter().enumerate() {
        let value = rating.value.unwrap_or_default();
        if !(RATING_MIN..=RATING_MAX).contains(&value) {
            return Err(ValidationError::RatingOutOfRange {
                question: idx + 1,
                value,
            });
        }
        sums[rating.quadrant.index()] += u32::from(value);
        counts[rating.quadrant.index()] += 1;
    }

    Ok(ScoreSet::from_fn(|q: Quadrant| {
        let i = q.index();
        if counts[i] == 0 {
            0.0
        } else {
            f64::from(sums[i]) / f64::from(counts[i])
        }
    }))
}
