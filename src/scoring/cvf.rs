//! Culture (CVF) scorer: 100 points spread across the quadrants per question.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::quadrant::{Quadrant, ScoreSet};
use crate::questionnaire::ALLOCATION_TOTAL;

/// One respondent's 100-point split for one CVF question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CvfAllocation {
    #[serde(rename = "Collaborate", alias = "Clan")]
    pub collaborate: u32,
    #[serde(rename = "Create", alias = "Adhocracy")]
    pub create: u32,
    #[serde(rename = "Compete", alias = "Market")]
    pub compete: u32,
    #[serde(rename = "Control", alias = "Hierarchy")]
    pub control: u32,
}

impl CvfAllocation {
    pub fn new(collaborate: u32, create: u32, compete: u32, control: u32) -> Self {
        Self {
            collaborate,
            create,
            compete,
            control,
        }
    }

    /// 25 points to every quadrant.
    pub fn even() -> Self {
        Self::new(25, 25, 25, 25)
    }

    pub fn get(&self, quadrant: Quadrant) -> u32 {
        match quadrant {
            Quadrant::Collaborate => self.collaborate,
            Quadrant::Create => self.create,
            Quadrant::Compete => self.compete,
            Quadrant::Control => self.control,
        }
    }

    /// Saturating so that absurd inputs cannot wrap around to 100.
    pub fn total(&self) -> u32 {
        Quadrant::ALL
            .into_iter()
            .fold(0u32, |acc, q| acc.saturating_add(self.get(q)))
    }

    pub fn is_complete(&self) -> bool {
        self.total() == ALLOCATION_TOTAL
    }
}

/// Per-quadrant mean of the allocated points across all questions.
///
/// Fails without computing anything if any allocation does not total
/// exactly 100, or if there are no allocations at all.
pub fn score_cvf(allocations: &[CvfAllocation]) -> Result<ScoreSet, ValidationError> {
    if allocations.is_empty() {
        return Err(ValidationError::Incomplete {
            answered: 0,
            expected: 0,
        });
    }

    if let Some((idx, bad)) = allocations
        .iter()
        .enumerate()
        .find(|(_, a)| !a.is_complete())
    {
        return Err(ValidationError::AllocationTotal {
            question: idx + 1,
            total: bad.total(),
        });
    }

    // Integer sums keep the result independent of question order.
    let mut sums = [0u64; 4];
    for allocation in allocations {
        for q in Quadrant::ALL {
            sums[q.index()] += u64::from(allocation.get(q));
        }
    }

    let n = allocations.len() as f64;
    Ok(ScoreSet::from_fn(|q| sums[q.index()] as f64 / n))
}
