//! Consolidation of many respondents' scores and dominant-profile labeling.

use serde::Serialize;

use crate::quadrant::{Quadrant, ScoreSet};
use crate::response::Response;

/// Element-wise mean of `sets`, or `None` when there is nothing to average.
///
/// Quadrants are averaged independently; the result is not re-normalized.
/// This is a pure function meant to be re-run whenever the underlying
/// collection changes.
pub fn consolidate<'a, I>(sets: I) -> Option<ScoreSet>
where
    I: IntoIterator<Item = &'a ScoreSet>,
{
    let mut total = ScoreSet::zero();
    let mut count = 0usize;
    for set in sets {
        total = total.add(set);
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some(ScoreSet::from_fn(|q| total.get(q) / n))
}

/// Consolidated culture scores of a response collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Consolidated {
    /// `None` when there are no responses yet.
    pub scores: Option<ScoreSet>,
    pub respondents: usize,
}

impl Consolidated {
    pub fn is_absent(&self) -> bool {
        self.scores.is_none()
    }
}

/// Consolidate the CVF scores of `responses`.
pub fn consolidate_responses(responses: &[Response]) -> Consolidated {
    Consolidated {
        scores: consolidate(responses.iter().map(|r| &r.cvf_scores)),
        respondents: responses.len(),
    }
}

/// The quadrant with the highest score. Exact ties go to the quadrant that
/// comes first in canonical order.
pub fn dominant_quadrant(scores: &ScoreSet) -> Quadrant {
    let mut best = Quadrant::ALL[0];
    for q in Quadrant::ALL.into_iter().skip(1) {
        // Strictly greater keeps the earlier quadrant on ties. NaN never wins.
        if scores.get(q) > scores.get(best) {
            best = q;
        }
    }
    best
}

/// Quadrants ordered from highest to lowest score, ties in canonical order.
pub fn ranked_quadrants(scores: &ScoreSet) -> [Quadrant; 4] {
    let mut ranked = Quadrant::ALL;
    ranked.sort_by(|a, b| {
        scores
            .get(*b)
            .partial_cmp(&scores.get(*a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(b))
    });
    ranked
}
