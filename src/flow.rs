//! Per-session screen state machine.
//!
//! A [`Session`] decides which screen a user may see given who they are,
//! whether their profile is complete and how far through the questionnaires
//! they are. Each [`Event`] is applied atomically through `&mut self`; the
//! surrounding application keeps one `Session` per signed-in user.
//!
//! Respondents walk
//! `Unauthenticated → AwaitingRegistration → Intro → CultureQuestionnaire →
//! LeadershipQuestionnaire → Completion`. Administrators land on
//! `AdminReviewing` and toggle into `AdminViewingReport` by selecting a
//! response. Logout is accepted everywhere.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consolidation::{consolidate_responses, Consolidated};
use crate::error::ValidationError;
use crate::identity::Identity;
use crate::quadrant::ScoreSet;
use crate::response::Response;
use crate::scoring::{
    score_cvcq_questionnaire, score_cvf_questionnaire, validate_cvcq_scores, validate_cvf_scores,
    CvfAllocation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Screen {
    Unauthenticated,
    AwaitingRegistration,
    Intro,
    CultureQuestionnaire,
    LeadershipQuestionnaire,
    Completion,
    AdminReviewing,
    AdminViewingReport,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Unauthenticated => "unauthenticated",
            Screen::AwaitingRegistration => "awaiting_registration",
            Screen::Intro => "intro",
            Screen::CultureQuestionnaire => "culture_questionnaire",
            Screen::LeadershipQuestionnaire => "leadership_questionnaire",
            Screen::Completion => "completion",
            Screen::AdminReviewing => "admin_reviewing",
            Screen::AdminViewingReport => "admin_viewing_report",
        }
    }

    pub fn is_admin_screen(&self) -> bool {
        matches!(self, Screen::AdminReviewing | Screen::AdminViewingReport)
    }

    pub fn is_questionnaire_screen(&self) -> bool {
        matches!(
            self,
            Screen::Intro
                | Screen::CultureQuestionnaire
                | Screen::LeadershipQuestionnaire
                | Screen::Completion
        )
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Authenticated(Identity),
    ProfileCompleted(Identity),
    Start,
    CultureSubmitted(ScoreSet),
    LeadershipSubmitted(ScoreSet),
    ResponsesChanged(Vec<Response>),
    ConsolidatedAnalysisReady(String),
    SelectResponse(Response),
    Deselect,
    Logout,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Authenticated(_) => "authenticated",
            Event::ProfileCompleted(_) => "profile_completed",
            Event::Start => "start",
            Event::CultureSubmitted(_) => "culture_submitted",
            Event::LeadershipSubmitted(_) => "leadership_submitted",
            Event::ResponsesChanged(_) => "responses_changed",
            Event::ConsolidatedAnalysisReady(_) => "consolidated_analysis_ready",
            Event::SelectResponse(_) => "select_response",
            Event::Deselect => "deselect",
            Event::Logout => "logout",
        }
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("event {event} is not allowed on screen {}", .from.as_str())]
    InvalidTransition { from: Screen, event: &'static str },

    #[error("no consolidated culture data yet; a response cannot be opened")]
    NoConsolidatedData,

    #[error("profile update refused: {0}")]
    ProfileMismatch(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Transient per-user progress. Never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    screen: Screen,
    identity: Option<Identity>,
    cvf_scores: Option<ScoreSet>,
    cvcq_scores: Option<ScoreSet>,
    completed_at: Option<DateTime<Utc>>,
    selected: Option<Response>,
    consolidated: Consolidated,
    consolidated_analysis: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            screen: Screen::Unauthenticated,
            identity: None,
            cvf_scores: None,
            cvcq_scores: None,
            completed_at: None,
            selected: None,
            consolidated: Consolidated {
                scores: None,
                respondents: 0,
            },
            consolidated_analysis: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn cvf_scores(&self) -> Option<&ScoreSet> {
        self.cvf_scores.as_ref()
    }

    pub fn cvcq_scores(&self) -> Option<&ScoreSet> {
        self.cvcq_scores.as_ref()
    }

    pub fn selected(&self) -> Option<&Response> {
        self.selected.as_ref()
    }

    pub fn consolidated(&self) -> &Consolidated {
        &self.consolidated
    }

    pub fn consolidated_analysis(&self) -> Option<&str> {
        self.consolidated_analysis.as_deref()
    }

    /// Apply one event. On error the session is left exactly as it was.
    pub fn apply(&mut self, event: Event) -> Result<Screen, FlowError> {
        let from = self.screen;
        let name = event.name();

        let next = match (from, event) {
            (_, Event::Logout) => {
                self.reset();
                Screen::Unauthenticated
            }
            (Screen::Unauthenticated, Event::Authenticated(identity)) => {
                let next = landing_screen(&identity);
                info!(user = %identity.id, admin = identity.is_admin(), "signed in");
                self.identity = Some(identity);
                next
            }
            (Screen::AwaitingRegistration, Event::ProfileCompleted(identity)) => {
                if let Some(current) = &self.identity {
                    if current.id != identity.id {
                        warn!(
                            user = %current.id,
                            received = %identity.id,
                            "foreign profile refused"
                        );
                        return Err(FlowError::ProfileMismatch("belongs to another user"));
                    }
                    if current.role != identity.role {
                        warn!(user = %current.id, "role change during registration refused");
                        return Err(FlowError::ProfileMismatch("role cannot change"));
                    }
                }
                if !identity.is_registered() {
                    let missing = if identity
                        .full_name
                        .as_deref()
                        .is_some_and(|s| !s.trim().is_empty())
                    {
                        "position"
                    } else {
                        "full_name"
                    };
                    return Err(ValidationError::MissingField(missing).into());
                }
                let next = landing_screen(&identity);
                self.identity = Some(identity);
                next
            }
            (Screen::Intro, Event::Start) => Screen::CultureQuestionnaire,
            (Screen::CultureQuestionnaire, Event::CultureSubmitted(scores)) => {
                validate_cvf_scores(&scores, "cvf_scores")?;
                self.cvf_scores = Some(scores);
                Screen::LeadershipQuestionnaire
            }
            (Screen::LeadershipQuestionnaire, Event::LeadershipSubmitted(scores)) => {
                validate_cvcq_scores(&scores, "cvcq_scores")?;
                if self.cvf_scores.is_none() {
                    warn!("culture scores missing at leadership submission; forcing logout");
                    self.reset();
                    Screen::Unauthenticated
                } else {
                    self.cvcq_scores = Some(scores);
                    self.completed_at = Some(Utc::now());
                    Screen::Completion
                }
            }
            (
                Screen::AdminReviewing | Screen::AdminViewingReport,
                Event::ResponsesChanged(responses),
            ) => self.refresh_responses(&responses),
            (
                Screen::AdminReviewing | Screen::AdminViewingReport,
                Event::ConsolidatedAnalysisReady(text),
            ) => {
                self.consolidated_analysis = Some(text);
                from
            }
            (Screen::AdminReviewing, Event::SelectResponse(response)) => {
                if self.consolidated.is_absent() {
                    return Err(FlowError::NoConsolidatedData);
                }
                self.selected = Some(response);
                Screen::AdminViewingReport
            }
            (Screen::AdminViewingReport, Event::Deselect) => {
                self.selected = None;
                Screen::AdminReviewing
            }
            (from, _) => return Err(FlowError::InvalidTransition { from, event: name }),
        };

        debug!(from = from.as_str(), to = next.as_str(), event = name, "transition");
        self.screen = next;
        Ok(next)
    }

    /// Score CVF answers and advance only if they are valid.
    pub fn submit_culture(&mut self, answers: &[CvfAllocation]) -> Result<Screen, FlowError> {
        self.expect_screen(Screen::CultureQuestionnaire, "culture_submitted")?;
        let scores = score_cvf_questionnaire(answers)?;
        self.apply(Event::CultureSubmitted(scores))
    }

    /// Score CVCQ answers and advance only if every question is answered.
    pub fn submit_leadership(&mut self, answers: &[Option<u8>]) -> Result<Screen, FlowError> {
        self.expect_screen(Screen::LeadershipQuestionnaire, "leadership_submitted")?;
        let scores = score_cvcq_questionnaire(answers)?;
        self.apply(Event::LeadershipSubmitted(scores))
    }

    /// The response to persist once the respondent reaches `Completion`.
    pub fn completed_response(&self) -> Option<Response> {
        if self.screen != Screen::Completion {
            return None;
        }
        let identity = self.identity.as_ref()?;
        Some(Response {
            user_id: identity.id.clone(),
            username: identity.username.clone(),
            full_name: identity.full_name.clone()?,
            position: identity.position.clone()?,
            cvf_scores: self.cvf_scores?,
            cvcq_scores: self.cvcq_scores?,
            submitted_at: self.completed_at,
        })
    }

    fn refresh_responses(&mut self, responses: &[Response]) -> Screen {
        self.consolidated = consolidate_responses(responses);
        self.consolidated_analysis = None;

        if self.screen != Screen::AdminViewingReport {
            return self.screen;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|sel| responses.iter().find(|r| r.user_id == sel.user_id));
        match current {
            Some(fresh) if !self.consolidated.is_absent() => {
                self.selected = Some(fresh.clone());
                Screen::AdminViewingReport
            }
            _ => {
                self.selected = None;
                Screen::AdminReviewing
            }
        }
    }

    fn expect_screen(&self, screen: Screen, event: &'static str) -> Result<(), FlowError> {
        if self.screen == screen {
            Ok(())
        } else {
            Err(FlowError::InvalidTransition {
                from: self.screen,
                event,
            })
        }
    }

    fn reset(&mut self) {
        *self = Session::new();
    }
}

fn landing_screen(identity: &Identity) -> Screen {
    if !identity.is_registered() {
        Screen::AwaitingRegistration
    } else if identity.is_admin() {
        Screen::AdminReviewing
    } else {
        Screen::Intro
    }
}
