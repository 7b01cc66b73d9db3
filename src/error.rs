//! Error taxonomy shared by the scorers, the flow and the collaborators.
//!
//! Each layer keeps its own error enum; [`Error`] wraps them so a front end
//! can decide how to present any failure through [`Error::kind`],
//! [`Error::placement`] and [`Error::user_message`].

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::flow::FlowError;
use crate::quadrant::Quadrant;
use crate::store::CollaboratorError;

/// Malformed or incomplete input. Always recoverable: the input is rejected
/// at the boundary and the caller re-prompts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("question {question}: allocation must total 100 (got {total})")]
    AllocationTotal { question: usize, total: u32 },

    #[error("incomplete questionnaire: {answered} of {expected} questions answered")]
    Incomplete { answered: usize, expected: usize },

    #[error("expected {expected} answers, got {actual}")]
    QuestionCount { expected: usize, actual: usize },

    #[error("question {question}: rating {value} is outside 1..=7")]
    RatingOutOfRange { question: usize, value: u8 },

    #[error("invalid transfer code: {0}")]
    TransferCode(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid score set for {field}: values must be finite")]
    NonFiniteScores { field: &'static str },

    #[error("invalid score set for {field}: {quadrant} is {value}, expected {expected}")]
    ScoreOutOfRange {
        field: &'static str,
        quadrant: Quadrant,
        value: f64,
        expected: &'static str,
    },

    #[error("invalid score set for {field}: culture scores must total 100 (got {total})")]
    ScoreTotal { field: &'static str, total: f64 },
}

/// Coarse classification used by front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    PermissionDenied,
    NotFound,
    Configuration,
    Authentication,
    InvalidState,
    Unknown,
}

/// Where an error is shown. Configuration problems block a whole screen;
/// everything else is reported next to the step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Inline,
    FullScreen,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Flow(#[from] FlowError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Collaborator(CollaboratorError::PermissionDenied(_)) => {
                ErrorKind::PermissionDenied
            }
            Error::Collaborator(CollaboratorError::NotFound(_)) => ErrorKind::NotFound,
            Error::Collaborator(CollaboratorError::Invalid(_)) => ErrorKind::Validation,
            Error::Collaborator(_) => ErrorKind::Unknown,
            Error::Analysis(AnalysisError::Configuration(_)) => ErrorKind::Configuration,
            Error::Analysis(AnalysisError::Authentication(_)) => ErrorKind::Authentication,
            Error::Analysis(AnalysisError::Unknown(_)) => ErrorKind::Unknown,
            Error::Flow(FlowError::Validation(_)) => ErrorKind::Validation,
            Error::Flow(_) => ErrorKind::InvalidState,
        }
    }

    pub fn placement(&self) -> Placement {
        match self.kind() {
            ErrorKind::Configuration => Placement::FullScreen,
            _ => Placement::Inline,
        }
    }

    /// Text suitable for showing to the acting user.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::PermissionDenied => format!(
                "{self}. Você não tem permissão para esta operação; contate o administrador."
            ),
            ErrorKind::Unknown => format!(
                "{self}. Ocorreu um erro inesperado; por favor, tente novamente mais tarde."
            ),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_take_the_whole_screen() {
        let err = Error::from(AnalysisError::Configuration("OPENROUTER_API_KEY not set".into()));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.placement(), Placement::FullScreen);

        let err = Error::from(AnalysisError::Authentication("invalid key".into()));
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.placement(), Placement::Inline);
    }

    #[test]
    fn permission_denied_carries_admin_hint() {
        let err = Error::from(CollaboratorError::PermissionDenied("row-level policy".into()));
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(err.user_message().contains("contate o administrador"));
    }

    #[test]
    fn validation_message_names_allocation_rule() {
        let err = Error::from(ValidationError::AllocationTotal {
            question: 3,
            total: 90,
        });
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.user_message().contains("allocation must total 100"));
    }
}
