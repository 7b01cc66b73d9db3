#![forbid(unsafe_code)]

//! # culture-lens
//!
//! Scoring and reporting for two organizational questionnaires: the
//! Competing Values Framework culture survey (CVF, 100 points split across
//! four quadrants per question) and the leadership competency
//! self-assessment (CVCQ, 1 to 7 ratings grouped by quadrant).
//!
//! The pure core turns raw answers into [`ScoreSet`]s, averages many
//! respondents' culture profiles, labels dominant profiles and drives the
//! per-session screen flow. Identity, persistence and AI narrative analysis
//! sit behind traits ([`IdentityProvider`], [`ResponseStore`],
//! [`NarrativeAnalyst`]) with a SQLite store and an OpenRouter-backed
//! analyst as the shipped implementations.

pub mod analysis;
pub mod config;
pub mod consolidation;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod identity;
pub mod prompts;
pub mod quadrant;
pub mod questionnaire;
pub mod report;
pub mod response;
pub mod scoring;
pub mod store;

pub use analysis::{AlignmentStatus, AnalysisError, AnalysisRequest, GatewayAnalyst, NarrativeAnalyst};
pub use config::Config;
pub use consolidation::{consolidate, consolidate_responses, dominant_quadrant, Consolidated};
pub use error::{Error, ErrorKind, Placement, Result, ValidationError};
pub use flow::{Event, FlowError, Screen, Session};
pub use gateway::{ChatGateway, ProviderGateway};
pub use identity::{Identity, IdentityProvider, ProfileDetails, Role};
pub use quadrant::{Quadrant, ScoreSet};
pub use response::{decode_transfer_code, encode_transfer_code, Response, UserId};
pub use scoring::{score_cvcq, score_cvf, CvcqRating, CvfAllocation};
pub use store::{CollaboratorError, ResponseStore, SqliteStore};
