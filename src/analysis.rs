//! Narrative analysis of score sets.
//!
//! The core treats analysis text as opaque. The only structure read back
//! out of it is the alignment status on the first line of a cross analysis,
//! see [`AlignmentStatus::parse`].

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::gateway::openrouter::OpenRouterAdapter;
use crate::gateway::{
    Attribution, ChatGateway, ChatModel, ChatRequest, GatewayConfig, ProviderError,
    ProviderGateway,
};
use crate::prompts::{PromptInstance, CROSS_PROMPT, CVCQ_PROMPT, CVF_PROMPT};
use crate::quadrant::ScoreSet;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    CvfSummary(ScoreSet),
    CvcqSummary(ScoreSet),
    CrossAlignment {
        culture: ScoreSet,
        leadership: ScoreSet,
    },
}

impl AnalysisRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisRequest::CvfSummary(_) => "cvf_summary",
            AnalysisRequest::CvcqSummary(_) => "cvcq_summary",
            AnalysisRequest::CrossAlignment { .. } => "cross_alignment",
        }
    }

    pub fn prompt(&self) -> PromptInstance {
        match self {
            AnalysisRequest::CvfSummary(scores) => CVF_PROMPT.render(Some(scores), None),
            AnalysisRequest::CvcqSummary(scores) => CVCQ_PROMPT.render(None, Some(scores)),
            AnalysisRequest::CrossAlignment {
                culture,
                leadership,
            } => CROSS_PROMPT.render(Some(culture), Some(leadership)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The analyst cannot run at all (no API key). Blocks the screen.
    #[error("Erro de Configuração: {0}")]
    Configuration(String),

    #[error("Erro de Autenticação: {0}")]
    Authentication(String),

    #[error("Ocorreu um erro ao comunicar com o serviço de IA: {0}")]
    Unknown(String),
}

impl From<ProviderError> for AnalysisError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Config(msg) => AnalysisError::Configuration(msg),
            ProviderError::Unauthorized { message, .. } => AnalysisError::Authentication(
                format!("a chave da API foi recusada ({message}); contate o administrador"),
            ),
            other => AnalysisError::Unknown(other.to_string()),
        }
    }
}

#[async_trait]
pub trait NarrativeAnalyst: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<String, AnalysisError>;
}

/// Analyst backed by a chat gateway. Built without a gateway when no API
/// key is configured; every call then fails with
/// [`AnalysisError::Configuration`].
pub struct GatewayAnalyst<G: ChatGateway> {
    gateway: Option<G>,
    model: ChatModel,
}

impl<G: ChatGateway> GatewayAnalyst<G> {
    pub fn new(gateway: G, model: ChatModel) -> Self {
        Self {
            gateway: Some(gateway),
            model,
        }
    }

    pub fn unconfigured(model: ChatModel) -> Self {
        Self {
            gateway: None,
            model,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.gateway.is_some()
    }
}

impl GatewayAnalyst<ProviderGateway<OpenRouterAdapter>> {
    pub fn from_config(config: &Config) -> Self {
        let model = ChatModel::openrouter(&config.model);
        let Some(api_key) = config.api_key.as_deref() else {
            warn!("OPENROUTER_API_KEY is not set; narrative analysis is disabled");
            return Self::unconfigured(model);
        };
        match OpenRouterAdapter::with_config(api_key, &config.base_url, config.timeout) {
            Ok(adapter) => Self::new(
                ProviderGateway::with_config(adapter, GatewayConfig::default()),
                model,
            ),
            Err(e) => {
                warn!(error = %e, "cannot build the analysis client");
                Self::unconfigured(model)
            }
        }
    }
}

#[async_trait]
impl<G: ChatGateway> NarrativeAnalyst for GatewayAnalyst<G> {
    async fn analyze(&self, request: AnalysisRequest) -> Result<String, AnalysisError> {
        let Some(gateway) = &self.gateway else {
            return Err(AnalysisError::Configuration(
                "a chave da API do serviço de IA não foi encontrada; contate o administrador"
                    .to_string(),
            ));
        };

        let prompt = request.prompt();
        let req = ChatRequest::new(
            self.model.clone(),
            prompt.to_messages(),
            Attribution::new("analysis::analyze"),
        )
        .temperature(0.4);

        let resp = gateway.chat(req).await?;
        let text = resp.content.trim();
        if text.is_empty() {
            return Err(AnalysisError::Unknown("resposta vazia".to_string()));
        }
        info!(
            kind = request.kind(),
            template = %prompt.template_slug,
            chars = text.len(),
            "analysis received"
        );
        Ok(text.to_string())
    }
}

/// Overall verdict of a cross analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlignmentStatus {
    Strong,
    Partial,
    Critical,
}

static STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*\*\s*(?:Diagnóstico de Alinhamento:\s*)?(.+?)\s*\*\*\s*$")
        .expect("Invalid alignment status regex")
});

impl AlignmentStatus {
    pub const ALL: [AlignmentStatus; 3] = [
        AlignmentStatus::Strong,
        AlignmentStatus::Partial,
        AlignmentStatus::Critical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AlignmentStatus::Strong => "Forte Alinhamento",
            AlignmentStatus::Partial => "Alinhamento Parcial com Pontos de Atenção",
            AlignmentStatus::Critical => "Desalinhamento Crítico",
        }
    }

    /// Read the status from the first line of `text`. Any other shape,
    /// including a recognized status further down, yields `None`.
    pub fn parse(text: &str) -> Option<AlignmentStatus> {
        let first = text.trim_start().lines().next()?.trim();
        let caps = STATUS_LINE.captures(first)?;
        let status = caps
            .get(1)?
            .as_str()
            .trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
            .trim_end_matches('.')
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|s| s.label().to_lowercase() == status)
    }
}
