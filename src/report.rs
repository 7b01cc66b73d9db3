//! Report assembly and Markdown rendering.
//!
//! Two reports exist. The alignment report sets a culture profile against a
//! leadership profile: a respondent sees their own pair, while an
//! administrator sees the consolidated culture against one respondent's
//! leadership. The consolidated report summarizes every stored response.

use serde::Serialize;
use tracing::warn;

use crate::analysis::{AlignmentStatus, AnalysisError, AnalysisRequest, NarrativeAnalyst};
use crate::consolidation::{consolidate_responses, dominant_quadrant, ranked_quadrants};
use crate::quadrant::{Quadrant, ScoreSet};
use crate::response::{Response, UserId};

pub const DEFAULT_REPORT_TITLE: &str = "Relatório de Análise";

/// One axis of a radar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarPoint {
    pub quadrant: Quadrant,
    pub label: &'static str,
    /// Rounded to two decimals.
    pub score: f64,
    pub color: &'static str,
}

pub fn radar_series(scores: &ScoreSet) -> Vec<RadarPoint> {
    scores
        .rounded()
        .iter()
        .map(|(quadrant, score)| RadarPoint {
            quadrant,
            label: quadrant.label(),
            score,
            color: quadrant.color(),
        })
        .collect()
}

/// Analysis text, or the message to show in its place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Ready(String),
    Failed(String),
}

impl AnalysisOutcome {
    /// Configuration errors abort the whole report; anything else is shown
    /// inline where the analysis would have been.
    pub fn from_result(result: Result<String, AnalysisError>) -> Result<Self, AnalysisError> {
        match result {
            Ok(text) => Ok(AnalysisOutcome::Ready(text)),
            Err(err @ AnalysisError::Configuration(_)) => Err(err),
            Err(err) => {
                warn!(error = %err, "analysis unavailable");
                Ok(AnalysisOutcome::Failed(err.to_string()))
            }
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Ready(text) => Some(text),
            AnalysisOutcome::Failed(_) => None,
        }
    }

    /// What goes on screen: the analysis, or the error shown in its place.
    pub fn message(&self) -> &str {
        match self {
            AnalysisOutcome::Ready(text) | AnalysisOutcome::Failed(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSubject {
    pub user_id: UserId,
    pub full_name: String,
    pub position: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignmentReport {
    pub title: String,
    pub subject: Option<ReportSubject>,
    pub culture: Vec<RadarPoint>,
    pub leadership: Vec<RadarPoint>,
    pub dominant_culture: Quadrant,
    pub dominant_leadership: Quadrant,
    pub leadership_ranking: [Quadrant; 4],
    /// Consolidated culture analysis shown alongside an admin's view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub culture_analysis: Option<String>,
    pub leadership_analysis: AnalysisOutcome,
    pub cross_analysis: AnalysisOutcome,
    pub alignment: Option<AlignmentStatus>,
    pub fingerprint: String,
}

/// Inputs of an alignment report.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentInput<'a> {
    pub title: &'a str,
    pub culture: &'a ScoreSet,
    pub leadership: &'a ScoreSet,
    pub subject: Option<&'a Response>,
    pub culture_analysis: Option<&'a str>,
}

impl<'a> AlignmentInput<'a> {
    /// A respondent's own report.
    pub fn own(response: &'a Response) -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE,
            culture: &response.cvf_scores,
            leadership: &response.cvcq_scores,
            subject: Some(response),
            culture_analysis: None,
        }
    }

    /// Administrator view: consolidated culture against one respondent.
    pub fn against_consolidated(
        title: &'a str,
        consolidated: &'a ScoreSet,
        response: &'a Response,
        culture_analysis: Option<&'a str>,
    ) -> Self {
        Self {
            title,
            culture: consolidated,
            leadership: &response.cvcq_scores,
            subject: Some(response),
            culture_analysis,
        }
    }
}

pub fn alignment_title(response: &Response) -> String {
    format!("Análise de Alinhamento: {}", response.full_name)
}

pub async fn build_alignment_report(
    analyst: &dyn NarrativeAnalyst,
    input: AlignmentInput<'_>,
) -> Result<AlignmentReport, AnalysisError> {
    let (leadership, cross) = tokio::join!(
        analyst.analyze(AnalysisRequest::CvcqSummary(*input.leadership)),
        analyst.analyze(AnalysisRequest::CrossAlignment {
            culture: *input.culture,
            leadership: *input.leadership,
        }),
    );
    let leadership_analysis = AnalysisOutcome::from_result(leadership)?;
    let cross_analysis = AnalysisOutcome::from_result(cross)?;
    let alignment = cross_analysis.text().and_then(AlignmentStatus::parse);

    Ok(AlignmentReport {
        title: input.title.to_string(),
        subject: input.subject.map(|r| ReportSubject {
            user_id: r.user_id.clone(),
            full_name: r.full_name.clone(),
            position: r.position.clone(),
        }),
        culture: radar_series(input.culture),
        leadership: radar_series(input.leadership),
        dominant_culture: dominant_quadrant(input.culture),
        dominant_leadership: dominant_quadrant(input.leadership),
        leadership_ranking: ranked_quadrants(input.leadership),
        culture_analysis: input.culture_analysis.map(str::to_string),
        leadership_analysis,
        cross_analysis,
        alignment,
        fingerprint: fingerprint(input.culture, input.leadership, input.subject),
    })
}

fn fingerprint(culture: &ScoreSet, leadership: &ScoreSet, subject: Option<&Response>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(&(culture, leadership)).unwrap_or_default());
    if let Some(response) = subject {
        hasher.update(b"|");
        hasher.update(response.fingerprint().as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// One line of the administrator's response list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    pub user_id: UserId,
    pub full_name: String,
    pub position: String,
    pub username: String,
    /// Dominant quadrant of the respondent's leadership scores.
    pub leadership_profile: Quadrant,
}

pub fn summarize_responses(responses: &[Response]) -> Vec<ResponseSummary> {
    responses
        .iter()
        .map(|r| ResponseSummary {
            user_id: r.user_id.clone(),
            full_name: r.full_name.clone(),
            position: r.position.clone(),
            username: r.username.clone(),
            leadership_profile: dominant_quadrant(&r.cvcq_scores),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedReport {
    pub respondents: usize,
    /// `None` until at least one response exists.
    pub culture: Option<Vec<RadarPoint>>,
    pub dominant_culture: Option<Quadrant>,
    pub culture_analysis: Option<AnalysisOutcome>,
    pub responses: Vec<ResponseSummary>,
}

/// Consolidate `responses` and, when there is anything to consolidate and
/// an analyst is given, ask for a culture summary.
pub async fn build_consolidated_report(
    analyst: Option<&dyn NarrativeAnalyst>,
    responses: &[Response],
) -> Result<ConsolidatedReport, AnalysisError> {
    let consolidated = consolidate_responses(responses);
    let culture_analysis = match (consolidated.scores, analyst) {
        (Some(scores), Some(analyst)) => Some(AnalysisOutcome::from_result(
            analyst.analyze(AnalysisRequest::CvfSummary(scores)).await,
        )?),
        _ => None,
    };
    Ok(ConsolidatedReport {
        respondents: consolidated.respondents,
        culture: consolidated.scores.as_ref().map(radar_series),
        dominant_culture: consolidated.scores.as_ref().map(dominant_quadrant),
        culture_analysis,
        responses: summarize_responses(responses),
    })
}

fn push_series(out: &mut String, series: &[RadarPoint]) {
    out.push_str("| Quadrante | Pontuação |\n|---|---|\n");
    for point in series {
        out.push_str(&format!("| {} | {:.2} |\n", point.label, point.score));
    }
}

fn push_analysis(out: &mut String, heading: &str, outcome: &AnalysisOutcome) {
    out.push_str(&format!("\n## {heading}\n\n"));
    match outcome {
        AnalysisOutcome::Ready(text) => out.push_str(text.trim()),
        AnalysisOutcome::Failed(msg) => out.push_str(&format!("> {msg}")),
    }
    out.push('\n');
}

pub fn render_alignment_markdown(report: &AlignmentReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", report.title));
    if let Some(subject) = &report.subject {
        out.push_str(&format!(
            "- Respondente: {} ({})\n",
            subject.full_name, subject.position
        ));
    }
    out.push_str(&format!(
        "- Cultura dominante: {}\n",
        report.dominant_culture.label()
    ));
    out.push_str(&format!(
        "- Liderança dominante: {}\n",
        report.dominant_leadership.label()
    ));
    if let Some(status) = report.alignment {
        out.push_str(&format!("- Alinhamento: **{}**\n", status.label()));
    }
    out.push_str(&format!("- Fingerprint: `{}`\n", report.fingerprint));

    out.push_str("\n## Cultura (CVF)\n\n");
    push_series(&mut out, &report.culture);
    if let Some(text) = &report.culture_analysis {
        out.push('\n');
        out.push_str(text.trim());
        out.push('\n');
    }

    out.push_str("\n## Liderança (CVCQ)\n\n");
    push_series(&mut out, &report.leadership);

    push_analysis(&mut out, "Análise de Competências", &report.leadership_analysis);
    push_analysis(&mut out, "Análise de Alinhamento", &report.cross_analysis);
    out
}

pub fn render_consolidated_markdown(report: &ConsolidatedReport) -> String {
    let mut out = String::new();
    out.push_str("# Painel do Administrador\n\n");

    match (&report.culture, report.dominant_culture) {
        (Some(series), Some(dominant)) => {
            out.push_str(&format!(
                "## Cultura Consolidada (Média CVF - {} Respostas)\n\n",
                report.respondents
            ));
            out.push_str(&format!("- Cultura dominante: {}\n\n", dominant.label()));
            push_series(&mut out, series);
            if let Some(outcome) = &report.culture_analysis {
                push_analysis(&mut out, "Análise da Cultura", outcome);
            }
        }
        _ => out.push_str("Nenhuma resposta foi registrada ainda.\n"),
    }

    if !report.responses.is_empty() {
        out.push_str("\n## Respostas Individuais\n\n");
        out.push_str("| Nome | Cargo | Perfil de Liderança | Id |\n|---|---|---|---|\n");
        for row in &report.responses {
            out.push_str(&format!(
                "| {} | {} | {} | `{}` |\n",
                row.full_name,
                row.position,
                row.leadership_profile.short_label(),
                row.user_id
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedAnalyst {
        cross: Result<String, AnalysisError>,
    }

    #[async_trait]
    impl NarrativeAnalyst for CannedAnalyst {
        async fn analyze(&self, request: AnalysisRequest) -> Result<String, AnalysisError> {
            match request {
                AnalysisRequest::CrossAlignment { .. } => self.cross.clone(),
                other => Ok(format!("análise {}", other.kind())),
            }
        }
    }

    fn response(id: &str, cvf: ScoreSet, cvcq: ScoreSet) -> Response {
        Response {
            user_id: UserId::new(id),
            username: format!("{id}@example.com"),
            full_name: format!("Pessoa {id}"),
            position: "Gerente".to_string(),
            cvf_scores: cvf,
            cvcq_scores: cvcq,
            submitted_at: None,
        }
    }

    #[test]
    fn radar_series_rounds_and_keeps_canonical_order() {
        let series = radar_series(&ScoreSet::new(33.33333, 33.33333, 33.33333, 0.0));
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].quadrant, Quadrant::Collaborate);
        assert_eq!(series[0].score, 33.33);
        assert_eq!(series[3].color, "#4b6a9e");
    }

    #[test]
    fn admin_list_uses_leadership_dominant() {
        let rows = summarize_responses(&[response(
            "a",
            ScoreSet::new(70.0, 10.0, 10.0, 10.0),
            ScoreSet::new(3.0, 4.0, 6.5, 5.0),
        )]);
        assert_eq!(rows[0].leadership_profile, Quadrant::Compete);
    }

    #[tokio::test]
    async fn alignment_report_parses_status_and_stamps() {
        let r = response(
            "a",
            ScoreSet::new(40.0, 20.0, 20.0, 20.0),
            ScoreSet::new(6.0, 4.0, 4.0, 5.0),
        );
        let analyst = CannedAnalyst {
            cross: Ok("**Diagnóstico de Alinhamento: Forte Alinhamento**\n\ntexto".into()),
        };
        let report = build_alignment_report(&analyst, AlignmentInput::own(&r))
            .await
            .unwrap();
        assert_eq!(report.title, DEFAULT_REPORT_TITLE);
        assert_eq!(report.alignment, Some(AlignmentStatus::Strong));
        assert_eq!(report.dominant_culture, Quadrant::Collaborate);
        assert_eq!(report.leadership_ranking[0], Quadrant::Collaborate);
        assert_eq!(report.fingerprint.len(), 64);

        let md = render_alignment_markdown(&report);
        assert!(md.contains("Alinhamento: **Forte Alinhamento**"));
        assert!(md.contains("| Clã (Colaborar) | 40.00 |"));
        assert!(md.contains("análise cvcq_summary"));
    }

    #[tokio::test]
    async fn failed_analysis_is_shown_inline() {
        let r = response("a", ScoreSet::uniform(25.0), ScoreSet::uniform(4.0));
        let analyst = CannedAnalyst {
            cross: Err(AnalysisError::Authentication("chave inválida".into())),
        };
        let report = build_alignment_report(&analyst, AlignmentInput::own(&r))
            .await
            .unwrap();
        assert!(matches!(report.cross_analysis, AnalysisOutcome::Failed(_)));
        assert!(report.cross_analysis.text().is_none());
        assert!(report
            .cross_analysis
            .message()
            .starts_with("Erro de Autenticação"));
        assert_eq!(report.alignment, None);
        assert!(render_alignment_markdown(&report).contains("> Erro de Autenticação"));
    }

    #[tokio::test]
    async fn configuration_error_aborts_the_report() {
        let r = response("a", ScoreSet::uniform(25.0), ScoreSet::uniform(4.0));
        let analyst = CannedAnalyst {
            cross: Err(AnalysisError::Configuration("sem chave".into())),
        };
        let err = build_alignment_report(&analyst, AlignmentInput::own(&r))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[tokio::test]
    async fn admin_view_sets_consolidated_culture_against_one_leader() {
        let r = response(
            "b",
            ScoreSet::new(10.0, 10.0, 10.0, 70.0),
            ScoreSet::new(2.0, 7.0, 3.0, 3.0),
        );
        let consolidated = ScoreSet::new(50.0, 20.0, 15.0, 15.0);
        let title = alignment_title(&r);
        let analyst = CannedAnalyst {
            cross: Ok("**Desalinhamento Crítico**".into()),
        };
        let report = build_alignment_report(
            &analyst,
            AlignmentInput::against_consolidated(&title, &consolidated, &r, Some("cultura média")),
        )
        .await
        .unwrap();
        assert_eq!(report.title, "Análise de Alinhamento: Pessoa b");
        assert_eq!(report.dominant_culture, Quadrant::Collaborate);
        assert_eq!(report.dominant_leadership, Quadrant::Create);
        assert_eq!(report.alignment, Some(AlignmentStatus::Critical));
        assert_eq!(report.culture_analysis.as_deref(), Some("cultura média"));
    }

    #[tokio::test]
    async fn empty_consolidated_report_has_no_culture() {
        let analyst = CannedAnalyst {
            cross: Ok(String::new()),
        };
        let report = build_consolidated_report(Some(&analyst), &[]).await.unwrap();
        assert_eq!(report.respondents, 0);
        assert!(report.culture.is_none());
        assert!(report.culture_analysis.is_none());
        assert!(render_consolidated_markdown(&report).contains("Nenhuma resposta"));
    }

    #[tokio::test]
    async fn consolidated_report_averages_and_lists() {
        let responses = vec![
            response("a", ScoreSet::new(50.0, 10.0, 20.0, 20.0), ScoreSet::uniform(4.0)),
            response("b", ScoreSet::new(30.0, 30.0, 20.0, 20.0), ScoreSet::uniform(5.0)),
        ];
        let analyst = CannedAnalyst {
            cross: Ok(String::new()),
        };
        let report = build_consolidated_report(Some(&analyst), &responses)
            .await
            .unwrap();
        assert_eq!(report.respondents, 2);
        assert_eq!(report.dominant_culture, Some(Quadrant::Collaborate));
        assert_eq!(report.culture.as_ref().unwrap()[0].score, 40.0);
        assert_eq!(
            report.culture_analysis,
            Some(AnalysisOutcome::Ready("análise cvf_summary".into()))
        );
        let md = render_consolidated_markdown(&report);
        assert!(md.contains("Média CVF - 2 Respostas"));
        assert!(md.contains("Pessoa b"));
    }

    #[tokio::test]
    async fn consolidated_report_without_analyst_skips_summary() {
        let responses = vec![response("a", ScoreSet::uniform(25.0), ScoreSet::uniform(4.0))];
        let report = build_consolidated_report(None, &responses).await.unwrap();
        assert_eq!(report.respondents, 1);
        assert!(report.culture_analysis.is_none());
        assert!(!render_consolidated_markdown(&report).contains("Análise da Cultura"));
    }
}
