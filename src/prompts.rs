//! Prompt templates for the narrative analyses.
//!
//! Each analysis kind has one template with `{cvf_scores}` and/or
//! `{cvcq_scores}` placeholders, filled with one line per quadrant.

use crate::gateway::Message;
use crate::quadrant::ScoreSet;

/// Rendered prompt ready for the gateway.
#[derive(Debug, Clone)]
pub struct PromptInstance {
    pub template_slug: String,
    pub system: String,
    pub user: String,
}

impl PromptInstance {
    pub fn to_messages(&self) -> Vec<Message> {
        vec![Message::system(&self.system), Message::user(&self.user)]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub slug: &'static str,
    pub system: &'static str,
    pub user: &'static str,
}

impl PromptTemplate {
    /// Fill the placeholders. A template ignores score sets it does not use.
    pub fn render(&self, cvf: Option<&ScoreSet>, cvcq: Option<&ScoreSet>) -> PromptInstance {
        let mut user = self.user.to_string();
        if let Some(scores) = cvf {
            user = user.replace("{cvf_scores}", &format_scores(scores));
        }
        if let Some(scores) = cvcq {
            user = user.replace("{cvcq_scores}", &format_scores(scores));
        }
        PromptInstance {
            template_slug: self.slug.to_string(),
            system: self.system.trim().to_string(),
            user: user.trim().to_string(),
        }
    }
}

/// One `- Label: 12.34` line per quadrant, in canonical order.
pub fn format_scores(scores: &ScoreSet) -> String {
    scores
        .iter()
        .map(|(q, v)| format!("- {}: {:.2}", q.label(), v))
        .collect::<Vec<_>>()
        .join("\n")
}

pub const CVF_PROMPT: PromptTemplate = PromptTemplate {
    slug: "cvf_summary_v1",
    system: r#"Você é um especialista em gestão organizacional e cultura empresarial, com profundo conhecimento da metodologia Competing Values Framework (CVF)."#,
    user: r#"Analise os seguintes resultados de um questionário CVF. A pontuação varia de 0 a 100.

Resultados da Cultura (CVF):
{cvf_scores}

Responda ESTRITAMENTE no seguinte formato, sem usar numeração:

**Cultura Predominante:**
Identifique a cultura com a maior pontuação.

**Características Principais:**
* Liste em 3 a 4 bullet points as características mais marcantes desta cultura.

**Análise Crítica:**
Em um único parágrafo curto, explique a principal implicação prática (ponto forte ou desafio) desta cultura para a empresa.

Seja direto e foque nos insights mais importantes."#,
};

pub const CVCQ_PROMPT: PromptTemplate = PromptTemplate {
    slug: "cvcq_summary_v1",
    system: r#"Você é um especialista em desenvolvimento de liderança e coach executivo."#,
    user: r#"Analise os seguintes resultados de uma autoavaliação de competências de liderança (CVCQ), baseada nos papéis do Mentor, Facilitador (Clã), Inovador, Negociador (Adhocracia), Produtor, Diretor (Mercado), Coordenador e Monitor (Hierarquia). A pontuação é uma média de 1 (Baixa Competência) a 7 (Alta Competência).

Resultados das Competências de Liderança (CVCQ):
{cvcq_scores}

Responda ESTRITAMENTE no seguinte formato, sem usar numeração:

**Ranking de Competências:**
* Liste os quadrantes do maior para o menor em pontuação, no formato `**Nome do Quadrante** (Pontuação: X.XX) - Descrição.`

**Resumo do Perfil de Liderança:**
Em um único parágrafo curto, descreva o estilo de liderança predominante que emerge desses resultados."#,
};

pub const CROSS_PROMPT: PromptTemplate = PromptTemplate {
    slug: "cross_alignment_v1",
    system: r#"Você é um consultor sênior de estratégia e gestão, especialista em alinhar cultura (CVF) e liderança (CVCQ)."#,
    user: r#"Resultados da Cultura (CVF - escala 0 a 100):
{cvf_scores}
Resultados das Competências de Liderança (CVCQ - escala 1 a 7):
{cvcq_scores}

Faça uma análise de alinhamento direta e acionável. Responda ESTRITAMENTE no seguinte formato:

**Diagnóstico de Alinhamento: [STATUS]**
Onde [STATUS] é uma das opções: Forte Alinhamento, Alinhamento Parcial com Pontos de Atenção, ou Desalinhamento Crítico. O status fica na mesma linha do título, dentro do negrito.

**Pontos Fortes e Sinergias**
* 2 ou 3 bullet points onde a liderança reforça a cultura atual.

**Pontos Fracos e Riscos**
* 2 ou 3 bullet points de desalinhamento ou atrito entre liderança e cultura.

**Recomendações para Alinhamento**
* 2 a 3 recomendações acionáveis."#,
};

pub const PROMPTS: &[PromptTemplate] = &[CVF_PROMPT, CVCQ_PROMPT, CROSS_PROMPT];

pub fn prompt_by_slug(slug: &str) -> Option<PromptTemplate> {
    PROMPTS.iter().find(|t| t.slug == slug).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_are_listed_with_labels_and_two_decimals() {
        let text = format_scores(&ScoreSet::new(40.0, 20.125, 19.875, 20.0));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "- Clã (Colaborar): 40.00");
        assert!(lines[1].starts_with("- Adhocracia (Criar): 20.1"));
        assert_eq!(lines[3], "- Hierarquia (Controlar): 20.00");
    }

    #[test]
    fn cross_prompt_fills_both_sets() {
        let p = CROSS_PROMPT.render(
            Some(&ScoreSet::uniform(25.0)),
            Some(&ScoreSet::uniform(4.0)),
        );
        assert!(!p.user.contains('{'));
        assert!(p.user.contains("25.00"));
        assert!(p.user.contains("4.00"));
        assert!(p.user.contains("**Diagnóstico de Alinhamento: [STATUS]**"));
        assert_eq!(p.to_messages().len(), 2);
    }

    #[test]
    fn single_set_prompts_only_use_their_placeholder() {
        let p = CVF_PROMPT.render(Some(&ScoreSet::uniform(25.0)), None);
        assert!(!p.user.contains("{cvf_scores}"));
        let p = CVCQ_PROMPT.render(None, Some(&ScoreSet::uniform(5.5)));
        assert!(p.user.contains("5.50"));
    }

    #[test]
    fn prompt_lookup() {
        assert!(prompt_by_slug("cross_alignment_v1").is_some());
        assert!(prompt_by_slug("canonical_v2").is_none());
    }
}
