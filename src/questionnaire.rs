//! The fixed question sets of both instruments.
//!
//! CVF questions list one statement per quadrant (canonical order); the
//! respondent spreads 100 points across them. CVCQ questions each describe
//! one leadership role and are rated 1 to 7.

use serde::Serialize;

use crate::quadrant::Quadrant;

/// Lowest CVCQ rating.
pub const RATING_MIN: u8 = 1;
/// Highest CVCQ rating.
pub const RATING_MAX: u8 = 7;
/// Points distributed across the four options of one CVF question.
pub const ALLOCATION_TOTAL: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CvfQuestion {
    pub title: &'static str,
    /// Statements in canonical quadrant order.
    pub options: [&'static str; 4],
}

impl CvfQuestion {
    pub fn option(&self, quadrant: Quadrant) -> &'static str {
        self.options[quadrant.index()]
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CvcqQuestion {
    pub role: &'static str,
    pub quadrant: Quadrant,
    pub label: &'static str,
}

pub const CVF_QUESTIONS: &[CvfQuestion] = &[
    CvfQuestion {
        title: "Características Dominantes da Empresa",
        options: [
            "Um lugar muito pessoal, como uma grande família.",
            "Um lugar dinâmico e empreendedor, com foco em inovação.",
            "Um lugar orientado a resultados, focado em alta competitividade.",
            "Um lugar muito estruturado e formal, com foco em procedimentos.",
        ],
    },
    CvfQuestion {
        title: "Estilo de Liderança Organizacional",
        options: [
            "A liderança é considerada mentora e facilitadora.",
            "A liderança é considerada inovadora e assumidora de riscos.",
            "A liderança é considerada dura, competitiva e exigente.",
            "A liderança é considerada coordenadora e orientada para a eficiência.",
        ],
    },
    CvfQuestion {
        title: "Gestão de Funcionários",
        options: [
            "Ênfase no desenvolvimento de talentos e no compromisso.",
            "Ênfase em assumir riscos e buscar desafios.",
            "Ênfase em metas e desempenho competitivo.",
            "Ênfase em segurança no trabalho e estabilidade.",
        ],
    },
    CvfQuestion {
        title: "O que une a Empresa",
        options: [
            "A lealdade e a tradição. O compromisso é elevado.",
            "O compromisso com a inovação e o desenvolvimento.",
            "O desejo de vencer e o foco na concorrência.",
            "Regras e políticas formais. A manutenção do sistema.",
        ],
    },
    CvfQuestion {
        title: "Ênfases Estratégicas",
        options: [
            "Foco no desenvolvimento humano e no bem-estar.",
            "Foco em diferenciação, agilidade e inovação.",
            "Foco em ações competitivas e domínio de mercado.",
            "Foco em permanência, controle e estabilidade.",
        ],
    },
    CvfQuestion {
        title: "Critérios de Sucesso",
        options: [
            "Desenvolvimento de pessoas, trabalho em equipe e coesão.",
            "Produtos ou serviços novos, agilidade e inovação.",
            "Posição de mercado, metas e objetivos atingidos.",
            "Eficiência e controle, com operações suaves.",
        ],
    },
    CvfQuestion {
        title: "Tomada de Decisão",
        options: [
            "Baseada em consenso, participação e envolvimento da equipe.",
            "Baseada em experimentação, intuição e busca por novas soluções.",
            "Rápida e assertiva, focada em oportunidades de mercado e resultados.",
            "Cautelosa e analítica, baseada em dados e procedimentos estabelecidos.",
        ],
    },
    CvfQuestion {
        title: "Comunicação Interna",
        options: [
            "Aberta, informal e focada no diálogo e no relacionamento interpessoal.",
            "Inspiradora, visionária e focada em compartilhar novas ideias.",
            "Direta, objetiva e focada em comunicar metas e resultados.",
            "Formal, através de canais oficiais e com ênfase na documentação.",
        ],
    },
    CvfQuestion {
        title: "Recompensa e Reconhecimento",
        options: [
            "Baseado no desenvolvimento pessoal, lealdade e contribuição para a equipe.",
            "Baseado na criatividade, na geração de novas ideias e na iniciativa.",
            "Baseado no atingimento de metas agressivas e na performance individual.",
            "Baseado na estabilidade, antiguidade e no cumprimento rigoroso de regras.",
        ],
    },
    CvfQuestion {
        title: "Tratamento de Falhas",
        options: [
            "Vista como uma oportunidade de aprendizado coletivo e desenvolvimento.",
            "Vista como uma parte inevitável e necessária do processo de inovação.",
            "Vista como inaceitável, com foco na identificação de culpados e correção rápida.",
            "Vista como um desvio a ser prevenido através de melhores processos e controles.",
        ],
    },
    CvfQuestion {
        title: "Foco do Cliente",
        options: [
            "Foco em construir relacionamentos de longo prazo e entender as necessidades do cliente.",
            "Foco em surpreender os clientes com produtos e serviços únicos e inovadores.",
            "Foco em superar a concorrência e ganhar participação de mercado a todo custo.",
            "Foco em oferecer um serviço padronizado, confiável e consistente.",
        ],
    },
    CvfQuestion {
        title: "Ritmo e Ambiente de Trabalho",
        options: [
            "Colaborativo, amigável e com ritmo ponderado.",
            "Rápido, ágil, flexível e adaptável às mudanças.",
            "Intenso, competitivo e altamente pressionado por resultados.",
            "Metódico, previsível, estável e com processos bem definidos.",
        ],
    },
];

pub const CVCQ_QUESTIONS: &[CvcqQuestion] = &[
    CvcqQuestion {
        role: "Mentor",
        quadrant: Quadrant::Collaborate,
        label: "Capacidade de ouvir, demonstrar empatia e ajudar no desenvolvimento de outros.",
    },
    CvcqQuestion {
        role: "Facilitador",
        quadrant: Quadrant::Collaborate,
        label: "Habilidade de promover o trabalho em equipe, gerenciar conflitos e obter participação.",
    },
    CvcqQuestion {
        role: "Construtor de Equipe",
        quadrant: Quadrant::Collaborate,
        label: "Habilidade de fomentar a moral, o espírito de equipe e a coesão do grupo.",
    },
    CvcqQuestion {
        role: "Inovador",
        quadrant: Quadrant::Create,
        label: "Foco em visualizar o futuro, propor novas soluções e facilitar a mudança.",
    },
    CvcqQuestion {
        role: "Negociador",
        quadrant: Quadrant::Create,
        label: "Capacidade de representar a organização externamente e adquirir recursos.",
    },
    CvcqQuestion {
        role: "Visionário",
        quadrant: Quadrant::Create,
        label: "Capacidade de definir e articular uma visão clara e inspiradora para o futuro.",
    },
    CvcqQuestion {
        role: "Produtor",
        quadrant: Quadrant::Compete,
        label: "Orientação para a tarefa, com foco em aumentar a produtividade e alcançar metas.",
    },
    CvcqQuestion {
        role: "Diretor",
        quadrant: Quadrant::Compete,
        label: "Habilidade de planejar, definir objetivos, dar instruções decisivas e claras.",
    },
    CvcqQuestion {
        role: "Competidor",
        quadrant: Quadrant::Compete,
        label: "Mentalidade orientada para a competição, com foco em analisar o mercado e superar os concorrentes.",
    },
    CvcqQuestion {
        role: "Coordenador",
        quadrant: Quadrant::Control,
        label: "Foco em manter a estrutura, ser confiável e organizar processos.",
    },
    CvcqQuestion {
        role: "Monitor",
        quadrant: Quadrant::Control,
        label: "Habilidade de analisar dados, garantir o cumprimento de regras e monitorar o desempenho.",
    },
    CvcqQuestion {
        role: "Organizador",
        quadrant: Quadrant::Control,
        label: "Capacidade de planejar, organizar e alocar recursos de forma eficiente para executar tarefas complexas.",
    },
];

/// Number of CVCQ questions tagged with `quadrant`.
pub fn cvcq_questions_for(quadrant: Quadrant) -> usize {
    CVCQ_QUESTIONS
        .iter()
        .filter(|q| q.quadrant == quadrant)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_sets_have_expected_sizes() {
        assert_eq!(CVF_QUESTIONS.len(), 12);
        assert_eq!(CVCQ_QUESTIONS.len(), 12);
    }

    #[test]
    fn every_quadrant_has_leadership_roles() {
        for q in Quadrant::ALL {
            assert_eq!(cvcq_questions_for(q), 3, "{q}");
        }
    }

    #[test]
    fn cvf_options_are_indexed_by_quadrant() {
        let first = &CVF_QUESTIONS[0];
        assert!(first.option(Quadrant::Collaborate).contains("família"));
        assert!(first.option(Quadrant::Control).contains("estruturado"));
    }
}
