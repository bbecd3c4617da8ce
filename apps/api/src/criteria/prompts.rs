// Prompt templates for the four criteria calls.
// Each template ends with the job context block from llm_client::prompts.

pub const COMPETENCE_PROMPT: &str = r#"Liste as competências comportamentais e técnicas essenciais para a vaga abaixo.

Retorne um objeto JSON neste formato EXATO:
{"items": ["Competência 1", "Competência 2"]}

Regras:
- Entre 5 e 10 competências
- Cada item é uma frase curta, sem numeração

{job_context}"#;

pub const STRATEGIES_PROMPT: &str = r#"Proponha estratégias de triagem para identificar os melhores candidatos à vaga abaixo.

Retorne um objeto JSON neste formato EXATO:
{"items": ["Estratégia 1", "Estratégia 2"]}

Regras:
- Entre 3 e 6 estratégias
- Cada estratégia deve ser acionável por um recrutador

{job_context}"#;

pub const QUALIFICATION_PROMPT: &str = r#"Elabore perguntas de qualificação para avaliar currículos e entrevistas da vaga abaixo.

Retorne um objeto JSON neste formato EXATO:
{"items": ["Pergunta 1", "Pergunta 2"]}

Regras:
- Entre 5 e 10 perguntas
- Cubra os pré-requisitos e os diferenciais

{job_context}"#;

/// Replace: {qualifications_json}, {job_context}
pub const SCORE_PROMPT: &str = r#"Atribua uma pontuação a cada qualificação abaixo de acordo com sua importância para a vaga.

QUALIFICAÇÕES:
{qualifications_json}

Retorne um objeto JSON neste formato EXATO:
{"criteria": [{"qualification": "Texto da qualificação", "weight": 20}]}

Regras:
- Uma entrada por qualificação, com o mesmo texto
- "weight" é um inteiro; a soma dos pesos deve ser 100

{job_context}"#;
