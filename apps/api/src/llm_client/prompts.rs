// Prompt fragments shared by every criteria prompt.

/// System prompt: recruiter persona plus JSON-only output.
pub const RECRUITER_JSON_SYSTEM: &str = "Você é um especialista em recrutamento e seleção. \
    Responda SOMENTE com JSON válido, sem texto fora do objeto JSON, \
    sem blocos de código markdown e sem explicações.";

/// Job-description block appended to every criteria prompt.
/// Replace: {job_name}, {main_activities}, {prerequisites}, {differentials}
pub const JOB_CONTEXT_TEMPLATE: &str = r#"VAGA: {job_name}

ATIVIDADES PRINCIPAIS:
{main_activities}

PRÉ-REQUISITOS:
{prerequisites}

DIFERENCIAIS:
{differentials}"#;
