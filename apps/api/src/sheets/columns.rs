// Fixed candidate-sheet layout. Column order is shared by the header row,
// appended candidate rows and the analysis cell updates.

pub const HEADERS: [&str; 14] = [
    "Nome do Candidato",
    "Email",
    "Telefone",
    "Cargo Desejado",
    "Experiência (anos)",
    "Formação",
    "Idiomas",
    "Habilidades Principais",
    "Link do Currículo",
    "ID do Arquivo",
    "Status da Análise",
    "Pontuação Final",
    "Data de Inclusão",
    "Análise da IA",
];

pub const HEADER_RANGE: &str = "A1:N1";

/// Column widths in characters, one per header.
const COLUMN_WIDTHS_CHARS: [u32; 14] = [20, 25, 15, 20, 15, 20, 15, 30, 40, 30, 15, 15, 15, 50];

const PIXELS_PER_CHAR: u32 = 7;

pub const STATUS_COLUMN: &str = "K";
pub const SCORE_COLUMN: &str = "L";
pub const AI_ANALYSIS_COLUMN: &str = "N";

pub fn header_row() -> Vec<String> {
    HEADERS.iter().map(|h| h.to_string()).collect()
}

pub fn column_widths_px() -> Vec<u32> {
    COLUMN_WIDTHS_CHARS
        .iter()
        .map(|w| w * PIXELS_PER_CHAR)
        .collect()
}

/// 1-based row number → A1 cell reference in the given column.
pub fn cell(column: &str, row: usize) -> String {
    format!("{column}{row}")
}
