//! In-memory fakes for the external services, shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::criteria::{CriteriaGenerator, JobDescription};
use crate::errors::AppError;
use crate::models::job::ScoreCriterion;
use crate::sheets::{CreationContext, SheetsError, Spreadsheet, SpreadsheetService, Worksheet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(String),
    Create(CreationContext),
    Share(String),
    UpdateValues(String),
    FormatHeader,
    AppendRow,
    GetAllValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBehavior {
    Succeed,
    Quota,
    Reject,
    AuthFailure,
}

#[derive(Debug, Clone)]
pub struct FakeSheet {
    pub id: String,
    pub rows: Vec<Vec<String>>,
    pub context: CreationContext,
}

#[derive(Default)]
struct FakeState {
    sheets: HashMap<String, FakeSheet>,
    create: HashMap<CreationContext, CreateBehavior>,
    calls: Vec<Call>,
    fail_share: bool,
    fail_format: bool,
    append_reports_zero: bool,
}

pub struct FakeSpreadsheetService {
    state: Mutex<FakeState>,
}

impl FakeSpreadsheetService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn add_sheet(&self, name: &str, rows: Vec<Vec<String>>) {
        let mut state = self.state.lock().unwrap();
        let id = format!("sheet-{}", state.sheets.len() + 1);
        state.sheets.insert(
            name.to_string(),
            FakeSheet {
                id,
                rows,
                context: CreationContext::ServiceAccount,
            },
        );
    }

    pub fn set_create_behavior(&self, context: CreationContext, behavior: CreateBehavior) {
        self.state.lock().unwrap().create.insert(context, behavior);
    }

    pub fn fail_share(&self) {
        self.state.lock().unwrap().fail_share = true;
    }

    pub fn fail_format(&self) {
        self.state.lock().unwrap().fail_format = true;
    }

    pub fn append_reports_zero_rows(&self) {
        self.state.lock().unwrap().append_reports_zero = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn sheet(&self, name: &str) -> Option<FakeSheet> {
        self.state.lock().unwrap().sheets.get(name).cloned()
    }

    fn handle(name: &str, sheet: &FakeSheet) -> Spreadsheet {
        Spreadsheet {
            id: sheet.id.clone(),
            name: name.to_string(),
            url: format!("https://docs.google.com/spreadsheets/d/{}", sheet.id),
            worksheet: Worksheet {
                id: 0,
                title: "Sheet1".to_string(),
            },
            context: sheet.context,
        }
    }
}

/// Splits a start cell such as `K12` into (0-based column, 0-based row).
fn parse_cell(a1: &str) -> (usize, usize) {
    let start = a1.split(':').next().unwrap_or(a1);
    let letters: String = start.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = start.chars().skip_while(|c| c.is_ascii_alphabetic()).collect();
    let col = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b.to_ascii_uppercase() - b'A' + 1) as usize)
        - 1;
    let row = digits.parse::<usize>().unwrap_or(1) - 1;
    (col, row)
}

#[async_trait]
impl SpreadsheetService for FakeSpreadsheetService {
    async fn open(&self, name: &str) -> Result<Spreadsheet, SheetsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Open(name.to_string()));
        state
            .sheets
            .get(name)
            .map(|s| Self::handle(name, s))
            .ok_or_else(|| SheetsError::NotFound(name.to_string()))
    }

    async fn create(
        &self,
        name: &str,
        context: CreationContext,
    ) -> Result<Spreadsheet, SheetsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(context));
        match state.create.get(&context).copied().unwrap_or(CreateBehavior::Succeed) {
            CreateBehavior::Succeed => {
                let sheet = FakeSheet {
                    id: format!("sheet-{}", state.sheets.len() + 1),
                    rows: vec![],
                    context,
                };
                let handle = Self::handle(name, &sheet);
                state.sheets.insert(name.to_string(), sheet);
                Ok(handle)
            }
            CreateBehavior::Quota => Err(SheetsError::QuotaExceeded(
                "The user's Drive storage quota has been exceeded.".to_string(),
            )),
            CreateBehavior::Reject => Err(SheetsError::Rejected {
                status: 403,
                message: "The caller does not have permission".to_string(),
            }),
            CreateBehavior::AuthFailure => {
                Err(SheetsError::Auth("invalid_grant".to_string()))
            }
        }
    }

    async fn share(&self, _sheet: &Spreadsheet, email: &str) -> Result<(), SheetsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Share(email.to_string()));
        if state.fail_share {
            return Err(SheetsError::Rejected {
                status: 400,
                message: "sharing disabled".to_string(),
            });
        }
        Ok(())
    }

    async fn update_values(
        &self,
        sheet: &Spreadsheet,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), SheetsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UpdateValues(range.to_string()));
        let target = state
            .sheets
            .get_mut(&sheet.name)
            .ok_or_else(|| SheetsError::NotFound(sheet.name.clone()))?;
        let (col, row) = parse_cell(range);
        for (offset, values) in rows.into_iter().enumerate() {
            let r = row + offset;
            if target.rows.len() <= r {
                target.rows.resize(r + 1, Vec::new());
            }
            let cells = &mut target.rows[r];
            if cells.len() < col + values.len() {
                cells.resize(col + values.len(), String::new());
            }
            for (i, v) in values.into_iter().enumerate() {
                cells[col + i] = v;
            }
        }
        Ok(())
    }

    async fn format_header(
        &self,
        _sheet: &Spreadsheet,
        _column_widths: &[u32],
    ) -> Result<(), SheetsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FormatHeader);
        if state.fail_format {
            return Err(SheetsError::Rejected {
                status: 400,
                message: "formatting unsupported".to_string(),
            });
        }
        Ok(())
    }

    async fn append_row(
        &self,
        sheet: &Spreadsheet,
        row: Vec<String>,
    ) -> Result<Option<u32>, SheetsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::AppendRow);
        if state.append_reports_zero {
            return Ok(Some(0));
        }
        let target = state
            .sheets
            .get_mut(&sheet.name)
            .ok_or_else(|| SheetsError::NotFound(sheet.name.clone()))?;
        target.rows.push(row);
        Ok(Some(1))
    }

    async fn get_all_values(&self, sheet: &Spreadsheet) -> Result<Vec<Vec<String>>, SheetsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetAllValues);
        state
            .sheets
            .get(&sheet.name)
            .map(|s| s.rows.clone())
            .ok_or_else(|| SheetsError::NotFound(sheet.name.clone()))
    }
}

/// Returns canned criteria and counts how often it was asked.
pub struct FakeCriteriaGenerator {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeCriteriaGenerator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Llm("model unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CriteriaGenerator for FakeCriteriaGenerator {
    async fn create_competence(&self, _job: &JobDescription) -> Result<Vec<String>, AppError> {
        self.record()?;
        Ok(vec!["Systems thinking".to_string(), "Ownership".to_string()])
    }

    async fn create_strategies(&self, _job: &JobDescription) -> Result<Vec<String>, AppError> {
        self.record()?;
        Ok(vec!["Screen for production Rust experience".to_string()])
    }

    async fn create_qualification(&self, _job: &JobDescription) -> Result<Vec<String>, AppError> {
        self.record()?;
        Ok(vec!["Describe a service you operated".to_string()])
    }

    async fn score_competence(
        &self,
        _job: &JobDescription,
        qualifications: &[String],
    ) -> Result<Vec<ScoreCriterion>, AppError> {
        self.record()?;
        Ok(qualifications
            .iter()
            .map(|q| ScoreCriterion {
                qualification: q.clone(),
                weight: 10,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_handles_ranges_and_single_cells() {
        assert_eq!(parse_cell("A1:N1"), (0, 0));
        assert_eq!(parse_cell("K12"), (10, 11));
        assert_eq!(parse_cell("AA3"), (26, 2));
    }
}
