//! Google Sheets v4 + Drive v3 backend for `SpreadsheetService`.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::sheets::auth::{ServiceAccountKey, TokenProvider};
use crate::sheets::columns::HEADERS;
use crate::sheets::{CreationContext, SheetsError, Spreadsheet, SpreadsheetService, Worksheet};

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const SPREADSHEET_FIELDS: &str =
    "spreadsheetId,spreadsheetUrl,properties.title,sheets.properties(sheetId,title)";

/// Structured error reasons the APIs use for storage and rate quotas.
const QUOTA_REASONS: [&str; 5] = [
    "storagequotaexceeded",
    "quotaexceeded",
    "userratelimitexceeded",
    "ratelimitexceeded",
    "rate_limit_exceeded",
];

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorReason>,
    #[serde(default)]
    details: Vec<ApiErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorReason {
    #[serde(default)]
    reason: Option<String>,
}

/// Turns a non-2xx response into a typed error from the structured error body.
pub(crate) fn classify_error(status: u16, body: &str) -> SheetsError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|p| p.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    let quota = status == 429
        || parsed.as_ref().is_some_and(|p| {
            p.error.status.as_deref() == Some("RESOURCE_EXHAUSTED")
                || p.error
                    .errors
                    .iter()
                    .chain(p.error.details.iter())
                    .filter_map(|r| r.reason.as_deref())
                    .any(|r| QUOTA_REASONS.contains(&r.to_ascii_lowercase().as_str()))
        });

    if quota {
        SheetsError::QuotaExceeded(message)
    } else if status == 401 {
        SheetsError::Auth(message)
    } else {
        SheetsError::Rejected { status, message }
    }
}

async fn check(response: Response) -> Result<Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_error(status.as_u16(), &body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetResource {
    spreadsheet_id: String,
    spreadsheet_url: String,
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetResource>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetResource {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl SpreadsheetResource {
    fn into_spreadsheet(self, context: CreationContext) -> Result<Spreadsheet, SheetsError> {
        let first = self.sheets.into_iter().next().ok_or_else(|| SheetsError::Rejected {
            status: 200,
            message: format!("spreadsheet {} has no worksheets", self.spreadsheet_id),
        })?;
        Ok(Spreadsheet {
            id: self.spreadsheet_id,
            name: self.properties.title,
            url: self.spreadsheet_url,
            worksheet: Worksheet {
                id: first.properties.sheet_id,
                title: first.properties.title,
            },
            context,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    updated_rows: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Escapes a literal for a Drive `q` expression.
fn drive_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Runs `lookup` under each context in order and returns the first hit.
/// A failure in a context that falls back is logged and the next context is tried.
async fn first_found<T, F, Fut>(
    contexts: &[CreationContext],
    mut lookup: F,
) -> Result<Option<T>, SheetsError>
where
    F: FnMut(CreationContext) -> Fut,
    Fut: Future<Output = Result<Option<T>, SheetsError>>,
{
    for &context in contexts {
        match lookup(context).await {
            Ok(Some(found)) => return Ok(Some(found)),
            Ok(None) => {}
            Err(e) if context.falls_back() => {
                warn!("Lookup as {context:?} failed, trying next context: {e}");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

pub struct GoogleSheetsClient {
    http: Client,
    auth: TokenProvider,
    delegated_user: Option<String>,
}

impl GoogleSheetsClient {
    pub fn from_key_file(path: &str, delegated_user: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        let key = ServiceAccountKey::from_file(path)?;
        info!("Loaded service account {}", key.client_email);
        let auth = TokenProvider::new(http.clone(), key)?;
        Ok(Self {
            http,
            auth,
            delegated_user,
        })
    }

    /// Identities `open` searches, most specific first.
    fn lookup_contexts(&self) -> Vec<CreationContext> {
        match self.delegated_user {
            Some(_) => vec![CreationContext::User, CreationContext::ServiceAccount],
            None => vec![CreationContext::ServiceAccount],
        }
    }

    async fn authorized(
        &self,
        builder: RequestBuilder,
        context: CreationContext,
    ) -> Result<RequestBuilder, SheetsError> {
        let subject = match context {
            CreationContext::ServiceAccount => None,
            CreationContext::User => Some(self.delegated_user.as_deref().ok_or_else(|| {
                SheetsError::Auth("no delegated user configured for user context".to_string())
            })?),
        };
        let token = self.auth.access_token(subject).await?;
        Ok(builder.bearer_auth(token))
    }

    async fn open_as(
        &self,
        name: &str,
        context: CreationContext,
    ) -> Result<Option<Spreadsheet>, SheetsError> {
        match self.find_file_id(name, context).await? {
            Some(id) => {
                debug!("Found spreadsheet '{name}' ({id}) as {context:?}");
                Ok(Some(self.fetch_spreadsheet(&id, context).await?))
            }
            None => Ok(None),
        }
    }

    fn spreadsheet_url(id: &str, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(SHEETS_API_URL).map_err(|e| SheetsError::Rejected {
            status: 0,
            message: format!("invalid API url: {e}"),
        })?;
        {
            let mut path = url.path_segments_mut().map_err(|_| SheetsError::Rejected {
                status: 0,
                message: "API url cannot be a base".to_string(),
            })?;
            path.push(id);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn fetch_spreadsheet(
        &self,
        id: &str,
        context: CreationContext,
    ) -> Result<Spreadsheet, SheetsError> {
        let url = Self::spreadsheet_url(id, &[])?;
        let request = self
            .authorized(self.http.get(url), context)
            .await?
            .query(&[("fields", SPREADSHEET_FIELDS)]);
        let resource: SpreadsheetResource = check(request.send().await?).await?.json().await?;
        resource.into_spreadsheet(context)
    }

    async fn find_file_id(
        &self,
        name: &str,
        context: CreationContext,
    ) -> Result<Option<String>, SheetsError> {
        let q = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            drive_query_literal(name),
            SPREADSHEET_MIME
        );
        let request = self
            .authorized(self.http.get(DRIVE_FILES_URL), context)
            .await?
            .query(&[
                ("q", q.as_str()),
                ("fields", "files(id)"),
                ("pageSize", "1"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ]);
        let list: DriveFileList = check(request.send().await?).await?.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }
}

#[async_trait]
impl SpreadsheetService for GoogleSheetsClient {
    async fn open(&self, name: &str) -> Result<Spreadsheet, SheetsError> {
        first_found(&self.lookup_contexts(), |context| self.open_as(name, context))
            .await?
            .ok_or_else(|| SheetsError::NotFound(name.to_string()))
    }

    async fn create(
        &self,
        name: &str,
        context: CreationContext,
    ) -> Result<Spreadsheet, SheetsError> {
        let request = self
            .authorized(self.http.post(SHEETS_API_URL), context)
            .await?
            .json(&json!({ "properties": { "title": name } }));
        let resource: SpreadsheetResource = check(request.send().await?).await?.json().await?;
        let sheet = resource.into_spreadsheet(context)?;
        info!("Created spreadsheet '{}' ({}) as {context:?}", sheet.name, sheet.id);
        Ok(sheet)
    }

    async fn share(&self, sheet: &Spreadsheet, email: &str) -> Result<(), SheetsError> {
        let url = format!("{DRIVE_FILES_URL}/{}/permissions", sheet.id);
        let request = self
            .authorized(self.http.post(url), sheet.context)
            .await?
            .query(&[("supportsAllDrives", "true"), ("sendNotificationEmail", "true")])
            .json(&json!({
                "type": "user",
                "role": "writer",
                "emailAddress": email,
            }));
        check(request.send().await?).await?;
        Ok(())
    }

    async fn update_values(
        &self,
        sheet: &Spreadsheet,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), SheetsError> {
        let range = sheet.worksheet.range(range);
        let url = Self::spreadsheet_url(&sheet.id, &["values", &range])?;
        let request = self
            .authorized(self.http.put(url), sheet.context)
            .await?
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": rows,
            }));
        check(request.send().await?).await?;
        Ok(())
    }

    async fn format_header(
        &self,
        sheet: &Spreadsheet,
        column_widths: &[u32],
    ) -> Result<(), SheetsError> {
        let sheet_id = sheet.worksheet.id;
        let mut requests = vec![
            json!({
                "repeatCell": {
                    "range": {
                        "sheetId": sheet_id,
                        "startRowIndex": 0,
                        "endRowIndex": 1,
                        "startColumnIndex": 0,
                        "endColumnIndex": HEADERS.len(),
                    },
                    "cell": {
                        "userEnteredFormat": {
                            "backgroundColor": { "red": 0.2, "green": 0.6, "blue": 0.9 },
                            "textFormat": {
                                "bold": true,
                                "foregroundColor": { "red": 1.0, "green": 1.0, "blue": 1.0 }
                            }
                        }
                    },
                    "fields": "userEnteredFormat(backgroundColor,textFormat)"
                }
            }),
            json!({
                "updateSheetProperties": {
                    "properties": {
                        "sheetId": sheet_id,
                        "gridProperties": { "frozenRowCount": 1 }
                    },
                    "fields": "gridProperties.frozenRowCount"
                }
            }),
        ];
        requests.extend(column_widths.iter().enumerate().map(|(i, px)| {
            json!({
                "updateDimensionProperties": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "COLUMNS",
                        "startIndex": i,
                        "endIndex": i + 1,
                    },
                    "properties": { "pixelSize": px },
                    "fields": "pixelSize"
                }
            })
        }));

        let url = Self::spreadsheet_url(&format!("{}:batchUpdate", sheet.id), &[])?;
        let request = self
            .authorized(self.http.post(url), sheet.context)
            .await?
            .json(&json!({ "requests": requests }));
        check(request.send().await?).await?;
        Ok(())
    }

    async fn append_row(
        &self,
        sheet: &Spreadsheet,
        row: Vec<String>,
    ) -> Result<Option<u32>, SheetsError> {
        let range = format!("{}:append", sheet.worksheet.range("A1"));
        let url = Self::spreadsheet_url(&sheet.id, &["values", &range])?;
        let request = self
            .authorized(self.http.post(url), sheet.context)
            .await?
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [row] }));
        let response: AppendResponse = check(request.send().await?).await?.json().await?;
        Ok(response.updates.and_then(|u| u.updated_rows))
    }

    async fn get_all_values(&self, sheet: &Spreadsheet) -> Result<Vec<Vec<String>>, SheetsError> {
        let range = format!("'{}'", sheet.worksheet.title.replace('\'', "''"));
        let url = Self::spreadsheet_url(&sheet.id, &["values", &range])?;
        let request = self.authorized(self.http.get(url), sheet.context).await?;
        let values: ValueRange = check(request.send().await?).await?.json().await?;
        Ok(values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_quota_reason_is_quota() {
        let body = r#"{"error": {"code": 403, "message": "The user's Drive storage quota has been exceeded.",
            "errors": [{"domain": "usageLimits", "reason": "storageQuotaExceeded"}]}}"#;
        match classify_error(403, body) {
            SheetsError::QuotaExceeded(msg) => assert!(msg.contains("storage quota")),
            other => panic!("expected quota, got {other:?}"),
        }
    }

    #[test]
    fn test_resource_exhausted_status_is_quota() {
        let body = r#"{"error": {"code": 403, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(classify_error(403, body), SheetsError::QuotaExceeded(_)));
    }

    #[test]
    fn test_error_info_detail_reason_is_quota() {
        let body = r#"{"error": {"code": 403, "message": "slow down", "status": "PERMISSION_DENIED",
            "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "RATE_LIMIT_EXCEEDED"}]}}"#;
        assert!(matches!(classify_error(403, body), SheetsError::QuotaExceeded(_)));
    }

    #[test]
    fn test_too_many_requests_is_quota_even_without_body() {
        assert!(matches!(classify_error(429, ""), SheetsError::QuotaExceeded(_)));
    }

    #[test]
    fn test_permission_denied_is_rejection() {
        let body = r#"{"error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}}"#;
        match classify_error(403, body) {
            SheetsError::Rejected { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "The caller does not have permission");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_quota_words_in_message_alone_are_not_quota() {
        let body = r#"{"error": {"code": 400, "message": "quota has been exceeded", "status": "INVALID_ARGUMENT"}}"#;
        assert!(matches!(classify_error(400, body), SheetsError::Rejected { .. }));
    }

    #[test]
    fn test_unauthorized_is_auth_error() {
        assert!(matches!(classify_error(401, "nope"), SheetsError::Auth(_)));
    }

    #[test]
    fn test_non_json_body_is_kept_as_message() {
        match classify_error(500, "upstream exploded") {
            SheetsError::Rejected { message, .. } => assert_eq!(message, "upstream exploded"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_skips_failing_user_context() {
        let mut seen = Vec::new();
        let found = first_found(
            &[CreationContext::User, CreationContext::ServiceAccount],
            |context| {
                seen.push(context);
                std::future::ready(match context {
                    CreationContext::User => Err(SheetsError::Auth("unauthorized_client".to_string())),
                    CreationContext::ServiceAccount => Ok(Some("sheet-id")),
                })
            },
        )
        .await
        .unwrap();

        assert_eq!(found, Some("sheet-id"));
        assert_eq!(seen, vec![CreationContext::User, CreationContext::ServiceAccount]);
    }

    #[tokio::test]
    async fn test_lookup_propagates_service_account_failure() {
        let result: Result<Option<&str>, SheetsError> =
            first_found(&[CreationContext::ServiceAccount], |_| {
                std::future::ready(Err(SheetsError::Auth("invalid_grant".to_string())))
            })
            .await;
        assert!(matches!(result, Err(SheetsError::Auth(_))));
    }

    #[tokio::test]
    async fn test_lookup_stops_at_first_hit() {
        let mut calls = 0;
        let found = first_found(
            &[CreationContext::User, CreationContext::ServiceAccount],
            |_| {
                calls += 1;
                std::future::ready(Ok::<_, SheetsError>(Some(1)))
            },
        )
        .await
        .unwrap();
        assert_eq!(found, Some(1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_drive_query_literal_escapes_quotes() {
        assert_eq!(drive_query_literal(r"O'Brien \ Co"), r"O\'Brien \\ Co");
    }

    #[test]
    fn test_spreadsheet_url_encodes_range_segment() {
        let url = GoogleSheetsClient::spreadsheet_url("abc", &["values", "'Página 1'!A1:N1"]).unwrap();
        assert!(url.as_str().starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc/values/"));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_resource_without_worksheets_is_rejected() {
        let resource: SpreadsheetResource = serde_json::from_value(json!({
            "spreadsheetId": "id1",
            "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/id1",
            "properties": { "title": "Currículos - QA" }
        }))
        .unwrap();
        assert!(resource.into_spreadsheet(CreationContext::ServiceAccount).is_err());
    }

    #[test]
    fn test_resource_maps_first_worksheet() {
        let resource: SpreadsheetResource = serde_json::from_value(json!({
            "spreadsheetId": "id1",
            "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/id1",
            "properties": { "title": "Currículos - QA" },
            "sheets": [
                { "properties": { "sheetId": 0, "title": "Sheet1" } },
                { "properties": { "sheetId": 7, "title": "Other" } }
            ]
        }))
        .unwrap();
        let sheet = resource.into_spreadsheet(CreationContext::User).unwrap();
        assert_eq!(sheet.worksheet.id, 0);
        assert_eq!(sheet.worksheet.title, "Sheet1");
        assert_eq!(sheet.context, CreationContext::User);
    }

    #[test]
    fn test_cell_text_flattens_non_strings() {
        assert_eq!(cell_text(json!("Ana")), "Ana");
        assert_eq!(cell_text(json!(8.5)), "8.5");
        assert_eq!(cell_text(Value::Null), "");
    }
}
