use crate::errors::AppError;
use crate::models::{AddRecordRequest, DayRecordsResponse, MonthSummary, Record};
use crate::state::AppState;
use crate::stats::month_summary;
use crate::storage::persist_ledger;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use tokio::fs;

#[derive(Debug, Deserialize)]
pub struct IndexParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MonthParams {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct DayParams {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AddRecordForm {
    pub date: NaiveDate,
    pub item: String,
    pub amount: f64,
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRecordForm {
    pub date: NaiveDate,
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<Html<String>, AppError> {
    let today = Local::now().date_naive();
    let selected = params.date;
    let year = params
        .year
        .or(selected.map(|date| date.year()))
        .unwrap_or(today.year());
    let month = params
        .month
        .or(selected.map(|date| date.month()))
        .unwrap_or(today.month());
    check_month(month)?;

    let ledger = state.ledger.lock().await;
    let summary = month_summary(ledger.records(), year, month);
    let day_records = selected
        .map(|date| ledger.records_on(date))
        .unwrap_or_default();

    Ok(Html(render_index(&summary, selected, &day_records, today)))
}

pub async fn list_records(State(state): State<AppState>) -> Result<Json<Vec<Record>>, AppError> {
    let ledger = state.ledger.lock().await;
    Ok(Json(ledger.records().to_vec()))
}

pub async fn get_day(
    State(state): State<AppState>,
    Query(params): Query<DayParams>,
) -> Result<Json<DayRecordsResponse>, AppError> {
    let ledger = state.ledger.lock().await;
    let records = ledger.records_on(params.date);
    let total = records.iter().map(|record| record.amount).sum();

    Ok(Json(DayRecordsResponse {
        date: params.date,
        records,
        total,
    }))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(params): Query<MonthParams>,
) -> Result<Json<MonthSummary>, AppError> {
    check_month(params.month)?;
    let ledger = state.ledger.lock().await;
    Ok(Json(month_summary(ledger.records(), params.year, params.month)))
}

pub async fn add_record(
    State(state): State<AppState>,
    Json(payload): Json<AddRecordRequest>,
) -> Result<Json<Record>, AppError> {
    let record = apply_append(&state, payload).await?;
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    apply_delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_record_form(
    State(state): State<AppState>,
    Form(form): Form<AddRecordForm>,
) -> Result<Redirect, AppError> {
    let date = form.date;
    apply_append(
        &state,
        AddRecordRequest {
            date,
            item: form.item,
            amount: form.amount,
            photo: form.photo,
        },
    )
    .await?;
    Ok(Redirect::to(&format!("/?date={date}")))
}

pub async fn delete_record_form(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<DeleteRecordForm>,
) -> Result<Redirect, AppError> {
    apply_delete(&state, id).await?;
    Ok(Redirect::to(&format!("/?date={}", form.date)))
}

pub async fn photo(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::bad_request("invalid photo name"));
    }

    let path = state.photo_dir.join(&name);
    match fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type_for(&name))], bytes).into_response()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::not_found(format!("no photo named {name}")))
        }
        Err(err) => Err(AppError::internal(err)),
    }
}

// Mutations go to a copy of the ledger first; the shared state only advances
// once the file write succeeds, so memory and disk never diverge.
async fn apply_append(state: &AppState, request: AddRecordRequest) -> Result<Record, AppError> {
    let item = request.item.trim().to_string();
    if item.is_empty() {
        return Err(AppError::bad_request("item must not be empty"));
    }
    if !request.amount.is_finite() || request.amount < 0.0 {
        return Err(AppError::bad_request("amount must be a non-negative number"));
    }
    let photo = request
        .photo
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let mut ledger = state.ledger.lock().await;
    let mut next = ledger.clone();
    let record = next.append(request.date, item, request.amount, photo);
    persist_ledger(&state.data_path, &next).await?;
    *ledger = next;

    Ok(record)
}

async fn apply_delete(state: &AppState, id: u64) -> Result<Record, AppError> {
    let mut ledger = state.ledger.lock().await;
    let mut next = ledger.clone();
    let removed = next
        .remove(id)
        .ok_or_else(|| AppError::not_found(format!("no record with id {id}")))?;
    persist_ledger(&state.data_path, &next).await?;
    *ledger = next;

    Ok(removed)
}

fn check_month(month: u32) -> Result<(), AppError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(AppError::bad_request("month must be between 1 and 12"))
    }
}

fn content_type_for(name: &str) -> &'static str {
    let extension = name.rsplit('.').next().unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
