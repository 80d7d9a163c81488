use crate::errors::AppError;
use crate::models::{Ledger, Record};
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;

const LEDGER_HEADER: [&str; 5] = ["id", "date", "item", "amount", "photo"];

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("DIARY_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/ledger.csv"))
}

pub fn resolve_photo_dir() -> PathBuf {
    match env::var("DIARY_PHOTO_DIR") {
        Ok(path) => PathBuf::from(path),
        Err(_) => PathBuf::from("data/photos"),
    }
}

pub async fn load_ledger(path: &Path) -> Ledger {
    match fs::read(path).await {
        Ok(bytes) => parse_ledger(&bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ledger::new(),
        Err(err) => {
            error!("failed to read ledger file: {err}");
            Ledger::new()
        }
    }
}

/// Rows that fail to parse (bad date, bad amount, wrong field count) are
/// logged and skipped; the rest of the file still loads.
fn parse_ledger(bytes: &[u8]) -> Ledger {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut records = Vec::new();
    for row in reader.deserialize::<Record>() {
        match row {
            Ok(record) => records.push(record),
            Err(err) => error!("skipping malformed ledger row: {err}"),
        }
    }
    Ledger::from_records(records)
}

pub async fn persist_ledger(path: &Path, ledger: &Ledger) -> Result<(), AppError> {
    let payload = encode_ledger(ledger)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

fn encode_ledger(ledger: &Ledger) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(LEDGER_HEADER)
        .map_err(AppError::internal)?;
    for record in ledger.records() {
        writer.serialize(record).map_err(AppError::internal)?;
    }
    writer
        .into_inner()
        .map_err(|err| AppError::internal(err.into_error()))
}
