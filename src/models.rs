use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One journal entry: something eaten or bought on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub date: NaiveDate,
    pub item: String,
    pub amount: f64,
    pub photo: Option<String>,
}

/// Append-only collection of records. Ids are assigned here and never reused
/// while the ledger is loaded; removal goes by id, not by position.
#[derive(Debug, Clone)]
pub struct Ledger {
    records: Vec<Record>,
    next_id: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        let next_id = records
            .iter()
            .map(|record| record.id)
            .max()
            .map_or(1, |max| max + 1);
        Self { records, next_id }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn append(
        &mut self,
        date: NaiveDate,
        item: String,
        amount: f64,
        photo: Option<String>,
    ) -> Record {
        let record = Record {
            id: self.next_id,
            date,
            item,
            amount,
            photo,
        };
        self.next_id += 1;
        self.records.push(record.clone());
        record
    }

    pub fn remove(&mut self, id: u64) -> Option<Record> {
        let index = self.records.iter().position(|record| record.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn records_on(&self, date: NaiveDate) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| record.date == date)
            .cloned()
            .collect()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
pub struct AddRecordRequest {
    pub date: NaiveDate,
    pub item: String,
    pub amount: f64,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DayRecordsResponse {
    pub date: NaiveDate,
    pub records: Vec<Record>,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub daily: BTreeMap<u32, f64>,
    pub total: f64,
}
