//! Transaction log loading and cleaning

use crate::encoding::{CategoricalColumn, LabelEncoder};
use crate::error::{ForecastError, Result};
use crate::utils::{
    normalize_column_name, parse_date, parse_time, DEFAULT_DATE_FORMATS, DEFAULT_TIME_FORMATS,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use csv::StringRecord;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Normalized names of the columns every input file must provide
pub const REQUIRED_COLUMNS: [&str; 15] = [
    "date",
    "time",
    "branch",
    "city",
    "customer_type",
    "gender",
    "product_line",
    "unit_price",
    "quantity",
    "tax_5%",
    "total",
    "cogs",
    "gross_margin_percentage",
    "gross_income",
    "rating",
];

/// Delimited table as read from disk, before any typing
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl RawTable {
    /// Create a raw table from headers and records
    pub fn new(headers: Vec<String>, records: Vec<StringRecord>) -> Self {
        Self { headers, records }
    }

    /// Header names exactly as they appeared in the file
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows
    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Data loader for transaction logs
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a comma-separated transaction log
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
        Self::from_csv_with_delimiter(path, b',')
    }

    /// Load a transaction log using a custom field delimiter
    pub fn from_csv_with_delimiter<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<RawTable> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::from_reader(file, delimiter)?;
        info!("Loaded {} rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Read a delimited table with a header row from any reader
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

        Ok(RawTable::new(headers, records))
    }
}

/// One sale line, typed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub invoice_id: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub branch: String,
    pub city: String,
    pub customer_type: String,
    pub gender: String,
    pub product_line: String,
    pub unit_price: f64,
    pub quantity: u32,
    /// The 5% tax amount
    pub tax: f64,
    pub total: f64,
    pub payment: Option<String>,
    pub cogs: f64,
    pub gross_margin_percentage: f64,
    pub gross_income: f64,
    /// Customer rating on a 0-10 scale
    pub rating: f64,
}

/// A transaction together with its derived calendar features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedTransaction {
    pub record: Transaction,
    pub datetime: NaiveDateTime,
    /// 1-12
    pub month: u32,
    /// 0 = Monday ... 6 = Sunday
    pub day_of_week: u32,
    /// 0-23
    pub hour: u32,
    /// 1-31
    pub day_of_month: u32,
}

impl CleanedTransaction {
    /// Derive calendar features from a typed record
    pub fn from_record(record: Transaction) -> Self {
        let datetime = record.date.and_time(record.time);
        Self {
            month: datetime.month(),
            day_of_week: datetime.weekday().num_days_from_monday(),
            hour: datetime.hour(),
            day_of_month: datetime.day(),
            datetime,
            record,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date
    }

    pub fn total(&self) -> f64 {
        self.record.total
    }

    pub fn quantity(&self) -> u32 {
        self.record.quantity
    }

    pub fn rating(&self) -> f64 {
        self.record.rating
    }

    /// Profit is reported as the gross income of the line
    pub fn profit(&self) -> f64 {
        self.record.gross_income
    }
}

/// Cleaned transaction table consumed by the aggregation and series code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    rows: Vec<CleanedTransaction>,
}

impl SalesTable {
    /// Build a table from typed records, deriving calendar features
    pub fn from_transactions(records: Vec<Transaction>) -> Self {
        Self {
            rows: records
                .into_iter()
                .map(CleanedTransaction::from_record)
                .collect(),
        }
    }

    pub fn rows(&self) -> &[CleanedTransaction] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CleanedTransaction> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the `total` column
    pub fn total_sales(&self) -> f64 {
        self.rows.iter().map(CleanedTransaction::total).sum()
    }

    /// Earliest and latest transaction dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.iter().map(CleanedTransaction::date).min()?;
        let last = self.rows.iter().map(CleanedTransaction::date).max()?;
        Some((first, last))
    }

    /// Label encoder fitted on one categorical column of this table
    pub fn encoder(&self, column: CategoricalColumn) -> LabelEncoder {
        LabelEncoder::fit(self.rows.iter().map(|row| column.value(row)))
    }
}

impl<'a> IntoIterator for &'a SalesTable {
    type Item = &'a CleanedTransaction;
    type IntoIter = std::slice::Iter<'a, CleanedTransaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Position of every known column in a raw table
#[derive(Debug)]
struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self> {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (normalize_column_name(name), i))
            .collect();

        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|name| !positions.contains_key(**name))
        {
            return Err(ForecastError::MissingColumn(missing.to_string()));
        }

        Ok(Self { positions })
    }

    fn field<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    fn optional<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        let value = self.field(record, column);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Turns a raw table into a typed, feature-enriched [`SalesTable`]
///
/// Any row that fails to parse aborts the whole clean; rows are never
/// dropped silently.
#[derive(Debug, Clone)]
pub struct DataCleaner {
    date_formats: Vec<String>,
    time_formats: Vec<String>,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            time_formats: DEFAULT_TIME_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl DataCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cleaner with custom date and time formats, tried in order
    pub fn with_formats(date_formats: Vec<String>, time_formats: Vec<String>) -> Result<Self> {
        if date_formats.is_empty() || time_formats.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one date format and one time format are required".to_string(),
            ));
        }

        Ok(Self {
            date_formats,
            time_formats,
        })
    }

    /// Clean every row of `raw`
    pub fn clean(&self, raw: &RawTable) -> Result<SalesTable> {
        let columns = ColumnIndex::resolve(raw.headers())?;
        debug!("Resolved {} columns", columns.positions.len());

        let records = raw
            .records()
            .iter()
            .enumerate()
            .map(|(i, record)| self.parse_record(i + 1, record, &columns))
            .collect::<Result<Vec<_>>>()?;

        let table = SalesTable::from_transactions(records);
        info!("Cleaned {} transactions", table.len());
        Ok(table)
    }

    fn parse_record(
        &self,
        row: usize,
        record: &StringRecord,
        columns: &ColumnIndex,
    ) -> Result<Transaction> {
        let date_text = columns.field(record, "date");
        let date = parse_date(date_text, &self.date_formats).ok_or_else(|| {
            ForecastError::data_format(row, "date", date_text, "unrecognized date format")
        })?;

        let time_text = columns.field(record, "time");
        let time = parse_time(time_text, &self.time_formats).ok_or_else(|| {
            ForecastError::data_format(row, "time", time_text, "unrecognized time format")
        })?;

        let text = |column: &str| -> Result<String> {
            let value = columns.field(record, column);
            if value.is_empty() {
                return Err(ForecastError::data_format(
                    row,
                    column,
                    value,
                    "value must not be empty",
                ));
            }
            Ok(value.to_string())
        };

        let number = |column: &str| -> Result<f64> {
            let value = columns.field(record, column);
            match value.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Ok(parsed),
                _ => Err(ForecastError::data_format(
                    row,
                    column,
                    value,
                    "expected a finite number",
                )),
            }
        };

        let quantity_text = columns.field(record, "quantity");
        let quantity = quantity_text.parse::<u32>().map_err(|_| {
            ForecastError::data_format(
                row,
                "quantity",
                quantity_text,
                "expected a non-negative integer",
            )
        })?;

        let rating = number("rating")?;
        if !(0.0..=10.0).contains(&rating) {
            return Err(ForecastError::data_format(
                row,
                "rating",
                columns.field(record, "rating"),
                "rating must be between 0 and 10",
            ));
        }

        Ok(Transaction {
            invoice_id: columns.optional(record, "invoice_id").map(str::to_string),
            date,
            time,
            branch: text("branch")?,
            city: text("city")?,
            customer_type: text("customer_type")?,
            gender: text("gender")?,
            product_line: text("product_line")?,
            unit_price: number("unit_price")?,
            quantity,
            tax: number("tax_5%")?,
            total: number("total")?,
            payment: columns.optional(record, "payment").map(str::to_string),
            cogs: number("cogs")?,
            gross_margin_percentage: number("gross_margin_percentage")?,
            gross_income: number("gross_income")?,
            rating,
        })
    }
}

/// Clean a raw table with the default date and time formats
pub fn clean_data(raw: &RawTable) -> Result<SalesTable> {
    DataCleaner::default().clean(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating";

    fn raw(body: &str) -> RawTable {
        let text = format!("{}\n{}", HEADER, body);
        DataLoader::from_reader(text.as_bytes(), b',').unwrap()
    }

    #[test]
    fn test_derived_features() {
        let table = clean_data(&raw(
            "750-67-8428,A,Yangon,Member,Female,Health and beauty,74.69,7,26.1415,548.9715,1/5/2019,13:08,Ewallet,522.83,4.761904762,26.1415,9.1",
        ))
        .unwrap();

        let row = &table.rows()[0];
        assert_eq!(row.month, 1);
        assert_eq!(row.day_of_month, 5);
        // 2019-01-05 was a Saturday
        assert_eq!(row.day_of_week, 5);
        assert_eq!(row.hour, 13);
        assert_eq!(row.profit(), 26.1415);
        assert_eq!(row.record.payment.as_deref(), Some("Ewallet"));
        assert_eq!(row.record.invoice_id.as_deref(), Some("750-67-8428"));
    }

    #[test]
    fn test_bad_time_names_row_and_value() {
        let err = clean_data(&raw(
            "1,A,Yangon,Member,Female,Health and beauty,74.69,7,26.14,548.97,1/5/2019,13:08,Cash,522.83,4.76,26.14,9.1\n\
             2,A,Yangon,Member,Female,Health and beauty,74.69,7,26.14,548.97,1/6/2019,noon,Cash,522.83,4.76,26.14,9.1",
        ))
        .unwrap_err();

        match err {
            ForecastError::DataFormat {
                row, column, value, ..
            } => {
                assert_eq!(row, 2);
                assert_eq!(column, "time");
                assert_eq!(value, "noon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = clean_data(&raw(
            "1,A,Yangon,Member,Female,Health and beauty,74.69,-7,26.14,548.97,1/5/2019,13:08,Cash,522.83,4.76,26.14,9.1",
        ))
        .unwrap_err();
        assert!(matches!(err, ForecastError::DataFormat { ref column, .. } if column == "quantity"));
    }
}
