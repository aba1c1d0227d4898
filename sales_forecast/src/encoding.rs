//! Categorical label encoding
//!
//! A single encoder used wherever a categorical field needs dense integer
//! codes, such as grouping in the aggregation functions.
//! Classes are kept in sorted order, so code assignment does not depend on
//! row order.

use crate::data::{CleanedTransaction, SalesTable};
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Categorical fields of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalColumn {
    Branch,
    City,
    CustomerType,
    Gender,
    ProductLine,
    Payment,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 6] = [
        CategoricalColumn::Branch,
        CategoricalColumn::City,
        CategoricalColumn::CustomerType,
        CategoricalColumn::Gender,
        CategoricalColumn::ProductLine,
        CategoricalColumn::Payment,
    ];

    /// Normalized column name
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalColumn::Branch => "branch",
            CategoricalColumn::City => "city",
            CategoricalColumn::CustomerType => "customer_type",
            CategoricalColumn::Gender => "gender",
            CategoricalColumn::ProductLine => "product_line",
            CategoricalColumn::Payment => "payment",
        }
    }

    /// Value of this column in `row`; an absent payment reads as ""
    pub fn value<'a>(&self, row: &'a CleanedTransaction) -> &'a str {
        let record = &row.record;
        match self {
            CategoricalColumn::Branch => &record.branch,
            CategoricalColumn::City => &record.city,
            CategoricalColumn::CustomerType => &record.customer_type,
            CategoricalColumn::Gender => &record.gender,
            CategoricalColumn::ProductLine => &record.product_line,
            CategoricalColumn::Payment => record.payment.as_deref().unwrap_or(""),
        }
    }
}

/// Maps string labels to dense codes `0..len()`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Fit on the distinct values of `values`
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: Vec<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let codes = classes
            .iter()
            .enumerate()
            .map(|(code, class)| (class.clone(), code))
            .collect();

        Self { classes, codes }
    }

    /// Fit on `values` and return the code of every value
    pub fn fit_transform<S: AsRef<str>>(values: &[S]) -> (Self, Vec<usize>) {
        let encoder = Self::fit(values);
        let codes = values
            .iter()
            .filter_map(|v| encoder.transform(v.as_ref()))
            .collect();
        (encoder, codes)
    }

    /// Sorted distinct labels; a label's code is its index here
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Consume the encoder, keeping only its classes
    pub fn into_classes(self) -> Vec<String> {
        self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Code of `label`, if it was seen during fitting
    pub fn transform(&self, label: &str) -> Option<usize> {
        self.codes.get(label).copied()
    }

    /// Code of `label`, failing on labels not seen during fitting
    pub fn encode(&self, label: &str) -> Result<usize> {
        self.transform(label).ok_or_else(|| {
            ForecastError::ValidationError(format!("unknown category label '{}'", label))
        })
    }

    /// Label for `code`
    pub fn inverse(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Encode one column of a table
    pub fn encode_column(&self, table: &SalesTable, column: CategoricalColumn) -> Result<Vec<usize>> {
        table.iter().map(|row| self.encode(column.value(row))).collect()
    }

    /// Partition `table` into one group per class, in code order
    ///
    /// Every returned group is non-empty when the encoder was fitted on the
    /// same table and column.
    pub fn group<'a>(
        &self,
        table: &'a SalesTable,
        column: CategoricalColumn,
    ) -> Vec<Vec<&'a CleanedTransaction>> {
        let mut groups = vec![Vec::new(); self.len()];
        for row in table {
            if let Some(code) = self.transform(column.value(row)) {
                groups[code].push(row);
            }
        }
        groups
    }
}
