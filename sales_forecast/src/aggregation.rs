//! Grouped summaries of a cleaned sales table
//!
//! All functions are pure and return rows sorted by their key. Groups
//! exist only for keys observed in the table, so no mean is ever taken
//! over an empty group.

use crate::data::{CleanedTransaction, SalesTable};
use crate::encoding::CategoricalColumn;
use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Total sales of one calendar date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: f64,
}

/// Summary of one product line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPerformance {
    pub product_line: String,
    pub quantity: u64,
    pub total: f64,
    pub profit: f64,
    /// Mean customer rating
    pub rating: f64,
}

/// Summary of one branch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchPerformance {
    pub branch: String,
    pub total: f64,
    pub profit: f64,
    /// Mean customer rating
    pub rating: f64,
}

/// Spending profile of one customer type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSegment {
    pub customer_type: String,
    pub mean_total: f64,
    pub total: f64,
    pub mean_quantity: f64,
    pub mean_rating: f64,
}

/// Sum of `total` per date, ascending by date
pub fn daily_sales(table: &SalesTable) -> Vec<DailySales> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in table {
        *by_date.entry(row.date()).or_insert(0.0) += row.total();
    }

    by_date
        .into_iter()
        .map(|(date, total)| DailySales { date, total })
        .collect()
}

/// Quantity, sales, profit and mean rating per product line
pub fn product_performance(table: &SalesTable) -> Vec<ProductPerformance> {
    grouped(table, CategoricalColumn::ProductLine)
        .map(|(product_line, rows)| ProductPerformance {
            product_line,
            quantity: rows.iter().map(|r| u64::from(r.quantity())).sum(),
            total: rows.iter().map(|r| r.total()).sum(),
            profit: rows.iter().map(|r| r.profit()).sum(),
            rating: rows.iter().map(|r| r.rating()).mean(),
        })
        .collect()
}

/// Sales, profit and mean rating per branch
pub fn branch_performance(table: &SalesTable) -> Vec<BranchPerformance> {
    grouped(table, CategoricalColumn::Branch)
        .map(|(branch, rows)| BranchPerformance {
            branch,
            total: rows.iter().map(|r| r.total()).sum(),
            profit: rows.iter().map(|r| r.profit()).sum(),
            rating: rows.iter().map(|r| r.rating()).mean(),
        })
        .collect()
}

/// Mean and total spend, mean basket size and mean rating per customer type
pub fn customer_segmentation(table: &SalesTable) -> Vec<CustomerSegment> {
    grouped(table, CategoricalColumn::CustomerType)
        .map(|(customer_type, rows)| CustomerSegment {
            customer_type,
            mean_total: rows.iter().map(|r| r.total()).mean(),
            total: rows.iter().map(|r| r.total()).sum(),
            mean_quantity: rows.iter().map(|r| f64::from(r.quantity())).mean(),
            mean_rating: rows.iter().map(|r| r.rating()).mean(),
        })
        .collect()
}

/// Rows of `table` grouped by `column`, labels in sorted order
fn grouped<'a>(
    table: &'a SalesTable,
    column: CategoricalColumn,
) -> impl Iterator<Item = (String, Vec<&'a CleanedTransaction>)> {
    let encoder = table.encoder(column);
    let groups = encoder.group(table, column);

    encoder
        .into_classes()
        .into_iter()
        .zip(groups)
        .filter(|(_, rows)| !rows.is_empty())
}

/// Every aggregation of one table, computed together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub daily_sales: Vec<DailySales>,
    pub products: Vec<ProductPerformance>,
    pub branches: Vec<BranchPerformance>,
    pub customers: Vec<CustomerSegment>,
    pub transactions: usize,
    pub total_sales: f64,
}

impl SalesSummary {
    pub fn from_table(table: &SalesTable) -> Self {
        Self {
            daily_sales: daily_sales(table),
            products: product_performance(table),
            branches: branch_performance(table),
            customers: customer_segmentation(table),
            transactions: table.len(),
            total_sales: table.total_sales(),
        }
    }
}
