#![allow(dead_code)]

use chrono::NaiveDate;
use sales_forecast::data::{DataLoader, RawTable};
use std::io::Write;
use tempfile::NamedTempFile;

pub const HEADER: &str = "Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating";

/// One sale line of a fixture file
#[derive(Debug, Clone)]
pub struct Sale {
    pub branch: &'static str,
    pub customer_type: &'static str,
    pub product_line: &'static str,
    pub quantity: u32,
    pub total: f64,
    pub date: NaiveDate,
    pub rating: f64,
}

impl Sale {
    pub fn new(branch: &'static str, total: f64, date: NaiveDate) -> Self {
        Self {
            branch,
            customer_type: "Member",
            product_line: "Food and beverages",
            quantity: 1,
            total,
            date,
            rating: 7.0,
        }
    }

    pub fn line(&self, invoice: usize) -> String {
        let tax = self.total / 21.0;
        let cogs = self.total - tax;
        let city = match self.branch {
            "A" => "Yangon",
            "B" => "Mandalay",
            _ => "Naypyitaw",
        };
        format!(
            "{:03}-00-0000,{},{},{},Female,{},{:.4},{},{},{},{},13:08,Cash,{},4.761904762,{},{}",
            invoice,
            self.branch,
            city,
            self.customer_type,
            self.product_line,
            cogs / f64::from(self.quantity.max(1)),
            self.quantity,
            tax,
            self.total,
            self.date.format("%m/%d/%Y"),
            cogs,
            tax,
            self.rating
        )
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn csv_text(sales: &[Sale]) -> String {
    let mut text = String::from(HEADER);
    for (i, sale) in sales.iter().enumerate() {
        text.push('\n');
        text.push_str(&sale.line(i + 1));
    }
    text
}

pub fn raw_table(sales: &[Sale]) -> RawTable {
    DataLoader::from_reader(csv_text(sales).as_bytes(), b',').unwrap()
}

pub fn write_csv(sales: &[Sale]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", csv_text(sales)).unwrap();
    file.flush().unwrap();
    file
}

/// Two sales per day over `days` consecutive days from 2019-01-07 (a
/// Monday), with weekend days selling more
pub fn weekly_sales(days: usize) -> Vec<Sale> {
    let weekly = [310.0, 295.0, 300.0, 320.0, 350.0, 430.0, 410.0];
    day(2019, 1, 7)
        .iter_days()
        .take(days)
        .enumerate()
        .flat_map(|(i, date)| {
            let total = weekly[i % 7] + i as f64;
            vec![
                Sale::new("A", total * 0.6, date),
                Sale {
                    customer_type: "Normal",
                    product_line: "Sports and travel",
                    quantity: 3,
                    rating: 8.5,
                    ..Sale::new("B", total * 0.4, date)
                },
            ]
        })
        .collect()
}
