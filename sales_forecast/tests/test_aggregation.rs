mod common;

use approx::assert_relative_eq;
use common::{day, raw_table, weekly_sales, Sale};
use pretty_assertions::assert_eq;
use rstest::rstest;
use sales_forecast::aggregation::{
    branch_performance, customer_segmentation, daily_sales, product_performance, SalesSummary,
};
use sales_forecast::data::{clean_data, SalesTable};

fn table(sales: &[Sale]) -> SalesTable {
    clean_data(&raw_table(sales)).unwrap()
}

fn two_branch_sales() -> Vec<Sale> {
    vec![
        Sale::new("A", 100.0, day(2019, 1, 1)),
        Sale::new("A", 120.0, day(2019, 1, 2)),
        Sale::new("A", 80.0, day(2019, 1, 3)),
        Sale::new("B", 50.0, day(2019, 1, 1)),
        Sale::new("B", 100.0, day(2019, 1, 3)),
    ]
}

#[rstest]
#[case(vec![0, 1, 2, 3, 4])]
#[case(vec![4, 3, 2, 1, 0])]
#[case(vec![3, 0, 4, 1, 2])]
fn test_branch_totals_ignore_row_order(#[case] order: Vec<usize>) {
    let base = two_branch_sales();
    let shuffled: Vec<Sale> = order.iter().map(|&i| base[i].clone()).collect();

    let branches = branch_performance(&table(&shuffled));
    let totals: Vec<(String, f64)> = branches.iter().map(|b| (b.branch.clone(), b.total)).collect();

    assert_eq!(
        totals,
        vec![("A".to_string(), 300.0), ("B".to_string(), 150.0)]
    );
}

#[test]
fn test_daily_sales_conserves_total() {
    let table = table(&weekly_sales(10));
    let daily = daily_sales(&table);

    assert_eq!(daily.len(), 10);
    assert!(daily.windows(2).all(|w| w[0].date < w[1].date));

    let daily_total: f64 = daily.iter().map(|d| d.total).sum();
    assert_relative_eq!(daily_total, table.total_sales(), max_relative = 1e-12);
}

#[test]
fn test_product_performance() {
    let table = table(&weekly_sales(2));
    let products = product_performance(&table);

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].product_line, "Food and beverages");
    assert_eq!(products[0].quantity, 2);
    assert_eq!(products[1].product_line, "Sports and travel");
    assert_eq!(products[1].quantity, 6);
    assert_relative_eq!(products[1].rating, 8.5);

    let profit: f64 = products.iter().map(|p| p.profit).sum();
    let expected: f64 = table.iter().map(|r| r.profit()).sum();
    assert_relative_eq!(profit, expected, max_relative = 1e-12);
}

#[test]
fn test_customer_segmentation_means() {
    let sales = vec![
        Sale::new("A", 100.0, day(2019, 1, 1)),
        Sale {
            quantity: 5,
            rating: 9.0,
            ..Sale::new("A", 300.0, day(2019, 1, 1))
        },
        Sale {
            customer_type: "Normal",
            ..Sale::new("B", 40.0, day(2019, 1, 2))
        },
    ];
    let segments = customer_segmentation(&table(&sales));

    assert_eq!(segments.len(), 2);
    let member = &segments[0];
    assert_eq!(member.customer_type, "Member");
    assert_relative_eq!(member.mean_total, 200.0);
    assert_relative_eq!(member.total, 400.0);
    assert_relative_eq!(member.mean_quantity, 3.0);
    assert_relative_eq!(member.mean_rating, 8.0);

    assert_eq!(segments[1].customer_type, "Normal");
    assert_relative_eq!(segments[1].mean_total, 40.0);
}

#[test]
fn test_empty_table_has_no_groups() {
    let summary = SalesSummary::from_table(&SalesTable::default());

    assert!(summary.daily_sales.is_empty());
    assert!(summary.products.is_empty());
    assert!(summary.branches.is_empty());
    assert!(summary.customers.is_empty());
    assert_eq!(summary.transactions, 0);
}

#[test]
fn test_summary_bundles_aggregations() {
    let table = table(&two_branch_sales());
    let summary = SalesSummary::from_table(&table);

    assert_eq!(summary.transactions, 5);
    assert_relative_eq!(summary.total_sales, 450.0);
    assert_eq!(summary.branches, branch_performance(&table));
    assert_eq!(summary.daily_sales.len(), 3);
    assert_relative_eq!(summary.daily_sales[0].total, 150.0);
}
