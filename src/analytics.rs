use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use crate::models::{
    round2, AnalyticsSummary, Metrics, MonthlyData, ProductData, ProductTrend, RegionData,
    SalesRecord, TrendMap,
};

/// Length of the two adjacent windows compared for the growth rate.
const GROWTH_WINDOW_DAYS: i64 = 90;

/// Monthly slope magnitude above which a trend counts as strong.
const TREND_STRENGTH_THRESHOLD: f64 = 1000.0;

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Compute the full summary over the given records. `today` anchors the
/// growth-rate windows so callers control the clock.
pub fn summarize(records: &[SalesRecord], today: NaiveDate) -> AnalyticsSummary {
    let total_sales: f64 = records.iter().map(|r| r.sales_amount).sum();
    let total_profit: f64 = records.iter().map(|r| r.profit).sum();
    let total_customers: i64 = records.iter().map(|r| r.quantity).sum();
    let avg_order_value = if records.is_empty() {
        0.0
    } else {
        total_sales / records.len() as f64
    };

    let growth_rate = growth_rate(records, today);

    let mut monthly: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for record in records {
        let entry = monthly.entry(month_key(record.date)).or_insert((0.0, 0.0));
        entry.0 += record.sales_amount;
        entry.1 += record.profit;
    }

    let mut months = Vec::with_capacity(monthly.len());
    let mut monthly_sales = Vec::with_capacity(monthly.len());
    let mut monthly_profit = Vec::with_capacity(monthly.len());
    for (month, (sales, profit)) in monthly {
        months.push(month);
        monthly_sales.push(round2(sales));
        monthly_profit.push(round2(profit));
    }

    let product_rollup = rollup(records, |r| r.product.clone());
    let region_rollup = rollup(records, |r| r.region.clone());

    AnalyticsSummary {
        metrics: Metrics {
            total_sales: round2(total_sales),
            total_profit: round2(total_profit),
            total_customers,
            avg_order_value: round2(avg_order_value),
            growth_rate,
        },
        monthly_data: MonthlyData {
            months,
            sales: monthly_sales,
            profit: monthly_profit,
        },
        product_data: ProductData {
            products: product_rollup.iter().map(|e| e.0.clone()).collect(),
            sales: product_rollup.iter().map(|e| round2(e.1)).collect(),
            quantity: product_rollup.iter().map(|e| e.2).collect(),
        },
        region_data: RegionData {
            regions: region_rollup.iter().map(|e| e.0.clone()).collect(),
            sales: region_rollup.iter().map(|e| round2(e.1)).collect(),
            customers: region_rollup.iter().map(|e| e.2).collect(),
        },
    }
}

/// Percentage change of the trailing 90 days against the 90 before them.
/// Zero when the prior window has no sales; dividing there would blow up
/// on freshly generated short histories.
fn growth_rate(records: &[SalesRecord], today: NaiveDate) -> f64 {
    let window_start = today - Duration::days(GROWTH_WINDOW_DAYS);
    let prior_start = today - Duration::days(2 * GROWTH_WINDOW_DAYS);

    let mut recent = 0.0;
    let mut previous = 0.0;
    for record in records {
        if record.date >= window_start {
            recent += record.sales_amount;
        } else if record.date >= prior_start {
            previous += record.sales_amount;
        }
    }

    if previous > 0.0 {
        let rate = (recent - previous) / previous * 100.0;
        (rate * 10.0).round() / 10.0
    } else {
        0.0
    }
}

/// Sum amount and quantity per dimension value, sorted descending by amount.
fn rollup<F>(records: &[SalesRecord], key: F) -> Vec<(String, f64, i64)>
where
    F: Fn(&SalesRecord) -> String,
{
    let mut sums: HashMap<String, (f64, i64)> = HashMap::new();
    for record in records {
        let entry = sums.entry(key(record)).or_insert((0.0, 0));
        entry.0 += record.sales_amount;
        entry.1 += record.quantity;
    }

    let mut entries: Vec<(String, f64, i64)> = sums
        .into_iter()
        .map(|(name, (amount, quantity))| (name, amount, quantity))
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
}

/// Classify each product's monthly sales by the sign and magnitude of a
/// least-squares slope. Products with fewer than two months of history
/// are skipped; one point fits any line.
pub fn product_trends(records: &[SalesRecord]) -> TrendMap {
    let mut by_product: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for record in records {
        *by_product
            .entry(record.product.clone())
            .or_default()
            .entry(month_key(record.date))
            .or_insert(0.0) += record.sales_amount;
    }

    let mut trends = TrendMap::new();
    for (product, monthly) in by_product {
        if monthly.len() < 2 {
            continue;
        }
        let sums: Vec<f64> = monthly.into_values().collect();
        let slope = linear_slope(&sums);
        trends.insert(
            product,
            ProductTrend {
                trend: round2(slope),
                direction: if slope > 0.0 { "up" } else { "down" },
                strength: if slope.abs() > TREND_STRENGTH_THRESHOLD {
                    "strong"
                } else {
                    "weak"
                },
            },
        );
    }
    trends
}

/// Least-squares slope of `values` against their indices 0..n.
fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_xx: f64 = (0..values.len()).map(|i| (i * i) as f64).sum();

    (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x)
}
