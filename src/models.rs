use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Round a currency value to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A sales row as stored, one synthetic order line.
#[derive(Debug, Clone, Serialize)]
pub struct SalesRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub product: String,
    pub region: String,
    pub sales_amount: f64,
    pub profit: f64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub population: i64,
}

/// Generator output prior to insertion; ids are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub date: NaiveDate,
    pub product: String,
    pub region: String,
    pub sales_amount: f64,
    pub profit: f64,
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct NewRegion {
    pub name: String,
    pub country: String,
    pub population: i64,
}

/// One full regeneration batch: everything the store replaces in one pass.
#[derive(Debug, Clone)]
pub struct SampleDataset {
    pub sales: Vec<NewSale>,
    pub products: Vec<NewProduct>,
    pub regions: Vec<NewRegion>,
}

/// Headline metrics block.
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub total_sales: f64,
    pub total_profit: f64,
    pub total_customers: i64,
    pub avg_order_value: f64,
    pub growth_rate: f64,
}

/// Month-bucketed sums, parallel arrays keyed by `months`.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyData {
    pub months: Vec<String>,
    pub sales: Vec<f64>,
    pub profit: Vec<f64>,
}

/// Per-product rollup, sorted descending by summed sales amount.
#[derive(Debug, Clone, Serialize)]
pub struct ProductData {
    pub products: Vec<String>,
    pub sales: Vec<f64>,
    pub quantity: Vec<i64>,
}

/// Per-region rollup, sorted descending by summed sales amount.
#[derive(Debug, Clone, Serialize)]
pub struct RegionData {
    pub regions: Vec<String>,
    pub sales: Vec<f64>,
    pub customers: Vec<i64>,
}

/// The full derived summary; recomputed from the sales table on demand.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub metrics: Metrics,
    pub monthly_data: MonthlyData,
    pub product_data: ProductData,
    pub region_data: RegionData,
}

/// Linear-fit classification of one product's monthly sales.
#[derive(Debug, Clone, Serialize)]
pub struct ProductTrend {
    pub trend: f64,
    pub direction: &'static str,
    pub strength: &'static str,
}

pub type TrendMap = BTreeMap<String, ProductTrend>;

/// Distinct filter values the front end can offer.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub dates: DateRangeOptions,
    pub products: Vec<String>,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRangeOptions {
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
    pub available: Vec<NaiveDate>,
}
