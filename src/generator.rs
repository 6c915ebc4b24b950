use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{round2, NewProduct, NewRegion, NewSale, SampleDataset};

pub const PRODUCTS: [&str; 10] = [
    "Laptop Pro",
    "Smartphone X",
    "Tablet Air",
    "Monitor 4K",
    "Keyboard RGB",
    "Mouse Wireless",
    "Headphones Pro",
    "Webcam HD",
    "Speaker Bluetooth",
    "Charger Fast",
];

pub const REGIONS: [&str; 5] = ["Norte", "Sur", "Este", "Oeste", "Centro"];

pub const CATEGORIES: [&str; 4] = ["Electronics", "Computing", "Audio", "Accessories"];

const COUNTRY: &str = "España";

/// Days of history the generator draws order dates from.
const HISTORY_DAYS: i64 = 365;

/// Generate `count` synthetic sales rows plus the product and region
/// catalogs they reference. Deterministic for a given `seed` and `today`.
pub fn sample_dataset(count: usize, today: NaiveDate, seed: Option<u64>) -> SampleDataset {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut sales = Vec::with_capacity(count);
    for _ in 0..count {
        let date = today - Duration::days(rng.gen_range(0..=HISTORY_DAYS));
        let product = PRODUCTS[rng.gen_range(0..PRODUCTS.len())].to_string();
        let region = REGIONS[rng.gen_range(0..REGIONS.len())].to_string();

        let base_price: f64 = rng.gen_range(50.0..2000.0);
        let quantity: i64 = rng.gen_range(1..10);
        let sales_amount = round2(base_price * quantity as f64);
        let profit = round2(sales_amount * rng.gen_range(0.1..0.4));

        sales.push(NewSale {
            date,
            product,
            region,
            sales_amount,
            profit,
            quantity,
        });
    }

    let products = PRODUCTS
        .iter()
        .enumerate()
        .map(|(i, name)| NewProduct {
            name: name.to_string(),
            category: CATEGORIES[i % CATEGORIES.len()].to_string(),
            price: round2(rng.gen_range(50.0..2000.0)),
            cost: round2(rng.gen_range(30.0..1200.0)),
        })
        .collect();

    let regions = REGIONS
        .iter()
        .map(|name| NewRegion {
            name: name.to_string(),
            country: COUNTRY.to_string(),
            population: rng.gen_range(100_000..2_000_000),
        })
        .collect();

    SampleDataset {
        sales,
        products,
        regions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn generates_exactly_count_rows() {
        let dataset = sample_dataset(100, today(), Some(42));
        assert_eq!(dataset.sales.len(), 100);
        assert_eq!(dataset.products.len(), PRODUCTS.len());
        assert_eq!(dataset.regions.len(), REGIONS.len());
    }

    #[test]
    fn rows_have_positive_values() {
        let dataset = sample_dataset(200, today(), Some(7));
        for sale in &dataset.sales {
            assert!(sale.sales_amount > 0.0);
            assert!(sale.profit > 0.0);
            assert!((1..10).contains(&sale.quantity));
        }
    }

    #[test]
    fn profit_never_exceeds_margin_cap() {
        let dataset = sample_dataset(200, today(), Some(11));
        for sale in &dataset.sales {
            // margin factor is drawn below 0.4; allow for cent rounding
            assert!(sale.profit <= sale.sales_amount * 0.4 + 0.01);
            assert!(sale.profit < sale.sales_amount);
        }
    }

    #[test]
    fn dates_fall_in_trailing_year() {
        let dataset = sample_dataset(150, today(), Some(3));
        let floor = today() - Duration::days(HISTORY_DAYS);
        for sale in &dataset.sales {
            assert!(sale.date >= floor && sale.date <= today());
        }
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = sample_dataset(50, today(), Some(42));
        let b = sample_dataset(50, today(), Some(42));
        for (x, y) in a.sales.iter().zip(b.sales.iter()) {
            assert_eq!(x.date, y.date);
            assert_eq!(x.product, y.product);
            assert_eq!(x.region, y.region);
            assert_eq!(x.sales_amount, y.sales_amount);
            assert_eq!(x.profit, y.profit);
            assert_eq!(x.quantity, y.quantity);
        }
    }
}
