use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use crate::models::{Product, Region, SalesRecord, SampleDataset};

/// Tables that can be exported by name. Anything else is rejected at the
/// API boundary before reaching the store.
pub const EXPORTABLE_TABLES: [&str; 3] = ["sales", "products", "regions"];

pub async fn init_db(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            product TEXT NOT NULL,
            region TEXT NOT NULL,
            sales_amount REAL NOT NULL,
            profit REAL NOT NULL,
            quantity INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            category TEXT NOT NULL,
            price REAL NOT NULL,
            cost REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS regions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            country TEXT NOT NULL,
            population INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the whole dataset in one transaction. Readers observe either
/// the previous generation or the new one, never a half-loaded table.
pub async fn rebuild(pool: &SqlitePool, dataset: &SampleDataset) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM sales").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM regions").execute(&mut *tx).await?;

    for sale in &dataset.sales {
        sqlx::query(
            "INSERT INTO sales (date, product, region, sales_amount, profit, quantity) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(sale.date)
        .bind(&sale.product)
        .bind(&sale.region)
        .bind(sale.sales_amount)
        .bind(sale.profit)
        .bind(sale.quantity)
        .execute(&mut *tx)
        .await?;
    }

    for product in &dataset.products {
        sqlx::query("INSERT INTO products (name, category, price, cost) VALUES (?, ?, ?, ?)")
            .bind(&product.name)
            .bind(&product.category)
            .bind(product.price)
            .bind(product.cost)
            .execute(&mut *tx)
            .await?;
    }

    for region in &dataset.regions {
        sqlx::query("INSERT INTO regions (name, country, population) VALUES (?, ?, ?)")
            .bind(&region.name)
            .bind(&region.country)
            .bind(region.population)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}

pub async fn fetch_sales(
    pool: &SqlitePool,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    product: Option<&str>,
    region: Option<&str>,
) -> sqlx::Result<Vec<SalesRecord>> {
    let mut query = String::from(
        "SELECT id, date, product, region, sales_amount, profit, quantity FROM sales WHERE 1 = 1",
    );

    if start_date.is_some() {
        query.push_str(" AND date >= ?");
    }
    if end_date.is_some() {
        query.push_str(" AND date <= ?");
    }
    if product.is_some() {
        query.push_str(" AND product = ?");
    }
    if region.is_some() {
        query.push_str(" AND region = ?");
    }
    query.push_str(" ORDER BY date");

    let mut rows = sqlx::query(&query);
    if let Some(value) = start_date {
        rows = rows.bind(value);
    }
    if let Some(value) = end_date {
        rows = rows.bind(value);
    }
    if let Some(value) = product {
        rows = rows.bind(value.to_string());
    }
    if let Some(value) = region {
        rows = rows.bind(value.to_string());
    }

    let records = rows.fetch_all(pool).await?;
    let mut sales = Vec::with_capacity(records.len());

    for row in records {
        sales.push(SalesRecord {
            id: row.get("id"),
            date: row.get("date"),
            product: row.get("product"),
            region: row.get("region"),
            sales_amount: row.get("sales_amount"),
            profit: row.get("profit"),
            quantity: row.get("quantity"),
        });
    }

    Ok(sales)
}

pub async fn fetch_products(pool: &SqlitePool) -> sqlx::Result<Vec<Product>> {
    let rows = sqlx::query("SELECT id, name, category, price, cost FROM products ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Product {
            id: row.get("id"),
            name: row.get("name"),
            category: row.get("category"),
            price: row.get("price"),
            cost: row.get("cost"),
        })
        .collect())
}

pub async fn fetch_regions(pool: &SqlitePool) -> sqlx::Result<Vec<Region>> {
    let rows = sqlx::query("SELECT id, name, country, population FROM regions ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Region {
            id: row.get("id"),
            name: row.get("name"),
            country: row.get("country"),
            population: row.get("population"),
        })
        .collect())
}

/// Distinct values of one sales column, sorted ascending. Used for the
/// filter-options endpoint.
pub async fn distinct_dates(pool: &SqlitePool) -> sqlx::Result<Vec<NaiveDate>> {
    let rows = sqlx::query("SELECT DISTINCT date FROM sales ORDER BY date")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|row| row.get("date")).collect())
}

pub async fn distinct_products(pool: &SqlitePool) -> sqlx::Result<Vec<String>> {
    let rows = sqlx::query("SELECT DISTINCT product FROM sales ORDER BY product")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|row| row.get("product")).collect())
}

pub async fn distinct_regions(pool: &SqlitePool) -> sqlx::Result<Vec<String>> {
    let rows = sqlx::query("SELECT DISTINCT region FROM sales ORDER BY region")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|row| row.get("region")).collect())
}

/// Cheap liveness probe for the health endpoint.
pub async fn sales_count(pool: &SqlitePool) -> sqlx::Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM sales")
        .fetch_one(pool)
        .await?;
    Ok(row.get("n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_db(&pool).await.unwrap();
        pool
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[tokio::test]
    async fn rebuild_inserts_every_generated_row() {
        let pool = memory_pool().await;
        let dataset = generator::sample_dataset(75, today(), Some(42));
        rebuild(&pool, &dataset).await.unwrap();

        assert_eq!(sales_count(&pool).await.unwrap(), 75);
        assert_eq!(fetch_products(&pool).await.unwrap().len(), 10);
        assert_eq!(fetch_regions(&pool).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn rebuild_replaces_the_previous_generation() {
        let pool = memory_pool().await;
        rebuild(&pool, &generator::sample_dataset(40, today(), Some(1)))
            .await
            .unwrap();
        rebuild(&pool, &generator::sample_dataset(15, today(), Some(2)))
            .await
            .unwrap();

        assert_eq!(sales_count(&pool).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn date_range_filter_is_inclusive() {
        let pool = memory_pool().await;
        let dataset = generator::sample_dataset(200, today(), Some(42));
        rebuild(&pool, &dataset).await.unwrap();

        let start = today() - chrono::Duration::days(60);
        let end = today() - chrono::Duration::days(30);
        let sales = fetch_sales(&pool, Some(start), Some(end), None, None)
            .await
            .unwrap();

        assert!(!sales.is_empty());
        for sale in &sales {
            assert!(sale.date >= start && sale.date <= end);
        }
    }

    #[tokio::test]
    async fn product_and_region_filters_match_exactly() {
        let pool = memory_pool().await;
        let dataset = generator::sample_dataset(200, today(), Some(42));
        rebuild(&pool, &dataset).await.unwrap();

        let sales = fetch_sales(&pool, None, None, Some("Laptop Pro"), Some("Norte"))
            .await
            .unwrap();
        for sale in &sales {
            assert_eq!(sale.product, "Laptop Pro");
            assert_eq!(sale.region, "Norte");
        }
    }

    #[tokio::test]
    async fn distinct_lists_are_sorted_and_deduplicated() {
        let pool = memory_pool().await;
        let dataset = generator::sample_dataset(300, today(), Some(42));
        rebuild(&pool, &dataset).await.unwrap();

        let products = distinct_products(&pool).await.unwrap();
        assert!(products.len() <= generator::PRODUCTS.len());
        for pair in products.windows(2) {
            assert!(pair[0] < pair[1]);
        }

        let dates = distinct_dates(&pool).await.unwrap();
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
