use std::io::Cursor;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use serde::Serialize;
use umya_spreadsheet::Worksheet;

use crate::models::{Metrics, Product, Region, SalesRecord};

/// Serialize any flat row type to CSV with a header row, in memory.
pub fn to_csv<T: Serialize>(rows: &[T]) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush().context("failed to flush csv buffer")?;
    }
    Ok(buf)
}

/// Timestamped attachment name, e.g. `sales_export_20260807_120000.csv`.
pub fn export_filename(prefix: &str, extension: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_export_{}.{}",
        prefix,
        now.format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Build the four-sheet workbook: sales, products, regions and a one-row
/// metrics summary. Rendered fully in memory.
pub fn to_xlsx(
    sales: &[SalesRecord],
    products: &[Product],
    regions: &[Region],
    metrics: &Metrics,
) -> anyhow::Result<Vec<u8>> {
    let mut book = umya_spreadsheet::new_file();

    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| anyhow!("workbook has no default sheet"))?;
    sheet.set_name("Ventas");
    write_sales_sheet(sheet, sales);

    let sheet = book
        .new_sheet("Productos")
        .map_err(|e| anyhow!("failed to add sheet: {e}"))?;
    write_products_sheet(sheet, products);

    let sheet = book
        .new_sheet("Regiones")
        .map_err(|e| anyhow!("failed to add sheet: {e}"))?;
    write_regions_sheet(sheet, regions);

    let sheet = book
        .new_sheet("Resumen")
        .map_err(|e| anyhow!("failed to add sheet: {e}"))?;
    write_summary_sheet(sheet, metrics);

    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
        .map_err(|e| anyhow!("failed to write workbook: {e}"))?;
    Ok(out.into_inner())
}

fn write_header(sheet: &mut Worksheet, columns: &[&str]) {
    for (i, column) in columns.iter().enumerate() {
        sheet
            .get_cell_mut((i as u32 + 1, 1))
            .set_value(column.to_string());
    }
}

fn write_sales_sheet(sheet: &mut Worksheet, sales: &[SalesRecord]) {
    write_header(
        sheet,
        &["id", "date", "product", "region", "sales_amount", "profit", "quantity"],
    );
    for (i, sale) in sales.iter().enumerate() {
        let row = i as u32 + 2;
        sheet.get_cell_mut((1, row)).set_value_number(sale.id as f64);
        sheet
            .get_cell_mut((2, row))
            .set_value(sale.date.format("%Y-%m-%d").to_string());
        sheet.get_cell_mut((3, row)).set_value(sale.product.clone());
        sheet.get_cell_mut((4, row)).set_value(sale.region.clone());
        sheet.get_cell_mut((5, row)).set_value_number(sale.sales_amount);
        sheet.get_cell_mut((6, row)).set_value_number(sale.profit);
        sheet
            .get_cell_mut((7, row))
            .set_value_number(sale.quantity as f64);
    }
}

fn write_products_sheet(sheet: &mut Worksheet, products: &[Product]) {
    write_header(sheet, &["id", "name", "category", "price", "cost"]);
    for (i, product) in products.iter().enumerate() {
        let row = i as u32 + 2;
        sheet
            .get_cell_mut((1, row))
            .set_value_number(product.id as f64);
        sheet.get_cell_mut((2, row)).set_value(product.name.clone());
        sheet
            .get_cell_mut((3, row))
            .set_value(product.category.clone());
        sheet.get_cell_mut((4, row)).set_value_number(product.price);
        sheet.get_cell_mut((5, row)).set_value_number(product.cost);
    }
}

fn write_regions_sheet(sheet: &mut Worksheet, regions: &[Region]) {
    write_header(sheet, &["id", "name", "country", "population"]);
    for (i, region) in regions.iter().enumerate() {
        let row = i as u32 + 2;
        sheet
            .get_cell_mut((1, row))
            .set_value_number(region.id as f64);
        sheet.get_cell_mut((2, row)).set_value(region.name.clone());
        sheet
            .get_cell_mut((3, row))
            .set_value(region.country.clone());
        sheet
            .get_cell_mut((4, row))
            .set_value_number(region.population as f64);
    }
}

fn write_summary_sheet(sheet: &mut Worksheet, metrics: &Metrics) {
    write_header(
        sheet,
        &[
            "total_sales",
            "total_profit",
            "total_customers",
            "avg_order_value",
            "growth_rate",
        ],
    );
    sheet.get_cell_mut((1, 2)).set_value_number(metrics.total_sales);
    sheet
        .get_cell_mut((2, 2))
        .set_value_number(metrics.total_profit);
    sheet
        .get_cell_mut((3, 2))
        .set_value_number(metrics.total_customers as f64);
    sheet
        .get_cell_mut((4, 2))
        .set_value_number(metrics.avg_order_value);
    sheet
        .get_cell_mut((5, 2))
        .set_value_number(metrics.growth_rate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics;
    use chrono::NaiveDate;

    fn sample_sales() -> Vec<SalesRecord> {
        (0..10)
            .map(|i| SalesRecord {
                id: i + 1,
                date: NaiveDate::from_ymd_opt(2026, 1 + (i as u32 % 6), 15).unwrap(),
                product: "Laptop Pro".to_string(),
                region: "Norte".to_string(),
                sales_amount: 100.0 * (i + 1) as f64,
                profit: 20.0 * (i + 1) as f64,
                quantity: 2,
            })
            .collect()
    }

    #[test]
    fn csv_roundtrip_preserves_row_count() {
        let sales = sample_sales();
        let bytes = to_csv(&sales).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), sales.len());
    }

    #[test]
    fn csv_header_lists_record_fields() {
        let bytes = to_csv(&sample_sales()).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["id", "date", "product", "region", "sales_amount", "profit", "quantity"]
        );
    }

    #[test]
    fn workbook_contains_all_four_sheets() {
        let sales = sample_sales();
        let summary = analytics::summarize(&sales, NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
        let bytes = to_xlsx(&sales, &[], &[], &summary.metrics).unwrap();

        let book =
            umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true).unwrap();
        for name in ["Ventas", "Productos", "Regiones", "Resumen"] {
            assert!(book.get_sheet_by_name(name).is_some(), "missing sheet {name}");
        }

        let ventas = book.get_sheet_by_name("Ventas").unwrap();
        assert_eq!(ventas.get_value((1, 1)), "id");
        // header plus ten data rows
        assert_eq!(ventas.get_value((3, 11)), "Laptop Pro");
    }

    #[test]
    fn filenames_carry_table_and_timestamp() {
        let now = DateTime::parse_from_rfc3339("2026-08-07T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            export_filename("sales", "csv", now),
            "sales_export_20260807_120000.csv"
        );
    }
}
