use anyhow::Result;
use std::io::Write;

use crate::application::{AccountingReport, DashboardSummary};

/// Writes reports in machine-readable formats.
pub struct Exporter<W: Write> {
    writer: W,
}

impl<W: Write> Exporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Export the report's rows as CSV, one line per sale. Returns the
    /// number of rows written.
    pub fn accounting_csv(self, report: &AccountingReport) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(self.writer);

        csv_writer.write_record([
            "id",
            "created_at",
            "employee",
            "price",
            "employee_amount",
            "shop_amount",
        ])?;

        let mut count = 0;
        for row in &report.sales {
            csv_writer.write_record(&[
                row.sale.id.to_string(),
                row.sale.created_at.to_rfc3339(),
                row.employee_name.clone(),
                row.sale.price.to_string(),
                row.sale.employee_amount.to_string(),
                row.sale.shop_amount.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    pub fn accounting_json(mut self, report: &AccountingReport) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, report)?;
        writeln!(self.writer)?;
        Ok(())
    }

    pub fn dashboard_json(mut self, summary: &DashboardSummary) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, summary)?;
        writeln!(self.writer)?;
        Ok(())
    }
}
