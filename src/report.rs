//! Pipe-delimited run report.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat, Utc};

use crate::models::Product;

const HEADER: &str = "timestamp_iso | site_name | product_name | status | price_value | currency | product_url | raw_price_text";

const NA: &str = "N/A";

/// Owns the single output handle for the whole run. Lines land in the
/// order the pipeline produced them; the file is meant to be read
/// top-to-bottom.
pub struct ReportWriter {
    out: BufWriter<File>,
    path: PathBuf,
}

impl ReportWriter {
    /// Create `<timestamp>_scrape.txt` under `out_dir` (creating the
    /// directory as needed) and write the header line.
    pub fn create(out_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(out_dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = out_dir.join(format!("{stamp}_scrape.txt"));
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, "{HEADER}")?;
        Ok(Self { out, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one product line. `fallback_url` stands in when the record
    /// carries no URL of its own.
    pub fn write_product(
        &mut self,
        site: &str,
        fallback_url: &str,
        product: &Product,
    ) -> io::Result<()> {
        let price = product
            .price_value
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| NA.to_string());
        let line = [
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            or_fallback(site, "unknown"),
            or_fallback(&product.name, NA),
            product.status.as_str().to_string(),
            price,
            or_fallback(product.currency.as_deref().unwrap_or(""), NA),
            or_fallback(&product.url, fallback_url),
            or_fallback(&product.raw_price_text, NA),
        ]
        .join(" | ");
        writeln!(self.out, "{line}")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn or_fallback(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
