//! The scrape command: the sequential per-site pipeline.

use console::style;
use tracing::{error, info, warn};

use crate::config::{self, RunConfig, SiteConfig};
use crate::extract::{discover_product_links, extract_products};
use crate::fetch::Fetcher;
use crate::report::ReportWriter;

/// Process every seed URL in order and write the report.
///
/// A failure inside one site's processing is logged and the run moves to
/// the next seed; this is the only place errors are caught, so a single
/// bad site never aborts the batch.
pub async fn cmd_scrape(run: &RunConfig, sites: &SiteConfig) -> anyhow::Result<()> {
    let urls = config::load_sites(&run.sites_file)?;
    let mut report = ReportWriter::create(&run.out_dir)?;
    let fetcher = Fetcher::new(run.mode);

    println!(
        "{} Scraping {} site{}...",
        style("→").cyan(),
        urls.len(),
        if urls.len() == 1 { "" } else { "s" }
    );

    for url in &urls {
        if let Err(e) = process_site(url, run, sites, &fetcher, &mut report).await {
            error!("Unhandled error for {}: {:#}", url, e);
        }
    }

    report.flush()?;
    println!(
        "{} Wrote report to: {}",
        style("✓").green(),
        report.path().display()
    );
    Ok(())
}

/// One seed URL: fetch the listing, discover candidate detail pages,
/// extract products from each, stop at the per-site cap.
async fn process_site(
    url: &str,
    run: &RunConfig,
    sites: &SiteConfig,
    fetcher: &Fetcher,
    report: &mut ReportWriter,
) -> anyhow::Result<()> {
    let host = config::host_of(url).unwrap_or_default();
    let include_paths = sites.include_paths_for(url);

    info!("[{}] Fetching ({:?}) {}", host, run.mode, url);
    let html = fetcher.fetch_html(url).await;
    if html.is_empty() {
        warn!("[{}] Empty HTML for seed {}", host, url);
        return Ok(());
    }

    let mut candidates: Vec<String> = discover_product_links(url, &html, include_paths)
        .into_iter()
        .collect();
    if candidates.is_empty() {
        // No plausible detail links: the seed itself may be the product page.
        candidates.push(url.to_string());
    }
    candidates.truncate(run.first_n);

    let mut collected = 0usize;
    for link in &candidates {
        let page = fetcher.fetch_html(link).await;
        if page.is_empty() {
            continue;
        }
        for product in extract_products(&page, link) {
            report.write_product(&host, link, &product)?;
            collected += 1;
        }
        if collected >= run.first_n {
            break;
        }
    }

    info!("[{}] Wrote {} products", host, collected);
    Ok(())
}
