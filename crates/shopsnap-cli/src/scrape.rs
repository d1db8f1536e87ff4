//! `scrape` subcommand: runs one job and writes (or prints) its artifacts.

use std::io::Write;

use anyhow::Context;
use shopsnap_scraper::{
    export::write_csv, run_scrape, ExportStore, ScrapeOptions, ScrapeOutput, ScrapeRequest,
    StorefrontClient,
};
use uuid::Uuid;

use crate::ScrapeArgs;

pub(crate) fn build_request(args: &ScrapeArgs) -> ScrapeRequest {
    ScrapeRequest {
        shop_url: args.shop_url.clone(),
        homepage: args.homepage,
        products: !args.no_products,
        key_pages: args.key_pages.clone(),
    }
}

pub(crate) fn summary_line(output: &ScrapeOutput) -> String {
    format!(
        "{}: {} products, {} rows, {} skipped, {} fetch failures, {} key pages{}",
        output.snapshot.shop_url,
        output.snapshot.products.len(),
        output.rows.len(),
        output.skipped.len(),
        output.fetch_failures.len(),
        output.snapshot.key_pages.len(),
        if output.snapshot.homepage.is_some() {
            ", homepage captured"
        } else {
            ""
        }
    )
}

/// Runs the job described by `args`.
///
/// # Errors
///
/// Returns an error if the client cannot be built, the job fails, or the
/// artifacts cannot be written.
pub(crate) async fn run_scrape_command(
    config: &shopsnap_core::AppConfig,
    args: ScrapeArgs,
) -> anyhow::Result<()> {
    let client = StorefrontClient::from_app_config(config)
        .context("failed to build storefront client")?;
    let mut options = ScrapeOptions::from_app_config(config);
    options.strict_variants |= args.strict;

    let request = build_request(&args);
    let output = run_scrape(&client, &options, &request)
        .await
        .with_context(|| format!("scrape failed for {}", request.shop_url))?;

    for skipped in &output.skipped {
        tracing::warn!(
            handle = %skipped.handle,
            variant_position = ?skipped.variant_position,
            reason = ?skipped.reason,
            "skipped record"
        );
    }

    if args.stdout {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write_csv(&output.rows, &mut handle).context("failed to write CSV to stdout")?;
        handle.flush()?;
        eprintln!("{}", summary_line(&output));
        return Ok(());
    }

    let out_dir = args.out_dir.unwrap_or_else(|| config.export_dir.clone());
    let store = ExportStore::new(out_dir);
    let job_id = Uuid::new_v4();
    let saved = store
        .save(job_id, &output.rows, &output.snapshot)
        .await
        .with_context(|| format!("failed to write artifacts under {}", store.root().display()))?;

    println!("{}", summary_line(&output));
    if let Some(csv) = &saved.csv {
        println!("csv: {}", csv.display());
    }
    println!("snapshot: {}", saved.snapshot.display());
    Ok(())
}
