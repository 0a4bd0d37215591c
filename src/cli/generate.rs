use super::ui;
use crate::core::config::{AppConfig, CommodityConfig};
use crate::core::{PostingSink, PriceIndex, SimulationEngine, SimulationReport};
use crate::providers::PriceSources;
use anyhow::{Context, Result};
use comfy_table::Cell;
use futures::future::join_all;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::BufWriter;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Fetches price history for every commodity, simulates the configured
/// period and writes the journal to `journal_path`.
pub async fn run(
    config: &AppConfig,
    sources: &PriceSources,
    journal_path: &Path,
) -> Result<SimulationReport> {
    info!("Generating journal file: {}", journal_path.display());

    let prices = load_prices(&config.commodities, sources).await?;
    let start = config.simulation.start_date()?;
    for commodity in &config.commodities {
        if let Some(first) = prices.first_date(&commodity.name)
            && first > start
        {
            warn!(
                commodity = %commodity.name,
                %first,
                %start,
                "Price history starts after the simulation start"
            );
        }
    }

    let report = write_journal(config, &prices, journal_path)?;
    println!("{}", display_report(&report, journal_path));
    Ok(report)
}

/// Builds the price index from all configured commodities, fetched
/// concurrently. Any failed series aborts the load.
pub async fn load_prices(
    commodities: &[CommodityConfig],
    sources: &PriceSources,
) -> Result<PriceIndex> {
    let pb = ui::new_progress_bar(commodities.len() as u64, true);
    pb.set_message("Fetching price history...");

    let futures = commodities.iter().map(|commodity| {
        let pb_clone = pb.clone();
        async move {
            let res = sources
                .for_type(commodity.commodity_type)
                .fetch_history(&commodity.code)
                .await
                .with_context(|| format!("Failed to load prices for {}", commodity.name));
            pb_clone.inc(1);
            (commodity.name.as_str(), res)
        }
    });

    let results = join_all(futures).await;
    pb.finish_and_clear();

    let mut index = PriceIndex::new();
    for (name, prices) in results {
        index.insert_series(name, prices?);
        debug!(commodity = name, count = index.len(name), "Loaded prices");
    }
    Ok(index)
}

/// Runs the simulation into a temporary file next to `journal_path` and
/// moves it into place only once every month was written.
pub fn write_journal(
    config: &AppConfig,
    prices: &PriceIndex,
    journal_path: &Path,
) -> Result<SimulationReport> {
    let simulation = &config.simulation;
    let start = simulation.start_date()?;
    let end = simulation.end_date();

    let dir = journal_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create journal in {}", dir.display()))?;

    let rng = match simulation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sink = PostingSink::new(BufWriter::new(file), &config.currency);
    let engine = SimulationEngine::new(simulation, &config.funds, prices, sink, rng)?;

    let (report, writer) = engine
        .run(start, end)
        .with_context(|| format!("Failed to generate journal {}", journal_path.display()))?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.persist(journal_path)
        .with_context(|| format!("Failed to write journal {}", journal_path.display()))?;

    info!(
        months = report.months,
        postings = report.postings,
        "Journal generated"
    );
    Ok(report)
}

pub fn display_report(report: &SimulationReport, journal_path: &Path) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Item"), ui::header_cell("Value")]);

    let state = &report.state;
    table.add_row(vec![
        Cell::new("Months simulated"),
        Cell::new(report.months),
    ]);
    table.add_row(vec![Cell::new("Postings"), Cell::new(report.postings)]);
    table.add_row(vec![
        Cell::new("Cash balance"),
        ui::amount_cell(state.cash_balance),
    ]);
    table.add_row(vec![
        Cell::new("EPF balance"),
        ui::amount_cell(state.retirement_balance),
    ]);
    table.add_row(vec![
        Cell::new("Yearly salary"),
        ui::amount_cell(state.yearly_salary),
    ]);
    table.add_row(vec![
        Cell::new("Monthly rent"),
        ui::amount_cell(state.monthly_rent),
    ]);
    for (account, units) in &state.positions {
        table.add_row(vec![
            Cell::new(format!("{account} units")),
            ui::amount_cell(*units),
        ]);
    }

    format!(
        "Journal: {}\n\n{}\n{}",
        ui::style_text(&journal_path.display().to_string(), ui::StyleType::Title),
        table,
        ui::style_text(
            "Balances are as of the last simulated month",
            ui::StyleType::Subtle
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Price;
    use crate::core::config::SimulationConfig;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn config(end: NaiveDate) -> AppConfig {
        let mut config: AppConfig =
            serde_yaml::from_str(crate::core::config::DEFAULT_CONFIG).unwrap();
        config.simulation = SimulationConfig {
            end_date: Some(end),
            seed: Some(42),
            ..SimulationConfig::default()
        };
        config
    }

    fn prices(from: NaiveDate) -> PriceIndex {
        let config = config(from);
        config
            .commodities
            .iter()
            .map(|c| (c.name.clone(), vec![Price::new(from, 10.0)]))
            .collect()
    }

    #[test]
    fn test_write_journal_persists_complete_output() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let journal = temp_dir.path().join("out").join("personal.ledger");
        let config = config(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        let prices = prices(NaiveDate::from_ymd_opt(2013, 1, 1).unwrap());

        let report = write_journal(&config, &prices, &journal)?;

        assert_eq!(report.months, 12);
        let content = std::fs::read_to_string(&journal)?;
        assert!(content.starts_with("\n2014/01/01 Salary\n"));
        assert_eq!(content.matches("\n\n").count() + 1, report.postings);
        // Only the journal is left in the directory
        assert_eq!(std::fs::read_dir(journal.parent().unwrap())?.count(), 1);

        let summary = display_report(&report, &journal);
        assert!(summary.contains("Months simulated"));
        assert!(summary.contains("Assets:Equity:NIFTY"));
        Ok(())
    }

    #[test]
    fn test_failed_run_leaves_no_journal() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let journal = temp_dir.path().join("personal.ledger");
        let config = config(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        // Prices only exist from mid 2014
        let prices = prices(NaiveDate::from_ymd_opt(2014, 6, 1).unwrap());

        let err = write_journal(&config, &prices, &journal).unwrap_err();

        assert!(err.to_string().starts_with("Failed to generate journal"));
        assert!(!journal.exists());
        assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), 0);
        Ok(())
    }
}
