use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fs, path::Path, path::PathBuf};
use tracing::debug;

/// Example configuration shipped with the binary, written by `setup`/`init`.
pub const DEFAULT_CONFIG: &str = include_str!("../../docs/example_config.yaml");

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommodityType {
    MutualFund,
    Nps,
}

/// Binds a commodity name used in the journal to a provider price series.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CommodityConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub commodity_type: CommodityType,
    pub code: String,
}

/// A fund receiving `share` of an amount, held in `account`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FundAllocation {
    pub commodity: String,
    pub account: String,
    pub share: f64,
}

impl FundAllocation {
    fn new(commodity: &str, account: &str, share: f64) -> Self {
        Self {
            commodity: commodity.to_string(),
            account: account.to_string(),
            share,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FundsConfig {
    /// Pension sub-funds bought out of every salary.
    pub pension: Vec<FundAllocation>,
    /// Funds the leftover cash is invested in each month. The first one is
    /// the primary equity position, partially sold every March.
    pub investments: Vec<FundAllocation>,
}

impl Default for FundsConfig {
    fn default() -> Self {
        FundsConfig {
            pension: vec![
                FundAllocation::new("NPS_HDFC_E", "Assets:Debt:NPS:HDFC:E", 0.75),
                FundAllocation::new("NPS_HDFC_C", "Assets:Equity:NPS:HDFC:C", 0.15),
                FundAllocation::new("NPS_HDFC_G", "Assets:Equity:NPS:HDFC:G", 0.10),
            ],
            investments: vec![
                FundAllocation::new("NIFTY", "Assets:Equity:NIFTY", 0.5),
                FundAllocation::new("NIFTY_JR", "Assets:Equity:NIFTY_JR", 0.2),
                FundAllocation::new("ABCBF", "Assets:Debt:ABCBF", 0.3),
            ],
        }
    }
}

/// A recurring expense paid from checking.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExpenseRule {
    pub payee: String,
    pub account: String,
    pub amount: f64,
    /// Lowest fraction of `amount` actually spent; 1.0 disables the fuzz.
    #[serde(default = "default_floor")]
    pub floor: f64,
    /// Calendar months (1-12) the expense occurs in; every month if absent.
    #[serde(default)]
    pub months: Option<Vec<u32>>,
}

fn default_floor() -> f64 {
    1.0
}

impl ExpenseRule {
    fn new(payee: &str, account: &str, amount: f64, floor: f64) -> Self {
        Self {
            payee: payee.to_string(),
            account: account.to_string(),
            amount,
            floor,
            months: None,
        }
    }

    pub fn applies_to(&self, month: u32) -> bool {
        self.months.as_ref().is_none_or(|m| m.contains(&month))
    }
}

pub fn default_expenses() -> Vec<ExpenseRule> {
    let mut dress = ExpenseRule::new("Dress", "Expenses:Clothing", 5000.0, 0.5);
    dress.months = Some(vec![1, 4, 11, 12]);
    vec![
        ExpenseRule::new("Internet", "Expenses:Utilities", 1500.0, 1.0),
        ExpenseRule::new("Mobile", "Expenses:Utilities", 430.0, 1.0),
        ExpenseRule::new("Shopping", "Expenses:Shopping", 3000.0, 0.5),
        ExpenseRule::new("Eat out", "Expenses:Restaurants", 2500.0, 0.5),
        ExpenseRule::new("Groceries", "Expenses:Food", 5000.0, 0.9),
        dress,
    ]
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    pub start_year: i32,
    /// Exclusive end of the simulation; today when absent.
    pub end_date: Option<NaiveDate>,
    pub opening_balance: f64,
    pub yearly_salary: f64,
    pub monthly_rent: f64,
    /// Seed for the random amounts; a fresh seed is drawn when absent.
    pub seed: Option<u64>,
    pub expenses: Vec<ExpenseRule>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            start_year: 2014,
            end_date: None,
            opening_balance: 0.0,
            yearly_salary: 500_000.0,
            monthly_rent: 10_000.0,
            seed: None,
            expenses: default_expenses(),
        }
    }
}

impl SimulationConfig {
    pub fn start_date(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year, 1, 1)
            .with_context(|| format!("Invalid start year: {}", self.start_year))
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MutualFundProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NpsProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub mutualfund: Option<MutualFundProviderConfig>,
    pub nps: Option<NpsProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            mutualfund: Some(MutualFundProviderConfig {
                base_url: "https://api.mfapi.in".to_string(),
            }),
            nps: Some(NpsProviderConfig {
                base_url: "https://nps.purifiedbytes.com".to_string(),
            }),
        }
    }
}

/// Slack for shares such as 0.1 + 0.2 + 0.7 that overshoot 1 in floating point.
const SHARE_TOLERANCE: f64 = 1e-9;

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub journal_path: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub funds: FundsConfig,
    pub commodities: Vec<CommodityConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "sampledger", "sampledger")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Journal location; relative paths resolve against `base_dir`.
    pub fn journal_path(&self, base_dir: &Path) -> PathBuf {
        let path = PathBuf::from(self.journal_path.as_deref().unwrap_or("personal.ledger"));
        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    }

    pub fn commodity(&self, name: &str) -> Option<&CommodityConfig> {
        self.commodities.iter().find(|c| c.name == name)
    }

    /// Rejects configurations the generator cannot run with.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for commodity in &self.commodities {
            if !names.insert(commodity.name.as_str()) {
                bail!("Commodity declared twice: {}", commodity.name);
            }
        }

        if self.funds.investments.is_empty() {
            bail!("At least one investment fund is required");
        }

        for fund in self.funds.pension.iter().chain(&self.funds.investments) {
            if !names.contains(fund.commodity.as_str()) {
                bail!("Unknown commodity in funds: {}", fund.commodity);
            }
            if !(fund.share > 0.0 && fund.share <= 1.0) {
                bail!(
                    "Share of {} must be within (0, 1], got {}",
                    fund.commodity,
                    fund.share
                );
            }
        }

        for (kind, funds) in [
            ("Pension", &self.funds.pension),
            ("Investment", &self.funds.investments),
        ] {
            let total: f64 = funds.iter().map(|f| f.share).sum();
            if total > 1.0 + SHARE_TOLERANCE {
                bail!("{kind} shares must add up to at most 1, got {total}");
            }
        }

        for expense in &self.simulation.expenses {
            if !expense.amount.is_finite() || expense.amount < 0.0 {
                bail!(
                    "Amount of expense {} must not be negative, got {}",
                    expense.payee,
                    expense.amount
                );
            }
            if !(0.0..=1.0).contains(&expense.floor) {
                bail!(
                    "Floor of expense {} must be within [0, 1], got {}",
                    expense.payee,
                    expense.floor
                );
            }
        }

        self.simulation.start_date()?;
        Ok(())
    }
}
