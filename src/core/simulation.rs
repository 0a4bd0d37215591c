//! Month by month simulation of salary, expenses and investments.
//!
//! Every month runs the salary rules, then expenses, then investments. Each
//! step spends from the cash balance the previous one left behind.

use super::config::{ExpenseRule, FundsConfig, SimulationConfig};
use super::error::LedgerError;
use super::ledger::CommodityLedger;
use super::posting::PostingSink;
use super::price::PriceIndex;
use super::rules::{
    employer_for_year, increment_by_percent_range, percent_range, round_to_k, tax_rate,
};
use chrono::{Datelike, Days, Months, NaiveDate};
use rand::Rng;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, info};

pub const CHECKING_ACCOUNT: &str = "Assets:Checking";
pub const EPF_ACCOUNT: &str = "Assets:Debt:EPF";
pub const EPF_INTEREST_ACCOUNT: &str = "Income:Interest:EPF";
pub const TAX_ACCOUNT: &str = "Expenses:Tax";
pub const RENT_ACCOUNT: &str = "Expenses:Rent";

const APRIL: u32 = 4;
const MARCH: u32 = 3;

const SALARY_INCREMENT: (u32, u32) = (10, 15);
const RENT_INCREMENT: (u32, u32) = (5, 10);
const EPF_RATE: f64 = 0.12;
const NPS_RATE: f64 = 0.10;
const EPF_INTEREST_RATE: f64 = 0.08;

/// Amount taken out of the primary equity fund every March.
pub const YEARLY_SELL_AMOUNT: f64 = 75_000.0;
const SELL_DAY_OFFSET: u64 = 15;

/// Running balances of the simulated person.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub cash_balance: f64,
    pub retirement_balance: f64,
    pub yearly_salary: f64,
    pub monthly_rent: f64,
    /// Units held per fund account. Two funds of the same commodity are
    /// separate positions.
    pub positions: BTreeMap<String, f64>,
}

impl SimulationState {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            cash_balance: config.opening_balance,
            retirement_balance: 0.0,
            yearly_salary: config.yearly_salary,
            monthly_rent: config.monthly_rent,
            positions: BTreeMap::new(),
        }
    }

    pub fn position(&self, account: &str) -> f64 {
        self.positions.get(account).copied().unwrap_or(0.0)
    }

    fn add_units(&mut self, account: &str, units: f64) {
        *self.positions.entry(account.to_string()).or_insert(0.0) += units;
    }
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub months: u32,
    pub postings: usize,
    pub state: SimulationState,
}

pub struct SimulationEngine<'a, W: Write, R: Rng> {
    ledger: CommodityLedger<'a>,
    sink: PostingSink<W>,
    rng: R,
    funds: &'a FundsConfig,
    expenses: &'a [ExpenseRule],
    state: SimulationState,
}

impl<'a, W: Write, R: Rng> SimulationEngine<'a, W, R> {
    /// Fails if a configured fund has no price series.
    pub fn new(
        config: &'a SimulationConfig,
        funds: &'a FundsConfig,
        prices: &'a PriceIndex,
        sink: PostingSink<W>,
        rng: R,
    ) -> Result<Self, LedgerError> {
        if let Some(missing) = funds
            .pension
            .iter()
            .chain(&funds.investments)
            .find(|f| !prices.contains(&f.commodity))
        {
            return Err(LedgerError::UnknownCommodity(missing.commodity.clone()));
        }

        Ok(Self {
            ledger: CommodityLedger::new(prices),
            sink,
            rng,
            funds,
            expenses: &config.expenses,
            state: SimulationState::new(config),
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Simulates every month from `start` while the month start is before
    /// `end`, then flushes the journal and returns its writer.
    pub fn run(
        mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(SimulationReport, W), LedgerError> {
        let mut cursor = start;
        let mut months = 0;
        while cursor < end {
            self.run_month(cursor)?;
            months += 1;

            if cursor.month() == 12 {
                info!(
                    year = cursor.year(),
                    cash = self.state.cash_balance,
                    epf = self.state.retirement_balance,
                    "Simulated year"
                );
            }

            let Some(next) = cursor.checked_add_months(Months::new(1)) else {
                break;
            };
            cursor = next;
        }

        let postings = self.sink.count();
        let writer = self.sink.finish()?;
        Ok((
            SimulationReport {
                months,
                postings,
                state: self.state,
            },
            writer,
        ))
    }

    pub fn run_month(&mut self, date: NaiveDate) -> Result<(), LedgerError> {
        debug!(%date, "Simulating month");
        self.emit_salary(date)?;
        self.emit_expenses(date)?;
        self.emit_investments(date)
    }

    fn emit_salary(&mut self, date: NaiveDate) -> Result<(), LedgerError> {
        if date.month() == APRIL {
            let (min, max) = SALARY_INCREMENT;
            self.state.yearly_salary =
                increment_by_percent_range(&mut self.rng, self.state.yearly_salary, min, max);
            debug!(salary = self.state.yearly_salary, "Yearly salary revised");
        }

        let salary = self.state.yearly_salary / 12.0;
        let salary_account = format!("Income:Salary:{}", employer_for_year(date.year()));

        let tax = salary * tax_rate(self.state.yearly_salary);
        let epf = salary * EPF_RATE;
        let nps = salary * NPS_RATE;
        let net_salary = salary - tax - epf - nps;

        self.sink
            .transaction(date, "Salary", &salary_account, CHECKING_ACCOUNT, net_salary)?;
        self.state.cash_balance += net_salary;

        self.sink
            .transaction(date, "Salary EPF", &salary_account, EPF_ACCOUNT, epf)?;
        self.state.retirement_balance += epf;

        self.sink
            .transaction(date, "Salary Tax", &salary_account, TAX_ACCOUNT, tax)?;

        let funds = self.funds;
        for fund in &funds.pension {
            let units = self.ledger.buy(
                &mut self.sink,
                date,
                &fund.commodity,
                &salary_account,
                &fund.account,
                nps * fund.share,
            )?;
            self.state.add_units(&fund.account, units);
        }
        Ok(())
    }

    fn emit_expenses(&mut self, date: NaiveDate) -> Result<(), LedgerError> {
        if date.month() == APRIL {
            let (min, max) = RENT_INCREMENT;
            self.state.monthly_rent =
                increment_by_percent_range(&mut self.rng, self.state.monthly_rent, min, max);
            debug!(rent = self.state.monthly_rent, "Rent revised");
        }

        let rent = self.state.monthly_rent;
        self.spend(date, "Rent", RENT_ACCOUNT, rent, 1.0)?;

        let expenses = self.expenses;
        for expense in expenses.iter().filter(|e| e.applies_to(date.month())) {
            self.spend(
                date,
                &expense.payee,
                &expense.account,
                expense.amount,
                expense.floor,
            )?;
        }
        Ok(())
    }

    /// Pays a random share of `base` between `floor` and all of it.
    fn spend(
        &mut self,
        date: NaiveDate,
        payee: &str,
        account: &str,
        base: f64,
        floor: f64,
    ) -> Result<(), LedgerError> {
        let min = (floor * 100.0).round() as u32;
        let amount = round_to_k(percent_range(&mut self.rng, min, 100) * base);
        self.sink
            .transaction(date, payee, CHECKING_ACCOUNT, account, amount)?;
        self.state.cash_balance -= amount;
        Ok(())
    }

    fn emit_investments(&mut self, date: NaiveDate) -> Result<(), LedgerError> {
        if date.month() == APRIL {
            let interest = self.state.retirement_balance * EPF_INTEREST_RATE;
            self.sink.transaction(
                date,
                "EPF Interest",
                EPF_INTEREST_ACCOUNT,
                EPF_ACCOUNT,
                interest,
            )?;
            self.state.retirement_balance += interest;
        }

        let funds = self.funds;
        let balance = self.state.cash_balance;
        for fund in &funds.investments {
            let amount = round_to_k(balance * fund.share);
            let units = self.ledger.buy(
                &mut self.sink,
                date,
                &fund.commodity,
                CHECKING_ACCOUNT,
                &fund.account,
                amount,
            )?;
            self.state.cash_balance -= amount;
            self.state.add_units(&fund.account, units);
        }

        if date.month() == MARCH
            && let Some(primary) = funds.investments.first()
        {
            let sell_date = date + Days::new(SELL_DAY_OFFSET);
            let sale = self.ledger.sell(
                &mut self.sink,
                sell_date,
                &primary.commodity,
                CHECKING_ACCOUNT,
                &primary.account,
                YEARLY_SELL_AMOUNT,
                self.state.position(&primary.account),
            )?;
            self.state.add_units(&primary.account, -sale.units);
            self.state.cash_balance += sale.amount;
            debug!(units = sale.units, amount = sale.amount, "Sold primary equity");
        }
        Ok(())
    }
}
