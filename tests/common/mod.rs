#![allow(dead_code)]

use chrono::NaiveDate;

/// A posting read back from a generated journal.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub date: NaiveDate,
    pub payee: String,
    pub to_account: String,
    pub from_account: String,
    /// Currency amount, or units times price for commodity postings.
    pub amount: f64,
    pub units: Option<(f64, String, f64)>,
}

pub fn parse_journal(journal: &str) -> Vec<Entry> {
    let lines: Vec<&str> = journal.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len() % 3, 0, "journal has a partial posting");

    lines
        .chunks(3)
        .map(|chunk| {
            let (date, payee) = chunk[0].split_once(' ').expect("header line");
            let date = NaiveDate::parse_from_str(date, "%Y/%m/%d").expect("posting date");

            let fields: Vec<&str> = chunk[1].split_whitespace().collect();
            let (amount, units) = match fields.as_slice() {
                [_, amount, _currency] => (amount.parse().expect("amount"), None),
                [_, units, commodity, "@", price, _currency] => {
                    let units: f64 = units.parse().expect("units");
                    let price: f64 = price.parse().expect("price");
                    (units * price, Some((units, commodity.to_string(), price)))
                }
                other => panic!("unexpected posting line: {other:?}"),
            };

            Entry {
                date,
                payee: payee.to_string(),
                to_account: fields[0].to_string(),
                from_account: chunk[2].trim().to_string(),
                amount,
                units,
            }
        })
        .collect()
}

/// Net cash movement of `account` across `entries`.
pub fn net_flow(entries: &[Entry], account: &str) -> f64 {
    entries
        .iter()
        .map(|e| {
            if e.to_account == account {
                e.amount
            } else if e.from_account == account {
                -e.amount
            } else {
                0.0
            }
        })
        .sum()
}
