//! Plain-text rendering of postings in ledger journal syntax

use super::error::LedgerError;
use chrono::NaiveDate;
use std::io::Write;

/// Payee used for every commodity purchase or disposal.
pub const INVESTMENT_PAYEE: &str = "Investment";

/// Amount side of a posting.
#[derive(Debug, Clone, PartialEq)]
pub enum PostingAmount<'a> {
    Currency(f64),
    Units {
        units: f64,
        commodity: &'a str,
        price: f64,
    },
}

/// A debit/credit pair, rendered once and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting<'a> {
    pub date: NaiveDate,
    pub payee: &'a str,
    pub to_account: &'a str,
    pub from_account: &'a str,
    pub amount: PostingAmount<'a>,
}

/// Formats a number with up to 4 decimals, trimming trailing zeros and a
/// dangling decimal point.
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes postings to an underlying writer as they are produced.
pub struct PostingSink<W: Write> {
    writer: W,
    currency: String,
    count: usize,
}

impl<W: Write> PostingSink<W> {
    pub fn new(writer: W, currency: &str) -> Self {
        Self {
            writer,
            currency: currency.to_string(),
            count: 0,
        }
    }

    /// Number of postings written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn emit(&mut self, posting: &Posting<'_>) -> Result<(), LedgerError> {
        let date = posting.date.format("%Y/%m/%d");
        match &posting.amount {
            PostingAmount::Currency(amount) => write!(
                self.writer,
                "\n{date} {}\n    {}                                {} {}\n    {}\n",
                posting.payee,
                posting.to_account,
                format_amount(*amount),
                self.currency,
                posting.from_account,
            )?,
            PostingAmount::Units {
                units,
                commodity,
                price,
            } => write!(
                self.writer,
                "\n{date} {}\n    {}                      {} {} @    {} {}\n    {}\n",
                posting.payee,
                posting.to_account,
                format_amount(*units),
                commodity,
                format_amount(*price),
                self.currency,
                posting.from_account,
            )?,
        }
        self.count += 1;
        Ok(())
    }

    /// Shorthand for a currency posting.
    pub fn transaction(
        &mut self,
        date: NaiveDate,
        payee: &str,
        from_account: &str,
        to_account: &str,
        amount: f64,
    ) -> Result<(), LedgerError> {
        self.emit(&Posting {
            date,
            payee,
            to_account,
            from_account,
            amount: PostingAmount::Currency(amount),
        })
    }

    /// Flushes pending output and hands back the writer.
    pub fn finish(mut self) -> Result<W, LedgerError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 1, 1).unwrap()
    }

    #[test]
    fn test_format_amount_trims_zeros() {
        assert_eq!(format_amount(32500.0), "32500");
        assert_eq!(format_amount(312.5), "312.5");
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(-7500.0), "-7500");
        assert_eq!(format_amount(1.0 / 3.0), "0.3333");
        assert_eq!(format_amount(2.00004), "2");
        assert_eq!(format_amount(-0.00001), "0");
    }

    #[test]
    fn test_currency_posting_layout() {
        let mut sink = PostingSink::new(Vec::new(), "INR");
        sink.transaction(
            date(),
            "Salary",
            "Income:Salary:Acme",
            "Assets:Checking",
            32500.0,
        )
        .unwrap();
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            "\n2014/01/01 Salary\n    Assets:Checking                                32500 INR\n    Income:Salary:Acme\n"
        );
    }

    #[test]
    fn test_units_posting_layout() {
        let mut sink = PostingSink::new(Vec::new(), "INR");
        sink.emit(&Posting {
            date: date(),
            payee: INVESTMENT_PAYEE,
            to_account: "Assets:Equity:NIFTY",
            from_account: "Assets:Checking",
            amount: PostingAmount::Units {
                units: 1250.5,
                commodity: "NIFTY",
                price: 10.25,
            },
        })
        .unwrap();
        assert_eq!(sink.count(), 1);
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            "\n2014/01/01 Investment\n    Assets:Equity:NIFTY                      1250.5 NIFTY @    10.25 INR\n    Assets:Checking\n"
        );
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut sink = PostingSink::new(FailingWriter, "INR");
        let err = sink
            .transaction(date(), "Rent", "Assets:Checking", "Expenses:Rent", 10000.0)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
        assert_eq!(sink.count(), 0);
    }
}
