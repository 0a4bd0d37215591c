//! Pure helpers behind the salary, expense and investment rules

use rand::Rng;

/// Rounds down to 100s below 20,000 and to 1,000s from there on, so that
/// generated amounts look like numbers a person would actually pay.
pub fn round_to_k(amount: f64) -> f64 {
    if amount < 20_000.0 {
        (amount / 100.0).trunc() * 100.0
    } else {
        (amount / 1_000.0).trunc() * 1_000.0
    }
}

/// Picks a percentage in `[min, max)` and returns it as a fraction. Equal
/// bounds always yield `min`.
pub fn percent_range<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> f64 {
    if min >= max {
        return f64::from(min) * 0.01;
    }
    f64::from(rng.gen_range(min..max)) * 0.01
}

/// Grows `amount` by a random percentage in `[min, max)`, rounded.
pub fn increment_by_percent_range<R: Rng + ?Sized>(
    rng: &mut R,
    amount: f64,
    min: u32,
    max: u32,
) -> f64 {
    round_to_k(amount + amount * percent_range(rng, min, max))
}

/// Progressive tax rate for an annual income.
pub fn tax_rate(annual_income: f64) -> f64 {
    match annual_income {
        x if x < 500_000.0 => 0.0,
        x if x < 750_000.0 => 0.10,
        x if x < 1_000_000.0 => 0.15,
        x if x < 1_250_000.0 => 0.20,
        x if x < 1_500_000.0 => 0.25,
        _ => 0.30,
    }
}

/// Employer paying the salary in a given year.
pub fn employer_for_year(year: i32) -> &'static str {
    if year > 2017 { "Globex" } else { "Acme" }
}
