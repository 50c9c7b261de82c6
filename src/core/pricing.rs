use crate::models::SymbolMetadata;
use crate::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub const PRICE_DOWN_FACTOR: Decimal = dec!(0.9);
pub const PRICE_UP_FACTOR: Decimal = dec!(1.1);

const MULTIPLE_DIGITS: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceMode {
    Live,
    /// Divides instead of multiplies so the order sits far below market.
    Test,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Quote {
    pub open_price: Decimal,
    pub buy_price: Decimal,
    pub budget: Decimal,
    pub buy_amount: Decimal,
}

/// Half-up rounding with the scale pinned to `precision`, so the string form
/// keeps trailing zeros.
pub fn round_half_up(value: Decimal, precision: u32) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(precision);
    rounded
}

pub fn truncate(value: Decimal, precision: u32) -> Decimal {
    let mut truncated = value.round_dp_with_strategy(precision, RoundingStrategy::ToZero);
    truncated.rescale(precision);
    truncated
}

pub fn normalize_multiple(multiple: Decimal) -> Result<Decimal> {
    let normalized = round_half_up(multiple, MULTIPLE_DIGITS);
    if normalized <= Decimal::ZERO {
        return Err(Error::new(format!(
            "multiple must be at least 0.01, got {multiple}"
        )));
    }
    Ok(normalized)
}

pub fn buy_price(
    open_price: Decimal,
    multiple: Decimal,
    mode: PriceMode,
    price_precision: u32,
) -> Result<Decimal> {
    let raw = match mode {
        PriceMode::Live => open_price
            .checked_mul(multiple)
            .ok_or_else(|| Error::new("buy price overflow"))?,
        PriceMode::Test => open_price
            .checked_div(multiple)
            .ok_or_else(|| Error::new("multiple must be non-zero"))?,
    };
    Ok(round_half_up(raw, price_precision))
}

/// Largest amount the budget covers at `price`, never rounded up.
pub fn buy_amount(budget: Decimal, price: Decimal, amount_precision: u32) -> Result<Decimal> {
    if price <= Decimal::ZERO {
        return Err(Error::new(format!("buy price must be positive, got {price}")));
    }
    let raw = budget
        .checked_div(price)
        .ok_or_else(|| Error::new("buy amount overflow"))?;
    Ok(truncate(raw, amount_precision))
}

pub fn compute_quote(
    candle_open: Decimal,
    balance: Decimal,
    multiple: Decimal,
    mode: PriceMode,
    symbol: &SymbolMetadata,
) -> Result<Quote> {
    let open_price = round_half_up(candle_open, symbol.price_precision);
    let multiple = normalize_multiple(multiple)?;
    let buy_price = buy_price(open_price, multiple, mode, symbol.price_precision)?;
    let budget = round_half_up(balance, symbol.total_precision);
    let buy_amount = buy_amount(budget, buy_price, symbol.amount_precision)?;
    Ok(Quote {
        open_price,
        buy_price,
        budget,
        buy_amount,
    })
}

/// Scales a rejected price by `factor` and puts it back on the price grid,
/// rounding in the direction of the move so the price always changes by at
/// least one tick.
pub fn adjust_price(price: Decimal, factor: Decimal, price_precision: u32) -> Result<Decimal> {
    let scaled = price
        .checked_mul(factor)
        .ok_or_else(|| Error::new("adjusted price overflow"))?;
    let strategy = if factor < Decimal::ONE {
        RoundingStrategy::ToNegativeInfinity
    } else {
        RoundingStrategy::ToPositiveInfinity
    };
    let mut adjusted = scaled.round_dp_with_strategy(price_precision, strategy);
    adjusted.rescale(price_precision);
    Ok(adjusted)
}
