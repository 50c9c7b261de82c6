use crate::{Error, Result};
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::str::FromStr;

/// Prints `question` and reads one trimmed line.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question}").map_err(|err| Error::new(format!("prompt write failed: {err}")))?;
    output
        .flush()
        .map_err(|err| Error::new(format!("prompt flush failed: {err}")))?;
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|err| Error::new(format!("prompt read failed: {err}")))?;
    if read == 0 {
        return Err(Error::new("input closed before an answer was given"));
    }
    Ok(line.trim().to_string())
}

pub fn parse_coin(raw: &str) -> Result<String> {
    let coin = raw.trim().to_lowercase();
    if coin.is_empty() {
        return Err(Error::new("coin must be set"));
    }
    if !coin.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(Error::new(format!("coin must be alphanumeric, got {raw}")));
    }
    Ok(coin)
}

pub fn parse_multiple(raw: &str) -> Result<Decimal> {
    let multiple = Decimal::from_str(raw.trim())
        .map_err(|_| Error::new(format!("multiple must be a decimal number, got {raw}")))?;
    if multiple <= Decimal::ZERO {
        return Err(Error::new("multiple must be positive"));
    }
    Ok(multiple)
}

/// Empty input means live mode.
pub fn parse_test_mode(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "" | "0" | "false" | "no" | "n" => Ok(false),
        "1" | "true" | "yes" | "y" => Ok(true),
        _ => Err(Error::new("test mode must be 1/0, true/false or yes/no")),
    }
}
