use crate::core::clock::Sleeper;
use crate::core::order_submit::{OrderSubmitter, Submission};
use crate::core::pricing::{compute_quote, PriceMode, Quote};
use crate::core::{RunStats, Shutdown};
use crate::exchange::SpotApi;
use crate::models::{Candle, OrderRequest, OrderType, Session, SymbolMetadata};
use crate::{Error, Result};
use rust_decimal::Decimal;
use std::time::Instant;
use tracing::{error, info, warn};

pub const CANDLE_PERIOD: &str = "1min";

#[derive(Clone, Debug, PartialEq)]
pub struct AcquisitionPlan {
    pub coin: String,
    pub quote_currency: String,
    pub multiple: Decimal,
    pub mode: PriceMode,
}

impl AcquisitionPlan {
    pub fn symbol(&self) -> String {
        format!(
            "{}{}",
            self.coin.to_lowercase(),
            self.quote_currency.to_lowercase()
        )
    }
}

/// Everything resolved once before polling starts.
#[derive(Clone, Debug, PartialEq)]
pub struct Prepared {
    pub session: Session,
    pub balance: Decimal,
    pub symbol: SymbolMetadata,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AcquisitionOutcome {
    Submitted { quote: Quote, submission: Submission },
    /// Shutdown arrived before a candle showed up.
    Interrupted,
}

pub struct Acquisition<'a> {
    api: &'a dyn SpotApi,
    sleeper: &'a dyn Sleeper,
    shutdown: &'a Shutdown,
}

impl<'a> Acquisition<'a> {
    pub fn new(api: &'a dyn SpotApi, sleeper: &'a dyn Sleeper, shutdown: &'a Shutdown) -> Self {
        Self {
            api,
            sleeper,
            shutdown,
        }
    }

    pub fn run(&self, plan: &AcquisitionPlan, stats: &mut RunStats) -> Result<AcquisitionOutcome> {
        let prepared = self.prepare(plan)?;
        let candle = match self.wait_for_open(&prepared.symbol.symbol, stats) {
            Some(candle) => candle,
            None => {
                warn!(polls = stats.candle_polls, "shutdown requested before the market opened");
                return Ok(AcquisitionOutcome::Interrupted);
            }
        };

        let quote = compute_quote(
            candle.open,
            prepared.balance,
            plan.multiple,
            plan.mode,
            &prepared.symbol,
        )?;
        info!(
            symbol = %prepared.symbol.symbol,
            open_price = %quote.open_price,
            buy_price = %quote.buy_price,
            budget = %quote.budget,
            buy_amount = %quote.buy_amount,
            test_mode = plan.mode == PriceMode::Test,
            "order computed"
        );
        if quote.buy_amount <= Decimal::ZERO {
            error!(budget = %quote.budget, buy_price = %quote.buy_price, "budget does not cover the smallest amount");
            return Err(Error::new(format!(
                "budget {} buys nothing at {}",
                quote.budget, quote.buy_price
            )));
        }

        let order = OrderRequest {
            account_id: prepared.session.account_id.clone(),
            symbol: prepared.symbol.symbol.clone(),
            order_type: OrderType::BuyLimit,
            amount: quote.buy_amount,
            price: quote.buy_price,
        };
        let submitter = OrderSubmitter::new(
            self.api,
            self.sleeper,
            self.shutdown,
            prepared.symbol.price_precision,
        );
        let submission = submitter.submit(order, stats);
        match &submission {
            Submission::Placed { order_id, .. } => self.report_order(order_id),
            Submission::Abandoned { reason, attempts } => {
                warn!(reason = %reason, attempts, "no order was placed");
            }
            Submission::Interrupted { attempts } => {
                warn!(attempts, "order submission interrupted, no order was placed");
            }
        }
        Ok(AcquisitionOutcome::Submitted { quote, submission })
    }

    pub fn prepare(&self, plan: &AcquisitionPlan) -> Result<Prepared> {
        let session = self
            .api
            .open_session()
            .map_err(|err| {
                error!(error = %err, "account lookup failed");
                err
            })?
            .ok_or_else(|| Error::config("exchange returned no account"))?;
        info!(account_id = %session.account_id, "session opened");

        let balance = self
            .api
            .available_balance(&session, &plan.quote_currency)
            .map_err(|err| {
                error!(error = %err, "balance lookup failed");
                err
            })?
            .ok_or_else(|| {
                Error::config(format!(
                    "no {} trade balance on account {}",
                    plan.quote_currency, session.account_id
                ))
            })?
            .trunc();
        info!(currency = %plan.quote_currency, balance = %balance, "usable balance");

        let pair = plan.symbol();
        let symbol = match self.api.symbol_metadata(&pair) {
            Ok(Some(symbol)) => symbol,
            Ok(None) => {
                error!(symbol = %pair, "symbol is not listed on the exchange");
                return Err(Error::config(format!("unknown symbol {pair}")));
            }
            Err(err) => {
                error!(symbol = %pair, error = %err, "symbol lookup failed");
                return Err(err);
            }
        };
        info!(
            symbol = %symbol.symbol,
            amount_precision = symbol.amount_precision,
            price_precision = symbol.price_precision,
            total_precision = symbol.total_precision,
            "symbol precision"
        );

        Ok(Prepared {
            session,
            balance,
            symbol,
        })
    }

    /// Polls the latest candle until the exchange returns one. There is no
    /// attempt cap; only shutdown ends the wait early.
    pub fn wait_for_open(&self, symbol: &str, stats: &mut RunStats) -> Option<Candle> {
        loop {
            if self.shutdown.is_triggered() {
                return None;
            }
            let started = Instant::now();
            let result = self.api.latest_candle(symbol, CANDLE_PERIOD);
            stats.candle_polls += 1;
            info!(
                symbol,
                poll = stats.candle_polls,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "candle fetch"
            );
            match result {
                Ok(Some(candle)) => {
                    info!(symbol, open = %candle.open, candle_id = candle.id, "opening candle found");
                    return Some(candle);
                }
                Ok(None) => {}
                Err(err) => {
                    stats.candle_errors += 1;
                    warn!(symbol, error = %err, "candle fetch failed");
                }
            }
        }
    }

    fn report_order(&self, order_id: &str) {
        match self.api.get_order(order_id) {
            Ok(Some(detail)) => info!(
                order_id = %detail.id,
                state = %detail.state,
                price = %detail.price,
                amount = %detail.amount,
                filled_amount = %detail.filled_amount,
                "order status"
            ),
            Ok(None) => warn!(order_id, "order lookup returned nothing"),
            Err(err) => warn!(order_id, error = %err, "order lookup failed"),
        }
    }
}
