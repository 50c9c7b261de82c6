use crate::core::clock::Sleeper;
use crate::core::pricing::{adjust_price, PRICE_DOWN_FACTOR, PRICE_UP_FACTOR};
use crate::core::{RunStats, Shutdown};
use crate::exchange::SpotApi;
use crate::models::{OrderRequest, OrderResult};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{error, info, warn};

/// Immediate resubmissions allowed after consecutive transport failures.
pub const MAX_TRANSPORT_RETRIES: u32 = 3;

const SLEEP_SLICE: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    Placed { order_id: String, attempts: u32 },
    Abandoned { reason: String, attempts: u32 },
    Interrupted { attempts: u32 },
}

#[derive(Clone, Debug)]
pub struct RetryContext {
    pub order: OrderRequest,
    pub attempts: u32,
    pub transport_failures: u32,
}

impl RetryContext {
    pub fn new(order: OrderRequest) -> Self {
        Self {
            order,
            attempts: 0,
            transport_failures: 0,
        }
    }

    fn abandon(&self, reason: impl Into<String>) -> Submission {
        Submission::Abandoned {
            reason: reason.into(),
            attempts: self.attempts,
        }
    }
}

/// Drives one order through the exchange's rejection codes until it is
/// placed, abandoned or interrupted.
pub struct OrderSubmitter<'a> {
    api: &'a dyn SpotApi,
    sleeper: &'a dyn Sleeper,
    shutdown: &'a Shutdown,
    price_precision: u32,
}

impl<'a> OrderSubmitter<'a> {
    pub fn new(
        api: &'a dyn SpotApi,
        sleeper: &'a dyn Sleeper,
        shutdown: &'a Shutdown,
        price_precision: u32,
    ) -> Self {
        Self {
            api,
            sleeper,
            shutdown,
            price_precision,
        }
    }

    pub fn submit(&self, order: OrderRequest, stats: &mut RunStats) -> Submission {
        let mut ctx = RetryContext::new(order);
        loop {
            if self.shutdown.is_triggered() {
                warn!(attempts = ctx.attempts, "shutdown requested, no further order submissions");
                return Submission::Interrupted {
                    attempts: ctx.attempts,
                };
            }

            ctx.attempts += 1;
            stats.submissions += 1;
            let result = self.api.place_order(&ctx.order);
            if !matches!(result, OrderResult::TransportFailure { .. }) {
                ctx.transport_failures = 0;
            }

            match result {
                OrderResult::Success { order_id } => {
                    info!(
                        order_id = %order_id,
                        symbol = %ctx.order.symbol,
                        price = %ctx.order.price,
                        amount = %ctx.order.amount,
                        attempts = ctx.attempts,
                        "spot order placed"
                    );
                    stats.placed = true;
                    return Submission::Placed {
                        order_id,
                        attempts: ctx.attempts,
                    };
                }
                OrderResult::RateLimitedOrProtected {
                    retry_after_ms: Some(wait_ms),
                } => {
                    stats.protection_waits += 1;
                    warn!(wait_ms, "open price protection active, retrying after the window");
                    if !self.pause(Duration::from_millis(wait_ms)) {
                        warn!(attempts = ctx.attempts, "shutdown requested during protection wait");
                        return Submission::Interrupted {
                            attempts: ctx.attempts,
                        };
                    }
                }
                OrderResult::RateLimitedOrProtected {
                    retry_after_ms: None,
                } => {
                    warn!("open price protection active but its end time is not in the message, giving up");
                    return ctx.abandon("open protection end time not found");
                }
                OrderResult::PriceTooHigh => {
                    stats.price_lowered += 1;
                    if let Err(reason) = self.reprice(&mut ctx, PRICE_DOWN_FACTOR) {
                        return ctx.abandon(reason);
                    }
                    warn!(price = %ctx.order.price, "price above limit, lowered by 10% and resubmitting");
                }
                OrderResult::PriceTooLow => {
                    stats.price_raised += 1;
                    if let Err(reason) = self.reprice(&mut ctx, PRICE_UP_FACTOR) {
                        return ctx.abandon(reason);
                    }
                    warn!(price = %ctx.order.price, "price below limit, raised by 10% and resubmitting");
                }
                OrderResult::OtherRejected { code, msg } => {
                    stats.generic_rejections += 1;
                    warn!(code = %code, msg = %msg, attempts = ctx.attempts, "order rejected, resubmitting unchanged");
                }
                OrderResult::TransportFailure { error: err } => {
                    stats.transport_failures += 1;
                    if ctx.transport_failures < MAX_TRANSPORT_RETRIES {
                        ctx.transport_failures += 1;
                        error!(
                            retry = ctx.transport_failures,
                            max_retries = MAX_TRANSPORT_RETRIES,
                            error = %err,
                            "order submission failed, retrying"
                        );
                    } else {
                        error!(
                            failures = ctx.transport_failures + 1,
                            error = %err,
                            "order submission failed too many times, giving up"
                        );
                        return ctx.abandon(format!("transport failures exhausted: {err}"));
                    }
                }
                OrderResult::Unrecognized { status, body } => {
                    warn!(status, body = %body, "order submission got an unrecognized response, giving up");
                    return ctx.abandon(format!("unrecognized response (http {status})"));
                }
            }
        }
    }

    fn reprice(&self, ctx: &mut RetryContext, factor: Decimal) -> Result<(), String> {
        let price = adjust_price(ctx.order.price, factor, self.price_precision)
            .map_err(|err| err.message)?;
        if price <= Decimal::ZERO {
            error!(price = %price, "adjusted price fell to zero, giving up");
            return Err(format!("adjusted price {price} is not positive"));
        }
        ctx.order = ctx.order.with_price(price);
        Ok(())
    }

    /// Sleeps in short slices so Ctrl-C is honoured. Returns false when
    /// interrupted.
    fn pause(&self, total: Duration) -> bool {
        let mut remaining = total;
        while !remaining.is_zero() {
            if self.shutdown.is_triggered() {
                return false;
            }
            let step = remaining.min(SLEEP_SLICE);
            self.sleeper.sleep(step);
            remaining -= step;
        }
        true
    }
}
