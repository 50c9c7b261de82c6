#![allow(dead_code)]

use firstfill::core::clock::Sleeper;
use firstfill::core::Shutdown;
use firstfill::exchange::SpotApi;
use firstfill::models::{
    Candle, OrderDetail, OrderRequest, OrderResult, OrderType, Session, SymbolMetadata,
};
use firstfill::{Error, Result};
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

/// Exchange double that replays scripted answers and records what it was sent.
pub struct ScriptedExchange {
    pub session: Result<Option<Session>>,
    pub balance: Result<Option<Decimal>>,
    pub symbol: Option<SymbolMetadata>,
    pub candles: RefCell<VecDeque<Result<Option<Candle>>>>,
    pub results: RefCell<VecDeque<OrderResult>>,
    pub placed: RefCell<Vec<OrderRequest>>,
    pub order_lookups: RefCell<Vec<String>>,
    pub candle_requests: RefCell<u32>,
    /// Triggered once the candle script runs dry so polling ends.
    pub shutdown: Option<Shutdown>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self {
            session: Ok(Some(Session {
                base_url: "https://api.test".to_string(),
                account_id: "100009".to_string(),
            })),
            balance: Ok(Some(Decimal::new(12399, 2))),
            symbol: Some(symbol(2, 4, 4)),
            candles: RefCell::new(VecDeque::new()),
            results: RefCell::new(VecDeque::new()),
            placed: RefCell::new(Vec::new()),
            order_lookups: RefCell::new(Vec::new()),
            candle_requests: RefCell::new(0),
            shutdown: None,
        }
    }

    pub fn with_results(results: Vec<OrderResult>) -> Self {
        let exchange = Self::new();
        *exchange.results.borrow_mut() = results.into();
        exchange
    }

    pub fn push_candle(&self, candle: Result<Option<Candle>>) {
        self.candles.borrow_mut().push_back(candle);
    }

    pub fn placed(&self) -> Vec<OrderRequest> {
        self.placed.borrow().clone()
    }
}

impl SpotApi for ScriptedExchange {
    fn open_session(&self) -> Result<Option<Session>> {
        self.session.clone()
    }

    fn available_balance(&self, _session: &Session, _currency: &str) -> Result<Option<Decimal>> {
        self.balance.clone()
    }

    fn symbol_metadata(&self, symbol: &str) -> Result<Option<SymbolMetadata>> {
        Ok(self
            .symbol
            .clone()
            .filter(|metadata| metadata.symbol == symbol))
    }

    fn latest_candle(&self, _symbol: &str, _period: &str) -> Result<Option<Candle>> {
        *self.candle_requests.borrow_mut() += 1;
        match self.candles.borrow_mut().pop_front() {
            Some(candle) => candle,
            None => {
                if let Some(shutdown) = &self.shutdown {
                    shutdown.trigger();
                }
                Ok(None)
            }
        }
    }

    fn place_order(&self, order: &OrderRequest) -> OrderResult {
        self.placed.borrow_mut().push(order.clone());
        self.results
            .borrow_mut()
            .pop_front()
            .unwrap_or(OrderResult::Unrecognized {
                status: 599,
                body: "script exhausted".to_string(),
            })
    }

    fn get_order(&self, order_id: &str) -> Result<Option<OrderDetail>> {
        self.order_lookups.borrow_mut().push(order_id.to_string());
        Ok(Some(OrderDetail {
            id: order_id.to_string(),
            symbol: "pufferusdt".to_string(),
            order_type: "buy-limit".to_string(),
            state: "submitted".to_string(),
            price: Decimal::ONE,
            amount: Decimal::ONE,
            filled_amount: Decimal::ZERO,
        }))
    }

    fn cancel_order(&self, order_id: &str) -> Result<Option<String>> {
        Err(Error::rejected(format!("cancel not scripted for {order_id}")))
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: RefCell<Vec<Duration>>,
    pub trigger_on_sleep: Option<Shutdown>,
}

impl RecordingSleeper {
    pub fn total(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        if let Some(shutdown) = &self.trigger_on_sleep {
            shutdown.trigger();
        }
    }
}

pub fn symbol(amount_precision: u32, price_precision: u32, total_precision: u32) -> SymbolMetadata {
    SymbolMetadata {
        symbol: "pufferusdt".to_string(),
        base_currency: "puffer".to_string(),
        quote_currency: "usdt".to_string(),
        amount_precision,
        price_precision,
        total_precision,
        state: Some("online".to_string()),
    }
}

pub fn candle(open: Decimal) -> Candle {
    Candle {
        id: 1_728_900_000,
        open,
        close: open,
        low: open,
        high: open,
        amount: Decimal::ZERO,
        vol: Decimal::ZERO,
        count: 0,
    }
}

pub fn order(price: Decimal, amount: Decimal) -> OrderRequest {
    OrderRequest {
        account_id: "100009".to_string(),
        symbol: "pufferusdt".to_string(),
        order_type: OrderType::BuyLimit,
        amount,
        price,
    }
}
