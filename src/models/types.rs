use rust_decimal::Decimal;
use std::fmt;

#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub base_url: String,
    pub account_id: String,
}

/// Trading rules for one pair, as reported by `/v2/settings/common/symbols`.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolMetadata {
    pub symbol: String,
    pub base_currency: String,
    pub quote_currency: String,
    /// `tap`: digits allowed after the decimal point in an order amount.
    pub amount_precision: u32,
    /// `tpp`: digits allowed in an order price.
    pub price_precision: u32,
    /// `ttp`: digits allowed in an order total.
    pub total_precision: u32,
    pub state: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Candle {
    pub id: i64,
    pub open: Decimal,
    pub close: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub amount: Decimal,
    pub vol: Decimal,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderType {
    BuyLimit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::BuyLimit => "buy-limit",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderRequest {
    pub account_id: String,
    pub symbol: String,
    pub order_type: OrderType,
    pub amount: Decimal,
    pub price: Decimal,
}

impl OrderRequest {
    pub fn with_price(&self, price: Decimal) -> Self {
        Self {
            price,
            ..self.clone()
        }
    }
}

/// How the exchange answered one order submission.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderResult {
    Success { order_id: String },
    /// Open-price protection window. `None` when the end time could not be
    /// read from the error message.
    RateLimitedOrProtected { retry_after_ms: Option<u64> },
    PriceTooHigh,
    PriceTooLow,
    OtherRejected { code: String, msg: String },
    TransportFailure { error: String },
    Unrecognized { status: u16, body: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderDetail {
    pub id: String,
    pub symbol: String,
    pub order_type: String,
    pub state: String,
    pub price: Decimal,
    pub amount: Decimal,
    pub filled_amount: Decimal,
}
