pub mod huobi;

use crate::models::{Candle, OrderDetail, OrderRequest, OrderResult, Session, SymbolMetadata};
use crate::Result;
use rust_decimal::Decimal;

/// Spot operations the acquisition needs from an exchange.
///
/// Lookups return `Ok(None)` when the exchange answered but had nothing
/// usable (no matching account, symbol or candle). Callers must not read
/// that as success.
pub trait SpotApi {
    fn open_session(&self) -> Result<Option<Session>>;
    fn available_balance(&self, session: &Session, currency: &str) -> Result<Option<Decimal>>;
    fn symbol_metadata(&self, symbol: &str) -> Result<Option<SymbolMetadata>>;
    fn latest_candle(&self, symbol: &str, period: &str) -> Result<Option<Candle>>;
    fn place_order(&self, order: &OrderRequest) -> OrderResult;
    fn get_order(&self, order_id: &str) -> Result<Option<OrderDetail>>;
    fn cancel_order(&self, order_id: &str) -> Result<Option<String>>;
}
