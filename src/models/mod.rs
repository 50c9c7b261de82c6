pub mod types;

pub use types::{
    Candle, Credentials, OrderDetail, OrderRequest, OrderResult, OrderType, Session,
    SymbolMetadata,
};
