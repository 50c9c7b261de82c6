use crate::exchange::SpotApi;
use crate::models::{
    Candle, Credentials, OrderDetail, OrderRequest, OrderResult, Session, SymbolMetadata,
};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client;
use reqwest::{Method, Url};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sha2::Sha256;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_BASE_URL: &str = "https://api-aws.huobi.pro";

pub const ERR_OPEN_PROTECT: &str = "forbidden-trade-for-open-protect";
pub const ERR_PRICE_ABOVE_LIMIT: &str = "order-price-greater-than-limit";
pub const ERR_PRICE_BELOW_LIMIT: &str = "order-price-less-than-limit";

/// Added to the protection wait so the resubmission lands after the window.
pub const PROTECTION_MARGIN_MS: i64 = 10;

// Unreserved characters stay as-is, everything else is %XX with uppercase hex.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Clone, Debug)]
pub struct HuobiConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub timeout_secs: u64,
}

pub struct HuobiClient {
    client: Client,
    config: HuobiConfig,
    host: String,
}

/// Status and decoded body of one exchange call. Non-2xx is not an error here.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl HuobiClient {
    pub fn new(config: HuobiConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::config("base_url must be set"));
        }
        if config.credentials.access_key.trim().is_empty() {
            return Err(Error::config("access key must be set"));
        }
        if config.credentials.secret_key.trim().is_empty() {
            return Err(Error::config("secret key must be set"));
        }
        let host = Url::parse(&base_url)
            .map_err(|err| Error::config(format!("invalid base_url {base_url}: {err}")))?
            .host_str()
            .map(|host| host.to_lowercase())
            .ok_or_else(|| Error::config(format!("base_url {base_url} has no host")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|err| Error::transport(format!("http client build failed: {err}")))?;
        Ok(Self {
            client,
            config: HuobiConfig { base_url, ..config },
            host,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn timestamp() -> String {
        Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// The exact text the signature is computed over:
    /// `METHOD\nhost\npath\nk1=v1&k2=v2` with keys in byte order.
    pub fn canonical_request(
        method: &str,
        host: &str,
        path: &str,
        params: &[(String, String)],
    ) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            method.to_uppercase(),
            host.to_lowercase(),
            path,
            build_query_string(params)
        )
    }

    pub fn sign(
        secret: &str,
        method: &str,
        host: &str,
        path: &str,
        params: &[(String, String)],
    ) -> Result<String> {
        let payload = Self::canonical_request(method, host, path, params);
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| Error::new("invalid key"))?;
        mac.update(payload.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn public_params(&self) -> Vec<(String, String)> {
        vec![
            (
                "AccessKeyId".to_string(),
                self.config.credentials.access_key.clone(),
            ),
            ("SignatureMethod".to_string(), "HmacSHA256".to_string()),
            ("SignatureVersion".to_string(), "2".to_string()),
            ("Timestamp".to_string(), Self::timestamp()),
        ]
    }

    /// Sends one signed call.
    ///
    /// GET signs the business `params` together with the public ones and
    /// sends everything in the query. POST signs only the public params and
    /// carries the business payload as a JSON `body`.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let mut signed = self.public_params();
        if method == Method::GET {
            signed.extend(params);
        } else if !params.is_empty() {
            return Err(Error::new(format!(
                "{method} {path}: business parameters must go in the JSON body"
            )));
        }

        let signature = Self::sign(
            &self.config.credentials.secret_key,
            method.as_str(),
            &self.host,
            path,
            &signed,
        )?;
        let url = format!(
            "{}{}?{}&Signature={}",
            self.config.base_url,
            path,
            build_query_string(&signed),
            encode(&signature)
        );

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .map_err(|err| Error::transport(format!("http request failed: {err}")))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|err| Error::transport(format!("http body read failed: {err}")))?;
        let body = serde_json::from_str::<Value>(&text).map_err(|err| {
            Error::transport(format!(
                "json parse failed: {err} (http {status}, body: {})",
                clip(&text)
            ))
        })?;
        debug!(method = %method, path, status, "huobi_response");
        Ok(RawResponse { status, body })
    }

    fn get(&self, path: &str, params: Vec<(String, String)>) -> Result<RawResponse> {
        self.request(Method::GET, path, params, None)
    }

    fn post(&self, path: &str, body: &Value) -> Result<RawResponse> {
        self.request(Method::POST, path, Vec::new(), Some(body))
    }
}

impl SpotApi for HuobiClient {
    fn open_session(&self) -> Result<Option<Session>> {
        let response = self.get("/v1/account/accounts", Vec::new())?;
        ensure_ok(&response, "account lookup").map_err(|err| Error::auth(err.message))?;
        let accounts = match response.body.get("data").and_then(Value::as_array) {
            Some(accounts) => accounts,
            None => return Ok(None),
        };
        let account = accounts
            .iter()
            .find(|account| account.get("type").and_then(Value::as_str) == Some("spot"))
            .or_else(|| accounts.first());
        let account_id = match account.and_then(|account| account.get("id")) {
            Some(id) => value_to_id(id)?,
            None => return Ok(None),
        };
        Ok(Some(Session {
            base_url: self.config.base_url.clone(),
            account_id,
        }))
    }

    fn available_balance(&self, session: &Session, currency: &str) -> Result<Option<Decimal>> {
        let path = format!("/v1/account/accounts/{}/balance", session.account_id);
        let response = self.get(&path, Vec::new())?;
        ensure_ok(&response, "balance lookup")?;
        let entries = response
            .body
            .pointer("/data/list")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::transport("balance response has no data.list"))?;
        let currency = currency.to_lowercase();
        for entry in entries {
            let matches_currency =
                entry.get("currency").and_then(Value::as_str) == Some(currency.as_str());
            let is_trade = entry.get("type").and_then(Value::as_str) == Some("trade");
            if !(matches_currency && is_trade) {
                continue;
            }
            let amount = entry
                .get("available")
                .or_else(|| entry.get("balance"))
                .ok_or_else(|| Error::transport("balance entry has no amount"))?;
            let amount = value_to_decimal(amount)?;
            info!(account_id = %session.account_id, currency = %currency, available = %amount, "balance");
            return Ok(Some(amount));
        }
        Ok(None)
    }

    fn symbol_metadata(&self, symbol: &str) -> Result<Option<SymbolMetadata>> {
        let response = self.get("/v2/settings/common/symbols", Vec::new())?;
        ensure_ok(&response, "symbol settings")?;
        let symbols = response
            .body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::transport("symbol settings response has no data"))?;
        let wanted = symbol.to_lowercase();
        let entry = match symbols
            .iter()
            .find(|entry| entry.get("sc").and_then(Value::as_str) == Some(wanted.as_str()))
        {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let metadata = parse_symbol(entry)?;
        info!(symbol = %metadata.symbol, raw = %entry, "symbol_settings");
        Ok(Some(metadata))
    }

    fn latest_candle(&self, symbol: &str, period: &str) -> Result<Option<Candle>> {
        let params = vec![
            ("symbol".to_string(), symbol.to_lowercase()),
            ("period".to_string(), period.to_string()),
            ("size".to_string(), "1".to_string()),
        ];
        let response = self.get("/market/history/kline", params)?;
        if !is_ok(&response) {
            debug!(symbol, status = response.status, body = %response.body, "kline_not_ready");
            return Ok(None);
        }
        match response
            .body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
        {
            Some(row) => {
                let candle = parse_candle(row)?;
                info!(symbol, period, raw = %row, "kline");
                Ok(Some(candle))
            }
            None => Ok(None),
        }
    }

    fn place_order(&self, order: &OrderRequest) -> OrderResult {
        let body = json!({
            "account-id": order.account_id,
            "symbol": order.symbol,
            "type": order.order_type.as_str(),
            "amount": order.amount.to_string(),
            "price": order.price.to_string(),
        });
        match self.post("/v1/order/orders/place", &body) {
            Ok(response) => classify_order_response(response.status, &response.body, &Local::now()),
            Err(err) => OrderResult::TransportFailure { error: err.message },
        }
    }

    fn get_order(&self, order_id: &str) -> Result<Option<OrderDetail>> {
        let path = format!("/v1/order/orders/{order_id}");
        let response = self.get(&path, Vec::new())?;
        ensure_ok(&response, "order lookup")?;
        match response.body.get("data") {
            Some(data) if data.is_object() => Ok(Some(parse_order(data)?)),
            _ => Ok(None),
        }
    }

    fn cancel_order(&self, order_id: &str) -> Result<Option<String>> {
        let path = format!("/v1/order/orders/{order_id}/submitcancel");
        let response = self.post(&path, &json!({}))?;
        ensure_ok(&response, "order cancel")?;
        Ok(response.body.get("data").map(value_to_id).transpose()?)
    }
}

/// Maps the answer to a place-order call onto the retry state machine's
/// inputs. `now` anchors the protection window end time to today's date.
pub fn classify_order_response<Tz: TimeZone>(
    status: u16,
    body: &Value,
    now: &DateTime<Tz>,
) -> OrderResult {
    let ok = body.get("status").and_then(Value::as_str) == Some("ok");
    if ok {
        if let Some(order_id) = body.get("data").and_then(|data| value_to_id(data).ok()) {
            return OrderResult::Success { order_id };
        }
    }

    let code = match body.get("err-code").and_then(Value::as_str) {
        Some(code) if !code.is_empty() => code,
        _ => {
            return OrderResult::Unrecognized {
                status,
                body: body.to_string(),
            }
        }
    };
    let msg = body
        .get("err-msg")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    match code {
        ERR_OPEN_PROTECT => OrderResult::RateLimitedOrProtected {
            retry_after_ms: protection_wait_ms(&msg, now),
        },
        ERR_PRICE_ABOVE_LIMIT => OrderResult::PriceTooHigh,
        ERR_PRICE_BELOW_LIMIT => OrderResult::PriceTooLow,
        other => OrderResult::OtherRejected {
            code: other.to_string(),
            msg,
        },
    }
}

/// Milliseconds to wait until the `HH:MM:SS` named in an open-protection
/// message (today, in `now`'s zone), plus the safety margin. The result is
/// the absolute distance, so a time already passed still yields a bounded
/// wait.
pub fn protection_wait_ms<Tz: TimeZone>(message: &str, now: &DateTime<Tz>) -> Option<u64> {
    let end = find_clock_time(message)?;
    let target = now
        .timezone()
        .from_local_datetime(&now.date_naive().and_time(end))
        .earliest()?;
    let wait = target.timestamp_millis() - now.timestamp_millis() + PROTECTION_MARGIN_MS;
    Some(wait.unsigned_abs())
}

fn find_clock_time(message: &str) -> Option<NaiveTime> {
    message
        .as_bytes()
        .windows(8)
        .filter(|window| {
            window.iter().enumerate().all(|(index, byte)| match index {
                2 | 5 => *byte == b':',
                _ => byte.is_ascii_digit(),
            })
        })
        .filter_map(|window| std::str::from_utf8(window).ok())
        .find_map(|text| NaiveTime::parse_from_str(text, "%H:%M:%S").ok())
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ENCODE_SET).to_string()
}

fn build_query_string(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|left, right| left.0.as_bytes().cmp(right.0.as_bytes()));
    sorted
        .into_iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<String>>()
        .join("&")
}

fn is_ok(response: &RawResponse) -> bool {
    let success = (200..300).contains(&response.status);
    let status_ok = response.body.get("status").and_then(Value::as_str) == Some("ok");
    let code_ok = response.body.get("code").and_then(Value::as_i64) == Some(200);
    success && (status_ok || code_ok)
}

fn ensure_ok(response: &RawResponse, label: &str) -> Result<()> {
    if is_ok(response) {
        return Ok(());
    }
    let body = &response.body;
    let code = body
        .get("err-code")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| body.get("code").map(|code| code.to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    let msg = body
        .get("err-msg")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("");
    Err(Error::rejected(format!(
        "{label} rejected (http {}): {code} {msg}",
        response.status
    )))
}

fn parse_symbol(entry: &Value) -> Result<SymbolMetadata> {
    Ok(SymbolMetadata {
        symbol: str_field(entry, "sc")?,
        base_currency: str_field(entry, "bc").unwrap_or_default(),
        quote_currency: str_field(entry, "qc").unwrap_or_default(),
        amount_precision: precision_field(entry, "tap")?,
        price_precision: precision_field(entry, "tpp")?,
        total_precision: precision_field(entry, "ttp")?,
        state: str_field(entry, "state").ok(),
    })
}

fn parse_candle(row: &Value) -> Result<Candle> {
    Ok(Candle {
        id: row.get("id").and_then(Value::as_i64).unwrap_or(0),
        open: decimal_field(row, "open")?,
        close: decimal_field(row, "close")?,
        low: decimal_field(row, "low")?,
        high: decimal_field(row, "high")?,
        amount: decimal_field(row, "amount").unwrap_or_default(),
        vol: decimal_field(row, "vol").unwrap_or_default(),
        count: row.get("count").and_then(Value::as_i64).unwrap_or(0),
    })
}

fn parse_order(data: &Value) -> Result<OrderDetail> {
    let id = data
        .get("id")
        .map(value_to_id)
        .transpose()?
        .ok_or_else(|| Error::transport("order detail has no id"))?;
    let filled_amount = data
        .get("filled-amount")
        .or_else(|| data.get("field-amount"))
        .map(value_to_decimal)
        .transpose()?
        .unwrap_or_default();
    Ok(OrderDetail {
        id,
        symbol: str_field(data, "symbol")?,
        order_type: str_field(data, "type")?,
        state: str_field(data, "state")?,
        price: decimal_field(data, "price")?,
        amount: decimal_field(data, "amount")?,
        filled_amount,
    })
}

fn str_field(value: &Value, key: &str) -> Result<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::transport(format!("field {key} missing or not a string")))
}

fn precision_field(value: &Value, key: &str) -> Result<u32> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|digits| u32::try_from(digits).ok())
        .ok_or_else(|| Error::transport(format!("precision {key} missing or invalid")))
}

fn decimal_field(value: &Value, key: &str) -> Result<Decimal> {
    let field = value
        .get(key)
        .ok_or_else(|| Error::transport(format!("field {key} missing")))?;
    value_to_decimal(field)
}

/// Reads a JSON number or numeric string without going through `f64`.
pub fn value_to_decimal(value: &Value) -> Result<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return Err(Error::transport("unexpected value type for decimal")),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|err| Error::transport(format!("invalid decimal {text}: {err}")))
}

fn value_to_id(value: &Value) -> Result<String> {
    match value {
        Value::Number(number) => Ok(number.to_string()),
        Value::String(text) if !text.is_empty() => Ok(text.clone()),
        _ => Err(Error::transport("unexpected value type for id")),
    }
}

fn clip(text: &str) -> String {
    text.chars().take(200).collect()
}
