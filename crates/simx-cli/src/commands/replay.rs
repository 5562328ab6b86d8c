//! `simx replay`: drive an account registry from CSV ticks and orders.
//!
//! Ticks and orders are merged by timestamp (ticks first on a tie).  Each
//! time the timestamp moves forward the registry clock advances, which
//! flushes queued responses.  Every listener callback and every immediate
//! order outcome is written as one JSON line; the final money of each
//! account closes the stream.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use simx_calendar::{ExchangeCatalog, Instrument};
use simx_config::{AccountConfig, SimTradeConfig};
use simx_fees::{OffsetFlag, Side};
use simx_price::parse_price;
use simx_registry::AccountRegistry;
use simx_venue::{OrderRequest, OrderStateChange, Tick, TransactionCreated, TxnSessionListener};
use tracing::info;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub ticks: usize,
    pub orders: usize,
    pub session_faults: usize,
}

// ---------------------------------------------------------------------------
// CSV rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TickRow {
    update_time: String,
    trading_day: String,
    instrument: String,
    last_price: String,
    #[serde(default)]
    upper_limit: Option<String>,
    #[serde(default)]
    lower_limit: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    Submit,
    Cancel,
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    time: String,
    account: String,
    action: Action,
    order_ref: String,
    instrument: String,
    #[serde(default)]
    side: Option<Side>,
    #[serde(default)]
    offset: Option<OffsetFlag>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    volume: Option<i64>,
}

enum ReplayEvent {
    Tick(Tick),
    Order {
        time: NaiveDateTime,
        instrument: Instrument,
        row: OrderRow,
    },
}

impl ReplayEvent {
    fn time(&self) -> NaiveDateTime {
        match self {
            ReplayEvent::Tick(t) => t.update_time,
            ReplayEvent::Order { time, .. } => *time,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ReplayEvent::Tick(_) => 0,
            ReplayEvent::Order { .. } => 1,
        }
    }
}

fn parse_time(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .with_context(|| format!("bad timestamp '{raw}' (want {TIME_FORMAT})"))
}

/// Price-limit column: empty or `N/A` means no limit.
fn parse_limit(raw: Option<&str>) -> Result<Option<simx_price::Price>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Ok(parse_price(text).with_context(|| format!("bad price limit '{text}'"))?),
    }
}

fn load_ticks(path: &Path) -> Result<Vec<ReplayEvent>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("open ticks csv failed: {}", path.display()))?;
    let mut out = Vec::new();
    for (line, rec) in rdr.deserialize::<TickRow>().enumerate() {
        let row = rec.with_context(|| format!("ticks csv row {}", line + 1))?;
        let last_price = parse_price(&row.last_price)
            .with_context(|| format!("ticks csv row {}: last_price", line + 1))?
            .ok_or_else(|| anyhow!("ticks csv row {}: last_price is N/A", line + 1))?;
        out.push(ReplayEvent::Tick(Tick {
            instrument: row
                .instrument
                .parse()
                .with_context(|| format!("ticks csv row {}: instrument", line + 1))?,
            trading_day: NaiveDate::parse_from_str(row.trading_day.trim(), "%Y-%m-%d")
                .with_context(|| format!("ticks csv row {}: trading_day", line + 1))?,
            last_price,
            upper_limit: parse_limit(row.upper_limit.as_deref())?,
            lower_limit: parse_limit(row.lower_limit.as_deref())?,
            update_time: parse_time(&row.update_time)?,
        }));
    }
    Ok(out)
}

fn load_orders(path: &Path) -> Result<Vec<ReplayEvent>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("open orders csv failed: {}", path.display()))?;
    let mut out = Vec::new();
    for (line, rec) in rdr.deserialize::<OrderRow>().enumerate() {
        let row = rec.with_context(|| format!("orders csv row {}", line + 1))?;
        out.push(ReplayEvent::Order {
            time: parse_time(&row.time)?,
            instrument: row
                .instrument
                .parse()
                .with_context(|| format!("orders csv row {}: instrument", line + 1))?,
            row,
        });
    }
    Ok(out)
}

fn order_request(instrument: Instrument, row: &OrderRow) -> Result<OrderRequest> {
    let missing = |field: &str| anyhow!("order {}: {field} required for submit", row.order_ref);
    let price_text = row.price.as_deref().ok_or_else(|| missing("price"))?;
    let limit_price = parse_price(price_text)
        .with_context(|| format!("order {}: price", row.order_ref))?
        .ok_or_else(|| missing("price"))?;
    Ok(OrderRequest {
        order_ref: row.order_ref.clone(),
        instrument,
        side: row.side.ok_or_else(|| missing("side"))?,
        offset: row.offset.ok_or_else(|| missing("offset"))?,
        limit_price,
        volume: row.volume.ok_or_else(|| missing("volume"))?,
    })
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Collects listener callbacks as JSON lines until drained.
#[derive(Default)]
struct JsonLinesListener {
    lines: Mutex<Vec<serde_json::Value>>,
}

impl JsonLinesListener {
    fn push(&self, line: serde_json::Value) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line);
    }

    fn drain_into(&self, out: &mut dyn Write) -> Result<()> {
        let lines = std::mem::take(&mut *self.lines.lock().unwrap_or_else(|e| e.into_inner()));
        for line in lines {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

impl TxnSessionListener for JsonLinesListener {
    fn on_order_state_changed(&self, change: &OrderStateChange) {
        self.push(json!({ "type": "order_state_changed", "data": change }));
    }

    fn on_transaction_created(&self, txn: &TransactionCreated) {
        self.push(json!({ "type": "transaction_created", "data": txn }));
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub fn run(
    cfg: &SimTradeConfig,
    catalog: Arc<ExchangeCatalog>,
    ticks: &Path,
    orders: Option<&Path>,
    out: &mut dyn Write,
) -> Result<ReplaySummary> {
    let listener = Arc::new(JsonLinesListener::default());
    let shared: Arc<dyn TxnSessionListener> = listener.clone();
    let mut registry = AccountRegistry::load(cfg, catalog.clone(), |_: &AccountConfig| shared.clone())?;

    let mut events = load_ticks(ticks)?;
    if let Some(path) = orders {
        events.extend(load_orders(path)?);
    }
    events.sort_by_key(|e| (e.time(), e.rank()));

    let mut summary = ReplaySummary::default();
    let mut clock: Option<NaiveDateTime> = None;
    let mut trading_day: Option<NaiveDate> = None;

    for event in events {
        let t = event.time();
        let day = match &event {
            ReplayEvent::Tick(tick) => Some(tick.trading_day),
            ReplayEvent::Order { instrument, .. } => catalog
                .detect_trading_times(instrument, t)
                .map(|times| times.trading_day()),
        }
        .or(trading_day);

        if clock.map_or(true, |c| t > c) {
            if let Some(d) = day {
                registry.on_time_changed(d, t);
                listener.drain_into(out)?;
            }
            clock = Some(t);
        }
        trading_day = day;

        match event {
            ReplayEvent::Tick(tick) => {
                summary.ticks += 1;
                summary.session_faults += registry.on_market_data(&tick);
            }
            ReplayEvent::Order {
                instrument, row, ..
            } => {
                summary.orders += 1;
                let account = registry
                    .account_mut(&row.account)
                    .ok_or_else(|| anyhow!("order {}: unknown account '{}'", row.order_ref, row.account))?;
                let outcome = match row.action {
                    Action::Submit => account.session_mut().submit(order_request(instrument, &row)?),
                    Action::Cancel => account.session_mut().cancel(&instrument, &row.order_ref),
                };
                let line = json!({ "type": "order_event", "account_id": row.account, "data": outcome });
                writeln!(out, "{line}")?;
            }
        }
    }

    match (trading_day, clock) {
        (Some(d), Some(t)) => {
            registry.on_time_changed(d, t);
            listener.drain_into(out)?;
        }
        _ => bail!("replay input had no events"),
    }

    for account in registry.accounts() {
        let line = json!({
            "type": "money",
            "account_id": account.id(),
            "state": account.session().state(),
            "money": account.session().money(),
        });
        writeln!(out, "{line}")?;
    }

    info!(
        ticks = summary.ticks,
        orders = summary.orders,
        session_faults = summary.session_faults,
        "replay finished"
    );
    Ok(summary)
}
