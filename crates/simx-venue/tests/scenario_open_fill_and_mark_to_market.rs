//! Open, fill, mark-to-market, close
//!
//! GREEN when:
//! - a buy-open at the current last price is `Placed`, and available drops by
//!   exactly margin + commission on acceptance.
//! - the next tick fills it in full at the last price and creates one
//!   transaction.
//! - position profit follows later ticks; a close realises it into close
//!   profit and releases the used margin.
//! - the ledger identity holds after every step.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use simx_calendar::{ExchangeCatalog, Instrument};
use simx_config::AccountConfig;
use simx_fees::{FutureFeeEvaluator, OffsetFlag, Side};
use simx_price::Price;
use simx_venue::{
    NullListener, OrderEvent, OrderRequest, SessionContext, SimClock, SimOrderState,
    SimTxnSession, Tick, TickCache, TxnSession,
};

const SCHEDULE: &str = r#"{
    "commodities": {
        "ru": {
            "price_tick": "1.00", "volume_multiple": 10,
            "long_margin_ratio": 0.05, "short_margin_ratio": 0.05,
            "open_by_volume": "10.00", "close_by_volume": "10.00"
        }
    }
}"#;

fn ru() -> Instrument {
    "shfe.ru1901".parse().unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 12, 10).unwrap()
}

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    day().and_hms_opt(h, m, s).unwrap()
}

fn tick(last: i64, time: NaiveDateTime) -> Tick {
    Tick {
        instrument: ru(),
        trading_day: day(),
        last_price: Price::units(last),
        upper_limit: Some(Price::units(4400)),
        lower_limit: Some(Price::units(3600)),
        update_time: time,
    }
}

struct Harness {
    cache: Arc<TickCache>,
    session: SimTxnSession,
}

impl Harness {
    fn new() -> Self {
        let cache = Arc::new(TickCache::new());
        let ctx = SessionContext {
            catalog: Arc::new(ExchangeCatalog::builtin().unwrap()),
            market_data: cache.clone(),
            clock: Arc::new(SimClock::new()),
        };
        let mut account = AccountConfig::new("acct-1");
        account.init_money = Some("50000".into());
        let mut session = SimTxnSession::new(account, ctx, Arc::new(NullListener));
        session.connect_with(Arc::new(FutureFeeEvaluator::from_json_str(SCHEDULE).unwrap()));
        Self { cache, session }
    }

    fn push(&mut self, t: Tick) {
        self.cache.update(t.clone());
        self.session.on_market_data(&t).unwrap();
    }
}

fn request(order_ref: &str, side: Side, offset: OffsetFlag, limit: i64) -> OrderRequest {
    OrderRequest {
        order_ref: order_ref.into(),
        instrument: ru(),
        side,
        offset,
        limit_price: Price::units(limit),
        volume: 1,
    }
}

#[test]
fn buy_open_fills_on_next_tick_and_close_realises_profit() {
    let mut h = Harness::new();
    h.push(tick(4000, at(9, 0, 0)));
    assert_eq!(h.session.money().available, Price::units(50_000));

    // Accept: 2,000.00 margin + 10.00 commission frozen.
    let ev = h.session.submit(request("o-1", Side::Buy, OffsetFlag::Open, 4000));
    assert!(matches!(ev, OrderEvent::Placed { .. }), "got {ev:?}");
    let m = h.session.money();
    assert_eq!(m.frozen_margin, Price::units(2000));
    assert_eq!(m.frozen_commission, Price::units(10));
    assert_eq!(m.available, Price::units(47_990));
    assert!(m.is_consistent());
    assert_eq!(h.session.orders()[0].state, SimOrderState::Placed);
    assert!(h.session.transactions().is_empty());

    // Fill at the last price.
    h.push(tick(4000, at(9, 0, 1)));
    assert_eq!(h.session.orders()[0].state, SimOrderState::Completed);
    let txns = h.session.transactions();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].volume, 1);
    assert_eq!(txns[0].price, Price::units(4000));
    let m = h.session.money();
    assert_eq!(m.frozen_margin, Price::ZERO);
    assert_eq!(m.frozen_commission, Price::ZERO);
    assert_eq!(m.use_margin, Price::units(2000));
    assert_eq!(m.commission, Price::units(10));
    assert_eq!(m.available, Price::units(47_990));
    assert!(m.is_consistent());

    // Mark to market: +10.00 × 10 per lot.
    h.push(tick(4010, at(9, 0, 2)));
    let m = h.session.money();
    assert_eq!(m.position_profit, Price::units(100));
    assert_eq!(m.curr_margin, Price::units(50_090));
    assert_eq!(m.available, Price::units(48_090));
    assert!(m.is_consistent());

    // Close below the market; fills at the last price.
    let ev = h.session.submit(request("o-2", Side::Sell, OffsetFlag::Close, 4010));
    assert!(matches!(ev, OrderEvent::Placed { .. }), "got {ev:?}");
    assert_eq!(h.session.money().frozen_commission, Price::units(10));

    h.push(tick(4020, at(9, 0, 3)));
    assert_eq!(h.session.orders()[1].state, SimOrderState::Completed);
    assert_eq!(h.session.transactions()[1].price, Price::units(4020));
    let m = h.session.money();
    assert_eq!(m.close_profit, Price::units(200));
    assert_eq!(m.position_profit, Price::ZERO);
    assert_eq!(m.use_margin, Price::ZERO);
    assert_eq!(m.commission, Price::units(20));
    assert_eq!(m.curr_margin, Price::units(50_180));
    assert_eq!(m.available, Price::units(50_180));
    assert_eq!(m.balance, Price::units(50_000));
    assert!(m.is_consistent());
}

#[test]
fn order_that_does_not_cross_keeps_resting() {
    let mut h = Harness::new();
    h.push(tick(4000, at(9, 0, 0)));
    let ev = h.session.submit(request("o-1", Side::Buy, OffsetFlag::Open, 3990));
    assert!(matches!(ev, OrderEvent::Placed { .. }));

    h.push(tick(3991, at(9, 0, 1)));
    assert_eq!(h.session.orders()[0].state, SimOrderState::Placed);

    // Exactly at the limit crosses.
    h.push(tick(3990, at(9, 0, 2)));
    assert_eq!(h.session.orders()[0].state, SimOrderState::Completed);
    assert_eq!(h.session.transactions()[0].price, Price::units(3990));
}

#[test]
fn cancel_releases_the_reservation() {
    let mut h = Harness::new();
    h.push(tick(4000, at(9, 0, 0)));
    h.session.submit(request("o-1", Side::Buy, OffsetFlag::Open, 3900));
    assert_eq!(h.session.money().available, Price::units(47_990 + 50));

    let ev = h.session.cancel(&ru(), "o-1");
    assert_eq!(ev, OrderEvent::Canceled { order_ref: "o-1".into() });
    assert_eq!(h.session.orders()[0].state, SimOrderState::Canceled);
    let m = h.session.money();
    assert_eq!(m.available, Price::units(50_000));
    assert_eq!(m.frozen_margin, Price::ZERO);
    assert!(m.is_consistent());

    // A canceled order is no longer found.
    let ev = h.session.cancel(&ru(), "o-1");
    assert!(matches!(ev, OrderEvent::CancelRejected { .. }));

    // Ticks that would have crossed it do nothing.
    h.push(tick(3800, at(9, 0, 1)));
    assert!(h.session.transactions().is_empty());
}

#[test]
fn ledger_identity_holds_across_mixed_sequence() {
    let mut h = Harness::new();
    let mut t = 0u32;
    let mut next = |h: &mut Harness, last: i64| {
        t += 1;
        h.push(tick(last, at(9, t / 60, t % 60)));
        assert!(h.session.money().is_consistent(), "tick {t}");
    };

    next(&mut h, 4000);
    h.session.submit(request("a", Side::Buy, OffsetFlag::Open, 4000));
    h.session.submit(request("b", Side::Sell, OffsetFlag::Open, 4005));
    h.session.submit(request("c", Side::Buy, OffsetFlag::Open, 3950));
    assert!(h.session.money().is_consistent());
    next(&mut h, 4000);
    next(&mut h, 4006);
    h.session.cancel(&ru(), "c");
    assert!(h.session.money().is_consistent());
    h.session.submit(request("d", Side::Sell, OffsetFlag::Close, 4006));
    h.session.submit(request("e", Side::Buy, OffsetFlag::Close, 4000));
    next(&mut h, 3999);
    next(&mut h, 4010);

    let m = h.session.money();
    assert_eq!(h.session.transactions().len(), 4);
    assert!(h.session.positions().iter().all(|p| p.long().volume == 0 && p.short().volume == 0));
    assert_eq!(m.use_margin, Price::ZERO);
    assert_eq!(m.frozen_margin, Price::ZERO);
    assert_eq!(m.commission, Price::units(40));
    // Long 4000 → 4010: +100; short 4006 → 3999: +70.
    assert_eq!(m.close_profit, Price::units(170));
    assert_eq!(m.available, Price::units(50_000 - 40 + 170));
}
