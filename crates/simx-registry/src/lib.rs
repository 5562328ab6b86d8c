//! simx-registry
//!
//! Owns every configured account and its transaction session, and routes
//! market data and clock advances to them.
//!
//! # Isolation
//! Ticks are dispatched to sessions one after another.  A session that
//! fails a tick has already restored its own state; the registry logs the
//! fault and moves on.  One account can never stop delivery to the rest.
//!
//! # Lifecycle
//! The account list is built once by [`AccountRegistry::load`] and is
//! fixed afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{NaiveDate, NaiveDateTime};
use simx_calendar::{ExchangeCatalog, Instrument};
use simx_config::{AccountConfig, SimTradeConfig};
use simx_venue::{SessionContext, SimClock, Tick, TickCache, TxnSession, TxnSessionListener};
use tracing::{error, info, warn};

mod factory;
mod view;

pub use factory::{default_factories, SimTxnSessionFactory, TxnSessionFactory};
pub use view::AccountView;

/// One configured account and the session trading it.
pub struct Account {
    config: AccountConfig,
    session: Box<dyn TxnSession>,
}

impl Account {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    pub fn session(&self) -> &dyn TxnSession {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut dyn TxnSession {
        self.session.as_mut()
    }
}

pub struct AccountRegistry {
    catalog: Arc<ExchangeCatalog>,
    cache: Arc<TickCache>,
    clock: Arc<SimClock>,
    factories: BTreeMap<String, Box<dyn TxnSessionFactory>>,
    accounts: Vec<Account>,
    /// view id → (account index, instruments)
    views: BTreeMap<String, (usize, Vec<Instrument>)>,
}

impl AccountRegistry {
    /// Build and connect every account in `config` with the default
    /// factories.
    pub fn load<F>(config: &SimTradeConfig, catalog: Arc<ExchangeCatalog>, listener_for: F) -> Result<Self>
    where
        F: Fn(&AccountConfig) -> Arc<dyn TxnSessionListener>,
    {
        Self::load_with(config, catalog, default_factories(), listener_for)
    }

    /// As [`load`](Self::load) with an explicit provider set.  An account
    /// naming a provider that no factory serves fails the whole load.
    pub fn load_with<F>(
        config: &SimTradeConfig,
        catalog: Arc<ExchangeCatalog>,
        factories: Vec<Box<dyn TxnSessionFactory>>,
        listener_for: F,
    ) -> Result<Self>
    where
        F: Fn(&AccountConfig) -> Arc<dyn TxnSessionListener>,
    {
        config.validate()?;

        let mut by_name = BTreeMap::new();
        for f in factories {
            let name = f.provider().to_string();
            if by_name.insert(name.clone(), f).is_some() {
                bail!("duplicate session factory for provider '{name}'");
            }
        }

        let cache = Arc::new(TickCache::new());
        let clock = Arc::new(SimClock::new());
        let ctx = SessionContext {
            catalog: catalog.clone(),
            market_data: cache.clone(),
            clock: clock.clone(),
        };

        let mut accounts = Vec::with_capacity(config.accounts.len());
        let mut views = BTreeMap::new();
        for account in &config.accounts {
            let Some(factory) = by_name.get(&account.provider) else {
                error!(account_id = %account.id, provider = %account.provider, "unknown session provider");
                bail!(
                    "account {}: unknown session provider '{}'",
                    account.id,
                    account.provider
                );
            };
            let mut session = factory.create(ctx.clone(), account.clone(), listener_for(account));
            session.connect();
            info!(
                account_id = %account.id,
                provider = %account.provider,
                state = ?session.state(),
                "account loaded"
            );

            let index = accounts.len();
            for v in &account.views {
                views.insert(v.id.clone(), (index, v.instruments()?));
            }
            accounts.push(Account {
                config: account.clone(),
                session,
            });
        }

        Ok(Self {
            catalog,
            cache,
            clock,
            factories: by_name,
            accounts,
            views,
        })
    }

    pub fn catalog(&self) -> &Arc<ExchangeCatalog> {
        &self.catalog
    }

    pub fn tick_cache(&self) -> &Arc<TickCache> {
        &self.cache
    }

    pub fn clock(&self) -> &Arc<SimClock> {
        &self.clock
    }

    /// Record `tick` as the latest for its instrument, then hand it to every
    /// session.  Returns the number of sessions that faulted.
    pub fn on_market_data(&mut self, tick: &Tick) -> usize {
        self.cache.update(tick.clone());
        let mut faults = 0;
        for account in &mut self.accounts {
            if let Err(e) = account.session.on_market_data(tick) {
                faults += 1;
                error!(
                    account_id = %account.config.id,
                    instrument = %tick.instrument,
                    error = %e,
                    "session failed on market data; continuing"
                );
            }
        }
        faults
    }

    /// Advance the shared clock and flush every session's queued responses.
    /// A backwards instant is ignored.
    pub fn on_time_changed(&mut self, trading_day: NaiveDate, instant: NaiveDateTime) {
        if !self.clock.advance(trading_day, instant) {
            warn!(%instant, "clock advance ignored: instant earlier than current");
            return;
        }
        for account in &mut self.accounts {
            account.session.on_time_changed(trading_day, instant);
        }
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.config.id == id)
    }

    pub fn account_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.config.id == id)
    }

    pub fn account_view(&self, view_id: &str) -> Option<AccountView<'_>> {
        let (key, (index, instruments)) = self.views.get_key_value(view_id)?;
        let account = self.accounts.get(*index)?;
        Some(AccountView::new(key, account, instruments.clone()))
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// First account loaded.
    pub fn primary_account(&self) -> Option<&Account> {
        self.accounts.first()
    }

    pub fn session_factories(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
