//! Named instrument filters over an account.

use simx_calendar::Instrument;
use simx_venue::{Ledger, SimPosition};

use crate::Account;

/// A sub-view of one account restricted to a fixed instrument list.
/// Money is account-wide; positions are filtered.
pub struct AccountView<'a> {
    id: &'a str,
    account: &'a Account,
    instruments: Vec<Instrument>,
}

impl<'a> AccountView<'a> {
    pub(crate) fn new(id: &'a str, account: &'a Account, instruments: Vec<Instrument>) -> Self {
        Self {
            id,
            account,
            instruments,
        }
    }

    pub fn id(&self) -> &str {
        self.id
    }

    pub fn account(&self) -> &Account {
        self.account
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn covers(&self, instrument: &Instrument) -> bool {
        self.instruments.iter().any(|i| i == instrument)
    }

    pub fn positions(&self) -> Vec<&'a SimPosition> {
        self.account
            .session()
            .positions()
            .into_iter()
            .filter(|p| self.covers(p.instrument()))
            .collect()
    }

    pub fn positions_json(&self) -> serde_json::Value {
        let full = self.account.session().positions_json();
        let serde_json::Value::Object(map) = full else {
            return serde_json::Value::Object(serde_json::Map::new());
        };
        let filtered = map
            .into_iter()
            .filter(|(key, _)| self.instruments.iter().any(|i| i.to_string() == *key))
            .collect();
        serde_json::Value::Object(filtered)
    }

    pub fn money(&self) -> Ledger {
        self.account.session().money()
    }
}
