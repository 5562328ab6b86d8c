use std::sync::Arc;

use simx_config::AccountConfig;
use simx_venue::{SessionContext, SimTxnSession, TxnSession, TxnSessionListener, SIM_PROVIDER};

/// Builds sessions for one provider name.
pub trait TxnSessionFactory: Send + Sync {
    fn provider(&self) -> &str;

    fn create(
        &self,
        ctx: SessionContext,
        account: AccountConfig,
        listener: Arc<dyn TxnSessionListener>,
    ) -> Box<dyn TxnSession>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SimTxnSessionFactory;

impl TxnSessionFactory for SimTxnSessionFactory {
    fn provider(&self) -> &str {
        SIM_PROVIDER
    }

    fn create(
        &self,
        ctx: SessionContext,
        account: AccountConfig,
        listener: Arc<dyn TxnSessionListener>,
    ) -> Box<dyn TxnSession> {
        Box::new(SimTxnSession::new(account, ctx, listener))
    }
}

/// Factories available to every registry.
pub fn default_factories() -> Vec<Box<dyn TxnSessionFactory>> {
    vec![Box::new(SimTxnSessionFactory)]
}
