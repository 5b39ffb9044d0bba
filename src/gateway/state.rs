use std::sync::Arc;

use crate::db::Database;
use crate::service::BankService;
use crate::session::TokenService;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub bank: Arc<BankService>,
    /// Used by the JWT middleware
    pub tokens: Arc<TokenService>,
    /// `None` when running on the in-memory store
    pub db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(bank: Arc<BankService>, db: Option<Arc<Database>>) -> Self {
        let tokens = bank.tokens().clone();
        Self { bank, tokens, db }
    }
}
