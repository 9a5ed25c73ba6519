//! Application state.
//!
//! Handlers only see the repository traits. The concrete table backend is
//! chosen once in `main` and wired in through [`AppState::from_table`].

use std::sync::Arc;

use postboard_core::storage::{MicropostRepository, TableClient, UserRepository};

use crate::storage::{
    ClaimManager, InMemoryTable, TableMicropostRepository, TableUserRepository, TransferStrategy,
};

/// Shared application state, cloned for each request handler.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub microposts: Arc<dyn MicropostRepository>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserRepository>, microposts: Arc<dyn MicropostRepository>) -> Self {
        Self { users, microposts }
    }

    /// Builds both repositories on one table.
    pub fn from_table<T>(table: Arc<T>, strategy: TransferStrategy) -> Self
    where
        T: TableClient + 'static,
    {
        let claims = ClaimManager::with_strategy(table.clone(), strategy);
        tracing::debug!(strategy = %claims.strategy(), "Email claims configured");
        let users = TableUserRepository::new(table.clone(), claims);
        let microposts = TableMicropostRepository::new(table);

        Self::new(Arc::new(users), Arc::new(microposts))
    }
}

impl Default for AppState {
    /// Empty in-memory store with the default transfer strategy.
    fn default() -> Self {
        Self::from_table(Arc::new(InMemoryTable::new()), TransferStrategy::default())
    }
}
