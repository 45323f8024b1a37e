pub mod ledger;
pub mod models;
pub mod notifications;
pub mod retry;
pub mod settings;
pub mod shutdown;
pub mod store;
