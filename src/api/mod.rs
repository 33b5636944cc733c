// HTTP query API over the fleet and ledger

pub mod query;

pub use query::{create_query_router, QueryAppState};
