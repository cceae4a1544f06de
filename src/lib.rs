mod chess;
mod config;
mod delta;
mod errors;
mod ingest;
mod metrics;
mod probe;
mod server;
mod store;
mod viewers;

pub mod proto;
pub mod utils;

pub use chess::*;
pub use config::*;
pub use delta::*;
pub use errors::*;
pub use ingest::*;
pub use metrics::*;
pub use probe::*;
pub use server::*;
pub use store::*;
pub use viewers::*;
