//! Database module for SQL Server connectivity

mod connection;
mod driver;
mod params;
mod query;

pub use connection::*;
pub use driver::*;
pub use params::*;
pub use query::*;
