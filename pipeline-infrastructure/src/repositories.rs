pub mod clickhouse_sink;
pub mod country_table;
pub mod geo_table;
pub mod loader;

pub use clickhouse_sink::*;
pub use country_table::*;
pub use geo_table::*;
