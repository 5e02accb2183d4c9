// ABOUTME: Database module exports for chferry
// ABOUTME: Contains ClickHouse connection management and SQL text construction

pub mod clickhouse;
pub mod sql;

pub use clickhouse::ClickHouseConnection;
