pub mod collector;
pub mod config;
pub mod detect;
pub mod formatter;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod profiles;
pub mod publisher;
pub mod routes;
pub mod scheduler;
pub mod snmp;
