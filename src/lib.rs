// Library for tests to access modules

pub mod collector;
pub mod config;
pub mod controller;
pub mod docker;
pub mod lifecycle;
pub mod metrics_store;
pub mod models;
pub mod notifier;
pub mod registry;
pub mod routes;
pub mod source;
pub mod units;
