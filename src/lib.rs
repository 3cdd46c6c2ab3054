// Library for tests to access modules

pub mod config;
pub mod downsample;
pub mod error;
pub mod history;
pub mod history_repo;
pub mod models;
pub mod routes;
pub mod store;
pub mod timespan;
pub mod version;
