pub mod adapters;
pub mod application;
pub mod cli_adapter;
pub mod config;
pub mod domain;
pub mod ports;
pub mod prettyprint;
pub mod service_factory;
