pub mod config;
pub mod logging;

pub mod checksum;
pub mod control;
pub mod error;
pub mod fetch;
pub mod fetch_head;
pub mod storage;
pub mod transfer;
pub mod url_model;
