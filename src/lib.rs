pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod logging;
pub mod model;
pub mod ops;
pub mod queries;
pub mod storage;
pub mod validation;
pub mod web;
