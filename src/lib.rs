//! src/lib.rs
// make public to other binaries (main, create_admin, tests)
pub mod authentication;
pub mod backend;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod session_state;
pub mod startup;
pub mod telemetry;
pub mod utils;
