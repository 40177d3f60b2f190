//! Fiqh QA Backend Library
//!
//! Account registration, login and profile management for the Fiqh QA
//! service. This library exposes the backend modules for use in tests and
//! the server binary.

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
