//! Edge Console - operator console for an edge ML pipeline
//!
//! This library tracks hub authentication, training-image upload, model
//! training and deployment, and a live detection stream against a remote
//! backend, and folds all of it into one consistent observable state.

pub mod cli;
pub mod config;
pub mod console;
pub mod health;
pub mod hub;
pub mod logging;
pub mod notify;
pub mod session;
pub mod stream;
pub mod tasks;
