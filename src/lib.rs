//! Performance Evaluation Engine
//!
//! This crate scores employees on three axes (Contribution, Expertise and
//! Impact), combines them into a preliminary grade, runs calibration
//! sessions that fix binding final grades, and decides growth-level
//! certification from the resulting evidence.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod calibration;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
