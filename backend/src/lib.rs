//! FinanDrive backend library.
//!
//! Shift timer and goal-tracking engine for rideshare/delivery drivers,
//! exposed over a REST API. Business logic lives in [`domain`], file-based
//! persistence in [`storage`], and the axum handlers in [`rest`].

pub mod domain;
pub mod rest;
pub mod storage;
