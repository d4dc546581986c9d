//! The `utils` module provides common definitions used across the `notihub`
//! application: the error taxonomy and logging initialization.

pub mod error;
pub mod logging;
