//! URL handling module for Sumi-Sweep
//!
//! This module provides the crawl [`Domain`] authority and host extraction.

mod domain;

pub use domain::{extract_host, Domain};
