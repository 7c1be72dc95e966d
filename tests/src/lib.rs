//! # CFx Test Suite
//!
//! Cross-crate scenarios that need more than one crate at a time.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── bus_benchmarks.rs   # Mailbox and routing throughput
//! └── src/
//!     └── integration/
//!         ├── config_flows.rs   # Config file → framework → saved config
//!         └── overlay_flows.rs  # Request/reply, timers, fault isolation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cfx-tests
//!
//! # By category
//! cargo test -p cfx-tests integration::config_flows
//! cargo test -p cfx-tests integration::overlay_flows
//!
//! # Benchmarks
//! cargo bench -p cfx-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
