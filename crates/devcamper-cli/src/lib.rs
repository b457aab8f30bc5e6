//! # DevCamper CLI
//!
//! Seeding and administration utilities for DevCamper development databases.
//!
//! ## Usage
//!
//! ```ignore
//! use devcamper_cli::seeder::{Fixtures, import};
//!
//! let fixtures = Fixtures::load("data")?;
//! import(store.as_ref(), geocoder.as_ref(), fixtures).await?;
//! ```

pub mod seeder;
