//! # Variant-base: case metadata in SQLite with pluggable variant backends.
//!
//! This crate stores families and samples (cases and individuals) in a SQLite database and answers variant queries for them.
//! The variants themselves are not copied into the database.
//! Each case names the backend that owns its variants, and every query is routed to that backend.
//!
//! See [`VariantStore`] for the main interface.
//! See [`CaseStore`] for the metadata database and [`VariantBackend`] for the backend interface.
//!
//! ### Basic concepts
//!
//! A case is a family or another sample unit with a single variant source.
//! Each case corresponds to a row in table `Cases`, with the case identifier as its primary key.
//! Individuals are samples within a case, and they are stored in table `Individuals`.
//! Individual identifiers are only unique within a case.
//!
//! The variant mode of a case selects the backend:
//!
//! * `vcf`: [`VcfBackend`] reads a VCF file or a directory of VCF files.
//! * `gemini`: [`GeminiBackend`] queries a GEMINI SQLite database.
//!
//! The mode is fixed when the case is added, and the backend is created again for every query (see [`dispatch`]).
//! Backends declare the filters they support with [`Capabilities`].
//! A query with a filter the backend does not support fails instead of ignoring the filter.
//!
//! ### Lookups
//!
//! Looking up a missing case or individual returns [`None`].
//! Variant queries for a missing case fail with [`Error::CaseNotFound`].

pub mod backend;
pub mod dispatch;
pub mod error;
pub mod facade;
pub mod formats;
pub mod models;
pub mod store;
pub mod utils;

#[cfg(test)]
mod internal;

pub use error::{Error, Result};
pub use models::{Case, CaseData, Individual, IndividualData, Phenotype, Sex, VariantMode, VariantType};
pub use backend::{Capabilities, FilterSet, Filters, Variant, VariantBackend};
pub use backend::gemini::GeminiBackend;
pub use backend::vcf::VcfBackend;
pub use facade::VariantStore;
pub use store::{CaseStore, StoreLocation};
