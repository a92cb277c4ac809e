//! Variant backends and the interface they share.
//!
//! A backend answers variant queries for the cases stored in one variant source.
//! All backends implement [`VariantBackend`], and callers only use them through that trait.
//! See [`crate::dispatch::select_backend`] for choosing the backend for a case.
//!
//! ### Filters
//!
//! Queries take [`Filters`], a mapping from filter names to values.
//! Each backend declares the filters it honors as [`Capabilities`].
//! [`FilterSet::parse`] validates a query against the capabilities before the backend runs it:
//!
//! * [`FilterSet::GENE_IDS`]: comma-separated gene symbols; the variant must be annotated with one of them.
//! * [`FilterSet::FREQUENCY`]: maximum population frequency; variants without a frequency pass.
//! * [`FilterSet::CADD`]: minimum CADD score; variants without a score fail.
//! * [`FilterSet::CONSEQUENCE`]: comma-separated SO terms; the variant must have one of them.
//! * [`FilterSet::SV_LEN`]: minimum structural variant length.
//!
//! A filter the backend does not declare is rejected with [`Error::UnsupportedFilter`], even if it is one of the names above.
//! Filters with empty values are ignored.

use crate::error::{Error, Result};
use crate::models::{Case, Individual, VariantMode, VariantType};

use std::collections::BTreeMap;
use std::fmt::Debug;

pub mod gemini;
pub mod vcf;


//-----------------------------------------------------------------------------

/// A variant returned by a backend query.
///
/// Coordinates are 1-based and inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct Variant {
    /// Identifier within the backend, used with [`VariantBackend::variant`].
    pub variant_id: String,
    pub chrom: String,
    pub start: usize,
    pub stop: usize,
    pub reference: String,
    pub alternative: String,
    pub quality: Option<f64>,
    pub filter: String,
    /// Annotated gene symbols.
    pub genes: Vec<String>,
    /// Annotated SO consequence terms.
    pub consequences: Vec<String>,
    /// Population allele frequency.
    pub frequency: Option<f64>,
    pub cadd_score: Option<f64>,
    /// Structural variant type, or [`None`] for SNVs and short indels.
    pub sv_type: Option<String>,
    pub sv_len: Option<usize>,
}

impl Variant {
    /// Returns `true` if this is a structural variant.
    #[inline]
    pub fn is_sv(&self) -> bool {
        self.sv_type.is_some()
    }

    /// Returns `true` if the variant belongs to the given variant type.
    #[inline]
    pub fn has_type(&self, variant_type: VariantType) -> bool {
        self.is_sv() == (variant_type == VariantType::Sv)
    }
}

/// Query filters as a mapping from filter names to values.
pub type Filters = BTreeMap<String, String>;

//-----------------------------------------------------------------------------

/// Filters honored by a backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub gene: bool,
    pub frequency: bool,
    pub cadd: bool,
    pub consequence: bool,
    pub sv_len: bool,
}

impl Capabilities {
    /// Returns `true` if the filter with the given name is honored.
    pub fn supports(&self, name: &str) -> bool {
        match name {
            FilterSet::GENE_IDS => self.gene,
            FilterSet::FREQUENCY => self.frequency,
            FilterSet::CADD => self.cadd,
            FilterSet::CONSEQUENCE => self.consequence,
            FilterSet::SV_LEN => self.sv_len,
            _ => false,
        }
    }

    /// Returns the names of the honored filters.
    pub fn names(&self) -> Vec<&'static str> {
        FilterSet::NAMES.iter().copied().filter(|name| self.supports(name)).collect()
    }
}

//-----------------------------------------------------------------------------

/// Validated query filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSet {
    pub genes: Vec<String>,
    pub max_frequency: Option<f64>,
    pub min_cadd: Option<f64>,
    pub consequences: Vec<String>,
    pub min_sv_len: Option<usize>,
}

impl FilterSet {
    /// Filter name for gene symbols.
    pub const GENE_IDS: &'static str = "gene_ids";

    /// Filter name for maximum population frequency.
    pub const FREQUENCY: &'static str = "frequency";

    /// Filter name for minimum CADD score.
    pub const CADD: &'static str = "cadd";

    /// Filter name for consequence terms.
    pub const CONSEQUENCE: &'static str = "consequence";

    /// Filter name for minimum structural variant length.
    pub const SV_LEN: &'static str = "sv_len";

    /// All known filter names.
    pub const NAMES: [&'static str; 5] = [Self::GENE_IDS, Self::FREQUENCY, Self::CADD, Self::CONSEQUENCE, Self::SV_LEN];

    fn parse_list(value: &str) -> Vec<String> {
        value.split(',').map(str::trim).filter(|x| !x.is_empty()).map(String::from).collect()
    }

    fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
        value.trim().parse::<T>().map_err(|_| Error::invalid_filter(name, value))
    }

    // NaN and infinities are not valid thresholds.
    fn parse_threshold(name: &str, value: &str) -> Result<f64> {
        let threshold: f64 = Self::parse_number(name, value)?;
        if !threshold.is_finite() {
            return Err(Error::invalid_filter(name, value));
        }
        Ok(threshold)
    }

    /// Validates the filters against the capabilities of a backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFilter`] for a non-empty filter the backend does not honor.
    /// Returns [`Error::InvalidFilter`] if a value cannot be parsed or if a threshold is not finite.
    pub fn parse(filters: &Filters, capabilities: Capabilities) -> Result<Self> {
        let mut result = FilterSet::default();
        for (name, value) in filters.iter() {
            if value.trim().is_empty() {
                continue;
            }
            if !capabilities.supports(name) {
                return Err(Error::UnsupportedFilter(name.clone()));
            }
            match name.as_str() {
                Self::GENE_IDS => result.genes = Self::parse_list(value),
                Self::FREQUENCY => result.max_frequency = Some(Self::parse_threshold(name, value)?),
                Self::CADD => result.min_cadd = Some(Self::parse_threshold(name, value)?),
                Self::CONSEQUENCE => result.consequences = Self::parse_list(value),
                Self::SV_LEN => result.min_sv_len = Some(Self::parse_number(name, value)?),
                _ => return Err(Error::UnsupportedFilter(name.clone())),
            }
        }
        Ok(result)
    }

    /// Returns `true` if no filters are active.
    pub fn is_empty(&self) -> bool {
        *self == FilterSet::default()
    }

    /// Returns `true` if the variant passes all filters.
    pub fn matches(&self, variant: &Variant) -> bool {
        if !self.genes.is_empty() && !variant.genes.iter().any(|x| self.genes.contains(x)) {
            return false;
        }
        if let (Some(max), Some(frequency)) = (self.max_frequency, variant.frequency) {
            if frequency > max {
                return false;
            }
        }
        if let Some(min) = self.min_cadd {
            if !variant.cadd_score.is_some_and(|score| score >= min) {
                return false;
            }
        }
        if !self.consequences.is_empty() && !variant.consequences.iter().any(|x| self.consequences.contains(x)) {
            return false;
        }
        if let Some(min) = self.min_sv_len {
            if !variant.sv_len.is_some_and(|len| len >= min) {
                return false;
            }
        }
        true
    }
}

//-----------------------------------------------------------------------------

/// Interface shared by all variant backends.
///
/// A backend also knows the cases in its source.
/// When used on its own, it derives them from the source.
/// When created by [`crate::dispatch::select_backend`], it is given the case from the [`crate::CaseStore`] instead.
pub trait VariantBackend: Debug {
    /// Returns the mode identifying this backend.
    fn mode(&self) -> VariantMode;

    /// Returns the type of variants this backend returns.
    fn variant_type(&self) -> VariantType;

    /// Returns the filters this backend honors.
    fn capabilities(&self) -> Capabilities;

    /// Returns at most `count` variants for the case after skipping the first `skip` matching variants.
    ///
    /// The order is stable, so consecutive windows do not overlap.
    ///
    /// # Errors
    ///
    /// Returns an error if the filters are not supported or invalid, if the case is unknown to the backend, or if the source cannot be read.
    fn variants(&self, case_id: &str, skip: usize, count: usize, filters: &Filters) -> Result<Vec<Variant>>;

    /// Returns the variant with the given identifier, or [`None`] if there is no such variant.
    fn variant(&self, case_id: &str, variant_id: &str) -> Result<Option<Variant>>;

    /// Returns the cases known to the backend.
    fn cases(&self) -> &[Case];

    /// Returns the case with the given identifier, or [`None`] if the backend does not know it.
    fn case(&self, case_id: &str) -> Option<&Case> {
        self.cases().iter().find(|case| case.case_id == case_id)
    }

    /// Returns the individuals in all known cases.
    fn individuals(&self) -> Vec<&Individual> {
        self.cases().iter().flat_map(|case| case.individuals.iter()).collect()
    }

    /// Returns the first individual with the given identifier, or [`None`] if there is no such individual.
    fn individual(&self, ind_id: &str) -> Option<&Individual> {
        self.cases().iter().find_map(|case| case.individual(ind_id))
    }
}

//-----------------------------------------------------------------------------
