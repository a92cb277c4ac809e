//! The single entry point for cases, individuals, and variants.

use crate::backend::{Capabilities, Filters, Variant, VariantBackend};
use crate::dispatch;
use crate::error::{Error, Result};
use crate::models::{Case, CaseData, Individual, VariantMode, VariantType};
use crate::store::CaseStore;

use log::debug;


//-----------------------------------------------------------------------------

/// Case metadata combined with variant queries.
///
/// Cases and individuals are stored in a [`CaseStore`].
/// Variant queries are routed to the backend named by the case, which is created for each query with [`dispatch::select_backend`].
/// The filters supported by the backend used for the latest query are available with [`VariantStore::filters`].
///
/// # Examples
///
/// ```
/// use variant_base::{CaseData, IndividualData, VariantStore, VariantType};
/// use std::fs;
///
/// let dir = tempfile::tempdir().unwrap();
/// let vcf_file = dir.path().join("fam1.vcf");
/// fs::write(&vcf_file, "##fileformat=VCFv4.2\n\
///     #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tfam1-1\n\
///     1\t100\t.\tA\tG\t30\tPASS\t.\tGT\t0/1\n").unwrap();
/// let source = vcf_file.display().to_string();
///
/// let mut store = VariantStore::connect(":memory:").unwrap();
/// store.set_up(false).unwrap();
/// let data = CaseData {
///     case_id: String::from("fam1"),
///     name: String::from("Family 1"),
///     variant_source: source.clone(),
///     individuals: vec![IndividualData {
///         ind_id: String::from("fam1-1"),
///         variant_source: source.clone(),
///         ..Default::default()
///     }],
/// };
/// store.add_case(&data, VariantType::Snv, "vcf", None).unwrap();
///
/// let variants = store.variants("fam1", 0, VariantStore::DEFAULT_COUNT, &Default::default()).unwrap();
/// assert_eq!(variants.len(), 1);
/// assert!(store.filters().supports("gene_ids"));
/// assert!(store.variant("fam1", "nonexistent-id").unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct VariantStore {
    store: CaseStore,
    filters: Capabilities,
}

impl VariantStore {
    /// Number of variants per page in listings.
    pub const DEFAULT_COUNT: usize = 30;

    /// Creates a facade over an existing store.
    pub fn new(store: CaseStore) -> Self {
        VariantStore { store, filters: Capabilities::default() }
    }

    /// Connects to the database at the given location.
    ///
    /// See [`CaseStore::connect`] for the supported locations.
    pub fn connect(uri: &str) -> Result<Self> {
        let store = CaseStore::connect(uri)?;
        Ok(Self::new(store))
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    /// Creates the tables, dropping the existing ones first if `reset` is `true`.
    pub fn set_up(&mut self, reset: bool) -> Result<()> {
        self.store.set_up(reset)?;
        Ok(())
    }

    /// Returns the filters supported by the backend used for the latest variant query.
    ///
    /// No filters are supported before the first query.
    pub fn filters(&self) -> Capabilities {
        self.filters
    }

    // Finds the case and creates the backend for it.
    fn resolve(&self, case_id: &str) -> Result<(Box<dyn VariantBackend>, String)> {
        let case = self.store.case(case_id)?.ok_or_else(|| Error::CaseNotFound(case_id.to_string()))?;
        dispatch::select_backend(&case)
    }
}

//-----------------------------------------------------------------------------

/// Variants.
impl VariantStore {
    /// Returns up to `count` variants of the case after skipping `skip` variants that pass the filters.
    ///
    /// The supported filters are recorded and available with [`VariantStore::filters`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaseNotFound`] if the case does not exist.
    /// Passes through errors from dispatching and from the backend.
    pub fn variants(&mut self, case_id: &str, skip: usize, count: usize, filters: &Filters) -> Result<Vec<Variant>> {
        let (backend, backend_case) = self.resolve(case_id)?;
        self.filters = backend.capabilities();
        debug!("Active filters for case {}: {}", case_id, self.filters.names().join(", "));
        backend.variants(&backend_case, skip, count, filters)
    }

    /// Returns the variant with the given identifier, or [`None`] if the case has no such variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaseNotFound`] if the case does not exist.
    /// Passes through errors from dispatching and from the backend.
    pub fn variant(&self, case_id: &str, variant_id: &str) -> Result<Option<Variant>> {
        let (backend, backend_case) = self.resolve(case_id)?;
        backend.variant(&backend_case, variant_id)
    }
}

//-----------------------------------------------------------------------------

/// Cases and individuals.
impl VariantStore {
    /// Stores a case with its individuals and returns the stored case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBackend`] if the mode is not supported.
    /// Nothing is stored in that case.
    /// Passes through database errors.
    pub fn add_case(&mut self, data: &CaseData, variant_type: VariantType, mode: &str, pedigree: Option<&str>) -> Result<Case> {
        let mode: VariantMode = mode.parse()?;
        let case = data.to_case(variant_type, mode, pedigree);
        self.store.add_case(&case)
    }

    /// Deletes the case and its individuals and returns the deleted case.
    pub fn delete_case(&mut self, case: Case) -> Result<Case> {
        self.store.delete_case(case)
    }

    /// Deletes the individual and returns it.
    pub fn delete_individual(&mut self, ind: Individual) -> Result<Individual> {
        self.store.delete_individual(ind)
    }

    /// Returns the case with the given identifier, or [`None`] if there is no such case.
    pub fn case(&self, case_id: &str) -> Result<Option<Case>> {
        self.store.case(case_id)
    }

    /// Returns the individual with the given identifier, or [`None`] if there is no such individual.
    pub fn individual(&self, ind_id: &str) -> Result<Option<Individual>> {
        self.store.individual(ind_id)
    }

    /// Returns all cases.
    pub fn cases(&self) -> Result<Vec<Case>> {
        self.store.cases()
    }

    /// Returns the individuals with the given identifiers, or all individuals.
    pub fn individuals(&self, ind_ids: Option<&[&str]>) -> Result<Vec<Individual>> {
        self.store.individuals(ind_ids)
    }
}

//-----------------------------------------------------------------------------
