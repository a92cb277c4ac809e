//! Choosing the variant backend for a case.

use crate::backend::gemini::GeminiBackend;
use crate::backend::vcf::VcfBackend;
use crate::backend::VariantBackend;
use crate::error::Result;
use crate::models::{Case, VariantMode};

use log::debug;

//-----------------------------------------------------------------------------

/// Creates the backend that owns the variants of the case.
///
/// Returns the backend and the identifier of the case for querying it.
/// The mode is parsed from [`Case::variant_mode`]:
///
/// * `vcf`: [`VcfBackend`] for [`Case::variant_source`], with the case as its only case.
/// * `gemini`: [`GeminiBackend`] for [`Case::variant_source`], with the case as its only case.
///
/// A new backend is created on every call.
///
/// # Errors
///
/// Returns [`crate::Error::UnsupportedBackend`] if the mode is not one of the above.
/// Passes through any errors from creating the backend.
///
/// # Examples
///
/// ```
/// use variant_base::{Case, Error, VariantMode, VariantType};
/// use variant_base::dispatch;
///
/// let mut case = Case::new("fam1", "Family 1", "/data/fam1.vcf", VariantType::Snv, VariantMode::Vcf);
/// case.variant_mode = String::from("unknown_mode");
/// match dispatch::select_backend(&case) {
///     Err(Error::UnsupportedBackend(mode)) => assert_eq!(mode, "unknown_mode"),
///     _ => panic!("Expected an unsupported backend"),
/// }
/// ```
pub fn select_backend(case: &Case) -> Result<(Box<dyn VariantBackend>, String)> {
    let mode: VariantMode = case.variant_mode.parse()?;
    let backend: Box<dyn VariantBackend> = match mode {
        VariantMode::Vcf => {
            debug!("Using VCF backend for case {}", case.case_id);
            let backend = VcfBackend::new(&case.variant_source, case.variant_type)?;
            Box::new(backend.with_cases(vec![case.clone()]))
        },
        VariantMode::Gemini => {
            debug!("Using GEMINI backend for case {}", case.case_id);
            let backend = GeminiBackend::new(&case.variant_source, case.variant_type)?;
            Box::new(backend.with_cases(vec![case.clone()]))
        },
    };
    Ok((backend, case.case_id.clone()))
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
