//! Cases, individuals, and the enumerations describing them.
//!
//! [`Case`] and [`Individual`] are the records stored in the [`crate::CaseStore`] and derived by the variant backends.
//! [`CaseData`] and [`IndividualData`] are the plain input structures accepted by [`crate::VariantStore::add_case`].

use crate::error::{Error, Result};

use std::fmt::{self, Display};
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

//-----------------------------------------------------------------------------

/// Kind of variants a case is analyzed for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VariantType {
    /// Single nucleotide variants and short indels.
    #[default]
    Snv,
    /// Structural variants.
    Sv,
}

impl VariantType {
    /// Returns the name used in the database and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantType::Snv => "snv",
            VariantType::Sv => "sv",
        }
    }
}

impl Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "snv" => Ok(VariantType::Snv),
            "sv" => Ok(VariantType::Sv),
            _ => Err(Error::InvalidVariantType(s.to_string())),
        }
    }
}

impl ToSql for VariantType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for VariantType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|x: Error| FromSqlError::Other(Box::new(x)))
    }
}

//-----------------------------------------------------------------------------

/// The backend that owns the variants of a case.
///
/// Cases store the mode as text, and [`crate::dispatch::select_backend`] parses it into this enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VariantMode {
    /// VCF files read by [`crate::VcfBackend`].
    #[default]
    Vcf,
    /// GEMINI databases read by [`crate::GeminiBackend`].
    Gemini,
}

impl VariantMode {
    /// Returns the name stored in [`Case::variant_mode`].
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantMode::Vcf => "vcf",
            VariantMode::Gemini => "gemini",
        }
    }
}

impl Display for VariantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vcf" => Ok(VariantMode::Vcf),
            "gemini" => Ok(VariantMode::Gemini),
            _ => Err(Error::UnsupportedBackend(s.to_string())),
        }
    }
}

//-----------------------------------------------------------------------------

/// Sex of an individual, with PED file codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Sex {
    #[default]
    Unknown,
    Male,
    Female,
}

impl Sex {
    /// Interprets a PED code; anything other than 1 or 2 is unknown.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Sex::Male,
            2 => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    /// Returns the PED code.
    pub fn code(&self) -> i64 {
        match self {
            Sex::Unknown => 0,
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }
}

impl ToSql for Sex {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Sex {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Sex::from_code(value.as_i64()?))
    }
}

/// Affection status of an individual, with PED file codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phenotype {
    /// Missing (PED codes 0 and -9).
    #[default]
    Unknown,
    Unaffected,
    Affected,
}

impl Phenotype {
    /// Interprets a PED code; anything other than 1 or 2 is unknown.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Phenotype::Unaffected,
            2 => Phenotype::Affected,
            _ => Phenotype::Unknown,
        }
    }

    /// Returns the PED code.
    pub fn code(&self) -> i64 {
        match self {
            Phenotype::Unknown => 0,
            Phenotype::Unaffected => 1,
            Phenotype::Affected => 2,
        }
    }
}

impl ToSql for Phenotype {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Phenotype {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Phenotype::from_code(value.as_i64()?))
    }
}

//-----------------------------------------------------------------------------

/// A family or sample unit with one variant source.
///
/// The record corresponds to one row in table `Cases`, and the individuals to rows in table `Individuals`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Case {
    /// Unique identifier.
    pub case_id: String,

    /// Display name.
    pub name: String,

    /// Path to the VCF file or the GEMINI database.
    pub variant_source: String,

    /// Kind of variants in the source.
    pub variant_type: VariantType,

    /// Name of the backend that owns the variants.
    ///
    /// Fixed at creation.
    /// The stored text may come from another tool, so it is only parsed when the case is dispatched.
    pub variant_mode: String,

    /// Optional pedigree drawing or other artifact.
    pub pedigree: Option<String>,

    /// Individuals in the order they were added.
    pub individuals: Vec<Individual>,
}

impl Case {
    /// Creates a case without individuals or a pedigree.
    pub fn new(case_id: &str, name: &str, variant_source: &str, variant_type: VariantType, variant_mode: VariantMode) -> Self {
        Case {
            case_id: case_id.to_string(),
            name: name.to_string(),
            variant_source: variant_source.to_string(),
            variant_type,
            variant_mode: variant_mode.to_string(),
            pedigree: None,
            individuals: Vec::new(),
        }
    }

    /// Returns the individual with the given identifier, or [`None`] if there is no such individual.
    pub fn individual(&self, ind_id: &str) -> Option<&Individual> {
        self.individuals.iter().find(|ind| ind.ind_id == ind_id)
    }

    /// Returns the identifiers of the affected individuals.
    pub fn affected(&self) -> impl Iterator<Item = &str> + '_ {
        self.individuals.iter().filter(|ind| ind.phenotype == Phenotype::Affected).map(|ind| ind.ind_id.as_str())
    }
}

/// One sample within a case.
///
/// Parents are free-form identifiers that may not refer to any stored individual.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Individual {
    /// Identifier, unique within the case.
    pub ind_id: String,

    /// Identifier of the owning case.
    pub case_id: String,

    pub mother: Option<String>,

    pub father: Option<String>,

    pub sex: Sex,

    pub phenotype: Phenotype,

    /// Position of the individual in the case (e.g. sample column in a VCF file).
    pub index: usize,

    /// Variant source for this sample.
    pub variant_source: String,

    /// Optional alignment file.
    pub bam_path: Option<String>,
}

//-----------------------------------------------------------------------------

/// Plain description of a case, as accepted by [`crate::VariantStore::add_case`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseData {
    pub case_id: String,
    pub name: String,
    pub variant_source: String,
    pub individuals: Vec<IndividualData>,
}

/// Plain description of an individual within a [`CaseData`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndividualData {
    pub ind_id: String,
    pub mother: Option<String>,
    pub father: Option<String>,
    pub sex: Sex,
    pub phenotype: Phenotype,
    pub index: usize,
    pub variant_source: String,
    pub bam_path: Option<String>,
}

impl CaseData {
    /// Builds the case record with its individuals.
    pub fn to_case(&self, variant_type: VariantType, variant_mode: VariantMode, pedigree: Option<&str>) -> Case {
        let mut case = Case::new(&self.case_id, &self.name, &self.variant_source, variant_type, variant_mode);
        case.pedigree = pedigree.map(String::from);
        case.individuals = self.individuals.iter().map(|ind| Individual {
            ind_id: ind.ind_id.clone(),
            case_id: self.case_id.clone(),
            mother: ind.mother.clone(),
            father: ind.father.clone(),
            sex: ind.sex,
            phenotype: ind.phenotype,
            index: ind.index,
            variant_source: ind.variant_source.clone(),
            bam_path: ind.bam_path.clone(),
        }).collect();
        case
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
