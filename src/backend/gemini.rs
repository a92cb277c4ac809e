//! Variant backend querying GEMINI databases.
//!
//! A GEMINI database is a SQLite file with one row per variant in table `variants` and one row per sample in table `samples`.
//! Each variant is annotated with its most severe gene and consequence, which are used for filtering.
//! Genotypes are stored in compressed columns and are not interpreted here, so the backend returns the same variants for every case it knows.
//! Queries for a case the backend does not know fail with [`Error::CaseNotFound`].

use crate::backend::{Capabilities, FilterSet, Filters, Variant, VariantBackend};
use crate::error::{Error, Result};
use crate::models::{Case, Individual, Phenotype, Sex, VariantMode, VariantType};

use std::path::Path;

use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags, OptionalExtension, Row};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A backend querying a GEMINI database.
///
/// The database is opened read-only, and it is validated before the backend is returned.
/// Cases are derived from the `samples` table, with one case for each family.
/// In multi-threaded applications, each thread should have its own backend.
#[derive(Debug)]
pub struct GeminiBackend {
    connection: Connection,
    db: String,
    variant_type: VariantType,
    case_objs: Vec<Case>,
}

impl GeminiBackend {
    // Columns read from table `variants`, in the order expected by `row_to_variant`.
    const VARIANT_COLUMNS: &'static str =
        "variant_id, chrom, start, end, ref, alt, qual, filter, type, sub_type, gene, impact_so, max_aaf_all, cadd_scaled";

    /// Opens the database and reads the cases from it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendUnavailable`] if the database cannot be opened or if it does not contain the GEMINI tables.
    pub fn new<P: AsRef<Path>>(db: P, variant_type: VariantType) -> Result<Self> {
        let db = db.as_ref().display().to_string();
        debug!("Opening GEMINI database {} ({})", db, variant_type);
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(&db, flags).map_err(|x| Error::unavailable(&db, x))?;
        Self::probe(&connection).map_err(|x| Error::unavailable(&db, x))?;
        let case_objs = Self::read_cases(&connection, &db, variant_type).map_err(|x| Error::unavailable(&db, x))?;

        Ok(GeminiBackend { connection, db, variant_type, case_objs })
    }

    /// Replaces the derived cases with the given ones.
    pub fn with_cases(mut self, cases: Vec<Case>) -> Self {
        self.case_objs = cases;
        self
    }

    /// Returns the path of the database.
    pub fn db(&self) -> &str {
        &self.db
    }

    fn check_case(&self, case_id: &str) -> Result<()> {
        if self.case(case_id).is_none() {
            return Err(Error::CaseNotFound(case_id.to_string()));
        }
        Ok(())
    }

    // Checks that the GEMINI tables exist.
    fn probe(connection: &Connection) -> std::result::Result<(), String> {
        let tables: usize = connection.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('variants', 'samples')",
            (),
            |row| row.get(0)
        ).map_err(|x| x.to_string())?;
        if tables != 2 {
            return Err(String::from("Not a GEMINI database"));
        }
        Ok(())
    }

    // Parent identifiers that mean "unknown" in GEMINI sample tables.
    fn parent(value: Option<String>) -> Option<String> {
        value.filter(|x| !matches!(x.as_str(), "" | "0" | "-9" | "."))
    }

    fn code(value: Option<String>) -> i64 {
        value.and_then(|x| x.trim().parse::<i64>().ok()).unwrap_or(0)
    }

    // Groups the samples into cases by family, in sample order.
    fn read_cases(connection: &Connection, db: &str, variant_type: VariantType) -> rusqlite::Result<Vec<Case>> {
        let mut get_samples = connection.prepare(
            "SELECT sample_id, family_id, name, paternal_id, maternal_id, sex, phenotype
            FROM samples ORDER BY sample_id"
        )?;
        let mut result: Vec<Case> = Vec::new();
        let mut rows = get_samples.query(())?;
        while let Some(row) = rows.next()? {
            let sample_id: i64 = row.get(0)?;
            let name: String = row.get(2)?;
            let family: Option<String> = row.get(1)?;
            let family = family.filter(|x| !x.is_empty() && x != "0").unwrap_or_else(|| name.clone());

            let offset = match result.iter().position(|case| case.case_id == family) {
                Some(offset) => offset,
                None => {
                    result.push(Case::new(&family, &family, db, variant_type, VariantMode::Gemini));
                    result.len() - 1
                },
            };
            result[offset].individuals.push(Individual {
                ind_id: name,
                case_id: family,
                father: Self::parent(row.get(3)?),
                mother: Self::parent(row.get(4)?),
                sex: Sex::from_code(Self::code(row.get(5)?)),
                phenotype: Phenotype::from_code(Self::code(row.get(6)?)),
                index: sample_id.saturating_sub(1).max(0) as usize,
                variant_source: db.to_string(),
                bam_path: None,
            });
        }
        Ok(result)
    }

    fn row_to_variant(row: &Row) -> rusqlite::Result<Variant> {
        let variant_id: i64 = row.get(0)?;
        let start: i64 = row.get(2)?;
        let stop: i64 = row.get(3)?;
        let filter: Option<String> = row.get(7)?;
        let variant_class: Option<String> = row.get(8)?;
        let sub_type: Option<String> = row.get(9)?;
        let gene: Option<String> = row.get(10)?;
        let consequence: Option<String> = row.get(11)?;
        let start = (start + 1).max(0) as usize;
        let stop = stop.max(0) as usize;
        // Sub-types are also used for SNVs (e.g. transitions), so only keep them for structural variants.
        let sv_type = if variant_class.as_deref() == Some("sv") {
            Some(sub_type.unwrap_or_else(|| String::from("SV")))
        } else {
            None
        };
        Ok(Variant {
            variant_id: variant_id.to_string(),
            chrom: row.get(1)?,
            start,
            stop,
            reference: row.get(4)?,
            alternative: row.get(5)?,
            quality: row.get(6)?,
            // GEMINI stores passing variants with a NULL filter.
            filter: filter.unwrap_or_else(|| String::from("PASS")),
            genes: gene.into_iter().filter(|x| !x.is_empty()).collect(),
            consequences: consequence.into_iter().filter(|x| !x.is_empty()).collect(),
            frequency: row.get(12)?,
            cadd_score: row.get(13)?,
            sv_len: sv_type.as_ref().map(|_| stop.saturating_sub(start)),
            sv_type,
        })
    }

    // Selects variants of the backend's type.
    fn type_clause(&self) -> &'static str {
        match self.variant_type {
            VariantType::Snv => "type IN ('snp', 'indel')",
            VariantType::Sv => "type = 'sv'",
        }
    }

    // Builds the WHERE clause and its parameters for the filters.
    fn where_clause(&self, filters: &FilterSet) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = vec![String::from(self.type_clause())];
        let mut params: Vec<Value> = Vec::new();
        if !filters.genes.is_empty() {
            clauses.push(format!("gene IN ({})", placeholders(filters.genes.len())));
            params.extend(filters.genes.iter().cloned().map(Value::Text));
        }
        if let Some(max) = filters.max_frequency {
            clauses.push(String::from("(max_aaf_all IS NULL OR max_aaf_all <= ?)"));
            params.push(Value::Real(max));
        }
        if let Some(min) = filters.min_cadd {
            clauses.push(String::from("cadd_scaled >= ?"));
            params.push(Value::Real(min));
        }
        if !filters.consequences.is_empty() {
            clauses.push(format!("impact_so IN ({})", placeholders(filters.consequences.len())));
            params.extend(filters.consequences.iter().cloned().map(Value::Text));
        }

        (clauses.join(" AND "), params)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl VariantBackend for GeminiBackend {
    fn mode(&self) -> VariantMode {
        VariantMode::Gemini
    }

    fn variant_type(&self) -> VariantType {
        self.variant_type
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { gene: true, frequency: true, cadd: true, consequence: true, sv_len: false }
    }

    fn variants(&self, case_id: &str, skip: usize, count: usize, filters: &Filters) -> Result<Vec<Variant>> {
        let filter_set = FilterSet::parse(filters, self.capabilities())?;
        self.check_case(case_id)?;
        let (condition, mut params) = self.where_clause(&filter_set);
        let sql = format!(
            "SELECT {} FROM variants WHERE {} ORDER BY variant_id LIMIT ? OFFSET ?",
            Self::VARIANT_COLUMNS, condition
        );
        debug!("Querying variants {}..{} for case {}: {}", skip, skip.saturating_add(count), case_id, sql);
        params.push(Value::Integer(count.min(i64::MAX as usize) as i64));
        params.push(Value::Integer(skip.min(i64::MAX as usize) as i64));

        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map(params_from_iter(params.iter()), Self::row_to_variant)?;
        let result = rows.collect::<rusqlite::Result<Vec<Variant>>>()?;
        Ok(result)
    }

    fn variant(&self, case_id: &str, variant_id: &str) -> Result<Option<Variant>> {
        self.check_case(case_id)?;
        let Ok(id) = variant_id.parse::<i64>() else {
            debug!("Invalid GEMINI variant id {} for case {}", variant_id, case_id);
            return Ok(None);
        };
        let sql = format!(
            "SELECT {} FROM variants WHERE variant_id = ?1 AND {}",
            Self::VARIANT_COLUMNS, self.type_clause()
        );
        let mut statement = self.connection.prepare(&sql)?;
        let result = statement.query_row((id,), Self::row_to_variant).optional()?;
        Ok(result)
    }

    fn cases(&self) -> &[Case] {
        &self.case_objs
    }
}

//-----------------------------------------------------------------------------
