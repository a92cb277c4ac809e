//! Case metadata stored in a SQLite database.

use crate::error::{Error, Result};
use crate::models::{Case, Individual};
use crate::utils;

use std::fmt::{self, Display};
use std::path::PathBuf;

use log::{debug, info};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row, Statement};


//-----------------------------------------------------------------------------

/// Location of a case database, parsed from a URI or a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    /// Temporary in-memory database (`:memory:`).
    Memory,
    /// SQLite database in the given file.
    File(PathBuf),
    /// Networked database identified by a driver scheme such as `mysql` or `postgresql`.
    Network {
        scheme: String,
        uri: String,
    },
}

impl StoreLocation {
    // Scheme for SQLite URIs.
    const SQLITE_SCHEME: &'static str = "sqlite";

    // Location of an in-memory database.
    const MEMORY: &'static str = ":memory:";

    /// Parses a database location.
    ///
    /// * `:memory:` is an in-memory database.
    /// * `sqlite:///path` and `sqlite://path` are SQLite files.
    /// * Other strings of the form `scheme://...` are networked databases.
    /// * Anything else is a file path, which is expanded with [`utils::absolute_path`].
    pub fn parse(uri: &str) -> Self {
        if uri == Self::MEMORY {
            return StoreLocation::Memory;
        }
        match uri.split_once("://") {
            Some((scheme, rest)) if scheme.starts_with(Self::SQLITE_SCHEME) => {
                // `sqlite:///path` has an absolute path after the third slash.
                if rest.is_empty() || rest == Self::MEMORY {
                    StoreLocation::Memory
                } else {
                    StoreLocation::File(utils::absolute_path(rest))
                }
            },
            Some((scheme, _)) => StoreLocation::Network {
                scheme: scheme.to_string(),
                uri: uri.to_string(),
            },
            None => StoreLocation::File(utils::absolute_path(uri)),
        }
    }
}

impl Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreLocation::Memory => write!(f, "{}://", Self::SQLITE_SCHEME),
            StoreLocation::File(path) => write!(f, "{}:///{}", Self::SQLITE_SCHEME, path.display().to_string().trim_start_matches('/')),
            StoreLocation::Network { uri, .. } => write!(f, "{}", uri),
        }
    }
}

//-----------------------------------------------------------------------------

/// A connection to a database storing cases and individuals.
///
/// The store owns its connection.
/// In multi-threaded applications, each thread should connect separately.
/// Every operation that modifies the database runs in a single transaction.
///
/// Lookups return [`None`] for missing cases and individuals.
///
/// # Examples
///
/// ```
/// use variant_base::{CaseStore, VariantMode, VariantType};
/// use variant_base::{Case, Individual, Phenotype, Sex};
///
/// let mut store = CaseStore::connect(":memory:").unwrap();
/// store.set_up(false).unwrap();
///
/// let mut case = Case::new("fam1", "Family 1", "/data/fam1.vcf", VariantType::Snv, VariantMode::Vcf);
/// case.individuals.push(Individual {
///     ind_id: String::from("fam1-1"),
///     case_id: String::from("fam1"),
///     mother: None,
///     father: None,
///     sex: Sex::Male,
///     phenotype: Phenotype::Affected,
///     index: 0,
///     variant_source: String::from("/data/fam1.vcf"),
///     bam_path: None,
/// });
/// let stored = store.add_case(&case).unwrap();
/// assert_eq!(stored, case);
///
/// let deleted = store.delete_case(stored).unwrap();
/// assert_eq!(deleted.case_id, "fam1");
/// assert!(store.case("fam1").unwrap().is_none());
/// assert!(store.individual("fam1-1").unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct CaseStore {
    connection: Connection,
    location: StoreLocation,
}

/// Connecting and schema management.
impl CaseStore {
    /// SQL dialect of the supported driver.
    pub const DIALECT: &'static str = "sqlite";

    /// Connects to the database at the given location.
    ///
    /// The tables are not created; see [`CaseStore::set_up`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedStore`] for networked databases, as only SQLite is supported.
    /// Passes through any database errors.
    pub fn connect(uri: &str) -> Result<Self> {
        let location = StoreLocation::parse(uri);
        debug!("Connecting to {}", location);
        let connection = match &location {
            StoreLocation::Memory => Connection::open_in_memory()?,
            StoreLocation::File(path) => Connection::open(path)?,
            StoreLocation::Network { scheme, .. } => return Err(Error::UnsupportedStore(scheme.clone())),
        };
        connection.execute_batch("PRAGMA foreign_keys = ON")?;
        debug!("Connection established");
        Ok(CaseStore { connection, location })
    }

    /// Returns the location of the database.
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Returns the SQL dialect used by the connection.
    pub fn dialect(&self) -> &'static str {
        Self::DIALECT
    }

    /// Returns the filename of the database, or [`None`] for in-memory databases.
    pub fn filename(&self) -> Option<&str> {
        self.connection.path().filter(|x| !x.is_empty())
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        let filename = self.filename()?;
        utils::file_size(filename)
    }

    /// Creates the tables if they do not exist.
    ///
    /// If `reset` is `true`, drops the existing tables first.
    pub fn set_up(&mut self, reset: bool) -> Result<&mut Self> {
        if reset {
            self.tear_down()?;
        }

        let transaction = self.connection.transaction()?;
        transaction.execute(
            "CREATE TABLE IF NOT EXISTS Cases (
                case_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                variant_source TEXT NOT NULL,
                variant_type TEXT NOT NULL,
                variant_mode TEXT NOT NULL,
                pedigree TEXT
            ) STRICT",
            (),
        )?;
        transaction.execute(
            "CREATE TABLE IF NOT EXISTS Individuals (
                case_id TEXT NOT NULL REFERENCES Cases(case_id),
                ind_id TEXT NOT NULL,
                mother TEXT,
                father TEXT,
                sex INTEGER NOT NULL,
                phenotype INTEGER NOT NULL,
                ind_index INTEGER NOT NULL,
                variant_source TEXT NOT NULL,
                bam_path TEXT,
                PRIMARY KEY (case_id, ind_id)
            ) STRICT",
            (),
        )?;
        transaction.commit()?;

        Ok(self)
    }

    /// Drops all tables.
    pub fn tear_down(&mut self) -> Result<&mut Self> {
        info!("Resetting database {}", self.location);
        let transaction = self.connection.transaction()?;
        transaction.execute("DROP TABLE IF EXISTS Individuals", ())?;
        transaction.execute("DROP TABLE IF EXISTS Cases", ())?;
        transaction.commit()?;
        Ok(self)
    }

    /// Returns `true` if the tables exist.
    pub fn is_set_up(&self) -> Result<bool> {
        let tables: usize = self.connection.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('Cases', 'Individuals')",
            (),
            |row| row.get(0)
        )?;
        Ok(tables == 2)
    }
}

//-----------------------------------------------------------------------------

/// Adding and deleting cases.
impl CaseStore {
    /// Stores the case with its individuals and returns the stored case.
    ///
    /// # Errors
    ///
    /// Passes through database errors, such as a constraint violation if the case already exists.
    /// Nothing is stored in that case.
    pub fn add_case(&mut self, case: &Case) -> Result<Case> {
        let transaction = self.connection.transaction()?;
        {
            transaction.execute(
                "INSERT INTO Cases(case_id, name, variant_source, variant_type, variant_mode, pedigree)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (&case.case_id, &case.name, &case.variant_source, case.variant_type, &case.variant_mode, &case.pedigree),
            )?;
            let mut insert = transaction.prepare(
                "INSERT INTO
                    Individuals(case_id, ind_id, mother, father, sex, phenotype, ind_index, variant_source, bam_path)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            )?;
            for ind in case.individuals.iter() {
                insert.execute((
                    &case.case_id, &ind.ind_id,
                    &ind.mother, &ind.father,
                    ind.sex, ind.phenotype, ind.index,
                    &ind.variant_source, &ind.bam_path,
                ))?;
            }
        }
        transaction.commit()?;
        info!("Added case {} with {} individuals", case.case_id, case.individuals.len());

        self.case(&case.case_id)?.ok_or_else(|| Error::CaseNotFound(case.case_id.clone()))
    }

    /// Deletes the case and all of its individuals and returns the deleted case.
    ///
    /// The individuals are deleted first, and both deletions happen in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaseNotFound`] if the case is not in the database.
    /// Passes through any database errors.
    /// Nothing is deleted if there is an error.
    pub fn delete_case(&mut self, case: Case) -> Result<Case> {
        let transaction = self.connection.transaction()?;
        let individuals = transaction.execute(
            "DELETE FROM Individuals WHERE case_id = ?1",
            (&case.case_id,),
        )?;
        let cases = transaction.execute(
            "DELETE FROM Cases WHERE case_id = ?1",
            (&case.case_id,),
        )?;
        if cases == 0 {
            // Dropping the transaction rolls back the deleted individuals.
            return Err(Error::CaseNotFound(case.case_id));
        }
        transaction.commit()?;

        for ind in case.individuals.iter() {
            debug!("Deleted individual {} from case {}", ind.ind_id, case.case_id);
        }
        info!("Deleted case {} with {} individuals", case.case_id, individuals);
        Ok(case)
    }

    /// Deletes the individual and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndividualNotFound`] if the individual is not in the database.
    /// Passes through any database errors.
    pub fn delete_individual(&mut self, ind: Individual) -> Result<Individual> {
        let transaction = self.connection.transaction()?;
        let deleted = transaction.execute(
            "DELETE FROM Individuals WHERE case_id = ?1 AND ind_id = ?2",
            (&ind.case_id, &ind.ind_id),
        )?;
        if deleted == 0 {
            return Err(Error::IndividualNotFound(ind.ind_id));
        }
        transaction.commit()?;
        info!("Deleted individual {} from case {}", ind.ind_id, ind.case_id);
        Ok(ind)
    }
}

//-----------------------------------------------------------------------------

/// Queries.
impl CaseStore {
    // Columns of table `Cases` in the order expected by `row_to_case`.
    const CASE_COLUMNS: &'static str = "case_id, name, variant_source, variant_type, variant_mode, pedigree";

    // Columns of table `Individuals` in the order expected by `row_to_individual`.
    const INDIVIDUAL_COLUMNS: &'static str =
        "case_id, ind_id, mother, father, sex, phenotype, ind_index, variant_source, bam_path";

    fn row_to_case(row: &Row) -> rusqlite::Result<Case> {
        Ok(Case {
            case_id: row.get(0)?,
            name: row.get(1)?,
            variant_source: row.get(2)?,
            variant_type: row.get(3)?,
            variant_mode: row.get(4)?,
            pedigree: row.get(5)?,
            individuals: Vec::new(),
        })
    }

    fn row_to_individual(row: &Row) -> rusqlite::Result<Individual> {
        Ok(Individual {
            case_id: row.get(0)?,
            ind_id: row.get(1)?,
            mother: row.get(2)?,
            father: row.get(3)?,
            sex: row.get(4)?,
            phenotype: row.get(5)?,
            index: row.get(6)?,
            variant_source: row.get(7)?,
            bam_path: row.get(8)?,
        })
    }

    fn individuals_for_case(connection: &Connection) -> rusqlite::Result<Statement<'_>> {
        connection.prepare(&format!(
            "SELECT {} FROM Individuals WHERE case_id = ?1 ORDER BY rowid",
            Self::INDIVIDUAL_COLUMNS
        ))
    }

    fn load_individuals(statement: &mut Statement, case: &mut Case) -> rusqlite::Result<()> {
        let rows = statement.query_map((&case.case_id,), Self::row_to_individual)?;
        case.individuals = rows.collect::<rusqlite::Result<Vec<Individual>>>()?;
        Ok(())
    }

    /// Returns the case with the given identifier, or [`None`] if there is no such case.
    ///
    /// The individuals are in the order they were added.
    /// The case and its individuals are read in the same transaction.
    pub fn case(&self, case_id: &str) -> Result<Option<Case>> {
        let transaction = self.connection.unchecked_transaction()?;
        let result = {
            let mut get_case = transaction.prepare(&format!(
                "SELECT {} FROM Cases WHERE case_id = ?1",
                Self::CASE_COLUMNS
            ))?;
            let case = get_case.query_row((case_id,), Self::row_to_case).optional()?;
            match case {
                Some(mut case) => {
                    let mut get_individuals = Self::individuals_for_case(&transaction)?;
                    Self::load_individuals(&mut get_individuals, &mut case)?;
                    Some(case)
                },
                None => None,
            }
        };
        transaction.commit()?;
        if result.is_none() {
            debug!("Case {} not found", case_id);
        }
        Ok(result)
    }

    /// Returns all cases in the order they were added.
    ///
    /// All cases and individuals are read in the same transaction.
    pub fn cases(&self) -> Result<Vec<Case>> {
        let transaction = self.connection.unchecked_transaction()?;
        let result = {
            let mut get_cases = transaction.prepare(&format!(
                "SELECT {} FROM Cases ORDER BY rowid",
                Self::CASE_COLUMNS
            ))?;
            let rows = get_cases.query_map((), Self::row_to_case)?;
            let mut result = rows.collect::<rusqlite::Result<Vec<Case>>>()?;
            let mut get_individuals = Self::individuals_for_case(&transaction)?;
            for case in result.iter_mut() {
                Self::load_individuals(&mut get_individuals, case)?;
            }
            result
        };
        transaction.commit()?;
        Ok(result)
    }

    /// Returns the first individual with the given identifier, or [`None`] if there is no such individual.
    ///
    /// Identifiers are only unique within a case.
    pub fn individual(&self, ind_id: &str) -> Result<Option<Individual>> {
        let mut get_individual = self.connection.prepare(&format!(
            "SELECT {} FROM Individuals WHERE ind_id = ?1 ORDER BY rowid LIMIT 1",
            Self::INDIVIDUAL_COLUMNS
        ))?;
        let result = get_individual.query_row((ind_id,), Self::row_to_individual).optional()?;
        if result.is_none() {
            debug!("Individual {} not found", ind_id);
        }
        Ok(result)
    }

    /// Returns the individuals with the given identifiers, or all individuals if no identifiers are given.
    ///
    /// The individuals are in the order they were added.
    pub fn individuals(&self, ind_ids: Option<&[&str]>) -> Result<Vec<Individual>> {
        let ind_ids = ind_ids.unwrap_or_default();
        let sql = if ind_ids.is_empty() {
            format!("SELECT {} FROM Individuals ORDER BY rowid", Self::INDIVIDUAL_COLUMNS)
        } else {
            let placeholders = vec!["?"; ind_ids.len()].join(", ");
            format!(
                "SELECT {} FROM Individuals WHERE ind_id IN ({}) ORDER BY rowid",
                Self::INDIVIDUAL_COLUMNS, placeholders
            )
        };
        let mut get_individuals = self.connection.prepare(&sql)?;
        let rows = get_individuals.query_map(params_from_iter(ind_ids.iter()), Self::row_to_individual)?;
        let result = rows.collect::<rusqlite::Result<Vec<Individual>>>()?;
        Ok(result)
    }
}

//-----------------------------------------------------------------------------
