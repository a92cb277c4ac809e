//! Variant backend reading VCF files.

use crate::backend::{Capabilities, FilterSet, Filters, Variant, VariantBackend};
use crate::error::{Error, Result};
use crate::formats::{self, VcfHeader};
use crate::models::{Case, Individual, Phenotype, Sex, VariantMode, VariantType};
use crate::utils;

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::debug;


//-----------------------------------------------------------------------------

/// A backend reading variants from VCF files.
///
/// The root path is either a VCF file or a directory of VCF files, which may be gzip-compressed.
/// Each file is a case named after the file, and the samples in the file are its individuals.
/// The files are read again for every query.
///
/// # Examples
///
/// ```
/// use variant_base::{VariantBackend, VariantType, VcfBackend};
/// use std::fs;
///
/// let dir = tempfile::tempdir().unwrap();
/// let vcf_file = dir.path().join("fam1.vcf");
/// fs::write(&vcf_file, "##fileformat=VCFv4.2\n\
///     #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tfam1-1\n\
///     1\t100\t.\tA\tG\t30\tPASS\t.\tGT\t0/1\n").unwrap();
///
/// let backend = VcfBackend::new(&vcf_file, VariantType::Snv).unwrap();
/// assert_eq!(backend.cases().len(), 1);
/// assert_eq!(backend.cases()[0].case_id, "fam1");
/// assert!(backend.individual("fam1-1").is_some());
///
/// let variants = backend.variants("fam1", 0, 30, &Default::default()).unwrap();
/// assert_eq!(variants.len(), 1);
/// assert_eq!(variants[0].variant_id, "1_100_A_G");
/// ```
#[derive(Clone, Debug)]
pub struct VcfBackend {
    root_path: PathBuf,
    variant_type: VariantType,
    case_objs: Vec<Case>,
}

impl VcfBackend {
    /// Creates a backend for the given file or directory and derives the cases from it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendUnavailable`] if the path cannot be accessed or if a VCF header cannot be read.
    pub fn new<P: AsRef<Path>>(root_path: P, variant_type: VariantType) -> Result<Self> {
        let root_path = root_path.as_ref().to_path_buf();
        debug!("Creating VCF backend for {} ({})", root_path.display(), variant_type);
        let metadata = fs::metadata(&root_path).map_err(|x| Error::unavailable(root_path.display(), x))?;

        let vcf_files = if metadata.is_dir() {
            Self::vcf_files(&root_path).map_err(|x| Error::unavailable(root_path.display(), x))?
        } else {
            vec![root_path.clone()]
        };
        let mut case_objs = Vec::with_capacity(vcf_files.len());
        for filename in vcf_files.iter() {
            let case = Self::case_from_file(filename, variant_type)
                .map_err(|x| Error::unavailable(filename.display(), x))?;
            case_objs.push(case);
        }

        Ok(VcfBackend { root_path, variant_type, case_objs })
    }

    /// Replaces the derived cases with the given ones.
    pub fn with_cases(mut self, cases: Vec<Case>) -> Self {
        self.case_objs = cases;
        self
    }

    /// Returns the file or directory the backend was created from.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    // Lists VCF files in the directory in lexicographic order.
    fn vcf_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && utils::is_vcf_name(&path) {
                result.push(path);
            }
        }
        result.sort();
        Ok(result)
    }

    // Derives a case from the header of the file.
    fn case_from_file(filename: &Path, variant_type: VariantType) -> Result<Case> {
        let mut reader = utils::open_file(filename)?;
        let (header, _) = VcfHeader::read(&mut reader)?;

        let source = filename.display().to_string();
        let case_id = utils::vcf_stem(filename).unwrap_or_else(|| source.clone());
        let mut case = Case::new(&case_id, &case_id, &source, variant_type, VariantMode::Vcf);
        case.individuals = header.samples.iter().enumerate().map(|(index, sample)| Individual {
            ind_id: sample.clone(),
            case_id: case_id.clone(),
            mother: None,
            father: None,
            sex: Sex::Unknown,
            phenotype: Phenotype::Unknown,
            index,
            variant_source: source.clone(),
            bam_path: None,
        }).collect();
        Ok(case)
    }

    // Calls `visit` on each record of the right type in the file until it returns `false`.
    fn scan<F: FnMut(Variant) -> bool>(&self, filename: &str, mut visit: F) -> Result<()> {
        let mut reader = utils::open_file(filename)?;
        let (header, mut line_num) = VcfHeader::read(&mut reader)?;

        let mut buf = String::new();
        loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                break;
            }
            line_num += 1;
            let line = buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            let variant = formats::parse_vcf_record(line, &header)
                .map_err(|message| Error::Format { line: line_num, message })?;
            if !variant.has_type(self.variant_type) {
                continue;
            }
            if !visit(variant) {
                break;
            }
        }

        Ok(())
    }

    fn variant_source(&self, case_id: &str) -> Result<&str> {
        match self.case(case_id) {
            Some(case) => Ok(&case.variant_source),
            None => Err(Error::CaseNotFound(case_id.to_string())),
        }
    }
}

impl VariantBackend for VcfBackend {
    fn mode(&self) -> VariantMode {
        VariantMode::Vcf
    }

    fn variant_type(&self) -> VariantType {
        self.variant_type
    }

    fn capabilities(&self) -> Capabilities {
        match self.variant_type {
            VariantType::Snv => Capabilities { gene: true, frequency: true, cadd: true, consequence: true, sv_len: false },
            VariantType::Sv => Capabilities { gene: true, consequence: true, sv_len: true, ..Default::default() },
        }
    }

    fn variants(&self, case_id: &str, skip: usize, count: usize, filters: &Filters) -> Result<Vec<Variant>> {
        let filter_set = FilterSet::parse(filters, self.capabilities())?;
        let source = self.variant_source(case_id)?;
        debug!("Reading variants {}..{} for case {} from {}", skip, skip.saturating_add(count), case_id, source);

        let mut result = Vec::new();
        if count == 0 {
            return Ok(result);
        }
        let mut skipped = 0;
        self.scan(source, |variant| {
            if !filter_set.matches(&variant) {
                return true;
            }
            if skipped < skip {
                skipped += 1;
                return true;
            }
            result.push(variant);
            result.len() < count
        })?;

        Ok(result)
    }

    fn variant(&self, case_id: &str, variant_id: &str) -> Result<Option<Variant>> {
        let source = self.variant_source(case_id)?;
        let mut result = None;
        self.scan(source, |variant| {
            if variant.variant_id == variant_id {
                result = Some(variant);
                return false;
            }
            true
        })?;
        if result.is_none() {
            debug!("Variant {} not found for case {}", variant_id, case_id);
        }
        Ok(result)
    }

    fn cases(&self) -> &[Case] {
        &self.case_objs
    }
}

//-----------------------------------------------------------------------------
