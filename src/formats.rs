//! Support for reading the text formats used as variant and pedigree sources.
//!
//! ### VCF (reading)
//!
//! The VCF format is a tab-separated text format for sequence variants.
//! See [VCFv4.3](https://samtools.github.io/hts-specs/VCFv4.3.pdf) for the format.
//! Only the fields needed by [`crate::VcfBackend`] are interpreted:
//!
//! * [`VcfHeader::read`]: Read the meta-information lines and the `#CHROM` line.
//! * [`parse_vcf_record`]: Convert a data line into a [`Variant`].
//!
//! Annotations are taken from INFO fields.
//! Gene symbols and consequences come from the VEP `CSQ` field, with the subfield layout taken from the header.
//! Population frequency comes from `1000GAF`, CADD scores from `CADD`, and structural variant information from `SVTYPE`, `SVLEN`, and `END`.
//!
//! ### PED (reading)
//!
//! The PED format has six whitespace-separated columns: family, individual, father, mother, sex, and phenotype.
//! [`read_ped`] builds one [`CaseData`] for each family.

use crate::backend::Variant;
use crate::error::{Error, Result};
use crate::models::{CaseData, IndividualData, Phenotype, Sex};

use std::io::BufRead;

use log::warn;


//-----------------------------------------------------------------------------

/// Information from the header of a VCF file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VcfHeader {
    /// Sample names from the `#CHROM` line, in column order.
    pub samples: Vec<String>,

    /// Subfield names of the VEP `CSQ` annotation, or an empty vector if the field is not declared.
    pub csq_fields: Vec<String>,
}

impl VcfHeader {
    // Prefix of the INFO declaration for VEP annotations.
    const CSQ_DECLARATION: &'static str = "##INFO=<ID=CSQ,";

    // The subfield layout follows this marker in the description.
    const CSQ_FORMAT_MARKER: &'static str = "Format: ";

    /// Number of mandatory columns before the optional FORMAT column.
    pub const MANDATORY_COLUMNS: usize = 8;

    /// Reads the header from the reader, leaving it at the first data line.
    ///
    /// Returns the header and the number of lines consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader ends before the `#CHROM` line or if a data line appears before it.
    /// Passes through any I/O errors.
    pub fn read<R: BufRead>(reader: &mut R) -> Result<(Self, usize)> {
        let mut header = VcfHeader::default();
        let mut line_num = 0;
        let mut buf = String::new();
        loop {
            buf.clear();
            let len = reader.read_line(&mut buf)?;
            if len == 0 {
                return Err(Error::Format { line: line_num, message: String::from("Missing #CHROM header line") });
            }
            line_num += 1;
            let line = buf.trim_end_matches(['\n', '\r']);
            if line.starts_with(Self::CSQ_DECLARATION) {
                header.csq_fields = Self::parse_csq_format(line);
            } else if line.starts_with("#CHROM") {
                header.samples = line.split('\t').skip(Self::MANDATORY_COLUMNS + 1).map(String::from).collect();
                return Ok((header, line_num));
            } else if !line.starts_with("##") {
                return Err(Error::Format { line: line_num, message: String::from("Expected a header line") });
            }
        }
    }

    fn parse_csq_format(line: &str) -> Vec<String> {
        let Some(start) = line.find(Self::CSQ_FORMAT_MARKER) else {
            return Vec::new();
        };
        let format = &line[start + Self::CSQ_FORMAT_MARKER.len()..];
        let end = format.find('"').unwrap_or(format.len());
        format[..end].split('|').map(|x| x.trim().to_string()).collect()
    }

    // Index of the named CSQ subfield.
    fn csq_index(&self, name: &str) -> Option<usize> {
        self.csq_fields.iter().position(|x| x == name)
    }
}

//-----------------------------------------------------------------------------

// Appends the value to the vector unless it is empty or already present.
fn push_unique(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|x| x == value) {
        values.push(value.to_string());
    }
}

fn parse_float(field: &str, value: &str) -> std::result::Result<Option<f64>, String> {
    if value == "." {
        return Ok(None);
    }
    value.parse::<f64>().map(Some).map_err(|_| format!("Invalid {} value: {}", field, value))
}

fn parse_usize(field: &str, value: &str) -> std::result::Result<usize, String> {
    value.parse::<usize>().map_err(|_| format!("Invalid {} value: {}", field, value))
}

/// Parses a VCF data line into a [`Variant`].
///
/// The variant identifier is `chrom_pos_ref_alt`.
/// A record is a structural variant if it has an `SVTYPE` INFO field or a symbolic ALT allele such as `<DEL>`.
/// Returns an error message if a mandatory column is missing or malformed.
pub fn parse_vcf_record(line: &str, header: &VcfHeader) -> std::result::Result<Variant, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < VcfHeader::MANDATORY_COLUMNS {
        return Err(format!("Expected at least {} columns, found {}", VcfHeader::MANDATORY_COLUMNS, fields.len()));
    }

    let chrom = fields[0].to_string();
    let start = parse_usize("POS", fields[1])?;
    let reference = fields[3].to_string();
    let alternative = fields[4].to_string();
    let quality = parse_float("QUAL", fields[5])?;
    let filter = fields[6].to_string();

    let mut variant = Variant {
        variant_id: format!("{}_{}_{}_{}", chrom, start, reference, alternative),
        chrom,
        start,
        stop: start + reference.len().saturating_sub(1),
        reference,
        alternative,
        quality,
        filter,
        genes: Vec::new(),
        consequences: Vec::new(),
        frequency: None,
        cadd_score: None,
        sv_type: None,
        sv_len: None,
    };

    let mut sv_len: Option<usize> = None;
    for entry in fields[7].split(';') {
        let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
        match key {
            "SVTYPE" => variant.sv_type = Some(value.to_string()),
            "END" => variant.stop = parse_usize("END", value)?,
            "SVLEN" => {
                // Multiple alleles have one length each; the first one is used.
                let first = value.split(',').next().unwrap_or(value);
                let len = first.parse::<i64>().map_err(|_| format!("Invalid SVLEN value: {}", value))?;
                sv_len = Some(len.unsigned_abs() as usize);
            },
            "1000GAF" => variant.frequency = parse_float(key, value)?,
            "CADD" => variant.cadd_score = parse_float(key, value)?,
            "CSQ" => parse_csq(value, header, &mut variant),
            _ => {},
        }
    }

    if variant.sv_type.is_none() && variant.alternative.starts_with('<') {
        let symbolic = variant.alternative.trim_start_matches('<');
        let symbolic = symbolic.split(['>', ':']).next().unwrap_or(symbolic);
        variant.sv_type = Some(symbolic.to_string());
    }
    if variant.is_sv() {
        variant.sv_len = sv_len.or(Some(variant.stop.saturating_sub(variant.start)));
    }

    Ok(variant)
}

fn parse_csq(value: &str, header: &VcfHeader, variant: &mut Variant) {
    let symbol = header.csq_index("SYMBOL");
    let consequence = header.csq_index("Consequence");
    for annotation in value.split(',') {
        let subfields: Vec<&str> = annotation.split('|').collect();
        if let Some(gene) = symbol.and_then(|i| subfields.get(i)) {
            push_unique(&mut variant.genes, gene);
        }
        if let Some(terms) = consequence.and_then(|i| subfields.get(i)) {
            for term in terms.split('&') {
                push_unique(&mut variant.consequences, term);
            }
        }
    }
}

//-----------------------------------------------------------------------------

// Parent identifiers that mean "unknown" in PED files.
fn parse_parent(value: &str) -> Option<String> {
    match value {
        "0" | "." | "-9" | "" => None,
        _ => Some(value.to_string()),
    }
}

// Unrecognized codes are treated as unknown (0).
fn parse_code(value: &str, field: &str, line: usize) -> i64 {
    match value.parse::<i64>() {
        Ok(code) => code,
        Err(_) => {
            warn!("PED line {}: invalid {} code {}, using unknown", line, field, value);
            0
        },
    }
}

/// Reads a PED file and returns one case for each family, in the order the families first appear.
///
/// Individuals keep their file order, and their index is the position within the family.
/// All cases and individuals get `variant_source` as their variant source.
/// Empty lines and lines starting with `#` are skipped.
///
/// # Errors
///
/// Returns an error if a line has fewer than six columns or if an individual appears twice in the same family.
/// Passes through any I/O errors.
pub fn read_ped<R: BufRead>(reader: R, variant_source: &str) -> Result<Vec<CaseData>> {
    let mut result: Vec<CaseData> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(Error::Format { line: i + 1, message: format!("Expected 6 PED columns, found {}", fields.len()) });
        }

        let offset = match result.iter().position(|case| case.case_id == fields[0]) {
            Some(offset) => offset,
            None => {
                result.push(CaseData {
                    case_id: fields[0].to_string(),
                    name: fields[0].to_string(),
                    variant_source: variant_source.to_string(),
                    individuals: Vec::new(),
                });
                result.len() - 1
            },
        };
        let family = &mut result[offset];
        if family.individuals.iter().any(|ind| ind.ind_id == fields[1]) {
            return Err(Error::Format { line: i + 1, message: format!("Duplicate individual {} in family {}", fields[1], fields[0]) });
        }

        let index = family.individuals.len();
        family.individuals.push(IndividualData {
            ind_id: fields[1].to_string(),
            father: parse_parent(fields[2]),
            mother: parse_parent(fields[3]),
            sex: Sex::from_code(parse_code(fields[4], "sex", i + 1)),
            phenotype: Phenotype::from_code(parse_code(fields[5], "phenotype", i + 1)),
            index,
            variant_source: variant_source.to_string(),
            bam_path: None,
        });
    }
    Ok(result)
}

//-----------------------------------------------------------------------------
