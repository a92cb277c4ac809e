use crate::{CaseData, CaseStore, IndividualData, Phenotype, Sex, VariantStore};

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

//-----------------------------------------------------------------------------

// VCF test data.

// Five SNVs/indels and one structural variant with VEP annotations for two samples.
pub(crate) const SNV_VCF: &str = "\
##fileformat=VCFv4.2
##INFO=<ID=CSQ,Number=.,Type=String,Description=\"Consequence annotations from Ensembl VEP. Format: Allele|Consequence|IMPACT|SYMBOL\">
##INFO=<ID=1000GAF,Number=1,Type=Float,Description=\"1000 Genomes allele frequency\">
##INFO=<ID=CADD,Number=1,Type=Float,Description=\"Scaled CADD score\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tfam1-1\tfam1-2
1\t880086\t.\tT\tC\t50\tPASS\t1000GAF=0.01;CADD=22.5;CSQ=C|missense_variant|MODERATE|SAMD11\tGT\t0/1\t0/0
1\t881627\t.\tG\tA\t40\tPASS\t1000GAF=0.3;CADD=5.1;CSQ=A|synonymous_variant|LOW|NOC2L\tGT\t0/1\t0/1
1\t5000000\t.\tN\t<DEL>\t.\tPASS\tSVTYPE=DEL;END=5001000;SVLEN=-1000;CSQ=<DEL>|feature_truncation|HIGH|AJAP1\tGT\t0/1\t0/0
2\t100\t.\tA\tG\t30\tPASS\tCADD=15.0;CSQ=G|missense_variant|MODERATE|TP53\tGT\t1/1\t0/1
2\t200\t.\tC\tT\t20\tLowQual\t1000GAF=0.001;CSQ=T|stop_gained|HIGH|TP53\tGT\t0/1\t0/0
X\t300\t.\tG\tGA\t60\tPASS\t1000GAF=0.05;CADD=30.0;CSQ=GA|frameshift_variant|HIGH|BRCA2\tGT\t0/1\t0/0
";

// Identifiers of the SNVs and indels in `SNV_VCF`, in file order.
pub(crate) const SNV_IDS: [&str; 5] = ["1_880086_T_C", "1_881627_G_A", "2_100_A_G", "2_200_C_T", "X_300_G_GA"];

// Identifier of the structural variant in `SNV_VCF`.
pub(crate) const SV_ID: &str = "1_5000000_N_<DEL>";

pub(crate) fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let filename = dir.join(name);
    let result = fs::write(&filename, content);
    assert!(result.is_ok(), "Failed to write {}: {}", filename.display(), result.unwrap_err());
    filename
}

// Writes a VCF file with the given number of unannotated SNVs for sample `s1`.
pub(crate) fn write_numbered_vcf(dir: &Path, name: &str, variants: usize) -> PathBuf {
    let mut content = String::from("##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\ts1\n");
    for i in 0..variants {
        content.push_str(&format!("1\t{}\t.\tA\tG\t30\tPASS\t.\tGT\t0/1\n", 1000 + i));
    }
    write_file(dir, name, &content)
}

//-----------------------------------------------------------------------------

// GEMINI test data.

// Creates a GEMINI-like database with the same variants as `SNV_VCF` and two families.
pub(crate) fn create_gemini_db(dir: &Path, name: &str) -> PathBuf {
    let filename = dir.join(name);
    let connection = Connection::open(&filename);
    assert!(connection.is_ok(), "Failed to create GEMINI database: {}", connection.unwrap_err());
    let connection = connection.unwrap();
    let result = connection.execute_batch(
        "CREATE TABLE variants (
            variant_id INTEGER PRIMARY KEY,
            chrom TEXT, start INTEGER, end INTEGER, ref TEXT, alt TEXT, qual REAL, filter TEXT,
            type TEXT, sub_type TEXT, gene TEXT, impact_so TEXT, max_aaf_all REAL, cadd_scaled REAL
        );
        CREATE TABLE samples (
            sample_id INTEGER PRIMARY KEY,
            family_id TEXT, name TEXT, paternal_id TEXT, maternal_id TEXT, sex TEXT, phenotype TEXT
        );
        INSERT INTO variants VALUES
            (1, 'chr1', 880085, 880086, 'T', 'C', 50.0, NULL, 'snp', 'ts', 'SAMD11', 'missense_variant', 0.01, 22.5),
            (2, 'chr1', 881626, 881627, 'G', 'A', 40.0, NULL, 'snp', 'ts', 'NOC2L', 'synonymous_variant', 0.3, 5.1),
            (3, 'chr1', 4999999, 5001000, 'N', '<DEL>', NULL, NULL, 'sv', 'DEL', 'AJAP1', 'feature_truncation', NULL, NULL),
            (4, 'chr2', 99, 100, 'A', 'G', 30.0, NULL, 'snp', 'ts', 'TP53', 'missense_variant', NULL, 15.0),
            (5, 'chr2', 199, 200, 'C', 'T', 20.0, 'LowQual', 'snp', 'ts', 'TP53', 'stop_gained', 0.001, NULL),
            (6, 'chrX', 299, 300, 'G', 'GA', 60.0, NULL, 'indel', 'ins', 'BRCA2', 'frameshift_variant', 0.05, 30.0);
        INSERT INTO samples VALUES
            (1, 'fam1', 'fam1-1', '0', '0', '1', '2'),
            (2, 'fam1', 'fam1-2', '0', '0', '2', '1'),
            (3, 'fam2', 'fam2-1', 'dad', 'mom', '1', '2');"
    );
    assert!(result.is_ok(), "Failed to populate GEMINI database: {}", result.unwrap_err());
    filename
}

//-----------------------------------------------------------------------------

// Store utilities.

pub(crate) fn open_store() -> CaseStore {
    let store = CaseStore::connect(":memory:");
    assert!(store.is_ok(), "Failed to connect to the store: {}", store.unwrap_err());
    let mut store = store.unwrap();
    let result = store.set_up(false);
    assert!(result.is_ok(), "Failed to set up the store: {}", result.unwrap_err());
    store
}

pub(crate) fn open_variant_store() -> VariantStore {
    VariantStore::new(open_store())
}

// The two-person family from the examples, with the given variant source.
pub(crate) fn fam1(variant_source: &str) -> CaseData {
    CaseData {
        case_id: String::from("fam1"),
        name: String::from("Family 1"),
        variant_source: variant_source.to_string(),
        individuals: vec![
            IndividualData {
                ind_id: String::from("fam1-1"),
                mother: None,
                father: None,
                sex: Sex::Male,
                phenotype: Phenotype::Affected,
                index: 0,
                variant_source: variant_source.to_string(),
                bam_path: Some(String::from("/data/fam1-1.bam")),
            },
            IndividualData {
                ind_id: String::from("fam1-2"),
                mother: None,
                father: None,
                sex: Sex::Female,
                phenotype: Phenotype::Unaffected,
                index: 1,
                variant_source: variant_source.to_string(),
                bam_path: None,
            },
        ],
    }
}

//-----------------------------------------------------------------------------
