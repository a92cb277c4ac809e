use super::*;

use crate::internal;

//-----------------------------------------------------------------------------

fn create_backend(db: &Path, variant_type: VariantType) -> GeminiBackend {
    let backend = GeminiBackend::new(db, variant_type);
    assert!(backend.is_ok(), "Failed to open GEMINI database {}: {}", db.display(), backend.unwrap_err());
    backend.unwrap()
}

fn query(backend: &GeminiBackend, skip: usize, count: usize, filters: &[(&str, &str)]) -> Vec<String> {
    let filters: Filters = filters.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let result = backend.variants("fam1", skip, count, &filters);
    assert!(result.is_ok(), "Failed to query variants: {}", result.unwrap_err());
    result.unwrap().into_iter().map(|variant| variant.variant_id).collect()
}

//-----------------------------------------------------------------------------

#[test]
fn cases_from_samples() {
    let dir = tempfile::tempdir().unwrap();
    let db = internal::create_gemini_db(dir.path(), "cohort.db");
    let backend = create_backend(&db, VariantType::Snv);

    assert_eq!(backend.db(), db.display().to_string());
    assert_eq!(backend.mode(), VariantMode::Gemini);
    let ids: Vec<&str> = backend.cases().iter().map(|case| case.case_id.as_str()).collect();
    assert_eq!(ids, vec!["fam1", "fam2"], "Wrong cases");

    let fam1 = backend.case("fam1").unwrap();
    assert_eq!(fam1.variant_mode, "gemini");
    assert_eq!(fam1.variant_source, db.display().to_string());
    assert_eq!(fam1.individuals.len(), 2);
    let proband = &fam1.individuals[0];
    assert_eq!(proband.ind_id, "fam1-1");
    assert_eq!(proband.sex, Sex::Male);
    assert_eq!(proband.phenotype, Phenotype::Affected);
    assert_eq!(proband.father, None, "Parent code 0 was not treated as unknown");

    let child = backend.individual("fam2-1").unwrap();
    assert_eq!(child.case_id, "fam2");
    assert_eq!(child.father.as_deref(), Some("dad"));
    assert_eq!(child.mother.as_deref(), Some("mom"));
    assert_eq!(child.index, 2);
    assert_eq!(backend.individuals().len(), 3);
}

#[test]
fn unavailable_databases() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.db");
    assert!(matches!(GeminiBackend::new(&missing, VariantType::Snv), Err(Error::BackendUnavailable { .. })), "Opened a missing database");
    assert!(!missing.exists(), "Read-only open created the database");

    let text = internal::write_file(dir.path(), "text.db", "this is not a database\n");
    assert!(matches!(GeminiBackend::new(&text, VariantType::Snv), Err(Error::BackendUnavailable { .. })), "Opened a text file");

    let foreign = dir.path().join("foreign.db");
    Connection::open(&foreign).unwrap().execute_batch("CREATE TABLE Cases (case_id TEXT)").unwrap();
    match GeminiBackend::new(&foreign, VariantType::Snv) {
        Err(Error::BackendUnavailable { location, reason }) => {
            assert_eq!(location, foreign.display().to_string());
            assert!(reason.contains("GEMINI"), "Unexpected reason: {}", reason);
        },
        other => panic!("Expected BackendUnavailable, got {:?}", other),
    }
}

//-----------------------------------------------------------------------------

#[test]
fn variant_types() {
    let dir = tempfile::tempdir().unwrap();
    let db = internal::create_gemini_db(dir.path(), "cohort.db");

    let snv = create_backend(&db, VariantType::Snv);
    assert_eq!(query(&snv, 0, 30, &[]), vec!["1", "2", "4", "5", "6"], "Wrong SNVs");

    let sv = create_backend(&db, VariantType::Sv);
    assert_eq!(query(&sv, 0, 30, &[]), vec!["3"], "Wrong structural variants");
    let deletion = sv.variant("fam1", "3").unwrap().unwrap();
    assert_eq!(deletion.sv_type.as_deref(), Some("DEL"));
    assert_eq!((deletion.start, deletion.stop), (5000000, 5001000));
    assert_eq!(deletion.sv_len, Some(1000));
}

#[test]
fn filtered_variants() {
    let dir = tempfile::tempdir().unwrap();
    let db = internal::create_gemini_db(dir.path(), "cohort.db");
    let backend = create_backend(&db, VariantType::Snv);

    assert_eq!(query(&backend, 0, 30, &[("gene_ids", "TP53")]), vec!["4", "5"]);
    assert_eq!(query(&backend, 0, 30, &[("gene_ids", "TP53,BRCA2")]), vec!["4", "5", "6"]);
    assert_eq!(query(&backend, 0, 30, &[("frequency", "0.02")]), vec!["1", "4", "5"]);
    assert_eq!(query(&backend, 0, 30, &[("cadd", "20")]), vec!["1", "6"]);
    assert_eq!(query(&backend, 0, 30, &[("consequence", "missense_variant,stop_gained")]), vec!["1", "4", "5"]);
    assert_eq!(query(&backend, 0, 30, &[("gene_ids", "TP53"), ("cadd", "10")]), vec!["4"]);
    assert_eq!(query(&backend, 1, 30, &[("gene_ids", "TP53")]), vec!["5"], "Skipping did not apply after filtering");

    let filters: Filters = [(String::from("sv_len"), String::from("100"))].into_iter().collect();
    assert!(matches!(backend.variants("fam1", 0, 30, &filters), Err(Error::UnsupportedFilter(_))));
}

#[test]
fn pagination() {
    let dir = tempfile::tempdir().unwrap();
    let db = internal::create_gemini_db(dir.path(), "cohort.db");
    let backend = create_backend(&db, VariantType::Snv);

    assert_eq!(query(&backend, 0, 2, &[]), vec!["1", "2"]);
    assert_eq!(query(&backend, 2, 2, &[]), vec!["4", "5"]);
    assert_eq!(query(&backend, 4, 2, &[]), vec!["6"]);
    assert!(query(&backend, 10, 2, &[]).is_empty(), "Variants past the end");
}

#[test]
fn single_variant() {
    let dir = tempfile::tempdir().unwrap();
    let db = internal::create_gemini_db(dir.path(), "cohort.db");
    let backend = create_backend(&db, VariantType::Snv);

    let variant = backend.variant("fam1", "1");
    assert!(variant.is_ok(), "Failed to get variant: {}", variant.unwrap_err());
    let variant = variant.unwrap().unwrap();
    assert_eq!(variant.chrom, "chr1");
    assert_eq!((variant.start, variant.stop), (880086, 880086), "Start was not converted to 1-based");
    assert_eq!(variant.filter, "PASS");
    assert_eq!(variant.genes, vec!["SAMD11"]);
    assert_eq!(variant.consequences, vec!["missense_variant"]);
    assert_eq!(variant.frequency, Some(0.01));
    assert_eq!(variant.cadd_score, Some(22.5));
    assert!(!variant.is_sv(), "SNV sub-type reported as a structural variant");

    let filtered = backend.variant("fam1", "5").unwrap().unwrap();
    assert_eq!(filtered.filter, "LowQual");
    assert_eq!(filtered.cadd_score, None);

    assert!(matches!(backend.variant("fam1", "99"), Ok(None)), "Found a missing variant");
    assert!(matches!(backend.variant("fam1", "nonexistent-id"), Ok(None)), "Found a variant with an invalid id");
}

#[test]
fn single_variant_of_wrong_type() {
    let dir = tempfile::tempdir().unwrap();
    let db = internal::create_gemini_db(dir.path(), "cohort.db");

    let snv = create_backend(&db, VariantType::Snv);
    assert!(matches!(snv.variant("fam1", "3"), Ok(None)), "SNV backend returned a structural variant");
    let sv = create_backend(&db, VariantType::Sv);
    assert!(matches!(sv.variant("fam1", "1"), Ok(None)), "SV backend returned an SNV");
    assert!(matches!(sv.variant("fam1", "3"), Ok(Some(_))), "SV backend did not return a structural variant");
}

//-----------------------------------------------------------------------------

#[test]
fn unknown_cases() {
    let dir = tempfile::tempdir().unwrap();
    let db = internal::create_gemini_db(dir.path(), "cohort.db");
    let backend = create_backend(&db, VariantType::Snv);
    assert!(backend.case("nobody").is_none());

    match backend.variants("nobody", 0, 30, &Filters::new()) {
        Err(Error::CaseNotFound(case_id)) => assert_eq!(case_id, "nobody"),
        other => panic!("Expected CaseNotFound from variants, got {:?}", other),
    }
    match backend.variant("nobody", "1") {
        Err(Error::CaseNotFound(case_id)) => assert_eq!(case_id, "nobody"),
        other => panic!("Expected CaseNotFound from variant, got {:?}", other),
    }

    // Every known case sees the whole cohort.
    assert_eq!(query(&backend, 0, 30, &[]).len(), 5);
    let fam2 = backend.variants("fam2", 0, 30, &Filters::new()).unwrap();
    assert_eq!(fam2.len(), 5, "Wrong variants for the second family");
}

#[test]
fn assigned_cases() {
    let dir = tempfile::tempdir().unwrap();
    let db = internal::create_gemini_db(dir.path(), "cohort.db");
    let source = db.display().to_string();
    let mut case = internal::fam1(&source).to_case(VariantType::Snv, VariantMode::Gemini, None);
    case.case_id = String::from("stored");
    let backend = create_backend(&db, VariantType::Snv).with_cases(vec![case.clone()]);

    assert_eq!(backend.cases(), &[case], "Assigned cases were not used");
    assert!(backend.case("fam1").is_none(), "Derived case was kept");
    assert_eq!(backend.variants("stored", 0, 30, &Filters::new()).unwrap().len(), 5);
    assert!(matches!(backend.variants("fam1", 0, 30, &Filters::new()), Err(Error::CaseNotFound(_))));
    assert!(matches!(backend.variant("fam1", "1"), Err(Error::CaseNotFound(_))));
}

//-----------------------------------------------------------------------------
