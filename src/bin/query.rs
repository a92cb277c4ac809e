use variant_base::{Case, Filters, Variant, VariantStore};

use std::io::{self, Write};
use std::time::Instant;
use std::{env, process};

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse arguments.
    let config = Config::new()?;

    // Open the database.
    let mut store = VariantStore::connect(&config.database).map_err(|x| x.to_string())?;
    if !store.store().is_set_up().map_err(|x| x.to_string())? {
        return Err(format!("Database {} does not contain cases", config.database));
    }

    let mut output = io::stdout().lock();
    match &config.case_id {
        None => {
            let cases = store.cases().map_err(|x| x.to_string())?;
            write_cases(&cases, &mut output).map_err(|x| x.to_string())?;
        },
        Some(case_id) if config.delete => {
            let case = store.case(case_id).map_err(|x| x.to_string())?;
            let case = case.ok_or(format!("Cannot find case {}", case_id))?;
            let case = store.delete_case(case).map_err(|x| x.to_string())?;
            eprintln!("Deleted case {} with {} individuals", case.case_id, case.individuals.len());
        },
        Some(case_id) => {
            if let Some(variant_id) = &config.variant_id {
                let variant = store.variant(case_id, variant_id).map_err(|x| x.to_string())?;
                let variant = variant.ok_or(format!("Cannot find variant {} in case {}", variant_id, case_id))?;
                write_variants(&[variant], &mut output).map_err(|x| x.to_string())?;
            } else {
                let variants = store.variants(case_id, config.skip, config.count, &config.filters).map_err(|x| x.to_string())?;
                write_variants(&variants, &mut output).map_err(|x| x.to_string())?;
                eprintln!(
                    "Variants {}..{} of case {}; supported filters: {}",
                    config.skip, config.skip + variants.len(), case_id, store.filters().names().join(", ")
                );
            }
        },
    }
    output.flush().map_err(|x| x.to_string())?;

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

pub struct Config {
    pub database: String,
    pub case_id: Option<String>,
    pub variant_id: Option<String>,
    pub skip: usize,
    pub count: usize,
    pub filters: Filters,
    pub delete: bool,
}

impl Config {
    const DEFAULT_DATABASE: &'static str = "variant-base.db";

    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        let database_desc = format!("database location (default: {})", Self::DEFAULT_DATABASE);
        opts.optopt("d", "database", &database_desc, "URI");
        opts.optopt("c", "case", "list the variants of this case", "ID");
        opts.optopt("v", "variant", "show only this variant (requires --case)", "ID");
        opts.optopt("s", "skip", "skip this many variants (default: 0)", "INT");
        let count_desc = format!("list this many variants (default: {})", VariantStore::DEFAULT_COUNT);
        opts.optopt("n", "count", &count_desc, "INT");
        opts.optmulti("f", "filter", "filter the variants (may repeat)", "NAME=VALUE");
        opts.optflag("", "delete", "delete the case (requires --case)");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        if matches.opt_present("h") {
            let header = format!("Usage: {} [options]", program);
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let database = matches.opt_str("d").unwrap_or(String::from(Self::DEFAULT_DATABASE));
        let case_id = matches.opt_str("c");
        let variant_id = matches.opt_str("v");
        let skip = parse_usize(matches.opt_str("s"), 0, "skip")?;
        let count = parse_usize(matches.opt_str("n"), VariantStore::DEFAULT_COUNT, "count")?;
        let mut filters = Filters::new();
        for filter in matches.opt_strs("f") {
            let (name, value) = filter.split_once('=').ok_or(format!("Invalid filter {}, expected NAME=VALUE", filter))?;
            filters.insert(name.trim().to_string(), value.trim().to_string());
        }
        let delete = matches.opt_present("delete");

        if case_id.is_none() && (variant_id.is_some() || delete) {
            return Err(String::from("Options --variant and --delete require --case"));
        }

        Ok(Config { database, case_id, variant_id, skip, count, filters, delete })
    }
}

fn parse_usize(value: Option<String>, default: usize, name: &str) -> Result<usize, String> {
    match value {
        Some(s) => s.parse::<usize>().map_err(|x| format!("--{}: {}", name, x)),
        None => Ok(default),
    }
}

//-----------------------------------------------------------------------------

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|x| x.to_string()).unwrap_or(String::from("."))
}

fn write_cases<W: Write>(cases: &[Case], output: &mut W) -> io::Result<()> {
    for case in cases.iter() {
        writeln!(
            output, "{}\t{}\t{}\t{}\t{}",
            case.case_id, case.name, case.variant_type, case.variant_mode, case.variant_source
        )?;
        for ind in case.individuals.iter() {
            writeln!(
                output, "\t{}\t{}\t{}\t{:?}\t{:?}\t{}",
                ind.ind_id, optional(&ind.father), optional(&ind.mother), ind.sex, ind.phenotype, optional(&ind.bam_path)
            )?;
        }
    }
    Ok(())
}

fn write_variants<W: Write>(variants: &[Variant], output: &mut W) -> io::Result<()> {
    writeln!(output, "#id\tchrom\tstart\tstop\tref\talt\tqual\tfilter\tgenes\tconsequences\tfrequency\tcadd\tsv_type\tsv_len")?;
    for variant in variants.iter() {
        writeln!(
            output, "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            variant.variant_id, variant.chrom, variant.start, variant.stop,
            variant.reference, variant.alternative, optional(&variant.quality), variant.filter,
            variant.genes.join(","), variant.consequences.join(","),
            optional(&variant.frequency), optional(&variant.cadd_score),
            optional(&variant.sv_type), optional(&variant.sv_len)
        )?;
    }
    Ok(())
}

//-----------------------------------------------------------------------------
