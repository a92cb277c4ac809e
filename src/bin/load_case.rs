use std::time::Instant;
use std::{env, process};

use variant_base::{formats, utils, VariantMode, VariantStore, VariantType};
use getopts::Options;
use log::info;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse arguments.
    let config = Config::new()?;

    // Read the families.
    if !utils::file_exists(&config.variant_source) {
        return Err(format!("Variant source {} does not exist", config.variant_source));
    }
    let reader = utils::open_file(&config.ped_file).map_err(|x| format!("Cannot open {}: {}", config.ped_file, x))?;
    let families = formats::read_ped(reader, &config.variant_source).map_err(|x| format!("{}: {}", config.ped_file, x))?;
    info!("Read {} families from {}", families.len(), config.ped_file);

    // Store the cases.
    let mut store = VariantStore::connect(&config.database).map_err(|x| x.to_string())?;
    store.set_up(config.reset).map_err(|x| x.to_string())?;
    let mode = config.mode.to_string();
    for family in families.iter() {
        let case = store.add_case(family, config.variant_type, &mode, None).map_err(|x| x.to_string())?;
        eprintln!(
            "Added case {} with {} individuals ({}, {})",
            case.case_id, case.individuals.len(), case.variant_type, case.variant_mode
        );
    }

    // Statistics.
    let cases = store.cases().map_err(|x| x.to_string())?;
    let individuals = store.individuals(None).map_err(|x| x.to_string())?;
    eprintln!("The database contains {} cases and {} individuals", cases.len(), individuals.len());
    if let Some(size) = store.store().file_size() {
        eprintln!("Database size: {}", size);
    }

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub ped_file: String,
    pub variant_source: String,
    pub database: String,
    pub variant_type: VariantType,
    pub mode: VariantMode,
    pub reset: bool,
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
        opts.optopt("t", "type", "variant type: snv or sv (default: snv)", "TYPE");
        opts.optopt("m", "mode", "variant backend: vcf or gemini (default: vcf)", "MODE");
        opts.optflag("", "reset", "drop the existing tables before loading");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] family.ped variants.vcf[.gz]", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let database = matches.opt_str("d").unwrap_or(String::from(Self::DEFAULT_DATABASE));
        let variant_type = match matches.opt_str("t") {
            Some(s) => s.parse::<VariantType>().map_err(|x| x.to_string())?,
            None => VariantType::default(),
        };
        let mode = match matches.opt_str("m") {
            Some(s) => s.parse::<VariantMode>().map_err(|x| x.to_string())?,
            None => VariantMode::default(),
        };
        let reset = matches.opt_present("reset");

        let (ped_file, variant_source) = if let [ped_file, variant_source] = matches.free.as_slice() {
            (ped_file.clone(), utils::absolute_path(variant_source).display().to_string())
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        Ok(Config { ped_file, variant_source, database, variant_type, mode, reset })
    }
}

//-----------------------------------------------------------------------------
