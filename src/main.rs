use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use ncr_timeline::{
    batch::BatchExtractor, example_data::ExampleDataGenerator, models::*, output::OutputManager,
    parser::NcrParser,
};
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = Command::new("NCR Treatment Timeline")
        .version("0.1.0")
        .about("Consolidates registry episode records into treatment timelines with PFS outcomes")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Semicolon-separated registry export")
                .required_unless_present("generate-example"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for results")
                .default_value("./ncr_results"),
        )
        .arg(
            Arg::new("generate-example")
                .long("generate-example")
                .help("Generate a synthetic registry export")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tumors")
                .short('n')
                .long("tumors")
                .value_name("NUMBER")
                .help("Number of tumors for the synthetic export")
                .value_parser(clap::value_parser!(usize))
                .default_value("50"),
        )
        .arg(
            Arg::new("log-filtered")
                .long("log-filtered")
                .help("Log every tumor removed by the quality filter")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("all-failures")
                .long("all-failures")
                .help("Report every failing quality rule instead of the first")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Apply the additional treatment consistency rules")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let output_dir = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .context("missing output directory")?;

    if matches.get_flag("generate-example") {
        let n_tumors = matches.get_one::<usize>("tumors").copied().unwrap_or(50);
        std::fs::create_dir_all(&output_dir)?;

        let example_file = output_dir.join("example_ncr.csv");
        ExampleDataGenerator::generate_dataset(&example_file, n_tumors)
            .context("failed to generate example dataset")?;
        println!("Generated example dataset: {}", example_file.display());

        if !matches.contains_id("input") {
            return run_extraction(&example_file, &output_dir, &matches);
        }
    }

    match matches.get_one::<String>("input") {
        Some(input_file) => run_extraction(Path::new(input_file), &output_dir, &matches),
        None => {
            println!("No input file specified. Use --generate-example to create sample data.");
            Ok(())
        }
    }
}

fn run_extraction(input_path: &Path, output_dir: &Path, matches: &clap::ArgMatches) -> anyhow::Result<()> {
    println!("Input file: {}", input_path.display());
    println!("Output directory: {}", output_dir.display());

    let config = create_extraction_config(matches, output_dir);

    let records = NcrParser::parse_file(input_path)
        .with_context(|| format!("failed to parse {}", input_path.display()))?;
    println!("Loaded {} episode records", records.len());

    let start_time = std::time::Instant::now();
    let results = BatchExtractor::extract_all(records, &config);
    println!("Extraction completed in {:.2} seconds", start_time.elapsed().as_secs_f64());

    OutputManager::save_results(&results, &config, &config.output_path).context("failed to save results")?;

    print_summary(&results);
    Ok(())
}

fn create_extraction_config(matches: &clap::ArgMatches, output_dir: &Path) -> ExtractionConfig {
    ExtractionConfig {
        log_filtered_records: matches.get_flag("log-filtered"),
        rejection_reporting: if matches.get_flag("all-failures") {
            RejectionReporting::AllFailures
        } else {
            RejectionReporting::FirstFailure
        },
        rule_set: if matches.get_flag("strict") {
            RuleSet::Strict
        } else {
            RuleSet::Standard
        },
        output_path: output_dir.to_string_lossy().to_string(),
    }
}

fn print_summary(results: &BatchResults) {
    println!("\n=== EXTRACTION SUMMARY ===");
    println!("Tumors: {}", results.total_tumors());
    println!("Treatment plans: {}", results.plans.len());
    if !results.rejected.is_empty() {
        println!("Rejected by quality filter: {}", results.rejected.len());
        println!("  (See rejected_tumors.log for details)");
    }
    if !results.failed.is_empty() {
        println!("Failed: {}", results.failed.len());
    }

    println!("\nPlans per classification:");
    for (classification, count) in OutputManager::classification_counts(&results.plans) {
        println!("  {}: {}", classification, count);
    }
}
