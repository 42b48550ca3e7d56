use kpcmp::{compare_many, CompareConfig, Report};
use log::*;
use std::path::PathBuf;
use std::process;
use structopt::clap::ErrorKind;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "kpcmp",
    about = "A tool to check whether keypoint files are the same up to ordering and float noise."
)]
struct Opt {
    /// The tolerance for comparing positions, scales and orientations.
    ///
    /// Overrides the value from the settings file. Defaults to 0.001.
    #[structopt(short, long)]
    epsilon: Option<f32>,
    /// A JSON file with comparison settings.
    ///
    /// This is in the format of `kpcmp::CompareConfig`.
    #[structopt(short, long, parse(from_os_str))]
    settings: Option<PathBuf>,
    /// Reject files with data after the declared keypoints.
    #[structopt(long)]
    strict: bool,
    /// Print each report as a JSON object.
    #[structopt(long)]
    json: bool,
    /// List the keypoints that differ.
    #[structopt(short, long)]
    verbose: bool,
    /// The keypoint files, given as pairs to compare: A B [A B ...]
    #[structopt(name = "FILES", parse(from_os_str), required = true, min_values = 2)]
    files: Vec<PathBuf>,
}

const EXIT_DIFFERENT: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn main() {
    pretty_env_logger::init_timed();
    let opt = match Opt::from_iter_safe(std::env::args_os()) {
        Ok(opt) => opt,
        Err(e) if matches!(e.kind, ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed) => {
            e.exit()
        }
        Err(e) => {
            // Usage errors share the error status.
            eprintln!("{}", e.message);
            process::exit(EXIT_ERROR);
        }
    };
    process::exit(run(opt));
}

fn load_config(opt: &Opt) -> kpcmp::Result<CompareConfig> {
    let mut config = match &opt.settings {
        Some(path) => CompareConfig::from_json_path(path)?,
        None => CompareConfig::default(),
    };
    if let Some(epsilon) = opt.epsilon {
        config.epsilon = epsilon;
    }
    config.strict |= opt.strict;
    config.validate()?;
    Ok(config)
}

fn run(opt: Opt) -> i32 {
    if opt.files.len() % 2 != 0 {
        eprintln!(
            "Usage: kpcmp keyfile0 keyfile1 [keyfile0 keyfile1 ...] (got {} files)",
            opt.files.len()
        );
        return EXIT_ERROR;
    }
    let config = match load_config(&opt) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_ERROR;
        }
    };
    debug!("Using {:?}", config);

    let pairs: Vec<(PathBuf, PathBuf)> = opt
        .files
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();

    let mut status = 0;
    for result in compare_many(&pairs, &config) {
        match result {
            Ok(report) => {
                if !report.is_equivalent() {
                    status = status.max(EXIT_DIFFERENT);
                }
                if let Err(e) = print_report(&report, &opt) {
                    eprintln!("Error: {}", e);
                    status = EXIT_ERROR;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                status = EXIT_ERROR;
            }
        }
    }
    status
}

fn print_report(report: &Report, opt: &Opt) -> serde_json::Result<()> {
    if opt.json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }
    println!("{}", report);
    if opt.verbose {
        for mismatch in report.outcome.details() {
            println!("  {}", mismatch);
        }
        if let Some(count) = report.outcome.mismatch_count() {
            let shown = report.outcome.details().len();
            if count > shown {
                println!("  ... and {} more", count - shown);
            }
        }
    }
    Ok(())
}
