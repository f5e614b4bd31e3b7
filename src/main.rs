#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # nbexam
//!
//! Command line front end: generate a batch of exams from a master
//! notebook, or strip hidden cases from a directory of test files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use nbexam::{AutograderFormat, RunOptions, artifact::strip_hidden_dir, config::DEFAULT_RESULT_DIR};
use tracing::{Level, info, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Generate exams and the autograder notebook
    Generate {
        /// Master notebook
        master: PathBuf,
        /// Output directory
        result: PathBuf,
        /// Autograder format
        format: AutograderFormat,
        /// Seed override
        seed:   Option<u64>,
        /// Quiet output
        quiet:  bool,
    },
    /// Remove hidden cases from every test file in a directory
    StripHidden(PathBuf),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the master notebook path
    fn master() -> impl Parser<PathBuf> {
        positional("MASTER").help("Path to the master notebook")
    }

    /// parses the output directory
    fn result() -> impl Parser<PathBuf> {
        positional("RESULT")
            .help("Directory to write the exams to")
            .fallback(PathBuf::from(DEFAULT_RESULT_DIR))
    }

    /// parses the autograder format
    fn format() -> impl Parser<AutograderFormat> {
        short('f')
            .long("format")
            .help("Autograder format, `otter` or `ok`")
            .argument::<String>("FORMAT")
            .parse(|s| s.parse::<AutograderFormat>())
            .fallback(AutograderFormat::default())
    }

    /// parses the seed override
    fn seed() -> impl Parser<Option<u64>> {
        short('s')
            .long("seed")
            .help("Seed for the random generator, overriding the exam config")
            .argument::<u64>("SEED")
            .optional()
    }

    /// parses the quiet flag
    fn quiet() -> impl Parser<bool> {
        short('q')
            .long("quiet")
            .help("Only print warnings and errors")
            .switch()
    }

    let format = format();
    let seed = seed();
    let quiet = quiet();
    let master = master();
    let result = result();
    let generate = construct!(Cmd::Generate {
        format,
        seed,
        quiet,
        master,
        result,
    })
    .to_options()
    .command("generate")
    .help("Generate randomized exams from a master notebook");

    let dir = positional::<PathBuf>("DIR").help("Directory of test files");
    let strip_hidden = construct!(Cmd::StripHidden(dir))
        .to_options()
        .command("strip-hidden")
        .help("Remove hidden test cases from every test file in a directory");

    let cmd = construct!([generate, strip_hidden]);

    cmd.to_options()
        .descr("Randomized exam generator for Jupyter notebooks")
        .run()
}

fn main() -> Result<()> {
    let cmd = options();

    let quiet = matches!(cmd, Cmd::Generate { quiet: true, .. });
    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(if quiet { Level::WARN } else { Level::INFO });
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match cmd {
        Cmd::Generate {
            master,
            result,
            format,
            seed,
            quiet,
        } => {
            let options = RunOptions::builder()
                .master(master.clone())
                .result(result)
                .format(format)
                .maybe_seed(seed)
                .quiet(quiet)
                .build();

            let summary = nbexam::run(&options)
                .with_context(|| format!("Failed to generate exams from {}", master.display()))?;

            if !quiet {
                println!("{}", summary.table());
                info!("Autograder notebook written to {}", summary.autograder.display());
            }
        }
        Cmd::StripHidden(dir) => {
            let count = strip_hidden_dir(&dir)
                .with_context(|| format!("Failed to strip hidden tests in {}", dir.display()))?;
            info!("Stripped hidden cases from {count} file(s) in {}", dir.display());
        }
    };

    Ok(())
}
