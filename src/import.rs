use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::Args;
use constants::{EXIT_SUCCESS, PROJECT_ROOT_ENV, REPORT_PATHS_ENV};
use glob::glob;
use reports::{
    parse_report_file, AggregationEngine, DensityPolicy, FsResolver, ImportOptions,
    ReportContent, ReportDialect, RunSummary,
};

use crate::sink::JsonLinesSink;

#[derive(Args, Clone, Debug)]
pub struct ImportArgs {
    #[arg(
        long,
        required = true,
        env = REPORT_PATHS_ENV,
        value_delimiter = ',',
        value_parser = clap::builder::NonEmptyStringValueParser::new(),
        help = "Comma-separated list of glob paths to report files, relative to the project root."
    )]
    pub report_paths: Vec<String>,
    #[arg(
        long,
        env = PROJECT_ROOT_ENV,
        default_value = ".",
        help = "Directory that source files are resolved against."
    )]
    pub project_root: PathBuf,
    #[arg(
        long,
        default_value_t = ReportDialect::Xunit,
        help = "Report format: xunit, soatest, execution-totals or static-analysis."
    )]
    pub dialect: ReportDialect,
    #[arg(long, help = "Source file extension appended to class names.")]
    pub source_extension: Option<String>,
    #[arg(long, help = "Trailing token removed from class names, e.g. IT.")]
    pub strip_suffix: Option<String>,
    #[arg(long, help = "failures-and-errors or failures-only.")]
    pub density: Option<DensityPolicy>,
    #[arg(long, help = "Write metrics to this file instead of stdout.")]
    pub output: Option<PathBuf>,
}

impl ImportArgs {
    pub fn import_options(&self) -> ImportOptions {
        let mut path_rule = self
            .dialect
            .default_path_rule()
            .with_strip_suffix(self.strip_suffix.clone());
        if self.source_extension.is_some() {
            path_rule = path_rule.with_extension(self.source_extension.clone());
        }
        let options = ImportOptions::new(self.dialect).with_path_rule(path_rule);
        match self.density {
            Some(density) => options.with_density(density),
            None => options,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct InspectArgs {
    #[arg(help = "Report file to parse.")]
    pub report: PathBuf,
    #[arg(long, default_value_t = ReportDialect::Xunit, help = "Report format.")]
    pub dialect: ReportDialect,
}

pub fn run_import(import_args: ImportArgs) -> anyhow::Result<i32> {
    let options = import_args.import_options();
    let report_files = find_report_files(
        import_args.report_paths.as_slice(),
        &import_args.project_root,
    )?;
    log::info!(
        "Found {} {} report file(s)",
        report_files.len(),
        options.dialect
    );

    let resolver = FsResolver::new(&import_args.project_root);
    let writer: Box<dyn Write> = match &import_args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = JsonLinesSink::new(BufWriter::new(writer));

    let summary = AggregationEngine::new(&options, &resolver, &mut sink).run(&report_files)?;
    log::info!("Wrote {} metric(s)", sink.written());
    sink.finish()?;
    print_summary(&summary);

    Ok(EXIT_SUCCESS)
}

pub fn run_inspect(inspect_args: InspectArgs) -> anyhow::Result<i32> {
    let InspectArgs { report, dialect } = inspect_args;
    let parsed = match parse_report_file(dialect, &report) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::error!("{}", e);
            return Ok(exitcode::DATAERR);
        }
    };

    match &parsed.content {
        ReportContent::Tests(index) => {
            for (key, report) in index.iter() {
                println!("{key}: {:?}", report.counts());
            }
        }
        ReportContent::Totals(totals) => println!("{totals:?}"),
        ReportContent::Violations(index) => {
            for (file, violations) in index.iter() {
                println!("{file}: {} violation(s)", violations.len());
                for violation in violations {
                    println!("  {violation:?}");
                }
            }
        }
    }
    for issue in &parsed.issues {
        println!("issue: {issue}");
    }

    Ok(EXIT_SUCCESS)
}

/// Expands every glob against `project_root`, keeping files only. The result
/// is sorted and free of duplicates so overlapping globs read a file once.
pub fn find_report_files<T: AsRef<str>>(
    report_paths: &[T],
    project_root: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for report_path in report_paths {
        let report_path = PathBuf::from(report_path.as_ref());
        let path_to_scan = if report_path.is_absolute() {
            report_path
        } else {
            project_root.join(report_path)
        };

        let before = files.len();
        files.extend(
            glob(&path_to_scan.to_string_lossy())?
                .filter_map(|entry| entry.ok().filter(|path| path.is_file())),
        );
        if files.len() == before {
            log::warn!("No report files matched {}", path_to_scan.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn print_summary(summary: &RunSummary) {
    if !summary.failed_files.is_empty() || summary.rejected_files > 0 {
        log::warn!(
            "{} report(s) could not be read, {} had an unexpected format",
            summary.failed_files.len(),
            summary.rejected_files
        );
    }
    if !summary.unresolved_keys.is_empty() {
        log::info!(
            "{} result group(s) did not match a project file",
            summary.unresolved_keys.len()
        );
    }
    log::info!(
        "Done: {} report(s) parsed, {} resource(s) updated",
        summary.parsed_files,
        summary.resolved_resources
    );
}
