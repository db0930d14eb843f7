use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use spectra_merge::data::merge::MergeSummary;
use spectra_merge::locale::{detect_defaults, PlatformInfo};
use spectra_merge::{
    DecimalSeparator, FieldSeparator, FormatOptions, FormatPreset, MergeEngine, MergeRequest,
};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Merge spectral text files (metadata + XYDATA block) onto one wavelength axis.
///
/// Writes unified_spectra_data.csv and spectra_metadata.csv.
#[derive(Debug, Parser)]
#[command(name = "spectra-merge", version)]
pub struct Args {
    /// Spectral files, or directories whose *.csv files are all merged
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Field separator of the output tables
    #[arg(long, value_enum)]
    pub separator: Option<FieldSeparator>,

    /// Decimal separator of numeric output cells
    #[arg(long, value_enum)]
    pub decimal: Option<DecimalSeparator>,

    /// Separator preset; --separator / --decimal override it
    #[arg(long, value_enum)]
    pub preset: Option<FormatPreset>,

    /// Output directory (default: the input directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Process files one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// `RUST_LOG` wins; otherwise `info`, or `warn` with `--quiet`.
pub fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

pub fn run(args: &Args) -> Result<()> {
    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        bail!("no input files found");
    }

    let format = resolve_format(args, &PlatformInfo::from_env());
    let mut request = MergeRequest::new(files, format);
    if let Some(dir) = args.output_dir.clone().or_else(|| single_dir(&args.inputs)) {
        request = request.with_output_dir(dir);
    }

    let engine = if args.sequential {
        MergeEngine::sequential()
    } else {
        MergeEngine::new()
    };
    let outcome = engine.run(&request).context("conversion failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome.summary).context("serialising summary")?;
        println!("{json}");
    } else {
        print_summary(&outcome.summary);
    }
    Ok(())
}

/// Expand directories into their `*.csv` files (sorted by name); keep files as given.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = std::fs::read_dir(input)
            .with_context(|| format!("reading directory {}", input.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_csv_extension(p) && !is_own_output(p))
            .collect();
        found.sort();
        info!("Found {} CSV files in {}", found.len(), input.display());
        files.extend(found);
    }
    Ok(files)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Outputs of an earlier run in the same directory are not inputs.
fn is_own_output(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| {
        n == spectra_merge::data::merge::DATA_FILE_NAME
            || n == spectra_merge::data::merge::METADATA_FILE_NAME
    })
}

fn single_dir(inputs: &[PathBuf]) -> Option<PathBuf> {
    match inputs {
        [only] if only.is_dir() => Some(only.clone()),
        _ => None,
    }
}

/// Locale defaults, then the preset, then explicit separators.
fn resolve_format(args: &Args, platform: &PlatformInfo) -> FormatOptions {
    let detected = detect_defaults(platform);
    info!("Auto-detected region: {}", detected.region);

    let mut format = args.preset.map_or(detected.format, FormatPreset::options);
    if let Some(sep) = args.separator {
        format.field_separator = sep;
    }
    if let Some(dec) = args.decimal {
        format.decimal_separator = dec;
    }
    format
}

fn print_summary(summary: &MergeSummary) {
    println!("Files created:");
    println!("  {}", summary.data_file.display());
    println!(
        "    {} rows x {} columns, range {:.1} - {:.1} nm",
        summary.rows, summary.columns, summary.axis_min, summary.axis_max
    );
    println!("  {}", summary.metadata_file.display());
    println!("Format: {}", summary.format);
    for f in &summary.files {
        println!(
            "  {:<32} {:>6}/{:<6} points  {:>5.1}%",
            f.column, f.valid_points, summary.rows, f.coverage_percent
        );
    }
    if !summary.excluded.is_empty() {
        println!("Excluded:");
        for x in &summary.excluded {
            println!("  {}", x.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["spectra-merge", "in.csv"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    fn german() -> PlatformInfo {
        PlatformInfo {
            locale: Some("de_DE.UTF-8".into()),
            os: "linux".into(),
        }
    }

    #[test]
    fn test_locale_default_used_without_flags() {
        let format = resolve_format(&args(&[]), &german());
        assert_eq!(format, FormatPreset::European.options());
    }

    #[test]
    fn test_preset_overrides_locale() {
        let format = resolve_format(&args(&["--preset", "excel"]), &german());
        assert_eq!(format, FormatPreset::Excel.options());
    }

    #[test]
    fn test_explicit_separator_overrides_preset() {
        let format = resolve_format(&args(&["--preset", "us", "--decimal", "comma"]), &german());
        assert_eq!(format.field_separator, FieldSeparator::Comma);
        assert_eq!(format.decimal_separator, DecimalSeparator::Comma);
    }

    #[test]
    fn test_collect_inputs_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.csv", "a.CSV", "notes.txt", "unified_spectra_data.csv"] {
            std::fs::write(dir.path().join(name), "XYDATA\n1;2\n").unwrap();
        }
        let files = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
    }
}
