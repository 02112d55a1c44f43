//! Subcommand implementations
//!
//! Every command returns whether all requested models were written.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use flange_cad::{CadKernel, default_kernel};
use flange_core::{
    BatchItem, BatchOptions, BatchReport, ExportOptions, FlangeParams, FlangeSpec, SamplingRanges,
    generate, load_batch_file, load_sampling_ranges, random_variations, run_batch,
    sanitize_filename, systematic_variations,
};

use crate::{Commands, GlobalArgs, SingleArgs};

pub fn run(command: Commands, global: &GlobalArgs) -> Result<bool> {
    let kernel = default_kernel();
    if !kernel.is_available() {
        bail!("no CAD kernel available (built without the `truck` feature)");
    }
    tracing::debug!(kernel = kernel.name(), "kernel ready");

    match command {
        Commands::Single(args) => single(kernel.as_ref(), &args, global),
        Commands::Batch { file } => {
            let items = load_batch_file(&file)
                .with_context(|| format!("failed to load batch file {}", file.display()))?;
            batch(kernel.as_ref(), &items, global, global.output.clone())
        }
        Commands::Random {
            count,
            seed,
            ranges,
            timestamped,
        } => {
            let ranges = match ranges {
                Some(path) => load_sampling_ranges(&path)
                    .with_context(|| format!("failed to load sampling ranges {}", path.display()))?,
                None => SamplingRanges::default(),
            };
            let items: Vec<BatchItem> = random_variations(count, &ranges, seed)?
                .into_iter()
                .map(BatchItem::from)
                .collect();
            let output_dir = if timestamped {
                timestamped_dir(&global.output)
            } else {
                global.output.clone()
            };
            batch(kernel.as_ref(), &items, global, output_dir)
        }
        Commands::Systematic => {
            let items: Vec<BatchItem> = systematic_variations()
                .into_iter()
                .map(BatchItem::from)
                .collect();
            batch(kernel.as_ref(), &items, global, global.output.clone())
        }
    }
}

fn export_options(global: &GlobalArgs) -> ExportOptions {
    ExportOptions {
        overwrite: global.overwrite,
        ..Default::default()
    }
}

/// `<output>/dataset_YYYYmmdd_HHMMSS`
fn timestamped_dir(output: &Path) -> PathBuf {
    output.join(format!(
        "dataset_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

impl SingleArgs {
    fn to_spec(&self) -> FlangeSpec {
        FlangeSpec {
            flange_diameter: self.flange_diameter,
            flange_thickness: self.flange_thickness,
            hole_count: self.hole_count,
            hole_diameter: self.hole_diameter,
            center_hole_diameter: self.center_hole_diameter,
            bolt_circle_diameter: self.bolt_circle_diameter,
            bolt_circle_ratio: self.bolt_circle_ratio,
            output_format: None,
        }
    }
}

fn single(kernel: &dyn CadKernel, args: &SingleArgs, global: &GlobalArgs) -> Result<bool> {
    let params = FlangeParams::try_from(args.to_spec()).context("invalid flange parameters")?;
    let params = match global.format {
        Some(format) => params.with_output_format(format),
        None => params,
    };

    let stem = match &args.name {
        Some(name) => sanitize_filename(name),
        None => params.file_stem(),
    };
    let path = generate(
        kernel,
        &params,
        &global.output.join(stem),
        &export_options(global),
    )
    .context("failed to generate flange")?;

    println!("{}", path.display());
    Ok(true)
}

fn batch(
    kernel: &dyn CadKernel,
    items: &[BatchItem],
    global: &GlobalArgs,
    output_dir: PathBuf,
) -> Result<bool> {
    let options = BatchOptions {
        output_dir,
        format_override: global.format,
        export: export_options(global),
        write_manifest: !global.no_manifest,
    };
    let report = run_batch(kernel, items, &options)?;
    print_summary(&report);
    Ok(report.all_succeeded())
}

fn print_summary(report: &BatchReport) {
    println!(
        "{} of {} flanges written to {}",
        report.succeeded(),
        report.total(),
        report.output_dir.display()
    );
    for failure in report.failures() {
        if let Err(err) = &failure.outcome {
            println!("  {} ({}): {err}", failure.index, failure.name);
        }
    }
    if let Some(manifest) = &report.manifest_path {
        println!("manifest: {}", manifest.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(output: &Path) -> GlobalArgs {
        GlobalArgs {
            output: output.to_path_buf(),
            format: None,
            overwrite: false,
            no_manifest: false,
            debug: false,
        }
    }

    #[test]
    fn test_single_args_to_spec() {
        let args = SingleArgs {
            flange_diameter: Some(80.0),
            hole_count: Some(-1),
            ..Default::default()
        };
        let spec = args.to_spec();
        assert_eq!(spec.flange_diameter, Some(80.0));
        assert!(spec.output_format.is_none());
        assert_eq!(FlangeParams::try_from(spec).unwrap_err().field, "hole_count");
    }

    #[test]
    fn test_timestamped_dir_is_under_output() {
        let dir = timestamped_dir(Path::new("out"));
        assert_eq!(dir.parent(), Some(Path::new("out")));
        let name = dir.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("dataset_"));
        assert_eq!(name.len(), "dataset_20240101_120000".len());
    }

    fn bad_thickness() -> BatchItem {
        BatchItem::new(FlangeSpec {
            flange_thickness: Some(-1.0),
            ..Default::default()
        })
    }

    #[test]
    fn test_batch_with_failures_reports_unsuccessful() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = flange_cad::NullKernel;

        let ok = batch(&kernel, &[], &global(dir.path()), dir.path().to_path_buf()).unwrap();
        assert!(ok);

        let items = [bad_thickness()];
        let ok = batch(&kernel, &items, &global(dir.path()), dir.path().to_path_buf()).unwrap();
        assert!(!ok);
        assert!(dir.path().join("metadata.json").exists());
    }

    #[test]
    fn test_batch_exit_status_with_default_kernel() {
        let kernel = default_kernel();
        if !kernel.is_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let args = global(dir.path());

        let items = [BatchItem::default()];
        assert!(batch(kernel.as_ref(), &items, &args, dir.path().join("good")).unwrap());

        let items = [BatchItem::default(), bad_thickness()];
        assert!(!batch(kernel.as_ref(), &items, &args, dir.path().join("mixed")).unwrap());
        assert!(dir.path().join("mixed/flange_0000.step").exists());
    }

    #[test]
    fn test_export_options_follow_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = global(dir.path());
        assert!(!export_options(&args).overwrite);
        args.overwrite = true;
        assert!(export_options(&args).overwrite);
    }
}
