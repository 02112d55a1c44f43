//! Export of built flanges to STEP or STL files
//!
//! Exactly one file is written per call. Geometry serialization is left to
//! the kernel: STEP through [`CadKernel::export_step`], STL through
//! [`CadKernel::tessellate`] followed by a binary STL writer.
//!
//! [`CadKernel::export_step`]: flange_cad::CadKernel::export_step
//! [`CadKernel::tessellate`]: flange_cad::CadKernel::tessellate

mod options;
mod stl;

use std::path::{Path, PathBuf};

use flange_cad::CadError;

use crate::geometry::FlangeSolid;
use crate::params::OutputFormat;

pub use options::ExportOptions;

/// Export-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("Output file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("IO error: {0}")]
    Io(String),
    #[error("CAD kernel error: {0}")]
    Kernel(#[from] CadError),
    #[error("Write failed: {0}")]
    Write(String),
}

/// Replace anything that is not alphanumeric, `_` or `-` with `_`
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

/// `stem` with the format's extension appended
///
/// Appends rather than replaces, so stems containing dots keep them.
pub fn output_path(stem: &Path, format: OutputFormat) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(format.extension());
    PathBuf::from(path)
}

/// Write a flange solid to `dest_stem.<ext>`
///
/// Missing parent directories are created. Returns the path of the written
/// file.
pub fn export_flange(
    flange: &FlangeSolid<'_>,
    dest_stem: &Path,
    format: OutputFormat,
    options: &ExportOptions,
) -> Result<PathBuf, ExportError> {
    let path = output_path(dest_stem, format);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::Io(e.to_string()))?;
    }

    if !options.overwrite && path.exists() {
        return Err(ExportError::AlreadyExists(path));
    }

    let kernel = flange.kernel();
    match format {
        OutputFormat::Step => {
            kernel.export_step(flange.solid(), &path, &options.step)?;
        }
        OutputFormat::Stl => {
            let mesh = kernel.tessellate(flange.solid(), options.stl_tolerance)?;
            tracing::debug!(triangles = mesh.triangle_count(), "flange tessellated");
            stl::write_stl(&mesh, &path)?;
        }
    }

    tracing::info!(path = %path.display(), format = %format, "flange exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::build_flange;
    use crate::params::FlangeParams;
    use crate::test_support::RecordingKernel;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("flange A/1"), "flange_A_1");
        assert_eq!(sanitize_filename("ok-name_2"), "ok-name_2");
        assert_eq!(sanitize_filename("../escape"), "___escape");
        assert_eq!(sanitize_filename("  "), "_");
    }

    #[test]
    fn test_output_path_appends_extension() {
        assert_eq!(
            output_path(Path::new("out/flange_0001"), OutputFormat::Step),
            PathBuf::from("out/flange_0001.step")
        );
        assert_eq!(
            output_path(Path::new("out/flange_d5p5"), OutputFormat::Stl),
            PathBuf::from("out/flange_d5p5.stl")
        );
        assert_eq!(
            output_path(Path::new("v1.2"), OutputFormat::Stl),
            PathBuf::from("v1.2.stl")
        );
    }

    #[test]
    fn test_export_step_creates_parent_dirs() {
        let kernel = RecordingKernel::new();
        let flange = build_flange(&kernel, &FlangeParams::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("nested/deeper/part");

        let path = export_flange(&flange, &stem, OutputFormat::Step, &ExportOptions::default())
            .unwrap();

        assert_eq!(path, dir.path().join("nested/deeper/part.step"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("ISO-10303-21;"));
        assert!(content.contains("1970-01-01T00:00:00"));
    }

    #[test]
    fn test_export_stl_is_binary_mesh() {
        let kernel = RecordingKernel::new();
        let flange = build_flange(&kernel, &FlangeParams::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = export_flange(
            &flange,
            &dir.path().join("part"),
            OutputFormat::Stl,
            &ExportOptions::default(),
        )
        .unwrap();

        let mut file = std::fs::File::open(&path).unwrap();
        let mesh = stl_io::read_stl(&mut file).unwrap();
        // base + bore + 6 holes
        assert_eq!(mesh.faces.len(), 8);
    }

    #[test]
    fn test_existing_file_is_not_replaced() {
        let kernel = RecordingKernel::new();
        let flange = build_flange(&kernel, &FlangeParams::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("part");
        std::fs::write(dir.path().join("part.step"), "keep me").unwrap();

        let err = export_flange(&flange, &stem, OutputFormat::Step, &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::AlreadyExists(_)));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("part.step")).unwrap(),
            "keep me"
        );

        let options = ExportOptions {
            overwrite: true,
            ..Default::default()
        };
        export_flange(&flange, &stem, OutputFormat::Step, &options).unwrap();
        assert_ne!(
            std::fs::read_to_string(dir.path().join("part.step")).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn test_step_export_is_deterministic() {
        let kernel = RecordingKernel::new();
        let dir = tempfile::tempdir().unwrap();
        let params = FlangeParams::default();

        let a = build_flange(&kernel, &params).unwrap();
        let b = build_flange(&kernel, &params).unwrap();
        let pa = export_flange(&a, &dir.path().join("a"), OutputFormat::Step, &ExportOptions::default())
            .unwrap();
        let pb = export_flange(&b, &dir.path().join("b"), OutputFormat::Step, &ExportOptions::default())
            .unwrap();

        assert_eq!(std::fs::read(pa).unwrap(), std::fs::read(pb).unwrap());
    }

    #[test]
    fn test_default_flange_with_default_kernel() {
        let kernel = flange_cad::default_kernel();
        if !kernel.is_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("example");
        let flange = build_flange(kernel.as_ref(), &FlangeParams::default()).unwrap();

        let step = export_flange(&flange, &stem, OutputFormat::Step, &ExportOptions::default())
            .unwrap();
        assert!(std::fs::read_to_string(step).unwrap().starts_with("ISO-10303-21;"));

        let stl = export_flange(&flange, &stem, OutputFormat::Stl, &ExportOptions::default())
            .unwrap();
        let mut file = std::fs::File::open(stl).unwrap();
        let mesh = stl_io::read_stl(&mut file).unwrap();
        assert!(!mesh.faces.is_empty());

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in &mesh.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        approx::assert_abs_diff_eq!(max[0], 25.0, epsilon = 0.1);
        approx::assert_abs_diff_eq!(min[1], -25.0, epsilon = 0.1);
        approx::assert_abs_diff_eq!(min[2], -4.0, epsilon = 1e-3);
        approx::assert_abs_diff_eq!(max[2], 4.0, epsilon = 1e-3);
    }
}
