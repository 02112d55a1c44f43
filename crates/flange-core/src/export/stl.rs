//! Binary STL output

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flange_cad::TessellatedMesh;

use super::ExportError;

/// Unit normal of a triangle, or +Z for a degenerate one
fn facet_normal([v0, v1, v2]: &[[f32; 3]; 3]) -> [f32; 3] {
    let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
    let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
    let cross = [
        e1[1] * e2[2] - e1[2] * e2[1],
        e1[2] * e2[0] - e1[0] * e2[2],
        e1[0] * e2[1] - e1[1] * e2[0],
    ];
    let len = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
    if len > 0.0 {
        [cross[0] / len, cross[1] / len, cross[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Write a tessellated mesh as a binary STL file
pub(crate) fn write_stl(mesh: &TessellatedMesh, path: &Path) -> Result<(), ExportError> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|corners| stl_io::Triangle {
            normal: stl_io::Normal::new(facet_normal(&corners)),
            vertices: corners.map(stl_io::Vertex::new),
        })
        .collect();

    if triangles.is_empty() {
        return Err(ExportError::Write("mesh has no triangles".into()));
    }

    let file = File::create(path).map_err(|e| ExportError::Io(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter())
        .map_err(|e| ExportError::Write(e.to_string()))?;
    writer.flush().map_err(|e| ExportError::Io(e.to_string()))?;

    Ok(())
}
