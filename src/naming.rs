//! Deterministic output file names.
//!
//! Frame names embed the assignment-time output index so a downstream video
//! encoder can reassemble the sequence in order; pose exports keep the
//! input's own base name.

use std::path::Path;

/// `frame<index>.<ext>` for the render pipeline.
pub fn frame_file_name(output_index: u64, extension: &str) -> String {
    format!("frame{output_index}.{extension}")
}

/// `<base>.json` for the pose-export pipeline.
pub fn pose_file_name(input_ref: &str) -> String {
    let stem = Path::new(input_ref)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| input_ref.to_string());
    format!("{stem}.json")
}
