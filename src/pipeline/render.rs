use std::path::PathBuf;

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::Result;
use crate::naming;
use crate::pipeline::pose::Pose;
use crate::scheduler::JobDescriptor;
use crate::source;
use crate::worker::ItemTransform;

/// One color per keypoint: warm tones for the head, greens for the arms,
/// blues for the legs.
pub const KEYPOINT_COLORS: [[u8; 3]; 17] = [
    [210, 105, 30],  // nose
    [255, 127, 80],  // left eye
    [184, 135, 11],  // right eye
    [255, 140, 0],   // left ear
    [255, 160, 122], // right ear
    [0, 100, 0],     // left shoulder
    [85, 107, 47],   // right shoulder
    [143, 188, 143], // left elbow
    [34, 139, 34],   // right elbow
    [50, 205, 50],   // left wrist
    [60, 179, 114],  // right wrist
    [70, 130, 180],  // left hip
    [135, 207, 235], // right hip
    [65, 105, 225],  // left knee
    [25, 25, 112],   // right knee
    [173, 216, 230], // left ankle
    [30, 143, 255],  // right ankle
];

/// Keypoint discs are drawn at 80% opacity.
const KEYPOINT_ALPHA: u16 = 204;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Jpg,
    Png,
}

impl FrameFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FrameFormat::Jpg => "jpg",
            FrameFormat::Png => "png",
        }
    }
}

/// Canvas geometry for the render pipeline.
///
/// Keypoint positions arrive in the source video's coordinate space and are
/// mapped linearly onto a square canvas.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub canvas_size: u32,
    pub source_width: f64,
    pub source_height: f64,
    pub format: FrameFormat,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            canvas_size: 512,
            source_width: 1080.0,
            source_height: 1920.0,
            format: FrameFormat::Jpg,
        }
    }
}

/// Linear map of `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
pub fn scale(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Disc diameter as a step function of keypoint confidence: more confident
/// keypoints are drawn larger.
pub fn score_to_diameter(score: f64) -> f64 {
    if score < 0.5 {
        25.0
    } else if score < 0.75 {
        35.0
    } else if score < 0.9 {
        40.0
    } else if score < 0.95 {
        60.0
    } else if score < 0.98 {
        75.0
    } else {
        80.0
    }
}

fn blend(dst: u8, src: u8, alpha: u16) -> u8 {
    ((u16::from(src) * alpha + u16::from(dst) * (255 - alpha)) / 255) as u8
}

fn draw_disc(canvas: &mut RgbaImage, cx: f64, cy: f64, diameter: f64, color: [u8; 3]) {
    let radius = diameter / 2.0;
    let r2 = radius * radius;
    let (width, height) = canvas.dimensions();

    let x_min = ((cx - radius).floor().max(0.0)) as u32;
    let y_min = ((cy - radius).floor().max(0.0)) as u32;
    let x_max = ((cx + radius).ceil().min(f64::from(width) - 1.0)).max(0.0) as u32;
    let y_max = ((cy + radius).ceil().min(f64::from(height) - 1.0)).max(0.0) as u32;

    for py in y_min..=y_max {
        for px in x_min..=x_max {
            let dx = f64::from(px) + 0.5 - cx;
            let dy = f64::from(py) + 0.5 - cy;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let pixel = canvas.get_pixel_mut(px, py);
            let Rgba([dr, dg, db, _]) = *pixel;
            *pixel = Rgba([
                blend(dr, color[0], KEYPOINT_ALPHA),
                blend(dg, color[1], KEYPOINT_ALPHA),
                blend(db, color[2], KEYPOINT_ALPHA),
                255,
            ]);
        }
    }
}

/// Draw every keypoint of `pose` as a colored disc on a fresh canvas.
pub fn render_pose(pose: &Pose, settings: &RenderSettings) -> RgbaImage {
    let size = settings.canvas_size;
    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));

    for (i, keypoint) in pose.keypoints.iter().enumerate() {
        let color = KEYPOINT_COLORS[i % KEYPOINT_COLORS.len()];
        let x = scale(
            keypoint.position.x,
            0.0,
            settings.source_width,
            0.0,
            f64::from(size),
        );
        let y = scale(
            keypoint.position.y,
            0.0,
            settings.source_height,
            0.0,
            f64::from(size),
        );
        draw_disc(&mut canvas, x, y, score_to_diameter(keypoint.score), color);
    }

    canvas
}

/// Item transform for the render pipeline: pose JSON in,
/// `frame<outputIndex>.<ext>` out.
pub struct FrameRenderTransform {
    input_dir: PathBuf,
    output_dir: PathBuf,
    settings: RenderSettings,
}

impl FrameRenderTransform {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        settings: RenderSettings,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            settings,
        }
    }
}

#[async_trait]
impl ItemTransform for FrameRenderTransform {
    async fn apply(&self, job: &JobDescriptor) -> Result<()> {
        if source::is_hidden(&job.input_ref) {
            tracing::warn!(input = %job.input_ref, "Hidden input reached a worker, skipping");
            return Ok(());
        }

        let input_path = self.input_dir.join(&job.input_ref);
        let json = tokio::fs::read(&input_path).await?;
        let pose: Pose = serde_json::from_slice(&json)?;

        let canvas = render_pose(&pose, &self.settings);
        let name = naming::frame_file_name(job.output_index, self.settings.format.extension());
        let output_path = self.output_dir.join(name);

        match self.settings.format {
            FrameFormat::Jpg => DynamicImage::ImageRgba8(canvas).to_rgb8().save(&output_path)?,
            FrameFormat::Png => canvas.save(&output_path)?,
        }

        tracing::info!(output = %output_path.display(), "Saved frame");
        Ok(())
    }
}
