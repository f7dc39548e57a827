//! Produce an optimized animated GIF from a video clip.
//!
//! Two sequential engine commands share one parameter set: a palette
//! generation pass and an encode pass. Both apply the identical time
//! window and scale/fps filter; a mismatch between the passes corrupts or
//! misaligns the result, so both argument lists are derived from the same
//! [`AnimatedImageOptions`] value and never edited independently.

use serde::{Deserialize, Serialize};

use ms_core::{Error, OutputArtifact, ProgressSender, Result};

use crate::engine::Engine;
use crate::ops::SourceFile;
use crate::projector::ProgressProjector;
use crate::vfs::{input_name, StagedSet};

const OPERATION: &str = "make-animated-image";
const PALETTE_NAME: &str = "palette.png";
const OUTPUT_NAME: &str = "output.gif";
const OUTPUT_MIME: &str = "image/gif";

/// Options for the animated-image operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimatedImageOptions {
    /// Output frame rate.
    pub frames_per_second: u32,
    /// Output width in pixels; height follows the aspect ratio.
    pub width: u32,
    /// Clip start within the source, in seconds.
    pub start_seconds: f64,
    /// Clip length, in seconds.
    pub duration_seconds: f64,
}

impl AnimatedImageOptions {
    pub fn validate(&self) -> Result<()> {
        if self.frames_per_second == 0 {
            return Err(Error::Validation("frames_per_second must be positive".into()));
        }
        if self.width == 0 {
            return Err(Error::Validation("width must be positive".into()));
        }
        if !self.start_seconds.is_finite() || self.start_seconds < 0.0 {
            return Err(Error::Validation("start_seconds must be >= 0".into()));
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(Error::Validation("duration_seconds must be positive".into()));
        }
        Ok(())
    }

    /// `-ss <start> -t <duration>`, identical for both passes.
    fn time_window(&self) -> [String; 4] {
        [
            "-ss".into(),
            self.start_seconds.to_string(),
            "-t".into(),
            self.duration_seconds.to_string(),
        ]
    }

    /// Sampling and scaling filter, identical for both passes. Height is
    /// derived from the aspect ratio; lanczos keeps downscaling sharp.
    fn base_filter(&self) -> String {
        format!(
            "fps={},scale={}:-1:flags=lanczos",
            self.frames_per_second, self.width
        )
    }

    /// Pass 1: sample the window and generate one global palette
    /// (stats_mode=single trades some color fidelity for temporal color
    /// stability).
    fn palette_args(&self, input: &str) -> Vec<String> {
        let mut args: Vec<String> = self.time_window().into();
        args.extend(["-i".into(), input.into()]);
        args.extend([
            "-vf".into(),
            format!("{},palettegen=stats_mode=single", self.base_filter()),
            PALETTE_NAME.into(),
        ]);
        args
    }

    /// Pass 2: re-apply the same window and filter, mapping the generated
    /// palette onto each frame with ordered Bayer dithering in rectangle
    /// diff mode.
    fn encode_args(&self, input: &str) -> Vec<String> {
        let mut args: Vec<String> = self.time_window().into();
        args.extend(["-i".into(), input.into(), "-i".into(), PALETTE_NAME.into()]);
        args.extend([
            "-filter_complex".into(),
            format!(
                "[0:v]{}[sampled];[sampled][1:v]paletteuse=dither=bayer:bayer_scale=5:diff_mode=rectangle",
                self.base_filter()
            ),
            OUTPUT_NAME.into(),
        ]);
        args
    }
}

/// Run the two-pass palette encode.
///
/// Progress reaches 50 when the palette pass completes and 100 after the
/// encode pass; raw engine progress advances within each pass's half.
pub(crate) async fn run(
    engine: &dyn Engine,
    source: SourceFile<'_>,
    options: AnimatedImageOptions,
    progress: &ProgressSender,
) -> Result<OutputArtifact> {
    source.validate()?;
    options.validate()?;

    let projector = ProgressProjector::new(progress);
    projector.begin();

    let mut staged = StagedSet::new();
    let input = staged.track(input_name(source.name));
    staged.track(PALETTE_NAME.to_string());
    staged.track(OUTPUT_NAME.to_string());

    tracing::info!(
        "{OPERATION} from {input}: {}fps, width {}, window {}s+{}s",
        options.frames_per_second,
        options.width,
        options.start_seconds,
        options.duration_seconds
    );

    let outcome = async {
        engine.stage(&input, source.bytes).await?;

        projector.set_window(0, 50);
        engine
            .exec(OPERATION, &options.palette_args(&input), &|p| {
                projector.observe(p)
            })
            .await?;
        projector.mark(50);

        projector.set_window(50, 100);
        engine
            .exec(OPERATION, &options.encode_args(&input), &|p| {
                projector.observe(p)
            })
            .await?;

        engine.retrieve(OUTPUT_NAME).await
    }
    .await;

    staged.purge(engine).await;
    let bytes = outcome?;

    projector.mark(100);
    Ok(OutputArtifact::copied_from(&bytes, OUTPUT_MIME, "gif"))
}
