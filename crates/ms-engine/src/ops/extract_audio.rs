//! Extract the audio track of a video into mp3 or aac.

use ms_core::{media::AUDIO_BITRATE, AudioTarget, OutputArtifact, ProgressSender, Result};

use crate::engine::Engine;
use crate::ops::SourceFile;
use crate::projector::ProgressProjector;
use crate::vfs::{input_name, StagedSet};

const OPERATION: &str = "extract-audio";

/// Drop the video stream and encode the audio with the requested codec at
/// a fixed 192 kbps.
pub(crate) async fn run(
    engine: &dyn Engine,
    source: SourceFile<'_>,
    target: AudioTarget,
    progress: &ProgressSender,
) -> Result<OutputArtifact> {
    source.validate()?;

    let projector = ProgressProjector::new(progress);
    projector.begin();

    let mut staged = StagedSet::new();
    let input = staged.track(input_name(source.name));
    let output = staged.track(format!("output.{}", target.file_extension()));

    tracing::info!("{OPERATION} ({target}) from {input}, {} bytes", source.bytes.len());

    let outcome = async {
        engine.stage(&input, source.bytes).await?;
        let args = build_args(&input, target, &output);
        engine
            .exec(OPERATION, &args, &|p| projector.observe(p))
            .await?;
        engine.retrieve(&output).await
    }
    .await;

    staged.purge(engine).await;
    let bytes = outcome?;

    projector.mark(100);
    Ok(OutputArtifact::copied_from(
        &bytes,
        target.mime_type(),
        target.file_extension(),
    ))
}

fn build_args(input: &str, target: AudioTarget, output: &str) -> Vec<String> {
    [
        "-i",
        input,
        "-vn",
        "-acodec",
        target.codec_name(),
        "-b:a",
        AUDIO_BITRATE,
        output,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
