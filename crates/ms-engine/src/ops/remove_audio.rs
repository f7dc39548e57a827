//! Strip the audio track of a video without re-encoding.

use ms_core::{canonical_extension, container_mime_type, OutputArtifact, ProgressSender, Result};

use crate::engine::Engine;
use crate::ops::SourceFile;
use crate::projector::ProgressProjector;
use crate::vfs::StagedSet;

const OPERATION: &str = "remove-audio";

/// Drop the audio stream and copy the video stream unchanged.
///
/// Stream copy touches no pixel data, so this is fast regardless of input
/// size. The output keeps the input's container extension; its MIME type
/// comes from the container map, defaulting to a generic video type.
pub(crate) async fn run(
    engine: &dyn Engine,
    source: SourceFile<'_>,
    progress: &ProgressSender,
) -> Result<OutputArtifact> {
    source.validate()?;

    let projector = ProgressProjector::new(progress);
    projector.begin();

    let extension = canonical_extension(source.name);
    let mut staged = StagedSet::new();
    let input = staged.track(format!("input.{extension}"));
    let output = staged.track(format!("output.{extension}"));

    tracing::info!("{OPERATION} from {input}, {} bytes", source.bytes.len());

    let outcome = async {
        engine.stage(&input, source.bytes).await?;
        let args = build_args(&input, &output);
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
        container_mime_type(&extension),
        extension,
    ))
}

fn build_args(input: &str, output: &str) -> Vec<String> {
    ["-i", input, "-an", "-vcodec", "copy", output]
        .into_iter()
        .map(String::from)
        .collect()
}
