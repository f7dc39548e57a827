//! Operation implementations: extract-audio, remove-audio, and
//! make-animated-image.
//!
//! Every operation follows the same skeleton: validate the request, emit
//! zeroed progress, stage the input under a synthetic name, run the engine
//! command(s), retrieve the output, copy it into a freshly allocated owned
//! buffer, and purge every staged or produced name whether the command
//! succeeded or not.

mod animated_image;
mod extract_audio;
mod remove_audio;

pub use animated_image::AnimatedImageOptions;

pub(crate) use animated_image::run as run_animated_image;
pub(crate) use extract_audio::run as run_extract_audio;
pub(crate) use remove_audio::run as run_remove_audio;

/// A source file handed in by the caller.
///
/// `name` is only consulted for its extension; the bytes are never read
/// from disk or the network by this crate.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    /// Raw file content.
    pub bytes: &'a [u8],
    /// Original file name, if the caller knows one.
    pub name: Option<&'a str>,
}

impl<'a> SourceFile<'a> {
    pub fn new(bytes: &'a [u8], name: Option<&'a str>) -> Self {
        Self { bytes, name }
    }

    /// Reject inputs no engine command could do anything with.
    pub(crate) fn validate(&self) -> ms_core::Result<()> {
        if self.bytes.is_empty() {
            return Err(ms_core::Error::Validation("source file is empty".into()));
        }
        Ok(())
    }
}
