use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, Sink};

/// Decode and play an MP3 clip to the default output device, blocking until
/// playback finishes. Run this under `spawn_blocking`.
pub fn play_mp3(path: &Path) -> Result<()> {
    let (_stream, handle) =
        OutputStream::try_default().context("no default audio output device")?;
    let sink = Sink::try_new(&handle).context("failed to open audio sink")?;

    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open audio clip {}", path.display()))?;
    let source = Decoder::new(BufReader::new(file)).context("failed to decode audio clip")?;

    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}
