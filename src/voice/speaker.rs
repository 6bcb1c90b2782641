//! Spoken narration with cancellation
//!
//! A [`Speaker`] owns the TTS backend and at most one in-flight
//! utterance. Starting a new utterance cancels the previous one, so
//! narration never overlaps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;

use crate::Result;
use crate::voice::playback::AudioPlayback;
use crate::voice::tts::TextToSpeech;

/// One playing utterance
struct Utterance {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Speaks narration aloud, one utterance at a time
pub struct Speaker {
    tts: Arc<TextToSpeech>,
    current: Option<Utterance>,
}

impl Speaker {
    /// Create a speaker over the given TTS backend
    #[must_use]
    pub fn new(tts: TextToSpeech) -> Self {
        Self {
            tts: Arc::new(tts),
            current: None,
        }
    }

    /// Speak the given text, cancelling any utterance already playing
    ///
    /// Returns once synthesis is done and playback has been handed to a
    /// background task. Playback failures are logged, not returned; the
    /// audio device may come and go without affecting the game.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn speak(&mut self, text: &str) -> Result<()> {
        self.stop();

        if text.trim().is_empty() {
            return Ok(());
        }

        let audio = self.tts.synthesize(text).await?;

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        // Playback blocks a thread; cancellation is the flag, since a
        // blocking closure cannot be aborted once running
        let handle = tokio::task::spawn_blocking(move || {
            let playback = match AudioPlayback::new() {
                Ok(playback) => playback,
                Err(e) => {
                    tracing::error!(error = %e, "audio playback unavailable");
                    return;
                }
            };

            if let Err(e) = playback.play_mp3_until(&audio, &flag) {
                tracing::error!(error = %e, "speech playback failed");
            }
        });

        self.current = Some(Utterance { cancel, handle });
        Ok(())
    }

    /// Stop the current utterance, if any
    pub fn stop(&mut self) {
        if let Some(utterance) = self.current.take() {
            utterance.cancel.store(true, Ordering::Relaxed);
            tracing::debug!("speech cancelled");
        }
    }

    /// Whether an utterance is still playing
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|utterance| !utterance.handle.is_finished())
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        self.stop();
    }
}
