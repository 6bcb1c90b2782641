//! One-shot speech capture
//!
//! Listens for a single player utterance: waits for speech energy,
//! accumulates samples until a trailing silence, then transcribes the
//! segment. There is no wake word; the player explicitly asks to listen.

use std::time::{Duration, Instant};

use crate::voice::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use crate::voice::stt::SpeechToText;
use crate::{Error, Result};

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to count as an utterance (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends an utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Give up if no complete utterance arrives within this window
const MAX_CAPTURE_SECS: u64 = 15;

/// How often buffered samples are pulled from the capture device
const CAPTURE_POLL: Duration = Duration::from_millis(100);

/// State of the utterance detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Waiting for speech energy
    Waiting,
    /// Speech detected, accumulating samples
    Capturing,
    /// Utterance complete (speech followed by silence)
    Complete,
}

/// Segments a single utterance out of a live sample stream
///
/// Speech and silence are tallied separately, so trailing silence never
/// pushes a noise blip over the minimum-speech bar.
pub struct UtteranceDetector {
    state: CaptureState,
    samples: Vec<f32>,
    speech_run: usize,
    silence_run: usize,
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceDetector {
    /// Create a detector in the waiting state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CaptureState::Waiting,
            samples: Vec::new(),
            speech_run: 0,
            silence_run: 0,
        }
    }

    /// Feed a chunk of samples, returning true once the utterance is complete
    pub fn push(&mut self, chunk: &[f32]) -> bool {
        let energy = rms_energy(chunk);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            CaptureState::Waiting => {
                if is_speech {
                    self.state = CaptureState::Capturing;
                    self.samples.clear();
                    self.samples.extend_from_slice(chunk);
                    self.speech_run = chunk.len();
                    self.silence_run = 0;
                    tracing::trace!(energy, "speech detected, capturing");
                }
            }
            CaptureState::Capturing => {
                self.samples.extend_from_slice(chunk);

                if is_speech {
                    self.speech_run += chunk.len();
                    self.silence_run = 0;
                } else {
                    self.silence_run += chunk.len();
                }

                tracing::trace!(
                    buffered = self.samples.len(),
                    speech = self.speech_run,
                    silence = self.silence_run,
                    energy,
                    "capturing"
                );

                if self.silence_run > SILENCE_SAMPLES && self.speech_run > MIN_SPEECH_SAMPLES {
                    self.state = CaptureState::Complete;
                    tracing::debug!(samples = self.samples.len(), "utterance complete");
                    return true;
                }

                // Long silence without enough speech: likely a noise blip
                if self.silence_run > SILENCE_SAMPLES * 2 {
                    tracing::trace!("noise blip, resetting");
                    self.reset();
                }
            }
            CaptureState::Complete => {}
        }

        false
    }

    /// Take the accumulated samples, resetting the detector
    pub fn take_samples(&mut self) -> Vec<f32> {
        self.speech_run = 0;
        self.silence_run = 0;
        self.state = CaptureState::Waiting;
        std::mem::take(&mut self.samples)
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> CaptureState {
        self.state
    }

    /// Reset to the waiting state, discarding samples
    pub fn reset(&mut self) {
        self.state = CaptureState::Waiting;
        self.samples.clear();
        self.speech_run = 0;
        self.silence_run = 0;
    }
}

/// Captures one utterance from the microphone and transcribes it
pub struct Listener {
    stt: SpeechToText,
}

impl Listener {
    /// Create a listener over the given transcription backend
    #[must_use]
    pub const fn new(stt: SpeechToText) -> Self {
        Self { stt }
    }

    /// Listen for one utterance and return its transcript
    ///
    /// Blocks (asynchronously) until a complete utterance is heard or
    /// the capture window expires.
    ///
    /// # Errors
    ///
    /// Returns error if the microphone cannot be opened, nothing is
    /// said within the window, or transcription fails.
    #[allow(clippy::future_not_send)] // holds a cpal stream across awaits
    pub async fn listen(&self) -> Result<String> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;

        let mut detector = UtteranceDetector::new();
        let deadline = Instant::now() + Duration::from_secs(MAX_CAPTURE_SECS);

        let samples = loop {
            tokio::time::sleep(CAPTURE_POLL).await;

            let chunk = capture.take_samples();
            if !chunk.is_empty() && detector.push(&chunk) {
                break detector.take_samples();
            }

            if Instant::now() >= deadline {
                // Use a partial utterance if one was underway
                let partial = detector.take_samples();
                if partial.len() > MIN_SPEECH_SAMPLES {
                    break partial;
                }
                capture.stop();
                return Err(Error::Stt("no speech detected".to_string()));
            }
        };

        capture.stop();

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        self.stt.transcribe(&wav).await
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_calculation() {
        let silence = vec![0.0f32; 100];
        assert!(rms_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(rms_energy(&loud) > 0.4);
    }

    #[test]
    fn silence_alone_never_starts_capture() {
        let mut detector = UtteranceDetector::new();
        let silence = vec![0.0f32; 1600];

        for _ in 0..20 {
            assert!(!detector.push(&silence));
        }
        assert_eq!(detector.state(), CaptureState::Waiting);
    }

    #[test]
    fn speech_then_silence_completes_utterance() {
        let mut detector = UtteranceDetector::new();
        let speech = vec![0.2f32; 1600]; // 100ms chunks
        let silence = vec![0.0f32; 1600];

        // 0.5s of speech, past the minimum length
        for _ in 0..5 {
            assert!(!detector.push(&speech));
        }
        assert_eq!(detector.state(), CaptureState::Capturing);

        // 0.6s of silence ends the utterance
        let mut complete = false;
        for _ in 0..6 {
            if detector.push(&silence) {
                complete = true;
                break;
            }
        }
        assert!(complete);
        assert_eq!(detector.state(), CaptureState::Complete);

        let samples = detector.take_samples();
        assert!(samples.len() > MIN_SPEECH_SAMPLES);
        assert_eq!(detector.state(), CaptureState::Waiting);
    }

    #[test]
    fn short_blip_resets_to_waiting() {
        let mut detector = UtteranceDetector::new();
        let blip = vec![0.2f32; 1600]; // 100ms, under the speech minimum
        let silence = vec![0.0f32; 1600];

        assert!(!detector.push(&blip));
        assert_eq!(detector.state(), CaptureState::Capturing);

        // Over a second of silence: the blip is discarded
        for _ in 0..12 {
            assert!(!detector.push(&silence));
        }
        assert_eq!(detector.state(), CaptureState::Waiting);
    }

    #[test]
    fn trailing_silence_does_not_count_as_speech() {
        let mut detector = UtteranceDetector::new();
        let blip = vec![0.2f32; 1600];
        let silence = vec![0.0f32; 800];

        detector.push(&blip);

        // Fine-grained silence: lots of buffered samples, no new speech
        for _ in 0..10 {
            assert!(!detector.push(&silence));
        }
        assert_ne!(detector.state(), CaptureState::Complete);
    }
}
