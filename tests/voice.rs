//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;

use fable_gateway::voice::{CaptureState, SAMPLE_RATE, UtteranceDetector, samples_to_wav};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed samples to the detector in 100ms chunks, as live capture would
fn feed(detector: &mut UtteranceDetector, samples: &[f32]) -> bool {
    let chunk_size = SAMPLE_RATE as usize / 10;
    for chunk in samples.chunks(chunk_size) {
        if detector.push(chunk) {
            return true;
        }
    }
    false
}

#[test]
fn test_detector_completes_on_spoken_phrase() {
    let mut detector = UtteranceDetector::new();

    let speech = generate_sine_samples(440.0, 0.6, 0.3);
    assert!(!feed(&mut detector, &speech));
    assert_eq!(detector.state(), CaptureState::Capturing);

    let silence = generate_silence(0.7);
    assert!(feed(&mut detector, &silence));
    assert_eq!(detector.state(), CaptureState::Complete);

    let samples = detector.take_samples();
    assert!(samples.len() >= speech.len());
    assert_eq!(detector.state(), CaptureState::Waiting);
}

#[test]
fn test_detector_ignores_quiet_ambient_tone() {
    let mut detector = UtteranceDetector::new();

    // Audible to a microphone, but well under the speech threshold
    let hum = generate_sine_samples(60.0, 1.0, 0.01);
    assert!(!feed(&mut detector, &hum));
    assert_eq!(detector.state(), CaptureState::Waiting);
    assert!(detector.take_samples().is_empty());
}

#[test]
fn test_detector_discards_brief_noise() {
    let mut detector = UtteranceDetector::new();

    let pop = generate_sine_samples(1000.0, 0.1, 0.5);
    feed(&mut detector, &pop);
    assert_eq!(detector.state(), CaptureState::Capturing);

    // Over a second of silence: the pop never becomes an utterance
    let silence = generate_silence(1.2);
    assert!(!feed(&mut detector, &silence));
    assert_eq!(detector.state(), CaptureState::Waiting);
}

#[test]
fn test_detector_reset_discards_samples() {
    let mut detector = UtteranceDetector::new();

    feed(&mut detector, &generate_sine_samples(440.0, 0.4, 0.3));
    assert_eq!(detector.state(), CaptureState::Capturing);

    detector.reset();
    assert_eq!(detector.state(), CaptureState::Waiting);
    assert!(detector.take_samples().is_empty());
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    // WAV should have reasonable size
    assert!(wav_data.len() > 44); // WAV header is 44 bytes
}

#[test]
fn test_wav_roundtrip() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    // Read WAV back
    let cursor = Cursor::new(wav_data);
    let mut reader = hound::WavReader::new(cursor).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    // Read samples back
    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
}
