use std::f32::consts::TAU;
use std::io::Write;
use std::time::Duration;

pub const VIBRATION: Duration = Duration::from_millis(200);

// Tone
//------------------------------------------------------------------------------

/// A sine beep whose gain decays exponentially over its duration.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Tone {
    pub frequency: f32,
    pub duration: Duration,
    pub gain: f32,
    pub end_gain: f32,
}

impl Default for Tone {
    fn default() -> Self {
        Self { frequency: 800.0, duration: Duration::from_millis(300), gain: 0.3, end_gain: 0.01 }
    }
}

impl Tone {
    pub fn gain_at(&self, t: f32) -> f32 {
        let len = self.duration.as_secs_f32();
        if len <= 0.0 {
            return self.gain;
        }
        let progress = (t / len).clamp(0.0, 1.0);
        self.gain * (self.end_gain / self.gain).powf(progress)
    }

    /// Mono PCM samples in [-1, 1].
    pub fn samples(&self, sample_rate: u32) -> Vec<f32> {
        let count = (self.duration.as_secs_f32() * sample_rate as f32).round() as usize;
        (0..count)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (TAU * self.frequency * t).sin() * self.gain_at(t)
            })
            .collect()
    }
}

// Feedback sink
//------------------------------------------------------------------------------

/// Where scan confirmations go.
pub trait Feedback {
    /// Sinks with an audio device can render the tone with [`Tone::samples`].
    fn play_tone(&mut self, tone: &Tone);

    fn vibrate(&mut self, duration: Duration);
}

/// Rings the terminal bell. Vibration is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalFeedback;

impl Feedback for TerminalFeedback {
    /// A terminal cannot play PCM, so the bell stands in for the waveform and
    /// the tone's frequency and duration are only logged.
    fn play_tone(&mut self, tone: &Tone) {
        tracing::debug!(frequency = tone.frequency, ms = tone.duration.as_millis() as u64, "Playing tone");
        let mut err = std::io::stderr();
        if let Err(e) = err.write_all(b"\x07").and_then(|_| err.flush()) {
            tracing::warn!(error = %e, "Could not ring terminal bell");
        }
    }

    fn vibrate(&mut self, duration: Duration) {
        tracing::debug!(ms = duration.as_millis() as u64, "Vibration requested");
    }
}

/// Discards all feedback.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Feedback for Silent {
    fn play_tone(&mut self, _: &Tone) {}

    fn vibrate(&mut self, _: Duration) {}
}
