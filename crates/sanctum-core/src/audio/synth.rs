//! Parametric cue synthesis.
//!
//! A cue is a list of [`Layer`]s. Each layer is one source (oscillator or
//! white noise), an optional biquad filter, and a gain envelope, placed at an
//! offset inside the cue. Layers are rendered independently and summed.

use std::f32::consts::PI;

use rand::Rng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample at `phase` in cycles (0.0..1.0).
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * (phase - (phase + 0.5).floor()),
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// Parameter automation over the first `duration_s` of a layer, then held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ramp {
    Constant(f32),
    Linear { from: f32, to: f32, duration_s: f32 },
    /// Endpoints must be positive.
    Exponential { from: f32, to: f32, duration_s: f32 },
}

impl Ramp {
    pub fn value_at(&self, t: f32) -> f32 {
        match *self {
            Ramp::Constant(v) => v,
            Ramp::Linear {
                from,
                to,
                duration_s,
            } => from + (to - from) * progress(t, duration_s),
            Ramp::Exponential {
                from,
                to,
                duration_s,
            } => {
                let from = from.max(f32::MIN_POSITIVE);
                let to = to.max(f32::MIN_POSITIVE);
                from * (to / from).powf(progress(t, duration_s))
            }
        }
    }
}

fn progress(t: f32, duration_s: f32) -> f32 {
    if duration_s <= 0.0 {
        1.0
    } else {
        (t / duration_s).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Straight line down to silence.
    Linear,
    /// Exponential decay down to `floor` of the peak.
    Exponential { floor_millis: u16 },
}

/// Attack to `peak`, then release until `end_s` (layer-relative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub peak: f32,
    pub attack_s: f32,
    pub end_s: f32,
    pub release: Release,
}

impl Envelope {
    /// Instant attack, exponential decay to 1/1000 of the peak.
    pub fn percussive(peak: f32, end_s: f32) -> Self {
        Self {
            peak,
            attack_s: 0.0,
            end_s,
            release: Release::Exponential { floor_millis: 1 },
        }
    }

    pub fn linear_out(peak: f32, end_s: f32) -> Self {
        Self {
            peak,
            attack_s: 0.0,
            end_s,
            release: Release::Linear,
        }
    }

    pub fn with_attack(mut self, attack_s: f32) -> Self {
        self.attack_s = attack_s;
        self
    }

    pub fn with_floor(mut self, floor_millis: u16) -> Self {
        self.release = Release::Exponential { floor_millis };
        self
    }

    pub fn gain_at(&self, t: f32) -> f32 {
        if t < 0.0 || t >= self.end_s {
            return 0.0;
        }
        if self.attack_s > 0.0 && t < self.attack_s {
            return self.peak * t / self.attack_s;
        }
        let release_len = (self.end_s - self.attack_s).max(f32::EPSILON);
        let u = ((t - self.attack_s) / release_len).clamp(0.0, 1.0);
        match self.release {
            Release::Linear => self.peak * (1.0 - u),
            Release::Exponential { floor_millis } => {
                let floor = (floor_millis.max(1) as f32) / 1000.0;
                self.peak * floor.powf(u)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Filter {
    pub kind: FilterKind,
    pub cutoff: Ramp,
    pub q: f32,
}

impl Filter {
    pub fn low_pass(cutoff: f32) -> Self {
        Self {
            kind: FilterKind::LowPass,
            cutoff: Ramp::Constant(cutoff),
            q: std::f32::consts::FRAC_1_SQRT_2,
        }
    }

    pub fn high_pass(cutoff: f32) -> Self {
        Self {
            kind: FilterKind::HighPass,
            cutoff: Ramp::Constant(cutoff),
            q: std::f32::consts::FRAC_1_SQRT_2,
        }
    }

    pub fn band_pass(center: f32, q: f32) -> Self {
        Self {
            kind: FilterKind::BandPass,
            cutoff: Ramp::Constant(center),
            q,
        }
    }

    pub fn sweeping(mut self, cutoff: Ramp) -> Self {
        self.cutoff = cutoff;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    Oscillator { waveform: Waveform, frequency: Ramp },
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub source: Source,
    pub filter: Option<Filter>,
    pub envelope: Envelope,
    /// Offset inside the cue, seconds.
    pub start_s: f32,
}

impl Layer {
    pub fn oscillator(waveform: Waveform, frequency: Ramp, envelope: Envelope) -> Self {
        Self {
            source: Source::Oscillator {
                waveform,
                frequency,
            },
            filter: None,
            envelope,
            start_s: 0.0,
        }
    }

    pub fn noise(envelope: Envelope) -> Self {
        Self {
            source: Source::Noise,
            filter: None,
            envelope,
            start_s: 0.0,
        }
    }

    pub fn filtered(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn at(mut self, start_s: f32) -> Self {
        self.start_s = start_s;
        self
    }

    pub fn end_s(&self) -> f32 {
        self.start_s + self.envelope.end_s
    }
}

/// Mono PCM, samples in -1.0..=1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct CueBuffer {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl CueBuffer {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
        (sum / self.samples.len() as f64).sqrt() as f32
    }

    pub fn scale(&mut self, gain: f32) {
        if (gain - 1.0).abs() < f32::EPSILON {
            return;
        }
        for s in &mut self.samples {
            *s = (*s * gain).clamp(-1.0, 1.0);
        }
    }
}

/// RBJ cookbook biquad, direct form I.
#[derive(Debug, Default, Clone, Copy)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    fn set(&mut self, kind: FilterKind, frequency: f32, q: f32, sample_rate: f32) {
        let frequency = frequency.clamp(10.0, sample_rate * 0.49);
        let w0 = 2.0 * PI * frequency / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q.max(0.01));

        let (b0, b1, b2) = match kind {
            FilterKind::LowPass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
            FilterKind::HighPass => ((1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0),
            FilterKind::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// Cutoff sweeps recompute coefficients every this many samples.
const FILTER_UPDATE_INTERVAL: usize = 32;

/// Renders layers to PCM.
#[derive(Debug, Clone)]
pub struct Synth {
    sample_rate: u32,
    rng: Pcg64,
}

impl Synth {
    pub fn new(sample_rate: u32, rng: Pcg64) -> Self {
        Self { sample_rate, rng }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn rng_mut(&mut self) -> &mut Pcg64 {
        &mut self.rng
    }

    pub fn render(&mut self, layers: &[Layer]) -> CueBuffer {
        let sr = self.sample_rate as f32;
        let total_s = layers.iter().map(Layer::end_s).fold(0.0f32, f32::max);
        let mut mix = vec![0.0f32; (total_s * sr).ceil() as usize];

        for layer in layers {
            let offset = (layer.start_s.max(0.0) * sr).round() as usize;
            let len = (layer.envelope.end_s.max(0.0) * sr).ceil() as usize;
            let mut phase = 0.0f32;
            let mut biquad = Biquad::default();

            for i in 0..len {
                let Some(slot) = mix.get_mut(offset + i) else {
                    break;
                };
                let t = i as f32 / sr;

                let raw = match layer.source {
                    Source::Oscillator {
                        waveform,
                        frequency,
                    } => {
                        let sample = waveform.sample(phase);
                        phase = (phase + frequency.value_at(t) / sr).fract();
                        sample
                    }
                    Source::Noise => self.rng.gen_range(-1.0f32..1.0),
                };

                let filtered = match layer.filter {
                    Some(filter) => {
                        if i % FILTER_UPDATE_INTERVAL == 0 {
                            biquad.set(filter.kind, filter.cutoff.value_at(t), filter.q, sr);
                        }
                        biquad.process(raw)
                    }
                    None => raw,
                };

                *slot += filtered * layer.envelope.gain_at(t);
            }
        }

        for s in &mut mix {
            *s = s.clamp(-1.0, 1.0);
        }
        CueBuffer {
            sample_rate: self.sample_rate,
            samples: mix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn synth() -> Synth {
        Synth::new(8_000, Pcg64::seed_from_u64(7))
    }

    #[test]
    fn exponential_ramp_hits_endpoints() {
        let ramp = Ramp::Exponential {
            from: 150.0,
            to: 20.0,
            duration_s: 0.5,
        };
        assert!((ramp.value_at(0.0) - 150.0).abs() < 1e-3);
        assert!((ramp.value_at(0.5) - 20.0).abs() < 1e-3);
        assert!((ramp.value_at(2.0) - 20.0).abs() < 1e-3);
    }

    #[test]
    fn percussive_envelope_decays() {
        let env = Envelope::percussive(0.8, 0.6);
        assert!((env.gain_at(0.0) - 0.8).abs() < 1e-6);
        assert!(env.gain_at(0.3) < 0.8);
        assert!(env.gain_at(0.599) < 0.01);
        assert_eq!(env.gain_at(0.6), 0.0);
    }

    #[test]
    fn attack_ramps_up_linearly() {
        let env = Envelope::percussive(1.0, 0.8).with_attack(0.1);
        assert_eq!(env.gain_at(0.0), 0.0);
        assert!((env.gain_at(0.05) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn render_length_covers_latest_layer() {
        let mut s = synth();
        let buffer = s.render(&[
            Layer::oscillator(Waveform::Sine, Ramp::Constant(440.0), Envelope::percussive(0.5, 0.2)),
            Layer::noise(Envelope::percussive(0.2, 0.25)).at(0.25),
        ]);
        assert_eq!(buffer.samples.len(), 4_000);
        assert_eq!(buffer.duration_ms(), 500);
    }

    #[test]
    fn output_is_clamped() {
        let mut s = synth();
        let loud = Envelope::linear_out(1.0, 0.1);
        let buffer = s.render(&[
            Layer::oscillator(Waveform::Square, Ramp::Constant(100.0), loud),
            Layer::oscillator(Waveform::Square, Ramp::Constant(100.0), loud),
        ]);
        assert!(buffer.peak() <= 1.0);
    }

    #[test]
    fn low_pass_attenuates_noise() {
        let mut s = synth();
        let env = Envelope::linear_out(0.5, 0.5);
        let dry = s.render(&[Layer::noise(env)]);
        let wet = s.render(&[Layer::noise(env).filtered(Filter::low_pass(200.0))]);
        assert!(wet.rms() < dry.rms());
    }

    #[test]
    fn waveforms_stay_in_range() {
        for waveform in [Waveform::Sine, Waveform::Square, Waveform::Sawtooth, Waveform::Triangle] {
            for i in 0..100 {
                let v = waveform.sample(i as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&v), "{waveform:?} out of range: {v}");
            }
        }
    }

    #[test]
    fn scale_applies_master_gain() {
        let mut buffer = CueBuffer {
            sample_rate: 8_000,
            samples: vec![0.5, -0.5],
        };
        buffer.scale(0.5);
        assert_eq!(buffer.samples, vec![0.25, -0.25]);
    }
}
