use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::synth::{Envelope, Filter, Layer, Ramp, Waveform};

/// Short fire-and-forget sound tied to a discrete event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CueKind {
    DoorSlam,
    Unlock,
    Grind,
    GlassClink,
    FolderOpen,
    StampImpact,
    CountdownTick,
    Explosion,
    Applause,
    Crackle,
    /// Button confirmation on the voucher screen.
    MetallicClick,
}

impl CueKind {
    pub const ALL: [CueKind; 11] = [
        CueKind::DoorSlam,
        CueKind::Unlock,
        CueKind::Grind,
        CueKind::GlassClink,
        CueKind::FolderOpen,
        CueKind::StampImpact,
        CueKind::CountdownTick,
        CueKind::Explosion,
        CueKind::Applause,
        CueKind::Crackle,
        CueKind::MetallicClick,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CueKind::DoorSlam => "door-slam",
            CueKind::Unlock => "unlock",
            CueKind::Grind => "grind",
            CueKind::GlassClink => "glass-clink",
            CueKind::FolderOpen => "folder-open",
            CueKind::StampImpact => "stamp-impact",
            CueKind::CountdownTick => "countdown-tick",
            CueKind::Explosion => "explosion",
            CueKind::Applause => "applause",
            CueKind::Crackle => "crackle",
            CueKind::MetallicClick => "metallic-click",
        }
    }

    /// Vibration pattern (on/off milliseconds) played alongside the cue.
    pub fn haptic_pattern(self) -> Option<&'static [u32]> {
        match self {
            CueKind::DoorSlam => Some(&[200]),
            CueKind::Unlock => Some(&[30, 50, 30]),
            CueKind::Grind => Some(&[100]),
            CueKind::GlassClink => Some(&[30, 50, 30]),
            CueKind::MetallicClick => Some(&[50]),
            _ => None,
        }
    }

    /// Synthesis recipe. `intensity` detunes the glass; `rng` varies claps,
    /// crackles and detune.
    pub fn layers<R: Rng>(self, intensity: u32, rng: &mut R) -> Vec<Layer> {
        match self {
            CueKind::DoorSlam => vec![Layer::oscillator(
                Waveform::Square,
                Ramp::Exponential {
                    from: 50.0,
                    to: 10.0,
                    duration_s: 0.6,
                },
                Envelope::percussive(0.8, 0.6),
            )],
            CueKind::Unlock => vec![Layer::oscillator(
                Waveform::Square,
                Ramp::Constant(60.0),
                Envelope::linear_out(0.1, 0.5),
            )],
            CueKind::Grind => vec![Layer::oscillator(
                Waveform::Sawtooth,
                Ramp::Constant(40.0),
                Envelope::linear_out(0.05, 3.0),
            )],
            CueKind::GlassClink => glass_layers(intensity, rng),
            CueKind::FolderOpen => vec![Layer::noise(
                Envelope::percussive(1.0, 0.8)
                    .with_attack(0.1)
                    .with_floor(10),
            )
            .filtered(Filter::low_pass(1_200.0))],
            CueKind::StampImpact => vec![
                Layer::oscillator(
                    Waveform::Sine,
                    Ramp::Exponential {
                        from: 150.0,
                        to: 40.0,
                        duration_s: 0.1,
                    },
                    Envelope::percussive(1.0, 0.2).with_floor(10),
                ),
                Layer::noise(Envelope::percussive(0.5, 0.1).with_floor(20))
                    .filtered(Filter::high_pass(1_000.0)),
            ],
            CueKind::CountdownTick => vec![
                Layer::oscillator(
                    Waveform::Sine,
                    Ramp::Constant(2_000.0),
                    Envelope::percussive(0.3, 0.15),
                ),
                // Echo
                Layer::oscillator(
                    Waveform::Sine,
                    Ramp::Constant(1_000.0),
                    Envelope::percussive(0.05, 0.4),
                )
                .at(0.1),
            ],
            CueKind::Explosion => vec![
                Layer::oscillator(
                    Waveform::Sine,
                    Ramp::Exponential {
                        from: 150.0,
                        to: 20.0,
                        duration_s: 0.5,
                    },
                    Envelope::percussive(1.0, 1.0),
                ),
                Layer::noise(Envelope::percussive(0.8, 2.5)).filtered(
                    Filter::low_pass(3_000.0).sweeping(Ramp::Exponential {
                        from: 3_000.0,
                        to: 100.0,
                        duration_s: 2.0,
                    }),
                ),
            ],
            CueKind::Applause => applause_layers(rng),
            CueKind::Crackle => vec![Layer::oscillator(
                Waveform::Sawtooth,
                Ramp::Constant(rng.gen_range(400.0..1_400.0)),
                Envelope::percussive(0.08, 0.05),
            )
            .filtered(Filter::high_pass(2_000.0))],
            CueKind::MetallicClick => {
                let mut layers: Vec<Layer> = [800.0, 1_200.0, 2_400.0]
                    .iter()
                    .enumerate()
                    .map(|(i, &f)| {
                        let waveform = if i == 0 { Waveform::Square } else { Waveform::Sine };
                        Layer::oscillator(
                            waveform,
                            Ramp::Constant(f),
                            Envelope::percussive(0.1 / (i as f32 + 1.0), 0.15),
                        )
                    })
                    .collect();
                layers.push(Layer::oscillator(
                    Waveform::Triangle,
                    Ramp::Exponential {
                        from: 100.0,
                        to: 40.0,
                        duration_s: 0.1,
                    },
                    Envelope::percussive(0.5, 0.1),
                ));
                layers
            }
        }
    }
}

const GLASS_PARTIALS: [f32; 5] = [2_000.0, 2_400.0, 3_200.0, 4_800.0, 8_000.0];

/// Crystal ring. Sober glasses hold pitch; each intensity level slides the
/// partials further during the ring.
fn glass_layers<R: Rng>(intensity: u32, rng: &mut R) -> Vec<Layer> {
    GLASS_PARTIALS
        .iter()
        .enumerate()
        .map(|(i, &f)| {
            let frequency = if intensity == 0 {
                Ramp::Constant(f)
            } else {
                let detune = rng.gen_range(-25.0..25.0) + intensity as f32 * 100.0;
                Ramp::Linear {
                    from: f,
                    to: f + detune,
                    duration_s: 1.5,
                }
            };
            let peak = 0.3 / (i as f32 + 1.0);
            let decay_end = 2.0 - i as f32 * 0.2;
            Layer::oscillator(
                Waveform::Sine,
                frequency,
                Envelope::percussive(peak, decay_end).with_attack(0.01),
            )
        })
        .collect()
}

/// Muffled crowd bed plus randomized band-passed claps.
fn applause_layers<R: Rng>(rng: &mut R) -> Vec<Layer> {
    let mut layers = vec![Layer::noise(
        Envelope::percussive(0.1, 4.0)
            .with_attack(0.5)
            .with_floor(100),
    )
    .filtered(Filter::low_pass(800.0))];

    let clap = |rng: &mut R, window_s: f32| {
        let center = rng.gen_range(800.0..2_000.0);
        let peak = rng.gen_range(0.1..0.3);
        Layer::noise(Envelope::percussive(peak, 0.15))
            .filtered(Filter::band_pass(center, 1.0))
            .at(rng.gen_range(0.0..window_s))
    };
    for _ in 0..60 {
        layers.push(clap(&mut *rng, 3.0));
    }
    // Opening burst
    for _ in 0..15 {
        layers.push(clap(&mut *rng, 0.5));
    }
    layers
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CueKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown cue '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use crate::audio::synth::Source;

    #[test]
    fn names_roundtrip() {
        for kind in CueKind::ALL {
            assert_eq!(kind.as_str().parse::<CueKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("gong".parse::<CueKind>().is_err());
    }

    #[test]
    fn every_cue_has_layers() {
        let mut rng = Pcg64::seed_from_u64(1);
        for kind in CueKind::ALL {
            assert!(!kind.layers(0, &mut rng).is_empty(), "{kind} has no layers");
        }
    }

    #[test]
    fn sober_glass_holds_pitch() {
        let mut rng = Pcg64::seed_from_u64(1);
        let layers = CueKind::GlassClink.layers(0, &mut rng);
        assert_eq!(layers.len(), GLASS_PARTIALS.len());
        assert!(layers.iter().all(|l| matches!(
            l.source,
            Source::Oscillator {
                frequency: Ramp::Constant(_),
                ..
            }
        )));
    }

    #[test]
    fn tipsy_glass_slides_up() {
        let mut rng = Pcg64::seed_from_u64(1);
        let layers = CueKind::GlassClink.layers(3, &mut rng);
        for layer in layers {
            match layer.source {
                Source::Oscillator {
                    frequency: Ramp::Linear { from, to, .. },
                    ..
                } => assert!(to - from > 250.0),
                other => panic!("unexpected source {other:?}"),
            }
        }
    }

    #[test]
    fn applause_has_bed_and_claps() {
        let mut rng = Pcg64::seed_from_u64(9);
        let layers = CueKind::Applause.layers(0, &mut rng);
        assert_eq!(layers.len(), 1 + 60 + 15);
        assert!(layers.iter().all(|l| l.start_s < 3.0));
    }

    #[test]
    fn haptics_only_for_tactile_cues() {
        assert_eq!(CueKind::DoorSlam.haptic_pattern(), Some(&[200u32][..]));
        assert_eq!(CueKind::Explosion.haptic_pattern(), None);
    }
}
