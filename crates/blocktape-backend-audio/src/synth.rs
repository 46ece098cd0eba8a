//! Track renderer: voices, mix, and mastering for every frame.

use blocktape_spec::hash::derive_component_seed;
use blocktape_spec::{MusicParameters, SampleBuffer};
use tracing::debug;

use crate::config::SynthConfig;
use crate::effects::{MasteringChain, MasteringSettings};
use crate::error::AudioResult;
use crate::mixer::{mix, to_i16, VoiceSamples};
use crate::voices::{bass, chords, drums, melody, Arrangement, FrameClock, VinylTexture};

/// Mix bus gain before mastering, leaving room for summed voices.
const HEADROOM: f64 = 0.5;
/// Fade applied at both ends of the render to avoid clicks.
const EDGE_FADE_SECONDS: f64 = 0.02;

/// Renders [`MusicParameters`] to interleaved 16-bit stereo.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: SynthConfig,
}

impl Synthesizer {
    /// Creates a synthesizer after checking the configuration.
    pub fn new(config: SynthConfig) -> AudioResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Frames that [`Synthesizer::synthesize`] will produce for `params`.
    ///
    /// The structural length is honored up to the configured cap.
    pub fn frame_count(&self, params: &MusicParameters) -> u64 {
        let seconds = params
            .requested_duration_seconds()
            .min(self.config.duration_cap())
            .max(0.0);
        (seconds * self.config.sample_rate as f64).floor() as u64
    }

    /// Renders a full track.
    ///
    /// Malformed fields degrade to defaults, so this only fails on an
    /// invalid configuration.
    pub fn synthesize(&self, params: &MusicParameters) -> AudioResult<SampleBuffer> {
        self.config.validate()?;

        let sample_rate = self.config.sample_rate;
        let num_frames = self.frame_count(params);
        let arr = Arrangement::from_params(params);
        let mut chain = MasteringChain::new(MasteringSettings::from_params(params), sample_rate);

        let vinyl = (params.features.vinyl_texture && self.config.vinyl_enabled)
            .then(|| VinylTexture::new(&params.seed, num_frames, sample_rate));
        let snare_seed = derive_component_seed(&params.seed, "snare");
        let hihat_seed = derive_component_seed(&params.seed, "hihat");

        let volume = if params.volume.is_finite() {
            params.volume.clamp(0.0, 1.0)
        } else {
            0.7
        };
        let gain = volume * HEADROOM;
        let fade_frames = (EDGE_FADE_SECONDS * sample_rate as f64) as u64;

        debug!(
            seed = %params.seed,
            tempo = params.tempo,
            frames = num_frames,
            vinyl = vinyl.is_some(),
            "synthesizing track"
        );

        let mut samples = Vec::with_capacity(num_frames as usize * 2);
        for index in 0..num_frames {
            let clock = FrameClock::new(index, sample_rate, arr.seconds_per_beat);
            let section = arr.section_at(clock.beat).mix();

            let voices = VoiceSamples {
                kick: section.drums * drums::kick(&arr.patterns.kick, &clock, arr.swing),
                snare: section.drums
                    * drums::snare(&arr.patterns.snare, &clock, arr.swing, snare_seed),
                hihat: section.drums
                    * drums::hihat(&arr.patterns.hihat, &clock, arr.swing, hihat_seed),
                bass: section.bass * bass::bass(&arr, &clock),
                chords: section.chords * chords::chords(&arr, &clock),
                melody: section.melody * melody::melody(&arr, &clock),
                texture: vinyl.as_ref().map_or(0.0, |v| v.sample(index)),
            };

            let edge = edge_gain(index, num_frames, fade_frames);
            let frame = chain.process(index, mix(&voices, gain * edge));
            samples.push(to_i16(frame.left));
            samples.push(to_i16(frame.right));
        }

        Ok(SampleBuffer {
            samples,
            sample_rate,
            channels: blocktape_spec::CHANNELS,
        })
    }
}

/// Linear fade over the first and last `fade` frames.
fn edge_gain(index: u64, total: u64, fade: u64) -> f64 {
    if fade == 0 {
        return 1.0;
    }
    let from_start = index as f64 / fade as f64;
    let from_end = total.saturating_sub(index + 1) as f64 / fade as f64;
    from_start.min(from_end).min(1.0)
}

/// Renders with the default configuration.
pub fn synthesize(params: &MusicParameters) -> AudioResult<SampleBuffer> {
    Synthesizer::default().synthesize(params)
}
