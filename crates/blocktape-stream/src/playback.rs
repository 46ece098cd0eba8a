//! Playback sinks and the linear crossfade.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use blocktape_spec::{GeneratedTrack, SampleBuffer};

use crate::error::StreamResult;

/// Receives the audio the session is playing.
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    /// Starts playing a track from silence.
    async fn play(&self, track: &GeneratedTrack) -> StreamResult<()>;

    /// Fades from the playing track to `to` over `duration`.
    ///
    /// Returns once the fade is complete.
    async fn crossfade(
        &self,
        from: &GeneratedTrack,
        to: &GeneratedTrack,
        duration: Duration,
    ) -> StreamResult<()>;

    /// Releases playback resources.
    async fn stop(&self);
}

/// Discards all audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl PlaybackSink for NullSink {
    async fn play(&self, _track: &GeneratedTrack) -> StreamResult<()> {
        Ok(())
    }

    async fn crossfade(
        &self,
        _from: &GeneratedTrack,
        _to: &GeneratedTrack,
        _duration: Duration,
    ) -> StreamResult<()> {
        Ok(())
    }

    async fn stop(&self) {}
}

/// What a [`RecordingSink`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Play {
        track_id: String,
    },
    Crossfade {
        from: String,
        to: String,
        duration: Duration,
        /// Frames in the rendered overlap.
        frames: usize,
    },
    Stop,
}

/// Records playback calls and renders each crossfade overlap.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PlaybackEvent>>,
    last_fade: Mutex<Option<SampleBuffer>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The overlap rendered by the most recent crossfade.
    pub fn last_fade(&self) -> Option<SampleBuffer> {
        self.last_fade.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, event: PlaybackEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}

#[async_trait]
impl PlaybackSink for RecordingSink {
    async fn play(&self, track: &GeneratedTrack) -> StreamResult<()> {
        self.push(PlaybackEvent::Play {
            track_id: track.id.clone(),
        });
        Ok(())
    }

    async fn crossfade(
        &self,
        from: &GeneratedTrack,
        to: &GeneratedTrack,
        duration: Duration,
    ) -> StreamResult<()> {
        let frames = (duration.as_secs_f64() * to.buffer.sample_rate as f64).round() as usize;
        let fade = linear_crossfade(&from.buffer, &to.buffer, frames);
        self.push(PlaybackEvent::Crossfade {
            from: from.id.clone(),
            to: to.id.clone(),
            duration,
            frames: fade.num_frames(),
        });
        *self.last_fade.lock().unwrap_or_else(|e| e.into_inner()) = Some(fade);
        Ok(())
    }

    async fn stop(&self) {
        self.push(PlaybackEvent::Stop);
    }
}

/// Overlaps the last `frames` frames of `outgoing` with the first `frames`
/// of `incoming`, with linear gains.
///
/// The overlap is shortened to the shorter buffer. Both buffers must share a
/// channel count; the result has the incoming buffer's format.
pub fn linear_crossfade(outgoing: &SampleBuffer, incoming: &SampleBuffer, frames: usize) -> SampleBuffer {
    let channels = incoming.channels.max(1) as usize;
    let frames = frames.min(outgoing.num_frames()).min(incoming.num_frames());
    let tail_start = (outgoing.num_frames() - frames) * channels;

    let mut samples = Vec::with_capacity(frames * channels);
    for frame in 0..frames {
        let gain_in = (frame as f64 + 0.5) / frames as f64;
        let gain_out = 1.0 - gain_in;
        for ch in 0..channels {
            let a = outgoing.samples[tail_start + frame * channels + ch] as f64;
            let b = incoming.samples[frame * channels + ch] as f64;
            let mixed = (a * gain_out + b * gain_in).round();
            samples.push(mixed.clamp(i16::MIN as f64, i16::MAX as f64) as i16);
        }
    }

    SampleBuffer {
        samples,
        sample_rate: incoming.sample_rate,
        channels: incoming.channels,
    }
}
