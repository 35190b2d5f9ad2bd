/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::domain::actor::Player;
use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::synth;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_extinguish: Arc<Vec<u8>>,
        sfx_evaporate: Arc<Vec<u8>>,
        sfx_button: Arc<Vec<u8>>,
        sfx_gate_open: Arc<Vec<u8>>,
        sfx_gate_close: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let wav = |samples: Vec<f32>| Arc::new(synth::make_wav(&samples));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_extinguish: wav(synth::gen_extinguish()),
                sfx_evaporate: wav(synth::gen_evaporate()),
                sfx_button: wav(synth::gen_button()),
                sfx_gate_open: wav(synth::gen_gate(true)),
                sfx_gate_close: wav(synth::gen_gate(false)),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_extinguish(&self) { self.play(&self.sfx_extinguish); }
        pub fn play_evaporate(&self) { self.play(&self.sfx_evaporate); }
        pub fn play_button(&self) { self.play(&self.sfx_button); }
        pub fn play_gate_open(&self) { self.play(&self.sfx_gate_open); }
        pub fn play_gate_close(&self) { self.play(&self.sfx_gate_close); }
    }
}

// ════════════════════════════════════════════════════════════
//  Waveform generators and WAV encoder
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    pub const SAMPLE_RATE: u32 = 22050;

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Fire extinguished: hissing noise with a sinking tone.
    pub fn gen_extinguish() -> Vec<f32> {
        let n = samples_for(0.35);
        let mut rng: u32 = 0x2545_F491;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 320.0 - t * 220.0;
                let tone = (ti * freq * TAU).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.3 + noise * 0.7) * (1.0 - t).powf(1.5) * 0.3
            })
            .collect()
    }

    /// Water evaporated: rising whistle that thins out.
    pub fn gen_evaporate() -> Vec<f32> {
        let n = samples_for(0.3);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 400.0 + t * 900.0;
                (ti * freq * TAU).sin() * (1.0 - t) * 0.25
            })
            .collect()
    }

    /// Button press: one short click.
    pub fn gen_button() -> Vec<f32> {
        let n = samples_for(0.03);
        (0..n)
            .map(|i| {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                (ti * 1200.0 * TAU).sin() * env * 0.2
            })
            .collect()
    }

    /// Gate motion: low stepped rumble, rising when opening.
    pub fn gen_gate(opening: bool) -> Vec<f32> {
        let steps = [110.0_f32, 131.0, 147.0, 165.0];
        let step_len = samples_for(0.06);
        let mut samples = Vec::with_capacity(step_len * steps.len());
        for k in 0..steps.len() {
            let freq = if opening { steps[k] } else { steps[steps.len() - 1 - k] };
            for i in 0..step_len {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / step_len as f32) * 0.5;
                // Square-ish wave for a mechanical feel
                let wave = (ti * freq * TAU).sin() * 0.7 + (ti * freq * 3.0 * TAU).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Wrap mono f32 samples into a 16-bit PCM WAV buffer.
    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_extinguish(&self) {}
    pub fn play_evaporate(&self) {}
    pub fn play_button(&self) {}
    pub fn play_gate_open(&self) {}
    pub fn play_gate_close(&self) {}
}

impl SoundEngine {
    pub fn play_event(&self, event: &GameEvent) {
        match event {
            GameEvent::PlayerReset { player: Player::Fire, .. } => self.play_extinguish(),
            GameEvent::PlayerReset { player: Player::Water, .. } => self.play_evaporate(),
            GameEvent::ButtonPressed { .. } => self.play_button(),
            GameEvent::ButtonReleased { .. } => {}
            GameEvent::GateOpened { .. } => self.play_gate_open(),
            GameEvent::GateClosed { .. } => self.play_gate_close(),
        }
    }
}
