//! # Tone Playback Module
//!
//! Plays the notes of the game through the default output device using CPAL
//! (Cross-Platform Audio Library).
//!
//! ## Features
//! - Fire-and-forget playback: callers never wait on the device
//! - Square-wave voice with a one second attack/release envelope
//! - Dedicated audio thread owning the output stream
//! - Device failures are logged and never reach the game

use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Length of one tone in seconds.
pub const TONE_DURATION: f64 = 1.0;

/// Time for the envelope to reach full gain.
const ATTACK: f64 = 0.1;

/// Time at which the envelope has faded back to silence.
const RELEASE_END: f64 = TONE_DURATION - 0.25;

/// Peak amplitude of the square wave; a full-scale square is harsh.
const AMPLITUDE: f32 = 0.2;

/// Pending tone requests before new ones are dropped.
const QUEUE_DEPTH: usize = 8;

/// Something that can sound a frequency.
///
/// Implementations must return immediately and swallow their own failures.
pub trait TonePlayer {
    fn play_tone(&self, frequency: f64);
}

/// Player that discards every tone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl TonePlayer for SilentPlayer {
    fn play_tone(&self, frequency: f64) {
        log::debug!("[AUDIO] Silent player skipping {:.2} Hz", frequency);
    }
}

/// Gain of the tone envelope `t` seconds after it started.
///
/// Rises linearly to 1 over the attack, then falls linearly to 0 at the
/// release end and stays silent until the tone stops.
pub fn envelope_gain(t: f64) -> f64 {
    if t < 0.0 || t >= RELEASE_END {
        0.0
    } else if t < ATTACK {
        t / ATTACK
    } else {
        1.0 - (t - ATTACK) / (RELEASE_END - ATTACK)
    }
}

/// A single square-wave voice rendered sample by sample.
#[derive(Debug, Clone)]
pub struct ToneVoice {
    sample_rate: f64,
    frequency: f64,
    elapsed: u64,
    active: bool,
}

impl ToneVoice {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            frequency: 0.0,
            elapsed: 0,
            active: false,
        }
    }

    /// Starts a new tone, cutting off any tone still sounding.
    pub fn trigger(&mut self, frequency: f64) {
        self.frequency = frequency;
        self.elapsed = 0;
        self.active = frequency.is_finite() && frequency > 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }
        let t = self.elapsed as f64 / self.sample_rate;
        if t >= TONE_DURATION {
            self.active = false;
            return 0.0;
        }
        self.elapsed += 1;
        let phase = (t * self.frequency).fract();
        let square = if phase < 0.5 { 1.0 } else { -1.0 };
        (square * envelope_gain(t)) as f32 * AMPLITUDE
    }
}

/// Plays tones on the default output device from a dedicated thread.
///
/// The stream is opened once when the player starts. If no device is
/// available the thread exits and later tones are silently dropped.
#[derive(Debug)]
pub struct CpalTonePlayer {
    tone_tx: Sender<f64>,
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl CpalTonePlayer {
    pub fn start() -> Self {
        let (tone_tx, tone_rx) = crossbeam_channel::bounded::<f64>(QUEUE_DEPTH);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let thread_handle = thread::spawn(move || {
            log::info!("[AUDIO] Starting audio thread...");
            let stream = match start_output_stream(tone_rx) {
                Ok(stream) => stream,
                Err(e) => {
                    log::warn!("[AUDIO] Playback unavailable: {}", e);
                    return;
                }
            };
            // The stream lives as long as this thread; wait for shutdown.
            let _ = shutdown_rx.recv();
            if let Err(e) = stream.pause() {
                log::warn!("[AUDIO] Error pausing stream: {}", e);
            }
            thread::sleep(Duration::from_millis(50));
            drop(stream);
            log::info!("[AUDIO] Audio thread finished");
        });
        Self {
            tone_tx,
            shutdown_tx,
            thread_handle: Some(thread_handle),
        }
    }
}

impl TonePlayer for CpalTonePlayer {
    fn play_tone(&self, frequency: f64) {
        match self.tone_tx.try_send(frequency) {
            Ok(()) => log::debug!("[AUDIO] Queued {:.2} Hz", frequency),
            Err(TrySendError::Full(_)) => log::warn!("[AUDIO] Tone queue full, dropping tone"),
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("[AUDIO] No output stream, dropping tone")
            }
        }
    }
}

impl Drop for CpalTonePlayer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::warn!("[AUDIO] Audio thread panicked");
            }
        }
    }
}

/// Opens the default output device and starts a stream rendering tones
/// received on `tone_rx`.
///
/// # Returns
/// * `Ok(stream)` - Playing stream; dropping it stops playback
/// * `Err(e)` - No device, or no f32 output format
fn start_output_stream(tone_rx: Receiver<f64>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("No output device available"))?;

    log::info!("[AUDIO] Using audio output device: {}", device.name()?);

    let supported_config = device.default_output_config()?;
    if supported_config.sample_format() != cpal::SampleFormat::F32 {
        return Err(anyhow!(
            "Unsupported output sample format {:?}",
            supported_config.sample_format()
        ));
    }
    let sample_rate = supported_config.sample_rate().0;
    let channels = supported_config.channels() as usize;
    let config: cpal::StreamConfig = supported_config.into();

    log::info!("[AUDIO] Output at {} Hz, {} channels", sample_rate, channels);

    let err_fn = |err| log::error!("[AUDIO] An error occurred on the output stream: {}", err);
    let mut voice = ToneVoice::new(sample_rate);

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            // Only the most recent request matters.
            while let Ok(frequency) = tone_rx.try_recv() {
                voice.trigger(frequency);
            }
            for frame in data.chunks_mut(channels) {
                let sample = voice.next_sample();
                for out in frame.iter_mut() {
                    *out = sample;
                }
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn envelope_shape() {
        assert_eq!(envelope_gain(0.0), 0.0);
        assert_relative_eq!(envelope_gain(0.05), 0.5);
        assert_relative_eq!(envelope_gain(ATTACK), 1.0);
        assert!(envelope_gain(0.5) > 0.0 && envelope_gain(0.5) < 1.0);
        assert_eq!(envelope_gain(RELEASE_END), 0.0);
        assert_eq!(envelope_gain(0.9), 0.0);
    }

    #[test]
    fn voice_stops_after_one_second() {
        let mut voice = ToneVoice::new(1_000);
        voice.trigger(100.0);
        let samples: Vec<f32> = (0..1_100).map(|_| voice.next_sample()).collect();
        assert!(!voice.is_active());
        assert!(samples[..1_000].iter().any(|s| s.abs() > 0.0));
        assert!(samples[1_000..].iter().all(|&s| s == 0.0));
        assert!(samples.iter().all(|s| s.abs() <= AMPLITUDE));
    }

    #[test]
    fn invalid_frequency_stays_silent() {
        let mut voice = ToneVoice::new(1_000);
        voice.trigger(f64::NAN);
        assert!(!voice.is_active());
        assert_eq!(voice.next_sample(), 0.0);
    }

    #[test]
    fn retrigger_restarts_the_envelope() {
        let mut voice = ToneVoice::new(1_000);
        voice.trigger(100.0);
        for _ in 0..500 {
            voice.next_sample();
        }
        voice.trigger(200.0);
        assert_eq!(voice.next_sample(), 0.0); // envelope back at zero
        assert!(voice.is_active());
    }
}
