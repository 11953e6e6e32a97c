//! Audio output using cpal
//!
//! Owns the output device on a dedicated audio thread: the thread opens
//! the device, builds the stream, then feeds the lock-free ring buffer
//! from the mixer until shutdown. The cpal callback only pops frames, so
//! the real-time path never takes a lock.
//!
//! Failing to open any output device is the one fatal initialization
//! error in the player.

use crate::audio::mixer::{Mixer, MixerHandle, MixerNotice};
use crate::audio::types::AudioFrame;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use ringbuf::{traits::*, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Frames rendered per feeder iteration
const RENDER_CHUNK_FRAMES: usize = 256;

/// Audio output manager.
///
/// Construction blocks until the audio thread has the stream running (or
/// has failed). All further interaction goes through the [`MixerHandle`].
pub struct AudioOutput {
    mixer: MixerHandle,
    sample_rate: u32,
    device_name: String,
    stop: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl AudioOutput {
    /// Open the output device and start the render thread.
    ///
    /// # Arguments
    /// - `device_name`: Optional device name (None = default device)
    /// - `ring_frames`: Ring buffer capacity in frames
    /// - `notice_tx`: Channel receiving mixer notices (track completions)
    ///
    /// # Errors
    /// `Error::AudioOutput` when no usable output device exists or the
    /// stream cannot be built. Fatal: the caller surfaces it once.
    pub fn new(
        device_name: Option<String>,
        ring_frames: usize,
        notice_tx: UnboundedSender<MixerNotice>,
    ) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = Arc::clone(&stop);
        let (init_tx, init_rx) = std::sync::mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("briefcast-audio".to_string())
            .spawn(move || {
                audio_thread(device_name, ring_frames, notice_tx, init_tx, stop_thread)
            })
            .map_err(|e| Error::AudioOutput(format!("Failed to spawn audio thread: {}", e)))?;

        match init_rx.recv() {
            Ok(Ok((mixer, sample_rate, device_name))) => {
                info!(
                    "Audio output running on '{}' at {} Hz",
                    device_name, sample_rate
                );
                Ok(Self {
                    mixer,
                    sample_rate,
                    device_name,
                    stop,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::AudioOutput(
                "Audio thread exited before initialization".to_string(),
            )),
        }
    }

    /// Shared mixer handle (clock source)
    pub fn mixer(&self) -> MixerHandle {
        self.mixer.clone()
    }

    /// Working sample rate of the output device
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Name of the opened device
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

type InitResult = std::result::Result<(MixerHandle, u32, String), Error>;

/// Audio thread body: open device, build stream, feed the ring buffer.
fn audio_thread(
    device_name: Option<String>,
    ring_frames: usize,
    notice_tx: UnboundedSender<MixerNotice>,
    init_tx: std::sync::mpsc::Sender<InitResult>,
    stop: Arc<AtomicBool>,
) {
    let (device, actual_name) = match open_device(device_name) {
        Ok(pair) => pair,
        Err(e) => {
            let _ = init_tx.send(Err(e));
            return;
        }
    };

    let supported = match device.default_output_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = init_tx.send(Err(Error::AudioOutput(format!(
                "No default output config: {}",
                e
            ))));
            return;
        }
    };

    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.config();
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    debug!(
        "Output config: rate={}, channels={}, format={:?}",
        sample_rate, channels, sample_format
    );

    let mixer = MixerHandle::new(Mixer::new(sample_rate));

    let rb = HeapRb::<AudioFrame>::new(ring_frames.max(RENDER_CHUNK_FRAMES * 2));
    let (mut producer, mut consumer) = rb.split();
    let underruns = Arc::new(AtomicU64::new(0));
    let underruns_cb = Arc::clone(&underruns);

    let err_fn = |e| warn!("Audio stream error: {}", e);

    let stream = match sample_format {
        SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _| {
                for frame_out in data.chunks_mut(channels) {
                    let frame = pop_or_silence(&mut consumer, &underruns_cb);
                    write_frame_f32(frame_out, frame);
                }
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _| {
                for frame_out in data.chunks_mut(channels) {
                    let frame = pop_or_silence(&mut consumer, &underruns_cb);
                    write_frame_i16(frame_out, frame);
                }
            },
            err_fn,
            None,
        ),
        other => {
            let _ = init_tx.send(Err(Error::AudioOutput(format!(
                "Unsupported sample format: {:?}",
                other
            ))));
            return;
        }
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = init_tx.send(Err(Error::AudioOutput(format!(
                "Failed to build output stream: {}",
                e
            ))));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = init_tx.send(Err(Error::AudioOutput(format!(
            "Failed to start output stream: {}",
            e
        ))));
        return;
    }

    let _ = init_tx.send(Ok((mixer.clone(), sample_rate, actual_name)));

    // Feeder loop: keep the ring buffer topped up from the mixer. The
    // stream stays alive for as long as this loop runs.
    let mut chunk = vec![AudioFrame::zero(); RENDER_CHUNK_FRAMES];
    while !stop.load(Ordering::Acquire) {
        if producer.vacant_len() >= RENDER_CHUNK_FRAMES {
            let notices = mixer.render(&mut chunk);
            for frame in &chunk {
                // vacant_len was checked above; a race here only drops
                // frames that the next iteration re-renders
                let _ = producer.try_push(*frame);
            }
            for notice in notices {
                if notice_tx.send(notice).is_err() {
                    debug!("Mixer notice receiver dropped");
                }
            }
        } else {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    drop(stream);
    debug!("Audio thread stopped");
}

/// Open the requested device, falling back to the default device.
fn open_device(device_name: Option<String>) -> Result<(Device, String)> {
    let host = cpal::default_host();

    if let Some(name) = device_name.as_ref() {
        let mut devices = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

        match devices.find(|d| d.name().ok().as_ref() == Some(name)) {
            Some(device) => {
                info!("Found requested audio device: {}", name);
                return Ok((device, name.clone()));
            }
            None => {
                warn!(
                    "Requested device '{}' not found, falling back to default device",
                    name
                );
            }
        }
    }

    let device = host.default_output_device().ok_or_else(|| {
        Error::AudioOutput("No default output device found".to_string())
    })?;
    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    Ok((device, name))
}

fn pop_or_silence(
    consumer: &mut ringbuf::HeapCons<AudioFrame>,
    underruns: &AtomicU64,
) -> AudioFrame {
    match consumer.try_pop() {
        Some(frame) => frame,
        None => {
            // Underruns while suspended are expected; log sparsely
            let count = underruns.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 10000 == 0 {
                debug!("Audio ring buffer underrun (total: {})", count);
            }
            AudioFrame::zero()
        }
    }
}

fn write_frame_f32(out: &mut [f32], frame: AudioFrame) {
    match out.len() {
        0 => {}
        1 => out[0] = 0.5 * (frame.left + frame.right),
        n => {
            out[0] = frame.left;
            out[1] = frame.right;
            for sample in &mut out[2..n] {
                *sample = 0.0;
            }
        }
    }
}

fn write_frame_i16(out: &mut [i16], frame: AudioFrame) {
    let convert = |s: f32| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
    match out.len() {
        0 => {}
        1 => out[0] = convert(0.5 * (frame.left + frame.right)),
        n => {
            out[0] = convert(frame.left);
            out[1] = convert(frame.right);
            for sample in &mut out[2..n] {
                *sample = 0;
            }
        }
    }
}
