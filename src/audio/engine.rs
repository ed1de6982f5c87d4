// Audio engine - Live output of the band through cpal
//
// # Format Support
//
// The device's preferred sample format (f32, i16 or u16) picks the stream
// type. Rendering is always mono f32; conversion happens while the block is
// copied into the interleaved device buffer.
//
// # Clock
//
// The callback counts rendered frames, so the scheduler's clock is the
// device clock. Control calls from other threads lock the shared renderer;
// the callback only ever `try_lock`s it and plays silence when it loses.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{error, info};
use ringbuf::traits::{Consumer, Producer};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::audio::format_conversion::write_block_to_interleaved;
use crate::audio::parameters::MixerControls;
use crate::audio::renderer::Renderer;
use crate::chord::Chord;
use crate::config::StudioConfig;
use crate::error::PlaybackError;
use crate::messaging::channels::{
    NotificationConsumer, NotificationProducer, create_notification_channel,
};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::sequencer::observer::PlaybackObserver;
use crate::sequencer::scheduler::PlayOptions;
use crate::synth::amp::GuitarEffects;

const NOTIFICATION_CAPACITY: usize = 64;

pub struct AudioEngine {
    _device: Device,
    _stream: Stream,
    sample_rate: f32,
    renderer: Arc<Mutex<Renderer>>,
    controls: MixerControls,
    notification_rx: NotificationConsumer,
}

impl AudioEngine {
    /// Open the default output device and start rendering
    pub fn new(config: &StudioConfig) -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PlaybackError::DeviceUnavailable("No audio output device found".to_string()))?;

        let supported_config = device
            .default_output_config()
            .map_err(|e| PlaybackError::DeviceUnavailable(format!("Config error: {}", e)))?;

        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let stream_config: StreamConfig = supported_config.into();
        info!(
            "Audio device: {} ({} Hz, {} channels, {:?})",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels,
            sample_format
        );

        let controls = MixerControls::new(&config.mixer);
        let mut renderer = Renderer::new(config, sample_rate);
        renderer.attach_controls(controls.clone());
        let renderer = Arc::new(Mutex::new(renderer));

        let (notification_tx, notification_rx) = create_notification_channel(NOTIFICATION_CAPACITY);
        let notification_tx = Arc::new(Mutex::new(notification_tx));
        let max_block = config.render.block_size.max(1);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &stream_config,
                channels,
                max_block,
                renderer.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &stream_config,
                channels,
                max_block,
                renderer.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &stream_config,
                channels,
                max_block,
                renderer.clone(),
                notification_tx.clone(),
            ),
            other => Err(PlaybackError::DeviceUnavailable(format!(
                "Unsupported sample format: {:?}",
                other
            ))),
        }?;

        stream
            .play()
            .map_err(|e| PlaybackError::DeviceUnavailable(format!("Cannot start stream: {}", e)))?;

        if let Ok(mut tx) = notification_tx.try_lock() {
            let notif = Notification::info(
                NotificationCategory::Audio,
                format!("Audio output started at {} Hz", sample_rate),
            );
            let _ = tx.try_push(notif);
        }

        Ok(Self {
            _device: device,
            _stream: stream,
            sample_rate,
            renderer,
            controls,
            notification_rx,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Volume handles shared with the callback
    pub fn controls(&self) -> &MixerControls {
        &self.controls
    }

    fn lock(&self) -> MutexGuard<'_, Renderer> {
        // A panic inside the callback must not take control calls down with it
        match self.renderer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn play(&self, progression: &[Chord], options: PlayOptions) -> Result<(), PlaybackError> {
        self.lock().play(progression, options)
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    pub fn is_playing(&self) -> bool {
        self.lock().engine().is_playing()
    }

    pub fn subscribe(&self, observer: Box<dyn PlaybackObserver>) {
        self.lock().engine_mut().subscribe(observer);
    }

    pub fn apply_guitar_effects(&self, effects: &GuitarEffects) {
        self.lock().apply_guitar_effects(effects);
    }

    /// Run `f` against the renderer (previews, state queries)
    pub fn with_renderer<R>(&self, f: impl FnOnce(&mut Renderer) -> R) -> R {
        f(&mut self.lock())
    }

    /// Notifications posted since the last call
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notification_rx.pop_iter().collect()
    }

    /// The callback renders f32 and converts to the device format
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        max_block: usize,
        renderer: Arc<Mutex<Renderer>>,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Stream, PlaybackError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let mut block = vec![0.0f32; max_block];

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No I/O and no blocking locks in here
                    let frames = data.len() / channels.max(1);
                    if block.len() < frames {
                        // Only when the device asks for a larger buffer than configured
                        block.resize(frames, 0.0);
                    }

                    if let Ok(mut renderer) = renderer.try_lock() {
                        let block = &mut block[..frames];
                        renderer.process(block);
                        write_block_to_interleaved(block, data, channels);
                    } else {
                        for sample in data.iter_mut() {
                            *sample = Sample::from_sample::<f32>(0.0);
                        }
                    }
                },
                move |err| {
                    // Runs outside the audio callback
                    error!("Audio stream error: {}", err);
                    if let Ok(mut tx) = notification_tx.try_lock() {
                        let notif = Notification::error(
                            NotificationCategory::Audio,
                            format!("Audio stream error: {}", err),
                        );
                        let _ = tx.try_push(notif);
                    }
                },
                None,
            )
            .map_err(|e| PlaybackError::DeviceUnavailable(format!("Stream creation failed: {}", e)))?;

        Ok(stream)
    }
}
