//! # Fracture Delay: An AU/VST3/CLAP Stereo Delay Plugin
//!
//! A block-based delay built with [nih-plug](https://github.com/robbert-vdh/nih-plug).
//! Each channel owns a 2-second ring buffer; a single write cursor walks
//! all of them in lockstep, one host block at a time.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬───────────────────────────────────────────────────────►(+)──► Output
//!         │                                                         ▲
//!         │    ┌──────────────── FEEDBACK LOOP ───────────────┐     │
//!         │    │                                              │     │
//!         └──►(+)──► [Ring Buffer] ──── delayed ──┬── × fb ───┘     │
//!                     (2 s per channel)           │                 │
//!                                                 └── × dry/wet ────┘
//! ```
//!
//! The right channel reads further back than the left by the stereo
//! offset. The dry signal always passes at full level; dry/wet only sets
//! how much delayed signal is added.
//!
//! The DSP lives in [`dsp`] and knows nothing about the host. This file is
//! the thin layer that maps host lifecycle calls onto it.

pub mod dsp;
pub mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::DelayEngine;
use nih_plug::prelude::*;
use no_denormals::no_denormals;
use params::FractureParams;

/// The plugin: shared parameters plus the engine owned by the audio
/// thread.
///
/// Parameters sit behind an `Arc` because the host, the UI and the audio
/// thread all read them. The engine (and its ring buffers) is touched
/// only from `initialize()`, `reset()` and `process()`, which the host
/// never runs concurrently.
pub struct FractureDelay {
    params: Arc<FractureParams>,
    engine: DelayEngine,
}

impl Default for FractureDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(FractureParams::default()),
            // Unconfigured until the host tells us the sample rate.
            engine: DelayEngine::new(),
        }
    }
}

impl Plugin for FractureDelay {
    const NAME: &'static str = "Fracture Delay";
    const VENDOR: &'static str = "Fracture Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first; mono still works, it just has no right channel to
    // offset.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are read once per block, so splitting blocks at
    // automation points would only add work.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called before the first block and whenever the sample rate, the
    /// maximum block size or the channel layout changes. Sizes the rings.
    ///
    /// Returning `false` tells the host the configuration can't be used.
    /// The engine keeps its previous rings in that case.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_channels = audio_io_layout
            .main_output_channels
            .map(|c| c.get() as usize)
            .unwrap_or(2);

        match self.engine.configure(
            buffer_config.sample_rate,
            buffer_config.max_buffer_size as usize,
            num_channels,
        ) {
            Ok(()) => {
                nih_log!(
                    "configured {} channel(s) at {} Hz, {} sample ring, max block {}",
                    num_channels,
                    buffer_config.sample_rate,
                    self.engine.capacity(),
                    buffer_config.max_buffer_size
                );
                true
            }
            Err(err) => {
                nih_error!("failed to configure delay engine: {}", err);
                false
            }
        }
    }

    /// Playback stopped or the plugin was bypassed: drop all pending
    /// echoes so they don't burst out when playback resumes.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let snapshot = self.params.snapshot();
        let engine = &mut self.engine;

        let mut result = Ok(());
        no_denormals(|| {
            result = engine.process(buffer.as_slice(), &snapshot);
        });

        match result {
            // Keep the host calling us while echoes are still sounding.
            Ok(()) => ProcessStatus::Tail(self.engine.tail_samples(&snapshot)),
            Err(err) => ProcessStatus::Error(err.as_static_str()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for FractureDelay {
    const CLAP_ID: &'static str = "com.fracture-audio.fracture-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A stereo delay with feedback and right-channel offset");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for FractureDelay {
    // 16 ASCII bytes, unique to this plugin.
    const VST3_CLASS_ID: [u8; 16] = *b"FractureDelay001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay, Vst3SubCategory::Stereo];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────

nih_export_clap!(FractureDelay);
nih_export_vst3!(FractureDelay);

// AUv2 entry point for Logic Pro, wrapping the CLAP export.
clap_wrapper::export_auv2!();
