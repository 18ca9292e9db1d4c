//! Impulse Response Convolver
//!
//! Direct convolution with a mono IR:
//! - IR resampled to the host rate (cubic)
//! - Kernel truncated to `max_length` taps to bound per-sample cost
//! - Sample-rate-dependent loudness normalization
//! - Kernel stored time-reversed, so each output frame is a forward dot
//!   product against a sliding window of input history
//!
//! Output is independent of how the host splits the stream into blocks.

use std::fmt;
use std::path::Path;

use ir_core::{GainConfig, IrError, IrResult, Sample, Tap, check_sample_rate};
use ir_file::RawAudio;
use serde::{Deserialize, Serialize};

use crate::history::HistoryBuffer;
use crate::resample::resample;
use crate::{ImpulseResponseError, ImpulseResponseResult, Processor};

// ============ Constants ============

/// Default kernel length cap (~170ms at 48kHz)
pub const DEFAULT_MAX_LENGTH: usize = 8192;

// ============ Config ============

/// Kernel construction settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpulseResponseConfig {
    /// Maximum number of kernel taps
    pub max_length: usize,
    /// Loudness normalization
    pub gain: GainConfig,
}

impl Default for ImpulseResponseConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            gain: GainConfig::default(),
        }
    }
}

impl ImpulseResponseConfig {
    pub fn validate(&self) -> IrResult<()> {
        if self.max_length == 0 {
            return Err(IrError::InvalidParam("max_length must be at least 1".into()));
        }
        Ok(())
    }
}

// ============ Load State ============

/// Lifecycle of an engine instance
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded,
    Failed(ImpulseResponseError),
}

// ============ Kernel ============

/// Build the reversed, gain-scaled kernel for `sample_rate`.
pub fn build_kernel(
    raw: &RawAudio,
    sample_rate: f64,
    config: &ImpulseResponseConfig,
) -> ImpulseResponseResult<Vec<Tap>> {
    config.validate()?;
    check_sample_rate(sample_rate)?;
    check_sample_rate(raw.sample_rate)?;
    if raw.is_empty() {
        return Err(IrError::EmptyAudio.into());
    }

    let resampled = resample(&raw.samples, raw.sample_rate, sample_rate, config.max_length);
    let gain = config.gain.gain_for(sample_rate)? as Tap;

    // kernel[len - 1 - i] = gain * resampled[i]
    let kernel: Vec<Tap> = resampled.iter().rev().map(|&s| gain * s).collect();

    log::info!(
        "IR kernel: {} taps ({} samples @ {} Hz -> {} Hz), gain {:.5}",
        kernel.len(),
        raw.len(),
        raw.sample_rate,
        sample_rate,
        gain
    );

    Ok(kernel)
}

#[inline]
fn dot(kernel: &[Tap], window: &[Tap]) -> Tap {
    kernel.iter().zip(window).map(|(k, x)| k * x).sum()
}

// ============ Processed Block ============

/// View of the engine's output buffers for the block just processed
#[derive(Debug, Clone, Copy)]
pub struct ProcessedBlock<'a> {
    outputs: &'a [Vec<Sample>],
    num_channels: usize,
    num_frames: usize,
}

impl<'a> ProcessedBlock<'a> {
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Output of channel `channel`, exactly `num_frames` long.
    #[inline]
    pub fn channel(&self, channel: usize) -> &'a [Sample] {
        &self.outputs[channel][..self.num_frames]
    }

    pub fn channels(&self) -> impl Iterator<Item = &'a [Sample]> + use<'a> {
        let block = *self;
        (0..block.num_channels).map(move |c| block.channel(c))
    }

    /// Copy into host buffers. Extra host channels and frames are left
    /// untouched.
    pub fn copy_to(&self, outputs: &mut [&mut [Sample]]) {
        for (out, src) in outputs.iter_mut().zip(self.channels()) {
            let n = out.len().min(src.len());
            out[..n].copy_from_slice(&src[..n]);
        }
    }
}

// ============ Impulse Response ============

/// Direct-convolution IR engine
pub struct ImpulseResponse {
    state: LoadState,
    config: ImpulseResponseConfig,
    /// Host sample rate the kernel is built for
    sample_rate: f64,
    /// Source audio, kept for persistence and rate changes
    raw: Option<RawAudio>,
    /// Reversed, gain-scaled taps
    kernel: Vec<Tap>,
    history: HistoryBuffer,
    /// Per-channel output, grow-only
    outputs: Vec<Vec<Sample>>,
}

impl ImpulseResponse {
    /// Create an engine with no IR
    pub fn new(sample_rate: f64, config: ImpulseResponseConfig) -> Self {
        Self {
            state: LoadState::NotLoaded,
            config,
            sample_rate,
            raw: None,
            kernel: Vec::new(),
            history: HistoryBuffer::new(0),
            outputs: Vec::new(),
        }
    }

    fn failed(sample_rate: f64, config: ImpulseResponseConfig, err: ImpulseResponseError) -> Self {
        let mut ir = Self::new(sample_rate, config);
        ir.state = LoadState::Failed(err);
        ir
    }

    /// Load a WAV IR. Failures produce an engine in the `Failed` state.
    pub fn from_file<P: AsRef<Path>>(path: P, sample_rate: f64, config: ImpulseResponseConfig) -> Self {
        Self::try_from_file(path, sample_rate, config)
            .unwrap_or_else(|err| Self::failed(sample_rate, config, err))
    }

    /// Build from previously decoded (or restored) audio. Failures produce
    /// an engine in the `Failed` state.
    pub fn from_data(raw: RawAudio, sample_rate: f64, config: ImpulseResponseConfig) -> Self {
        Self::try_from_data(raw, sample_rate, config)
            .unwrap_or_else(|err| Self::failed(sample_rate, config, err))
    }

    pub fn try_from_file<P: AsRef<Path>>(
        path: P,
        sample_rate: f64,
        config: ImpulseResponseConfig,
    ) -> ImpulseResponseResult<Self> {
        let raw = ir_file::load(path)?;
        Self::try_from_data(raw, sample_rate, config)
    }

    pub fn try_from_data(
        raw: RawAudio,
        sample_rate: f64,
        config: ImpulseResponseConfig,
    ) -> ImpulseResponseResult<Self> {
        let kernel = build_kernel(&raw, sample_rate, &config)?;
        let history = HistoryBuffer::new(kernel.len() - 1);

        Ok(Self {
            state: LoadState::Loaded,
            config,
            sample_rate,
            raw: Some(raw),
            kernel,
            history,
            outputs: Vec::new(),
        })
    }

    /// Build a fresh engine with the same IR for a new host sample rate.
    pub fn with_sample_rate(&self, sample_rate: f64) -> ImpulseResponseResult<Self> {
        match &self.raw {
            Some(raw) => Self::try_from_data(raw.clone(), sample_rate, self.config),
            None => Err(ImpulseResponseError::NotLoaded),
        }
    }

    #[inline]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn config(&self) -> &ImpulseResponseConfig {
        &self.config
    }

    /// Reversed, gain-scaled taps
    #[inline]
    pub fn kernel(&self) -> &[Tap] {
        &self.kernel
    }

    /// Past samples needed per output frame (`kernel.len() - 1`)
    #[inline]
    pub fn history_required(&self) -> usize {
        self.history.required()
    }

    /// Source audio for state persistence (pre-resample, pre-gain).
    pub fn get_data(&self) -> Option<RawAudio> {
        self.raw.clone()
    }

    #[inline]
    pub fn raw_audio(&self) -> Option<&RawAudio> {
        self.raw.as_ref()
    }

    fn prepare_buffers(&mut self, num_channels: usize, num_frames: usize) {
        if self.outputs.len() < num_channels {
            self.outputs.resize_with(num_channels, Vec::new);
        }
        for channel in &mut self.outputs[..num_channels] {
            if channel.len() < num_frames {
                channel.resize(num_frames, 0.0);
            }
        }
        self.history.reserve(num_frames);
    }

    /// Convolve one block.
    ///
    /// `inputs` holds one slice per channel; only channel 0 is convolved and
    /// its result is copied to every output channel.
    pub fn process(
        &mut self,
        inputs: &[&[Sample]],
        num_frames: usize,
    ) -> ImpulseResponseResult<ProcessedBlock<'_>> {
        if !self.is_loaded() {
            return Err(ImpulseResponseError::NotLoaded);
        }

        let num_channels = inputs.len();
        let input = match inputs.first() {
            Some(channel) if channel.len() >= num_frames => &channel[..num_frames],
            other => {
                return Err(ImpulseResponseError::BufferMismatch {
                    channels: num_channels,
                    frames: num_frames,
                    available: other.map_or(0, |c| c.len()),
                });
            }
        };

        self.prepare_buffers(num_channels, num_frames);
        self.history.push_block(input);

        let (first, rest) = self.outputs.split_at_mut(1);
        let mono = &mut first[0][..num_frames];
        for (i, out) in mono.iter_mut().enumerate() {
            *out = Sample::from(dot(&self.kernel, self.history.window(i)));
        }

        // Copy out for more-than-mono
        for channel in &mut rest[..num_channels - 1] {
            channel[..num_frames].copy_from_slice(mono);
        }

        self.history.advance(num_frames);

        Ok(ProcessedBlock {
            outputs: &self.outputs,
            num_channels,
            num_frames,
        })
    }
}

impl fmt::Debug for ImpulseResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImpulseResponse")
            .field("state", &self.state)
            .field("sample_rate", &self.sample_rate)
            .field("kernel_len", &self.kernel.len())
            .field("history_required", &self.history.required())
            .finish()
    }
}

impl Processor for ImpulseResponse {
    fn reset(&mut self) {
        self.history.clear();
        for channel in &mut self.outputs {
            channel.fill(0.0);
        }
    }
}

// ============ Tests ============
