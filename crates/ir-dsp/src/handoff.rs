//! Lock-free IR hand-off between a loader thread and the audio thread
//!
//! Engines are built completely on the loader side and moved to the audio
//! thread through an SPSC ring. Engines the audio thread replaces travel
//! back through a second ring so they are never dropped (deallocated) in
//! the audio callback.

use std::path::Path;

use ir_core::Sample;
use rtrb::{Consumer, Producer, RingBuffer};
use thiserror::Error;

use crate::{ImpulseResponse, ImpulseResponseConfig, ImpulseResponseError, ImpulseResponseResult, LoadState};

/// Message from loader to audio thread
enum Staged {
    Install(Box<ImpulseResponse>),
    Clear,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandoffError {
    #[error(transparent)]
    Build(#[from] ImpulseResponseError),

    #[error("IR staging queue is full")]
    QueueFull,
}

/// Create a connected loader/slot pair.
///
/// `capacity` bounds how many engines can be staged before the audio
/// thread picks them up.
pub fn ir_channel(capacity: usize) -> (IrLoader, IrSlot) {
    let capacity = capacity.max(1);
    let (stage_tx, stage_rx) = RingBuffer::new(capacity);
    let (retire_tx, retire_rx) = RingBuffer::new(capacity + 1);

    (
        IrLoader {
            stage_tx,
            retire_rx,
        },
        IrSlot {
            stage_rx,
            retire_tx,
            active: None,
        },
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOADER SIDE
// ═══════════════════════════════════════════════════════════════════════════════

/// Loader-thread handle: builds engines and stages them for installation
pub struct IrLoader {
    stage_tx: Producer<Staged>,
    retire_rx: Consumer<Box<ImpulseResponse>>,
}

impl IrLoader {
    /// Stage a fully built engine. Engines that are not `Loaded` are
    /// refused so the audio thread keeps whatever it currently runs.
    pub fn stage(&mut self, ir: ImpulseResponse) -> Result<(), HandoffError> {
        match ir.state() {
            LoadState::Loaded => {}
            LoadState::Failed(err) => return Err(err.clone().into()),
            LoadState::NotLoaded => return Err(ImpulseResponseError::NotLoaded.into()),
        }

        self.collect_garbage();
        self.stage_tx
            .push(Staged::Install(Box::new(ir)))
            .map_err(|_| HandoffError::QueueFull)
    }

    /// Decode, build and stage in one step.
    pub fn load_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        sample_rate: f64,
        config: ImpulseResponseConfig,
    ) -> Result<(), HandoffError> {
        let ir = ImpulseResponse::try_from_file(path, sample_rate, config)?;
        self.stage(ir)
    }

    /// Stage removal of the active engine (audio passes through).
    pub fn clear(&mut self) -> Result<(), HandoffError> {
        self.stage_tx
            .push(Staged::Clear)
            .map_err(|_| HandoffError::QueueFull)
    }

    /// Drop engines the audio thread has retired. Returns how many.
    pub fn collect_garbage(&mut self) -> usize {
        let mut count = 0;
        while let Ok(retired) = self.retire_rx.pop() {
            drop(retired);
            count += 1;
        }
        if count > 0 {
            log::debug!("Released {} retired IR engine(s)", count);
        }
        count
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIO SIDE
// ═══════════════════════════════════════════════════════════════════════════════

/// Audio-thread handle: owns the active engine
pub struct IrSlot {
    stage_rx: Consumer<Staged>,
    retire_tx: Producer<Box<ImpulseResponse>>,
    active: Option<Box<ImpulseResponse>>,
}

impl IrSlot {
    /// Install the newest staged engine.
    ///
    /// A swap only happens while the retire ring has room for the engine
    /// being replaced; otherwise it waits for the loader to collect.
    pub fn apply_staged(&mut self) {
        while self.retire_tx.slots() > 0 {
            let Ok(staged) = self.stage_rx.pop() else {
                break;
            };
            let next = match staged {
                Staged::Install(ir) => Some(ir),
                Staged::Clear => None,
            };
            if let Some(old) = std::mem::replace(&mut self.active, next) {
                // Room was checked above
                let _ = self.retire_tx.push(old);
            }
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[inline]
    pub fn active(&self) -> Option<&ImpulseResponse> {
        self.active.as_deref()
    }

    /// Process one block into host buffers.
    ///
    /// With no engine installed, inputs are copied to outputs unchanged. If
    /// the engine rejects the block, outputs are silenced and the error is
    /// returned.
    pub fn process(
        &mut self,
        inputs: &[&[Sample]],
        outputs: &mut [&mut [Sample]],
        num_frames: usize,
    ) -> ImpulseResponseResult<()> {
        self.apply_staged();

        match self.active.as_deref_mut() {
            Some(ir) => match ir.process(inputs, num_frames) {
                Ok(block) => block.copy_to(outputs),
                Err(err) => {
                    for out in outputs.iter_mut() {
                        out.fill(0.0);
                    }
                    return Err(err);
                }
            },
            None => {
                for (c, out) in outputs.iter_mut().enumerate() {
                    let n = out.len().min(num_frames);
                    match inputs.get(c) {
                        Some(input) => {
                            let n = n.min(input.len());
                            out[..n].copy_from_slice(&input[..n]);
                        }
                        None => out[..n].fill(0.0),
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_file::RawAudio;

    fn engine(tap: f32) -> ImpulseResponse {
        ImpulseResponse::from_data(
            RawAudio::new(vec![tap], 48000.0),
            48000.0,
            ImpulseResponseConfig::default(),
        )
    }

    fn active_tap(slot: &IrSlot) -> Option<f32> {
        slot.active().map(|ir| ir.kernel()[0])
    }

    #[test]
    fn test_passthrough_without_engine() {
        let (_loader, mut slot) = ir_channel(4);
        let input = [0.1, 0.2, 0.3];
        let mut left = [0.0; 3];
        let mut right = [9.0; 3];

        slot.process(&[&input], &mut [&mut left, &mut right], 3).unwrap();
        assert_eq!(left, input);
        assert_eq!(right, [0.0; 3]);
    }

    #[test]
    fn test_staged_engine_is_installed() {
        let (mut loader, mut slot) = ir_channel(4);
        let ir = engine(1.0);
        let tap = f64::from(ir.kernel()[0]);
        loader.stage(ir).unwrap();
        assert!(!slot.is_active());

        let input = [1.0; 4];
        let mut out = [0.0; 4];
        slot.process(&[&input], &mut [&mut out], 4).unwrap();
        assert!(slot.is_active());
        assert_eq!(out, [tap; 4]);
    }

    #[test]
    fn test_replaced_engine_is_returned_to_loader() {
        let (mut loader, mut slot) = ir_channel(4);
        loader.stage(engine(1.0)).unwrap();
        slot.apply_staged();
        loader.stage(engine(0.5)).unwrap();
        slot.apply_staged();

        assert_eq!(loader.collect_garbage(), 1);
        assert_eq!(active_tap(&slot), Some(engine(0.5).kernel()[0]));
    }

    #[test]
    fn test_failed_engine_keeps_previous() {
        let (mut loader, mut slot) = ir_channel(4);
        loader.stage(engine(1.0)).unwrap();
        slot.apply_staged();

        let failed = ImpulseResponse::from_file(
            "/no/such/ir.wav",
            48000.0,
            ImpulseResponseConfig::default(),
        );
        assert_eq!(
            loader.stage(failed),
            Err(HandoffError::Build(ImpulseResponseError::Load(ir_file::LoadError::Opening)))
        );
        assert_eq!(
            loader.stage(ImpulseResponse::new(48000.0, ImpulseResponseConfig::default())),
            Err(HandoffError::Build(ImpulseResponseError::NotLoaded))
        );

        slot.apply_staged();
        assert_eq!(active_tap(&slot), Some(engine(1.0).kernel()[0]));
    }

    #[test]
    fn test_queue_full() {
        let (mut loader, _slot) = ir_channel(1);
        loader.stage(engine(1.0)).unwrap();
        assert_eq!(loader.stage(engine(0.5)), Err(HandoffError::QueueFull));
    }

    #[test]
    fn test_rejected_block_is_silenced() {
        let (mut loader, mut slot) = ir_channel(4);
        loader.stage(engine(1.0)).unwrap();

        let input = [1.0; 2];
        let mut left = [0.3; 4];
        let mut right = [0.3; 4];
        let err = slot
            .process(&[&input], &mut [&mut left, &mut right], 4)
            .unwrap_err();

        assert!(matches!(err, ImpulseResponseError::BufferMismatch { .. }));
        assert_eq!(left, [0.0; 4]);
        assert_eq!(right, [0.0; 4]);
    }

    #[test]
    fn test_clear_returns_to_passthrough() {
        let (mut loader, mut slot) = ir_channel(4);
        loader.stage(engine(0.5)).unwrap();
        slot.apply_staged();
        loader.clear().unwrap();

        let input = [0.7; 2];
        let mut out = [0.0; 2];
        slot.process(&[&input], &mut [&mut out], 2).unwrap();
        assert!(!slot.is_active());
        assert_eq!(out, input);
        assert_eq!(loader.collect_garbage(), 1);
    }

    #[test]
    fn test_swap_waits_when_retire_ring_is_full() {
        // capacity 1: retire ring holds 2
        let (mut loader, mut slot) = ir_channel(1);
        let taps = [1.0, 0.9, 0.8, 0.7];
        let expected: Vec<f32> = taps.iter().map(|&t| engine(t).kernel()[0]).collect();

        for &tap in &taps[..3] {
            assert!(loader.stage_tx.push(Staged::Install(Box::new(engine(tap)))).is_ok());
            slot.apply_staged();
        }
        assert_eq!(active_tap(&slot), Some(expected[2]));

        assert!(loader.stage_tx.push(Staged::Install(Box::new(engine(taps[3])))).is_ok());
        slot.apply_staged();
        // Two retired engines fill the ring, so the fourth stays staged
        assert_eq!(active_tap(&slot), Some(expected[2]));

        assert_eq!(loader.collect_garbage(), 2);
        slot.apply_staged();
        assert_eq!(active_tap(&slot), Some(expected[3]));
    }
}
