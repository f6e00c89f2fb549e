//! Lock-free parameter slots shared by the edit side and the render thread.
//!
//! Values are stored as `f32` bits in `AtomicU32`s, one slot per processor
//! parameter. The edit side writes a slot and raises the pending flag; the
//! render thread pushes every slot into the processor right before its next
//! `process` call, while it already holds the processor. Setting or reading
//! a parameter therefore never touches the processor lock.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::processor::{ParamDescriptor, Processor};

/// Atomic mirror of one processor's parameters.
#[derive(Debug, Default)]
pub(crate) struct ParamSlots {
    values: Box<[AtomicU32]>,
    descriptors: Box<[Option<ParamDescriptor>]>,
    pending: AtomicBool,
}

impl ParamSlots {
    /// One slot per parameter of `processor`, holding its current values.
    pub fn capture(processor: &dyn Processor) -> Self {
        let count = processor.param_count();
        Self {
            values: (0..count)
                .map(|i| AtomicU32::new(processor.get_param(i).to_bits()))
                .collect(),
            descriptors: (0..count).map(|i| processor.param_info(i)).collect(),
            pending: AtomicBool::new(false),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Latest value written to slot `index`.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values
            .get(index)
            .map(|slot| f32::from_bits(slot.load(Ordering::Relaxed)))
    }

    /// Stores `value`, clamped to the parameter's range when it has one.
    ///
    /// Returns `false` and stores nothing for an unknown index or a
    /// non-finite value.
    pub fn set(&self, index: usize, value: f32) -> bool {
        let Some(slot) = self.values.get(index) else {
            return false;
        };
        if !value.is_finite() {
            return false;
        }
        let value = match self.descriptors.get(index).copied().flatten() {
            Some(descriptor) => descriptor.clamp(value),
            None => value,
        };
        slot.store(value.to_bits(), Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Pushes every slot into `processor` if anything was written since the
    /// last call. Real-time safe.
    pub fn apply_pending(&self, processor: &mut dyn Processor) {
        if !self.pending.swap(false, Ordering::Acquire) {
            return;
        }
        for (index, slot) in self.values.iter().enumerate() {
            processor.set_param(index, f32::from_bits(slot.load(Ordering::Relaxed)));
        }
    }

    /// Re-reads every slot from `processor`, discarding pending writes.
    pub fn refresh(&self, processor: &dyn Processor) {
        self.pending.store(false, Ordering::Relaxed);
        for (index, slot) in self.values.iter().enumerate() {
            slot.store(processor.get_param(index).to_bits(), Ordering::Relaxed);
        }
    }
}
