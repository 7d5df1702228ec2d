//! Output buffer allocation
//!
//! The numeric phase writes C's column indices and values into buffers sized
//! by the symbolic phase. Those buffers are handed out as `MaybeUninit`
//! storage: callers never get to read them until every slot has been
//! written and checked, at which point they are converted to plain vectors.

use std::mem::{ManuallyDrop, MaybeUninit};

use num_traits::Zero;

use crate::error::{Result, SpgemmError};

/// How output buffers are prepared before the algorithm writes them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationMode {
    /// Fill every slot with zero before handing the buffer out
    Zeroed,
    /// Reserve storage only; the algorithm must write every slot before the
    /// buffer becomes readable
    #[default]
    WithoutInitializing,
}

/// Buffer whose slots are written by the algorithm before anyone reads them
pub(crate) struct SlotBuffer<T> {
    slots: Vec<MaybeUninit<T>>,
}

impl<T: Copy> SlotBuffer<T> {
    /// Reserves `len` slots, mapping allocator failure to an error
    pub fn allocate(buffer: &'static str, len: usize, mode: AllocationMode) -> Result<Self>
    where
        T: Zero,
    {
        let mut slots: Vec<MaybeUninit<T>> = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| SpgemmError::AllocationFailure { buffer, len })?;

        match mode {
            AllocationMode::Zeroed => slots.resize(len, MaybeUninit::new(T::zero())),
            AllocationMode::WithoutInitializing => slots.resize(len, MaybeUninit::uninit()),
        }

        Ok(Self { slots })
    }

    pub fn as_mut_slice(&mut self) -> &mut [MaybeUninit<T>] {
        &mut self.slots
    }

    /// Converts the buffer into initialized storage.
    ///
    /// # Safety
    ///
    /// Every slot must have been written, either by `AllocationMode::Zeroed`
    /// or by the algorithm.
    pub unsafe fn assume_init(self) -> Vec<T> {
        let mut slots = ManuallyDrop::new(self.slots);
        let (ptr, len, cap) = (slots.as_mut_ptr(), slots.len(), slots.capacity());
        // SAFETY: MaybeUninit<T> has the same layout as T, and the caller
        // guarantees each of the `len` slots is initialized.
        Vec::from_raw_parts(ptr as *mut T, len, cap)
    }
}

/// Allocates a plain vector of `len` copies of `value`, reporting allocator failure
pub(crate) fn try_filled<T: Clone>(buffer: &'static str, len: usize, value: T) -> Result<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| SpgemmError::AllocationFailure { buffer, len })?;
    out.resize(len, value);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_buffer_is_readable() {
        let buffer = SlotBuffer::<f64>::allocate("values", 4, AllocationMode::Zeroed).unwrap();
        // SAFETY: zeroed mode initializes every slot
        let values = unsafe { buffer.assume_init() };
        assert_eq!(values, vec![0.0; 4]);
    }

    #[test]
    fn test_written_buffer() {
        let mut buffer =
            SlotBuffer::<usize>::allocate("entries", 3, AllocationMode::WithoutInitializing)
                .unwrap();
        for (i, slot) in buffer.as_mut_slice().iter_mut().enumerate() {
            slot.write(i * 10);
        }
        // SAFETY: every slot written above
        let entries = unsafe { buffer.assume_init() };
        assert_eq!(entries, vec![0, 10, 20]);
    }

    #[test]
    fn test_huge_allocation_fails() {
        let result = SlotBuffer::<f64>::allocate("values", usize::MAX / 2, AllocationMode::Zeroed);
        assert!(matches!(
            result,
            Err(SpgemmError::AllocationFailure { buffer: "values", .. })
        ));
    }

    #[test]
    fn test_try_filled() {
        assert_eq!(try_filled("row_ptr", 3, 0usize).unwrap(), vec![0, 0, 0]);
        assert!(matches!(
            try_filled("row_ptr", usize::MAX / 2, 0usize),
            Err(SpgemmError::AllocationFailure { buffer: "row_ptr", .. })
        ));
    }
}
