//! Sort pass over a filled row
//!
//! The numeric phase leaves each row's slots in accumulation order. This
//! module reorders one row's slots by column index, carrying along the
//! `width` values that belong to each slot (1 for CSR, block_dim² for BSR).

/// Sorts one row's slots by column index.
///
/// `cols` holds one column per slot and `vals` holds `width` values per slot.
pub fn sort_row_slots<T: Copy>(cols: &mut [usize], vals: &mut [T], width: usize) {
    debug_assert_eq!(cols.len() * width, vals.len());

    if cols.windows(2).all(|w| w[0] <= w[1]) {
        return;
    }

    // Sort slot positions by column, then gather both arrays
    let mut order: Vec<usize> = (0..cols.len()).collect();
    order.sort_unstable_by_key(|&slot| cols[slot]);

    let sorted_cols: Vec<usize> = order.iter().map(|&slot| cols[slot]).collect();
    let mut sorted_vals = Vec::with_capacity(vals.len());
    for &slot in &order {
        sorted_vals.extend_from_slice(&vals[slot * width..(slot + 1) * width]);
    }

    cols.copy_from_slice(&sorted_cols);
    vals.copy_from_slice(&sorted_vals);
}
