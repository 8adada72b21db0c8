//! Tests for bounding-rectangle extraction on bit grids.

use raster_common::GridExtent;
use tile_mosaic::BitSet2D;

fn rect(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> GridExtent {
    GridExtent::new(x_min, y_min, x_max, y_max).unwrap()
}

fn filled(width: usize, height: usize, area: GridExtent) -> BitSet2D {
    let mut bits = BitSet2D::new(width, height);
    bits.set_rect(&area);
    bits
}

// ============================================================================
// Area tests
// ============================================================================

#[test]
fn test_area_set_block() {
    let bits = filled(8, 8, rect(3, 2, 5, 4));
    assert_eq!(bits.area_set(), Some(rect(3, 2, 5, 4)));
    assert_eq!(bits.count_ones(), 9);
}

#[test]
fn test_area_set_empty() {
    let bits = BitSet2D::new(8, 8);
    assert_eq!(bits.area_set(), None);
    assert_eq!(bits.area_cleared(), Some(rect(0, 0, 7, 7)));
}

#[test]
fn test_area_cleared_full() {
    let bits = filled(8, 8, rect(0, 0, 7, 7));
    assert_eq!(bits.area_cleared(), None);
    assert_eq!(bits.area_set(), Some(rect(0, 0, 7, 7)));
}

#[test]
fn test_area_cleared_of_partial_rows() {
    // Left half set: cleared bits are the right half
    let bits = filled(8, 4, rect(0, 0, 3, 3));
    assert_eq!(bits.area_cleared(), Some(rect(4, 0, 7, 3)));
}

#[test]
fn test_area_set_widens_on_ragged_rows() {
    let mut bits = BitSet2D::new(10, 10);
    bits.set(4, 1);
    bits.set(2, 2);
    bits.set(7, 3);
    assert_eq!(bits.area_set(), Some(rect(2, 1, 7, 3)));
}

#[test]
fn test_area_set_stops_at_empty_row() {
    let mut bits = filled(8, 8, rect(1, 1, 2, 2));
    bits.set_rect(&rect(5, 5, 6, 6));
    // Rows below the first gap are not visited
    assert_eq!(bits.area_set(), Some(rect(1, 1, 2, 2)));
}

// ============================================================================
// Intersection tests
// ============================================================================

#[test]
fn test_intersect_set_corner() {
    let a = filled(8, 8, rect(0, 0, 3, 3));
    let b = filled(8, 8, rect(2, 2, 5, 5));
    assert_eq!(a.intersect_set(&b), Some(rect(2, 2, 3, 3)));
    assert_eq!(b.intersect_set(&a), Some(rect(2, 2, 3, 3)));
}

#[test]
fn test_intersect_set_disjoint() {
    let a = filled(8, 8, rect(0, 0, 3, 3));
    let b = filled(8, 8, rect(4, 4, 7, 7));
    assert_eq!(a.intersect_set(&b), None);
}

#[test]
fn test_intersect_set_shape_mismatch() {
    let a = filled(8, 8, rect(0, 0, 3, 3));
    let b = filled(4, 16, rect(0, 0, 3, 3));
    assert_eq!(a.intersect_set(&b), None);
}

#[test]
fn test_intersect_cleared() {
    let a = filled(8, 4, rect(0, 0, 3, 3));
    let b = filled(8, 4, rect(0, 0, 5, 3));
    // Cleared in both: columns 6 and 7
    assert_eq!(a.intersect_cleared(&b), Some(rect(6, 0, 7, 3)));
}

// ============================================================================
// Scan tests
// ============================================================================

#[test]
fn test_clear_bit_scan_ignores_padding() {
    // 3x3 = 9 bits inside one 64-bit word
    let bits = filled(3, 3, rect(0, 0, 2, 2));
    assert_eq!(bits.next_clear_bit(0), None);
    assert_eq!(bits.previous_clear_bit(8), None);
}

#[test]
fn test_scans_cross_word_boundaries() {
    let mut bits = BitSet2D::new(100, 2);
    bits.set_flat(130);
    assert_eq!(bits.next_set_bit(0), Some(130));
    assert_eq!(bits.previous_set_bit(199), Some(130));
    assert_eq!(bits.next_set_bit(131), None);
    assert!(bits.get(30, 1));
    bits.clear(30, 1);
    assert_eq!(bits.next_set_bit(0), None);
}
