//! Disc and ring offset sets for squared radii.
//!
//! View, attack, and spawn radii are fixed for the life of a game, so the
//! offset sets they induce are computed once per distinct radius and reused
//! every turn; the grid precomputes its discs at startup and hands out
//! slices.

use crate::engine::tile::Offset;

/// Compute the filled disc of offsets with `dr² + dc² <= radius2`.
#[must_use]
pub fn disc_offsets(radius2: u32) -> Vec<Offset> {
    offsets_for(radius2, false)
}

/// Compute the thin ring of offsets with `dr² + dc²` equal to `radius2` or
/// `radius2 - 1`.
///
/// Used for perimeter placement, e.g. posting defenders around a hill.
#[must_use]
pub fn ring_offsets(radius2: u32) -> Vec<Offset> {
    offsets_for(radius2, true)
}

fn offsets_for(radius2: u32, outline_only: bool) -> Vec<Offset> {
    let mut offsets = Vec::new();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mx = f64::from(radius2).sqrt() as i16;
    for dr in -mx..=mx {
        for dc in -mx..=mx {
            let d = u32::from(dr.unsigned_abs()).pow(2) + u32::from(dc.unsigned_abs()).pow(2);
            let keep = if outline_only {
                d == radius2 || d + 1 == radius2
            } else {
                d <= radius2
            };
            if keep {
                offsets.push(Offset::new(dr, dc));
            }
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disc_radius_one() {
        // Center plus the four orthogonal neighbors.
        let disc = disc_offsets(1);
        assert_eq!(disc.len(), 5);
        assert!(disc.contains(&Offset::new(0, 0)));
        assert!(disc.contains(&Offset::new(-1, 0)));
        assert!(disc.contains(&Offset::new(1, 0)));
        assert!(disc.contains(&Offset::new(0, -1)));
        assert!(disc.contains(&Offset::new(0, 1)));
    }

    #[test]
    fn test_disc_excludes_outside() {
        let disc = disc_offsets(5);
        assert!(disc.contains(&Offset::new(2, 1)));
        assert!(!disc.contains(&Offset::new(2, 2)));
    }

    #[test]
    fn test_ring_excludes_interior() {
        let ring = ring_offsets(5);
        assert!(ring.contains(&Offset::new(2, 1)));
        assert!(ring.contains(&Offset::new(2, 0)));
        assert!(!ring.contains(&Offset::new(0, 0)));
        assert!(!ring.contains(&Offset::new(1, 0)));
    }

    #[test]
    fn test_ring_is_subset_of_disc() {
        let disc = disc_offsets(10);
        for offset in ring_offsets(10) {
            assert!(disc.contains(&offset));
        }
    }

}
