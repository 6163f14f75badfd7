// src/processing/mask.rs
use crate::processing::tile::Tile;

/// Per-band no-data flags for one tile (bands x pixels, row-major).
#[derive(Debug, Clone, PartialEq)]
pub struct InputMask {
    pixels: usize,
    planes: Vec<Vec<bool>>,
}

fn is_no_data(value: f64, sentinel: f64) -> bool {
    if sentinel.is_nan() {
        value.is_nan()
    } else {
        value == sentinel
    }
}

impl InputMask {
    /// Flag every pixel that exactly equals its band's no-data value.
    /// Bands without a no-data value are never flagged.
    pub fn compute(tile: &Tile) -> Self {
        let planes = tile
            .bands
            .iter()
            .map(|band| match band.no_data {
                Some(sentinel) => band.data.iter().map(|&v| is_no_data(v, sentinel)).collect(),
                None => vec![false; band.data.len()],
            })
            .collect();

        Self {
            pixels: tile.block.pixel_count(),
            planes,
        }
    }

    pub fn band(&self, index: usize) -> &[bool] {
        &self.planes[index]
    }

    pub fn band_count(&self) -> usize {
        self.planes.len()
    }

    /// True where any of `bands` is no-data.
    pub fn reduce_any(&self, bands: &[usize]) -> Vec<bool> {
        let mut combined = vec![false; self.pixels];
        for &b in bands {
            for (acc, &flag) in combined.iter_mut().zip(&self.planes[b]) {
                *acc |= flag;
            }
        }
        combined
    }
}

/// Overwrite masked positions of `plane` with `no_data`.
pub fn apply(plane: &mut [f64], mask: &[bool], no_data: f64) {
    for (value, &masked) in plane.iter_mut().zip(mask) {
        if masked {
            *value = no_data;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::blocks::BlockSpec;

    fn tile_2x2() -> Tile {
        let block = BlockSpec { x: 0, y: 0, width: 2, height: 2 };
        Tile::new(block)
            .with_band("a", Some(-1.0), vec![1.0, -1.0, 3.0, 4.0])
            .with_band("b", Some(0.0), vec![0.0, 2.0, 3.0, 4.0])
            .with_band("c", None, vec![-1.0, 0.0, f64::NAN, 4.0])
    }

    #[test]
    fn test_compute_exact_match() {
        let mask = InputMask::compute(&tile_2x2());
        assert_eq!(mask.band_count(), 3);
        assert_eq!(mask.band(0), &[false, true, false, false]);
        assert_eq!(mask.band(1), &[true, false, false, false]);
        assert_eq!(mask.band(2), &[false, false, false, false]);
    }

    #[test]
    fn test_nan_sentinel_matches_nan() {
        let block = BlockSpec { x: 0, y: 0, width: 3, height: 1 };
        let tile = Tile::new(block).with_band("a", Some(f64::NAN), vec![f64::NAN, 1.0, 0.0]);
        let mask = InputMask::compute(&tile);
        assert_eq!(mask.band(0), &[true, false, false]);
    }

    #[test]
    fn test_reduce_any_over_subset() {
        let mask = InputMask::compute(&tile_2x2());
        assert_eq!(mask.reduce_any(&[0]), vec![false, true, false, false]);
        assert_eq!(mask.reduce_any(&[0, 1]), vec![true, true, false, false]);
        assert_eq!(mask.reduce_any(&[2]), vec![false; 4]);
        assert_eq!(mask.reduce_any(&[]), vec![false; 4]);
    }

    #[test]
    fn test_apply_replaces_undefined_results() {
        let mut plane = vec![f64::NAN, f64::INFINITY, 0.5, 0.25];
        apply(&mut plane, &[true, true, false, false], -999.0);
        assert_eq!(plane, vec![-999.0, -999.0, 0.5, 0.25]);
    }
}
