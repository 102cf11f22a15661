use itertools::izip;

/// A per-dimension scale and translation mapping voxel coordinates of a resolution level to channel-local physical coordinates.
///
/// A voxel of a level downsampled by factor `f` covers `f` voxels of level 0, so its centre lies at `f * x + (f - 1) / 2` in level 0 voxel coordinates.
/// The result is then scaled by the level 0 voxel size.
#[derive(Clone, Debug, PartialEq)]
pub struct MipmapTransform {
    scale: Vec<f64>,
    translation: Vec<f64>,
}

impl MipmapTransform {
    /// Create the transform of a level with `downsampling_factors` in a channel with level 0 `voxel_size`.
    ///
    /// # Panics
    /// Panics if `voxel_size` and `downsampling_factors` have different lengths.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(voxel_size: &[f64], downsampling_factors: &[u64]) -> Self {
        assert_eq!(voxel_size.len(), downsampling_factors.len());
        let (scale, translation) = std::iter::zip(voxel_size, downsampling_factors)
            .map(|(&voxel_size, &factor)| {
                let factor = factor as f64;
                (voxel_size * factor, voxel_size * (factor - 1.0) * 0.5)
            })
            .unzip();
        Self { scale, translation }
    }

    /// Create an identity transform.
    #[must_use]
    pub fn identity(dimensionality: usize) -> Self {
        Self {
            scale: vec![1.0; dimensionality],
            translation: vec![0.0; dimensionality],
        }
    }

    /// Return the dimensionality of the transform.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.scale.len()
    }

    /// Return the scale of the transform.
    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Return the translation of the transform.
    #[must_use]
    pub fn translation(&self) -> &[f64] {
        &self.translation
    }

    /// Map level voxel coordinates to physical coordinates.
    ///
    /// # Panics
    /// Panics if the length of `coordinates` does not match the transform dimensionality.
    #[must_use]
    pub fn apply(&self, coordinates: &[f64]) -> Vec<f64> {
        assert_eq!(coordinates.len(), self.dimensionality());
        izip!(coordinates, &self.scale, &self.translation)
            .map(|(x, scale, translation)| x * scale + translation)
            .collect()
    }

    /// Map physical coordinates to level voxel coordinates.
    ///
    /// # Panics
    /// Panics if the length of `coordinates` does not match the transform dimensionality.
    #[must_use]
    pub fn apply_inverse(&self, coordinates: &[f64]) -> Vec<f64> {
        assert_eq!(coordinates.len(), self.dimensionality());
        izip!(coordinates, &self.scale, &self.translation)
            .map(|(x, scale, translation)| (x - translation) / scale)
            .collect()
    }
}
