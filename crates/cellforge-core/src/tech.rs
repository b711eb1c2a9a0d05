use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::Grid2D;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TechError {
    #[error("layer index {0} has no GDS mapping")]
    UnmappedLayer(usize),
}

/// Unit and header parameters consumed verbatim when initializing a GDS
/// output library.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechUnits {
    /// GDS stream format version, e.g. 600 for version 6.
    pub gds_header: i16,
    /// Database unit in user units.
    pub dbu_uu: f64,
    /// Database unit in meters.
    pub dbu_m: f64,
}

impl Default for TechUnits {
    fn default() -> Self {
        Self {
            gds_header: 600,
            dbu_uu: 1e-3,
            dbu_m: 1e-9,
        }
    }
}

/// A single technology layer: a name plus its layer number in the output
/// stream format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechLayer {
    pub name: String,
    pub gds_layer: i16,
}

/// Read-only technology database: maps internal layer indices to GDS layer
/// numbers and carries unit parameters and pairwise spacing rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tech {
    units: TechUnits,
    layers: Vec<TechLayer>,
    /// Minimum spacing per layer pair, in database units. Zero means no rule.
    spacing: Grid2D<i64>,
}

impl Tech {
    pub fn new(units: TechUnits) -> Self {
        Self {
            units,
            layers: Vec::new(),
            spacing: Grid2D::new(0, 0),
        }
    }

    pub fn units(&self) -> &TechUnits {
        &self.units
    }

    /// Register a layer and return its internal index.
    pub fn add_layer(&mut self, name: &str, gds_layer: i16) -> usize {
        self.layers.push(TechLayer {
            name: name.to_string(),
            gds_layer,
        });
        self.layers.len() - 1
    }

    pub fn layer(&self, idx: usize) -> Option<&TechLayer> {
        self.layers.get(idx)
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Map an internal layer index to its GDS layer number. Fails closed
    /// when the index has no mapping.
    pub fn layer_to_gds(&self, idx: usize) -> Result<i16, TechError> {
        self.layers
            .get(idx)
            .map(|l| l.gds_layer)
            .ok_or(TechError::UnmappedLayer(idx))
    }

    /// Record a symmetric minimum-spacing rule between two layers.
    pub fn set_spacing_rule(&mut self, a: usize, b: usize, spacing: i64) -> Result<(), TechError> {
        let n = self.layers.len();
        if a >= n {
            return Err(TechError::UnmappedLayer(a));
        }
        if b >= n {
            return Err(TechError::UnmappedLayer(b));
        }
        if self.spacing.x_size() != n {
            let mut table = Grid2D::new(n, n);
            for x in 0..self.spacing.x_size() {
                for y in 0..self.spacing.y_size() {
                    table[(x, y)] = self.spacing[(x, y)];
                }
            }
            self.spacing = table;
        }
        self.spacing[(a, b)] = spacing;
        self.spacing[(b, a)] = spacing;
        Ok(())
    }

    /// Minimum required spacing between two layers, 0 when no rule exists.
    pub fn spacing_rule(&self, a: usize, b: usize) -> i64 {
        self.spacing.get(a, b).copied().unwrap_or(0)
    }
}
