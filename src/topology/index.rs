//! Node numbering for tensor-product lattices.
//!
//! Nodes are numbered with the first axis varying fastest:
//! `i = p * npts[1] * npts[0] + n * npts[0] + m`.
//! Unused trailing axes have one point and their index is pinned to 0.

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::grid_error::GridError;

/// Maximum parametric dimensionality of a grid.
pub const MAX_DIM: usize = 3;

/// Lattice shape: dimensionality and per-axis point counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawShape")]
pub struct GridShape {
    ndim: usize,
    npts: [usize; MAX_DIM],
}

/// Serialized layout of [`GridShape`], checked before use.
#[derive(Deserialize)]
struct RawShape {
    ndim: usize,
    npts: [usize; MAX_DIM],
}

impl TryFrom<RawShape> for GridShape {
    type Error = GridError;

    fn try_from(raw: RawShape) -> Result<Self, GridError> {
        let used = raw.npts.get(..raw.ndim).ok_or(GridError::UnsupportedDimension {
            operation: "GridShape::deserialize",
            ndim: raw.ndim,
        })?;
        let shape = Self::new(used)?;
        if shape.npts != raw.npts {
            return Err(GridError::InvalidInput(format!(
                "unused axes must have one point, got {:?}",
                raw.npts
            )));
        }
        Ok(shape)
    }
}

impl GridShape {
    /// Builds a shape from one point count per axis (1 to 3 axes, each non-zero).
    pub fn new(npts: &[usize]) -> Result<Self, GridError> {
        let ndim = npts.len();
        if ndim == 0 || ndim > MAX_DIM {
            return Err(GridError::UnsupportedDimension {
                operation: "GridShape::new",
                ndim,
            });
        }
        if let Some(axis) = npts.iter().position(|&n| n == 0) {
            return Err(GridError::InvalidInput(format!(
                "axis {axis} has no points"
            )));
        }
        let mut all = [1; MAX_DIM];
        all[..ndim].copy_from_slice(npts);
        Ok(Self { ndim, npts: all })
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Point count along `axis`; 1 for axes beyond the dimensionality.
    #[inline]
    pub fn npts(&self, axis: usize) -> usize {
        self.npts.get(axis).copied().unwrap_or(1)
    }

    /// Total number of nodes.
    #[inline]
    pub fn size(&self) -> usize {
        self.npts.iter().product()
    }

    /// Multi-index to linear node id.
    pub fn to_linear(&self, m: usize, n: usize, p: usize) -> Result<usize, GridError> {
        if m >= self.npts[0] || n >= self.npts[1] || p >= self.npts[2] {
            return Err(GridError::InvalidIndex { m, n, p });
        }
        Ok(p * self.npts[1] * self.npts[0] + n * self.npts[0] + m)
    }

    /// Linear node id to multi-index.
    pub fn to_multi(&self, id: usize) -> Result<(usize, usize, usize), GridError> {
        let size = self.size();
        if id >= size {
            return Err(GridError::InvalidNodeId { id, size });
        }
        let layer = self.npts[0] * self.npts[1];
        let p = id / layer;
        let rem = id % layer;
        Ok((rem % self.npts[0], rem / self.npts[0], p))
    }

    /// All multi-indices in node order.
    pub fn indices(&self) -> impl Iterator<Item = (usize, usize, usize)> + use<> {
        let [nm, nn, np] = self.npts;
        iproduct!(0..np, 0..nn, 0..nm).map(|(p, n, m)| (m, n, p))
    }

    /// Node ids of the sub-lattice `m in ms, n in ns, p in ps`, in node order.
    pub(crate) fn block(
        &self,
        ms: std::ops::Range<usize>,
        ns: std::ops::Range<usize>,
        ps: std::ops::Range<usize>,
    ) -> Vec<usize> {
        let (nm, nn) = (self.npts[0], self.npts[1]);
        iproduct!(ps, ns, ms)
            .map(|(p, n, m)| p * nn * nm + n * nm + m)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_numbering_is_first_axis_fastest() {
        let shape = GridShape::new(&[5, 4]).unwrap();
        assert_eq!(shape.ndim(), 2);
        assert_eq!(shape.size(), 20);
        assert_eq!(shape.npts(2), 1);
        let mut idx = 0;
        for n in 0..4 {
            for m in 0..5 {
                assert_eq!(shape.to_linear(m, n, 0).unwrap(), idx);
                assert_eq!(shape.to_multi(idx).unwrap(), (m, n, 0));
                idx += 1;
            }
        }
    }

    #[test]
    fn indices_follow_node_order() {
        let shape = GridShape::new(&[3, 4, 2]).unwrap();
        for (i, (m, n, p)) in shape.indices().enumerate() {
            assert_eq!(shape.to_linear(m, n, p).unwrap(), i);
        }
        assert_eq!(shape.indices().count(), 24);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let shape = GridShape::new(&[3, 4]).unwrap();
        assert_eq!(
            shape.to_linear(3, 0, 0),
            Err(GridError::InvalidIndex { m: 3, n: 0, p: 0 })
        );
        assert_eq!(
            shape.to_linear(0, 0, 1),
            Err(GridError::InvalidIndex { m: 0, n: 0, p: 1 })
        );
        assert_eq!(
            shape.to_multi(12),
            Err(GridError::InvalidNodeId { id: 12, size: 12 })
        );
    }

    #[test]
    fn deserialization_checks_the_shape() {
        let shape = GridShape::new(&[3, 2]).unwrap();
        let json = serde_json::to_string(&shape).unwrap();
        assert_eq!(serde_json::from_str::<GridShape>(&json).unwrap(), shape);

        for bad in [
            r#"{"ndim":2,"npts":[0,3,1]}"#,
            r#"{"ndim":2,"npts":[2,3,4]}"#,
            r#"{"ndim":4,"npts":[2,2,2]}"#,
            r#"{"ndim":0,"npts":[1,1,1]}"#,
        ] {
            assert!(serde_json::from_str::<GridShape>(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn bad_shapes() {
        assert!(GridShape::new(&[]).is_err());
        assert!(GridShape::new(&[2, 2, 2, 2]).is_err());
        assert!(matches!(
            GridShape::new(&[2, 0]),
            Err(GridError::InvalidInput(_))
        ));
    }
}
