//! Reshaping flat per-node data into the node lattice and back.
//!
//! Nested results are indexed `[n][m]` in 2D and `[p][n][m]` in 3D, so the
//! innermost vector runs along the first axis, matching node order.

use crate::grid::Grid;
use crate::grid_error::GridError;

impl Grid {
    fn require_ndim(&self, ndim: usize, operation: &'static str) -> Result<(), GridError> {
        if self.ndim() != ndim {
            return Err(GridError::UnsupportedDimension {
                operation,
                ndim: self.ndim(),
            });
        }
        Ok(())
    }

    fn check_len(&self, found: usize) -> Result<(), GridError> {
        if found != self.size() {
            return Err(GridError::ShapeMismatch {
                expected: self.size(),
                found,
            });
        }
        Ok(())
    }

    /// Physical coordinates as `(xx, yy)`, each `[n][m]`.
    pub fn meshgrid2d(&self) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>), GridError> {
        self.require_ndim(2, "meshgrid2d")?;
        let component = |k: usize| self.nodes.iter().map(|nd| nd.x[k]).collect::<Vec<_>>();
        Ok((
            self.map_meshgrid2d(&component(0))?,
            self.map_meshgrid2d(&component(1))?,
        ))
    }

    /// Physical coordinates as `(xx, yy, zz)`, each `[p][n][m]`.
    #[allow(clippy::type_complexity)]
    pub fn meshgrid3d(
        &self,
    ) -> Result<(Vec<Vec<Vec<f64>>>, Vec<Vec<Vec<f64>>>, Vec<Vec<Vec<f64>>>), GridError> {
        self.require_ndim(3, "meshgrid3d")?;
        let component = |k: usize| self.nodes.iter().map(|nd| nd.x[k]).collect::<Vec<_>>();
        Ok((
            self.map_meshgrid3d(&component(0))?,
            self.map_meshgrid3d(&component(1))?,
            self.map_meshgrid3d(&component(2))?,
        ))
    }

    /// Reshapes one value per node into `[n][m]`.
    pub fn map_meshgrid2d<T: Clone>(&self, values: &[T]) -> Result<Vec<Vec<T>>, GridError> {
        self.require_ndim(2, "map_meshgrid2d")?;
        self.check_len(values.len())?;
        Ok(values.chunks(self.npts(0)).map(<[T]>::to_vec).collect())
    }

    /// Reshapes one value per node into `[p][n][m]`.
    pub fn map_meshgrid3d<T: Clone>(&self, values: &[T]) -> Result<Vec<Vec<Vec<T>>>, GridError> {
        self.require_ndim(3, "map_meshgrid3d")?;
        self.check_len(values.len())?;
        let (nm, nn) = (self.npts(0), self.npts(1));
        Ok(values
            .chunks(nm * nn)
            .map(|layer| layer.chunks(nm).map(<[T]>::to_vec).collect())
            .collect())
    }

    /// Inverse of [`Grid::map_meshgrid2d`].
    pub fn flatten2d<T: Clone>(&self, nested: &[Vec<T>]) -> Result<Vec<T>, GridError> {
        self.require_ndim(2, "flatten2d")?;
        let found: usize = nested.iter().map(Vec::len).sum();
        let ragged = nested.len() != self.npts(1) || nested.iter().any(|row| row.len() != self.npts(0));
        if ragged {
            return Err(GridError::ShapeMismatch {
                expected: self.size(),
                found,
            });
        }
        Ok(nested.concat())
    }

    /// Inverse of [`Grid::map_meshgrid3d`].
    pub fn flatten3d<T: Clone>(&self, nested: &[Vec<Vec<T>>]) -> Result<Vec<T>, GridError> {
        self.require_ndim(3, "flatten3d")?;
        let found: usize = nested.iter().flatten().map(Vec::len).sum();
        let ragged = nested.len() != self.npts(2)
            || nested.iter().any(|layer| {
                layer.len() != self.npts(1) || layer.iter().any(|row| row.len() != self.npts(0))
            });
        if ragged {
            return Err(GridError::ShapeMismatch {
                expected: self.size(),
                found,
            });
        }
        Ok(nested.iter().flatten().flatten().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_and_flatten_2d() {
        let grid = Grid::uniform(&[0.0, 0.0], &[1.0, 1.0], &[3, 2]).unwrap();
        let v = vec![1, 2, 3, 4, 5, 6];
        let nested = grid.map_meshgrid2d(&v).unwrap();
        assert_eq!(nested, vec![vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(grid.flatten2d(&nested).unwrap(), v);
    }

    #[test]
    fn map_and_flatten_3d() {
        let grid = Grid::uniform(&[0.0; 3], &[1.0; 3], &[2, 2, 2]).unwrap();
        let v: Vec<u8> = (0..8).collect();
        let nested = grid.map_meshgrid3d(&v).unwrap();
        assert_eq!(
            nested,
            vec![vec![vec![0, 1], vec![2, 3]], vec![vec![4, 5], vec![6, 7]]]
        );
        assert_eq!(grid.flatten3d(&nested).unwrap(), v);
    }

    #[test]
    fn shape_errors() {
        let grid = Grid::uniform(&[0.0, 0.0], &[1.0, 1.0], &[3, 2]).unwrap();
        assert_eq!(
            grid.map_meshgrid2d(&[0.0; 5]),
            Err(GridError::ShapeMismatch {
                expected: 6,
                found: 5
            })
        );
        assert_eq!(
            grid.flatten2d(&[vec![1, 2], vec![3, 4, 5, 6]]),
            Err(GridError::ShapeMismatch {
                expected: 6,
                found: 6
            })
        );
        assert!(matches!(
            grid.map_meshgrid3d(&[0.0; 6]),
            Err(GridError::UnsupportedDimension { ndim: 2, .. })
        ));
        assert!(matches!(
            grid.meshgrid3d(),
            Err(GridError::UnsupportedDimension { .. })
        ));
    }
}
