//! Logical sides of a structured grid and their integer tags.
//!
//! Side sets are derived from the lattice shape alone. Lookups are lenient:
//! a side or tag that does not exist for the grid's dimensionality yields
//! `None`, so callers can probe for a boundary without checking `ndim` first.
//!
//! Tag vocabulary:
//! - 2D edges: `10` xmin, `11` xmax, `20` ymin, `21` ymax
//! - 3D faces: `100` xmin, `101` xmax, `200` ymin, `201` ymax, `300` zmin, `301` zmax

use serde::{Deserialize, Serialize};

use crate::topology::index::GridShape;

/// One of the six sides of the logical cube.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoundarySide {
    XMin,
    XMax,
    YMin,
    YMax,
    ZMin,
    ZMax,
}

impl BoundarySide {
    /// All sides in side-number order.
    pub const ALL: [BoundarySide; 6] = [
        BoundarySide::XMin,
        BoundarySide::XMax,
        BoundarySide::YMin,
        BoundarySide::YMax,
        BoundarySide::ZMin,
        BoundarySide::ZMax,
    ];

    /// Side from its number `2 * axis + (0 min | 1 max)`.
    pub fn from_index(side: usize) -> Option<Self> {
        Self::ALL.get(side).copied()
    }

    /// Side number `2 * axis + (0 min | 1 max)`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis normal to this side.
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    /// Whether this side sits at the upper end of its axis.
    pub fn is_max(self) -> bool {
        self.index() % 2 == 1
    }

    /// 2D edge tag (`10`, `11`, `20`, `21`); `None` for z sides.
    pub fn edge_tag(self) -> Option<i32> {
        (self.axis() < 2).then(|| 10 * (self.axis() as i32 + 1) + self.is_max() as i32)
    }

    /// 3D face tag (`100` ... `301`).
    pub fn face_tag(self) -> i32 {
        100 * (self.axis() as i32 + 1) + self.is_max() as i32
    }

    /// Inverse of [`BoundarySide::edge_tag`].
    pub fn from_edge_tag(tag: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.edge_tag() == Some(tag))
    }

    /// Inverse of [`BoundarySide::face_tag`].
    pub fn from_face_tag(tag: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.face_tag() == tag)
    }
}

/// Node ids on `side`, in node order, for any shape whose dimensionality
/// includes the side's axis.
fn side_nodes(shape: &GridShape, side: BoundarySide) -> Option<Vec<usize>> {
    let axis = side.axis();
    if axis >= shape.ndim() {
        return None;
    }
    let mut ranges = [0..shape.npts(0), 0..shape.npts(1), 0..shape.npts(2)];
    let fixed = if side.is_max() { shape.npts(axis).checked_sub(1)? } else { 0 };
    ranges[axis] = fixed..fixed + 1;
    let [ms, ns, ps] = ranges;
    Some(shape.block(ms, ns, ps))
}

/// Node ids on 2D edge `side` (0 xmin, 1 xmax, 2 ymin, 3 ymax).
pub fn edge(shape: &GridShape, side: usize) -> Option<Vec<usize>> {
    if shape.ndim() != 2 {
        return None;
    }
    side_nodes(shape, BoundarySide::from_index(side)?)
}

/// Node ids on 3D face `side` (0 xmin ... 5 zmax).
pub fn face(shape: &GridShape, side: usize) -> Option<Vec<usize>> {
    if shape.ndim() != 3 {
        return None;
    }
    side_nodes(shape, BoundarySide::from_index(side)?)
}

/// Edge node ids for a 2D tag.
pub fn edge_given_tag(shape: &GridShape, tag: i32) -> Option<Vec<usize>> {
    edge(shape, BoundarySide::from_edge_tag(tag)?.index())
}

/// Face node ids for a 3D tag.
pub fn face_given_tag(shape: &GridShape, tag: i32) -> Option<Vec<usize>> {
    face(shape, BoundarySide::from_face_tag(tag)?.index())
}

/// Edge or face node ids for a tag, following the grid's dimensionality.
pub fn boundary(shape: &GridShape, tag: i32) -> Option<Vec<usize>> {
    match shape.ndim() {
        2 => edge_given_tag(shape, tag),
        3 => face_given_tag(shape, tag),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for side in BoundarySide::ALL {
            assert_eq!(BoundarySide::from_face_tag(side.face_tag()), Some(side));
            if let Some(tag) = side.edge_tag() {
                assert_eq!(BoundarySide::from_edge_tag(tag), Some(side));
            }
        }
        assert_eq!(BoundarySide::XMax.edge_tag(), Some(11));
        assert_eq!(BoundarySide::YMin.edge_tag(), Some(20));
        assert_eq!(BoundarySide::ZMin.edge_tag(), None);
        assert_eq!(BoundarySide::ZMax.face_tag(), 301);
        assert_eq!(BoundarySide::from_edge_tag(123), None);
    }

    #[test]
    fn edges_2d() {
        let shape = GridShape::new(&[5, 4]).unwrap();
        assert_eq!(edge(&shape, 0).unwrap(), vec![0, 5, 10, 15]);
        assert_eq!(edge(&shape, 1).unwrap(), vec![4, 9, 14, 19]);
        assert_eq!(edge(&shape, 2).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(edge(&shape, 3).unwrap(), vec![15, 16, 17, 18, 19]);
        assert_eq!(edge(&shape, 4), None);
        assert_eq!(face(&shape, 0), None);
        assert_eq!(face_given_tag(&shape, 100), None);
        assert_eq!(boundary(&shape, 21), edge(&shape, 3));
        assert_eq!(boundary(&shape, 100), None);
    }

    #[test]
    fn faces_3d() {
        let shape = GridShape::new(&[4, 3, 2]).unwrap();
        assert_eq!(face(&shape, 0).unwrap(), vec![0, 4, 8, 12, 16, 20]);
        assert_eq!(face(&shape, 1).unwrap(), vec![3, 7, 11, 15, 19, 23]);
        assert_eq!(face(&shape, 2).unwrap(), vec![0, 1, 2, 3, 12, 13, 14, 15]);
        assert_eq!(face(&shape, 3).unwrap(), vec![8, 9, 10, 11, 20, 21, 22, 23]);
        assert_eq!(face(&shape, 4).unwrap(), (0..12).collect::<Vec<_>>());
        assert_eq!(face(&shape, 5).unwrap(), (12..24).collect::<Vec<_>>());
        assert_eq!(edge(&shape, 0), None);
        assert_eq!(edge_given_tag(&shape, 10), None);
        assert_eq!(boundary(&shape, 10), None);
    }

    #[test]
    fn no_sides_in_1d() {
        let shape = GridShape::new(&[4]).unwrap();
        assert_eq!(edge(&shape, 0), None);
        assert_eq!(face(&shape, 0), None);
        assert_eq!(boundary(&shape, 10), None);
    }
}
