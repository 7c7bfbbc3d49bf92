/// Minimum and maximum extents of a rectangular region.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox<T> {
    /// Minimum extent in the x direction, the left side of a region.
    pub x_min: T,
    /// Minimum extent in the y direction. In a Y-up coordinate system,
    /// which is used by fonts, this represents the bottom of a region.
    pub y_min: T,
    /// Maximum extent in the x direction, the right side of a region.
    pub x_max: T,
    /// Maximum extent in the y direction. In a Y-up coordinate system,
    /// which is used by fonts, this represents the top of the region.
    pub y_max: T,
}

impl<T> BoundingBox<T>
where
    T: PartialOrd + Copy,
{
    /// Compute the bounds of a sequence of points.
    ///
    /// Returns `None` if the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = crate::Point<T>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = BoundingBox {
            x_min: first.x,
            y_min: first.y,
            x_max: first.x,
            y_max: first.y,
        };
        for point in iter {
            if point.x < bbox.x_min {
                bbox.x_min = point.x;
            }
            if point.x > bbox.x_max {
                bbox.x_max = point.x;
            }
            if point.y < bbox.y_min {
                bbox.y_min = point.y;
            }
            if point.y > bbox.y_max {
                bbox.y_max = point.y;
            }
        }
        Some(bbox)
    }
}
