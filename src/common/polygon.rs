use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{self as shp, PolygonRing};

/// Shapefile point types that carry planar x/y.
pub(crate) trait PlanarPoint {
    fn coord(&self) -> Coord<f64>;
}

impl PlanarPoint for shp::Point {
    fn coord(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } }
}

impl PlanarPoint for shp::PointM {
    fn coord(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } }
}

impl PlanarPoint for shp::PointZ {
    fn coord(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } }
}

/// Convert the rings of a shapefile polygon (any point flavour) to geo::MultiPolygon<f64>.
pub(crate) fn rings_to_geo<P: PlanarPoint>(rings: &[PolygonRing<P>]) -> MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn to_closed_line(points: &[impl PlanarPoint]) -> LineString<f64> {
        let mut coords: Vec<Coord<f64>> = points.iter().map(PlanarPoint::coord).collect();
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
        LineString(coords)
    }

    // Shapefile stores each outer ring followed by its holes.
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => {
                if let Some(ext) = current_exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
                }
                current_exterior = Some(to_closed_line(points));
            }
            // A hole with no preceding outer ring is a mis-wound exterior.
            PolygonRing::Inner(points) if current_exterior.is_none() => {
                current_exterior = Some(to_closed_line(points));
            }
            PolygonRing::Inner(points) => current_holes.push(to_closed_line(points)),
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(Polygon::new(ext, current_holes));
    }

    MultiPolygon(polys)
}

/// Convert geo::MultiPolygon<f64> to shapefile::Polygon
#[cfg(test)]
pub(crate) fn geo_to_shp(mp: &MultiPolygon<f64>) -> shp::Polygon {
    /// Close a ring of shapefile::Point
    fn ensure_closed(pts: &mut Vec<shp::Point>) {
        if let (Some(&first), Some(&last)) = (pts.first(), pts.last()) {
            if first.x != last.x || first.y != last.y { pts.push(first) }
        }
    }

    /// Get the signed area of a shapefile::Point list (negative for clockwise)
    fn signed_area(pts: &[shp::Point]) -> f64 {
        pts.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
    }

    let mut rings: Vec<PolygonRing<shp::Point>> = Vec::new();
    for poly in &mp.0 {
        // Exterior: force CW (Shapefile convention)
        let mut ext_pts: Vec<_> = poly.exterior().coords().map(|c| shp::Point::new(c.x, c.y)).collect();
        ensure_closed(&mut ext_pts);
        if signed_area(&ext_pts) > 0.0 { ext_pts.reverse() }
        rings.push(PolygonRing::Outer(ext_pts));

        // Holes: force CCW
        for hole in poly.interiors() {
            let mut hole_pts: Vec<_> = hole.coords().map(|c| shp::Point::new(c.x, c.y)).collect();
            ensure_closed(&mut hole_pts);
            if signed_area(&hole_pts) < 0.0 { hole_pts.reverse() }
            rings.push(PolygonRing::Inner(hole_pts));
        }
    }

    shp::Polygon::with_rings(rings)
}
