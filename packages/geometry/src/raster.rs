//! Fixed-point raster transform for debug rendering of sector boundaries.
//!
//! Maps polygon vertices from true degrees into a fixed 500×500 pixel
//! canvas (plus padding) so a boundary and the points filtered against
//! it can be eyeballed. Coordinates go through a `×10⁸` fixed-point
//! integer space before rescaling, so two nearby vertices never collapse
//! from float noise. Not used by the acquisition pipeline itself.

use std::collections::BTreeMap;

/// Canvas size in pixels, per axis.
pub const RESOLUTION: [i64; 2] = [500, 500];

/// Padding added on each side of the canvas, per axis.
pub const PADDING: [i64; 2] = [6, 6];

/// Fixed-point multiplier applied to degree coordinates.
const TO_INTEGER: f64 = 100_000_000.0;

/// Per-axis linear scale: `(min, range)` in fixed-point space.
type Scale = (i64, i64);

/// A linear transform from degree coordinates into canvas pixels.
///
/// The x axis is latitude and the y axis is longitude, matching the
/// `[lat, lon]` vertex order of the sector boundary rings.
#[derive(Debug, Clone)]
pub struct Dimension {
    x_scale: Scale,
    y_scale: Scale,
    outlines: Vec<Vec<[i64; 2]>>,
}

impl Dimension {
    /// Builds the transform that fits the given rings onto the canvas.
    ///
    /// Returns `None` when the rings contain no vertices at all.
    #[must_use]
    pub fn from_rings(rings: &[Vec<[f64; 2]>]) -> Option<Self> {
        let mut xs: Vec<i64> = Vec::new();
        let mut ys: Vec<i64> = Vec::new();
        for ring in rings {
            for &[lat, lon] in ring {
                xs.push(to_fixed(lat));
                ys.push(to_fixed(lon));
            }
        }
        if xs.is_empty() {
            return None;
        }

        let x_scale = scale_of(&xs);
        let y_scale = scale_of(&ys);

        let outlines = rings
            .iter()
            .filter(|ring| !ring.is_empty())
            .map(|ring| {
                ring.iter()
                    .map(|&[lat, lon]| {
                        [
                            fit(to_fixed(lat), x_scale, 0),
                            fit(to_fixed(lon), y_scale, 1),
                        ]
                    })
                    .collect()
            })
            .collect();

        Some(Self {
            x_scale,
            y_scale,
            outlines,
        })
    }

    /// Projects a degree coordinate onto the canvas.
    #[must_use]
    pub fn project(&self, lat: f64, lon: f64) -> [i64; 2] {
        [
            fit(to_fixed(lat), self.x_scale, 0),
            fit(to_fixed(lon), self.y_scale, 1),
        ]
    }

    /// The boundary rings, already projected to canvas coordinates.
    #[must_use]
    pub fn outlines(&self) -> &[Vec<[i64; 2]>] {
        &self.outlines
    }

    /// Projects tagged points (listings, amenities) onto the canvas.
    #[must_use]
    pub fn dots<'a, I>(&self, points: I) -> Vec<Dust>
    where
        I: IntoIterator<Item = (&'a str, f64, f64)>,
    {
        points
            .into_iter()
            .map(|(tag, lat, lon)| Dust {
                tag: tag.to_owned(),
                pos: self.project(lat, lon),
            })
            .collect()
    }
}

/// A tagged point projected onto the canvas.
#[derive(Debug, Clone)]
pub struct Dust {
    /// Category or property-type code the point was tagged with.
    pub tag: String,
    /// Canvas position.
    pub pos: [i64; 2],
}

#[allow(clippy::cast_possible_truncation)]
fn to_fixed(degrees: f64) -> i64 {
    (degrees * TO_INTEGER) as i64
}

fn scale_of(values: &[i64]) -> Scale {
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    (min, (max - min).max(1))
}

#[allow(clippy::cast_possible_truncation)]
fn fit(value: i64, (min, range): Scale, axis: usize) -> i64 {
    let scaled = i128::from(value - min) * i128::from(RESOLUTION[axis]) / i128::from(range);
    scaled as i64 + PADDING[axis]
}

/// Default color per tag for rendering, as RGB triples.
#[must_use]
pub fn default_tag_colors() -> BTreeMap<&'static str, [u8; 3]> {
    BTreeMap::from([
        ("APT", [0, 255, 0]),
        ("ABYG", [0, 255, 0]),
        ("OPST", [255, 0, 0]),
        ("OBYG", [255, 0, 0]),
        ("JGB", [0, 0, 255]),
        ("JGC", [0, 0, 255]),
        ("BUS", [0, 255, 255]),
        ("METRO", [0, 255, 255]),
        ("INFANT", [255, 255, 0]),
        ("PRESCHOOL", [255, 255, 0]),
        ("PRI_SCHOOL", [0, 0, 0]),
        ("PUB_SCHOOL", [0, 0, 0]),
        ("HOSPITAL", [0, 0, 0]),
        ("PARKING", [0, 0, 0]),
        ("MART", [0, 0, 0]),
        ("CONVENIENCE", [0, 0, 0]),
        ("WASHING", [0, 0, 0]),
        ("BANK", [0, 0, 0]),
        ("OFFICE", [0, 0, 0]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_extremes_to_canvas_edges() {
        let rings = vec![vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]];
        let dim = Dimension::from_rings(&rings).unwrap();

        assert_eq!(dim.project(0.0, 0.0), [PADDING[0], PADDING[1]]);
        assert_eq!(
            dim.project(1.0, 1.0),
            [RESOLUTION[0] + PADDING[0], RESOLUTION[1] + PADDING[1]]
        );
    }

    #[test]
    fn projects_midpoint_to_canvas_center() {
        let rings = vec![vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]];
        let dim = Dimension::from_rings(&rings).unwrap();

        assert_eq!(
            dim.project(0.5, 0.5),
            [RESOLUTION[0] / 2 + PADDING[0], RESOLUTION[1] / 2 + PADDING[1]]
        );
    }

    #[test]
    fn outline_vertices_match_projection() {
        let rings = vec![vec![[37.5, 127.0], [37.51, 127.02], [37.49, 127.03]]];
        let dim = Dimension::from_rings(&rings).unwrap();
        let outline = &dim.outlines()[0];

        assert_eq!(outline[0], dim.project(37.5, 127.0));
        assert_eq!(outline[2], dim.project(37.49, 127.03));
    }

    #[test]
    fn no_vertices_yields_no_dimension() {
        assert!(Dimension::from_rings(&[]).is_none());

        let empty_ring: Vec<[f64; 2]> = Vec::new();
        assert!(Dimension::from_rings(&[empty_ring]).is_none());
    }
}
