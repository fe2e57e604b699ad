use anyhow::{anyhow, Context, Result};
use geo::Coord;
use proj4rs::{proj::Proj as Proj4, transform::transform};

/// A pure coordinate transform from a source frame into a target frame.
pub trait Projection {
    fn project(&self, coord: Coord<f64>) -> Result<Coord<f64>>;
}

/// Any `(x, y) -> (x, y)` function is a projection.
impl<F> Projection for F where F: Fn(f64, f64) -> (f64, f64) {
    #[inline]
    fn project(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let (x, y) = self(coord.x, coord.y);
        Ok(Coord { x, y })
    }
}

/// Returns true if the PROJ.4 string describes a geographic (lon/lat) frame.
fn is_geographic(proj_string: &str) -> bool {
    ["+proj=longlat", "+proj=latlong", "+proj=lonlat", "+proj=latlon"].iter()
        .any(|name| proj_string.contains(name))
}

/// Build the PROJ.4 string for the UTM zone containing a lon/lat `center`.
/// - WGS84: zones 1-60, `+south` below the equator
/// - NAD83: northern hemisphere only; falls back to WGS84 in the south
pub fn utm_proj4(center: Coord<f64>, nad83: bool) -> String {
    let zone = (((center.x + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u32;
    let north = center.y >= 0.0;

    let datum = if nad83 && north { "NAD83" } else { "WGS84" };
    let south = if north { "" } else { " +south" };

    format!("+proj=utm +zone={zone}{south} +datum={datum} +units=m +no_defs +type=crs")
}

/// A `Projection` between two PROJ.4 frames, backed by `proj4rs`.
///
/// Geographic frames take and return degrees; the conversion to the radians
/// `proj4rs` works in is handled here.
pub struct Proj4Projection {
    from: Proj4,
    to: Proj4,
    from_degrees: bool,
    to_degrees: bool,
}

impl Proj4Projection {
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let from = Proj4::from_proj_string(source)
            .with_context(|| anyhow!("[geom::proj] failed to build source PROJ.4: {source}"))?;
        let to = Proj4::from_proj_string(target)
            .with_context(|| anyhow!("[geom::proj] failed to build target PROJ.4: {target}"))?;

        Ok(Self { from, to, from_degrees: is_geographic(source), to_degrees: is_geographic(target) })
    }

    /// Projection from WGS84 lon/lat into the UTM zone around `center`.
    pub fn wgs84_to_utm(center: Coord<f64>) -> Result<Self> {
        Self::new("+proj=longlat +datum=WGS84 +no_defs +type=crs", &utm_proj4(center, false))
    }
}

impl Projection for Proj4Projection {
    fn project(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = if self.from_degrees {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        transform(&self.from, &self.to, &mut point)
            .map_err(|err| anyhow!("[geom::proj] CRS transform failed for ({}, {}): {err:?}", coord.x, coord.y))?;

        Ok(if self.to_degrees {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    }
}
