//! TWD97 transverse-Mercator grid to geographic coordinates.
//!
//! Open data from Taiwanese agencies frequently ships TM2 grid pairs
//! (`X坐標`/`Y坐標`) instead of latitude/longitude. The inverse projection
//! here is the classic series expansion on the GRS80 ellipsoid; the series is
//! truncated at fixed order, which is accurate well below a metre over the
//! two-degree zone.

/// Parameters of one transverse-Mercator zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    /// Semi-major axis in metres.
    pub semi_major: f64,
    /// Semi-minor axis in metres.
    pub semi_minor: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    /// Central meridian in degrees.
    pub central_meridian: f64,
}

/// TWD97 two-degree zone centred on 121°E (EPSG:3826).
pub const TWD97_TM2_121: TransverseMercator = TransverseMercator {
    semi_major: 6_378_137.0,
    semi_minor: 6_356_752.314_140,
    scale_factor: 0.9999,
    false_easting: 250_000.0,
    false_northing: 0.0,
    central_meridian: 121.0,
};

/// TWD97 two-degree zone centred on 119°E, used for Penghu and Kinmen.
pub const TWD97_TM2_119: TransverseMercator = TransverseMercator {
    central_meridian: 119.0,
    ..TWD97_TM2_121
};

/// Spatial reference WKID the geocoding service uses for TWD97/TM2 121°E.
pub const TWD97_TM2_121_WKID: u32 = 3826;

/// Convert a TWD97 TM2 (121°E) grid pair to `(latitude, longitude)` degrees.
///
/// Callers must reject non-positive inputs first (see [`is_valid_grid_input`]);
/// pathological input yields NaN or meaningless values rather than an error.
pub fn to_geographic(x: f64, y: f64) -> (f64, f64) {
    TWD97_TM2_121.inverse(x, y)
}

/// Whether a raw grid pair is worth projecting at all.
pub fn is_valid_grid_input(x: f64, y: f64) -> bool {
    x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0
}

impl TransverseMercator {
    /// Inverse projection: grid easting/northing to `(latitude, longitude)`.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let a = self.semi_major;
        let b = self.semi_minor;
        let e2 = 1.0 - (b * b) / (a * a);
        let e = e2.sqrt();
        let ep2 = e2 / (1.0 - e2);
        let k0 = self.scale_factor;

        let easting = x - self.false_easting;
        let northing = y - self.false_northing;

        // Footpoint latitude from the meridional arc.
        let arc = northing / k0;
        let mu = arc / (a * (1.0 - e2 / 4.0 - 3.0 * e.powi(4) / 64.0 - 5.0 * e.powi(6) / 256.0));

        let root = (1.0 - e2).sqrt();
        let e1 = (1.0 - root) / (1.0 + root);
        let j1 = 3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0;
        let j2 = 21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0;
        let j3 = 151.0 * e1.powi(3) / 96.0;
        let j4 = 1097.0 * e1.powi(4) / 512.0;
        let fp = mu
            + j1 * (2.0 * mu).sin()
            + j2 * (4.0 * mu).sin()
            + j3 * (6.0 * mu).sin()
            + j4 * (8.0 * mu).sin();

        let sin_fp = fp.sin();
        let cos_fp = fp.cos();
        let tan_fp = fp.tan();
        let n1 = a / (1.0 - e2 * sin_fp * sin_fp).sqrt();
        let t1 = tan_fp * tan_fp;
        let c1 = ep2 * cos_fp * cos_fp;
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_fp * sin_fp).powf(1.5);
        let d = easting / (n1 * k0);

        let q1 = n1 * tan_fp / r1;
        let q2 = d.powi(2) / 2.0;
        let q3 = (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0;
        let q4 = (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
            * d.powi(6)
            / 720.0;
        let latitude = fp - q1 * (q2 - q3 + q4);

        let q6 = (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0;
        let q7 = (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
            * d.powi(5)
            / 120.0;
        let longitude = self.central_meridian.to_radians() + (d - q6 + q7) / cos_fp;

        (latitude.to_degrees(), longitude.to_degrees())
    }
}
