// wn-core/src/units.rs

use uom::si::f64::{
    Area as UomArea, Length as UomLength, Velocity as UomVelocity,
    VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Length = UomLength;
pub type Velocity = UomVelocity;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

/// Pipe diameters arrive in millimetres.
#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

/// Demands and flows are exchanged in litres per second.
#[inline]
pub fn lps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::liter_per_second;
    VolumeRate::new::<liter_per_second>(v)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v)
}

#[inline]
pub fn as_lps(q: VolumeRate) -> f64 {
    use uom::si::volume_rate::liter_per_second;
    q.get::<liter_per_second>()
}

#[inline]
pub fn as_m3ps(q: VolumeRate) -> f64 {
    use uom::si::volume_rate::cubic_meter_per_second;
    q.get::<cubic_meter_per_second>()
}

#[inline]
pub fn as_m(l: Length) -> f64 {
    use uom::si::length::meter;
    l.get::<meter>()
}

#[inline]
pub fn as_mps(v: Velocity) -> f64 {
    use uom::si::velocity::meter_per_second;
    v.get::<meter_per_second>()
}

/// Cross-section of a full circular pipe.
#[inline]
pub fn circle_area(diameter: Length) -> Area {
    diameter * diameter * (std::f64::consts::PI / 4.0)
}

/// Mean velocity of a flow through a circular pipe; zero for a zero area.
pub fn mean_velocity(flow: VolumeRate, diameter: Length) -> Velocity {
    let area = circle_area(diameter);
    if area.value <= 0.0 {
        use uom::si::velocity::meter_per_second;
        return Velocity::new::<meter_per_second>(0.0);
    }
    flow / area
}

pub mod constants {
    /// Hazen-Williams coefficient for SI units (m, m^3/s).
    pub const HAZEN_WILLIAMS_SI: f64 = 10.67;
    /// Mean Earth radius used for geographic lengths.
    pub const EARTH_RADIUS_M: f64 = 6_371_008.8;
}
