//! Reference-line thermodynamics for the diagram
//!
//! Thin wrappers over `metfor` in the units the plot works in: °C and hPa
//! as plain `f64`. Points `metfor` cannot evaluate come back as `None` and
//! are left out of the line.

use metfor::{Celsius, HectoPascal, Kelvin, Quantity};

const REFERENCE_PRESSURE: f64 = 1000.0;

/// Temperature on the dry adiabat of potential temperature `theta_k`
#[must_use]
pub fn dry_adiabat(theta_k: f64, pressure: f64) -> f64 {
    let t = metfor::temperature_from_theta(Kelvin(theta_k), HectoPascal(pressure));
    Celsius::from(t).unpack()
}

/// Temperature on the saturation mixing-ratio line `grams_per_kg`
#[must_use]
pub fn mixing_ratio_line(grams_per_kg: f64, pressure: f64) -> Option<f64> {
    metfor::dew_point_from_p_and_mw(HectoPascal(pressure), grams_per_kg / 1000.0).map(|t| t.unpack())
}

/// `(pressure, temperature)` points of the saturated adiabat through
/// `t1000` (°C at 1000 hPa)
#[must_use]
pub fn moist_adiabat(t1000: f64, pressures: &[f64]) -> Vec<(f64, f64)> {
    let Some(theta_e) = metfor::theta_e(
        Celsius(t1000),
        Celsius(t1000),
        HectoPascal(REFERENCE_PRESSURE),
    ) else {
        return Vec::new();
    };

    pressures
        .iter()
        .filter_map(|&p| {
            metfor::temperature_from_theta_e_saturated_and_pressure(HectoPascal(p), theta_e)
                .map(|t| (p, t.unpack()))
        })
        .collect()
}

/// Environmental lapse rate between two levels, K/km. Positive when
/// temperature falls with height.
#[must_use]
pub fn lapse_rate(t_lower: f64, z_lower: f64, t_upper: f64, z_upper: f64) -> Option<f64> {
    let dz = z_upper - z_lower;
    if dz.abs() < 1.0 {
        return None;
    }
    Some(-(t_upper - t_lower) / dz * 1000.0)
}
