//! Wind barb geometry in pixel offsets from the barb's anchor
//!
//! Speeds are rounded to the nearest 5 kt. A pennant is 50 kt, a full
//! barb 10 kt and a half barb 5 kt. The staff points into the direction
//! the wind blows from; pixel y grows downwards.

const KMH_PER_KNOT: f64 = 1.852;
const STAFF: f64 = 30.0;
const FEATHER: f64 = 12.0;
const SPACING: f64 = 5.0;
const PENNANT_BASE: f64 = 7.0;

pub type Offset = (i32, i32);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Barb {
    /// Rounded speed in knots
    pub knots: u32,
    /// Staff, barbs and half barbs as line segments
    pub lines: Vec<[Offset; 2]>,
    /// Filled triangles
    pub pennants: Vec<[Offset; 3]>,
}

impl Barb {
    /// Below 2.5 kt nothing but a calm circle is drawn
    #[must_use]
    pub fn is_calm(&self) -> bool {
        self.knots == 0
    }
}

#[must_use]
pub fn kmh_to_knots(speed: f64) -> f64 {
    speed / KMH_PER_KNOT
}

/// Build a barb for `speed_kmh` blowing from `direction` degrees
#[must_use]
pub fn barb(speed_kmh: f64, direction: f64) -> Barb {
    let knots = ((kmh_to_knots(speed_kmh) / 5.0).round() as u32) * 5;
    if knots == 0 {
        return Barb::default();
    }

    let theta = direction.to_radians();
    let along = (theta.sin(), -theta.cos());
    // feathers sit clockwise of the staff
    let across = (-along.1, along.0);
    let at = |s: f64, c: f64| -> Offset {
        (
            (along.0 * s + across.0 * c).round() as i32,
            (along.1 * s + across.1 * c).round() as i32,
        )
    };

    let mut result = Barb {
        knots,
        lines: vec![[(0, 0), at(STAFF, 0.0)]],
        pennants: Vec::new(),
    };

    let mut remaining = knots;
    let mut position = STAFF;
    while remaining >= 50 {
        result
            .pennants
            .push([at(position, 0.0), at(position - PENNANT_BASE, 0.0), at(position, FEATHER)]);
        position -= PENNANT_BASE + 1.0;
        remaining -= 50;
    }
    while remaining >= 10 {
        result
            .lines
            .push([at(position, 0.0), at(position + 3.0, FEATHER)]);
        position -= SPACING;
        remaining -= 10;
    }
    if remaining >= 5 {
        // a lone half barb is set back from the tip
        if knots == 5 {
            position -= SPACING;
        }
        result
            .lines
            .push([at(position, 0.0), at(position + 1.5, FEATHER / 2.0)]);
    }
    result
}
