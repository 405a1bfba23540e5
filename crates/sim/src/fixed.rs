use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

pub const FRAC_BITS: u32 = 16;

/// 16.16 signed fixed-point scalar. All simulation arithmetic goes through
/// this type; no floating point ever touches simulated state, so two runs of
/// the same command stream stay bit-identical on every platform.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(1 << FRAC_BITS);
    pub const HALF: Fixed = Fixed(1 << (FRAC_BITS - 1));
    pub const MAX: Fixed = Fixed(i32::MAX);
    pub const MIN: Fixed = Fixed(i32::MIN);

    pub const fn from_int(value: i32) -> Fixed {
        Fixed(value << FRAC_BITS)
    }

    /// Integer part, rounding toward negative infinity.
    pub const fn to_int(self) -> i32 {
        self.0 >> FRAC_BITS
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn from_raw(raw: i32) -> Fixed {
        Fixed(raw)
    }

    pub const fn abs(self) -> Fixed {
        if self.0 < 0 {
            Fixed(-self.0)
        } else {
            self
        }
    }

    pub fn min(self, other: Fixed) -> Fixed {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    pub fn max(self, other: Fixed) -> Fixed {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    pub fn clamp(self, lo: Fixed, hi: Fixed) -> Fixed {
        self.max(lo).min(hi)
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Fixed * fixed with an i64 intermediate so full-range products cannot
    /// overflow before the shift back down.
    pub const fn mul(self, other: Fixed) -> Fixed {
        Fixed(((self.0 as i64 * other.0 as i64) >> FRAC_BITS) as i32)
    }

    /// Fixed / fixed. Division by zero is an invariant violation upstream;
    /// debug builds assert, release saturates like the widening shift would.
    pub fn div(self, other: Fixed) -> Fixed {
        debug_assert!(other.0 != 0, "fixed-point division by zero");
        if other.0 == 0 {
            return if self.0 >= 0 { Fixed::MAX } else { Fixed::MIN };
        }
        Fixed((((self.0 as i64) << FRAC_BITS) / other.0 as i64) as i32)
    }

    pub const fn scale_int(self, factor: i32) -> Fixed {
        Fixed((self.0 as i64 * factor as i64) as i32)
    }

    /// Integer square root over the widened value; exact for perfect squares
    /// and monotone everywhere, which is all slope normalization needs.
    pub fn sqrt(self) -> Fixed {
        if self.0 <= 0 {
            return Fixed::ZERO;
        }
        let widened = (self.0 as u64) << FRAC_BITS;
        let mut root: u64 = 0;
        let mut bit: u64 = 1 << 62;
        let mut rem = widened;
        while bit > widened {
            bit >>= 2;
        }
        while bit != 0 {
            if rem >= root + bit {
                rem -= root + bit;
                root = (root >> 1) + bit;
            } else {
                root >>= 1;
            }
            bit >>= 2;
        }
        Fixed(root as i32)
    }
}

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, other: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(other.0))
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, other: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(other.0))
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(self.0.wrapping_neg())
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, other: Fixed) {
        self.0 = self.0.wrapping_add(other.0);
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, other: Fixed) {
        self.0 = self.0.wrapping_sub(other.0);
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    fn mul(self, other: Fixed) -> Fixed {
        Fixed::mul(self, other)
    }
}

impl Div for Fixed {
    type Output = Fixed;
    fn div(self, other: Fixed) -> Fixed {
        Fixed::div(self, other)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Integer-only formatting; logging must not route through floats.
        let negative = self.0 < 0;
        let magnitude = (self.0 as i64).unsigned_abs();
        let whole = magnitude >> FRAC_BITS;
        let frac = ((magnitude & 0xFFFF) * 10_000) >> FRAC_BITS;
        if negative {
            write!(f, "-{whole}.{frac:04}")
        } else {
            write!(f, "{whole}.{frac:04}")
        }
    }
}

/// 3-coordinate fixed-point vector (x, y horizontal; z vertical).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FVec3 {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
}

impl FVec3 {
    pub const ZERO: FVec3 = FVec3 {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> FVec3 {
        FVec3 { x, y, z }
    }

    pub fn scaled(self, factor: Fixed) -> FVec3 {
        FVec3 {
            x: self.x.mul(factor),
            y: self.y.mul(factor),
            z: self.z.mul(factor),
        }
    }

    pub fn horizontal_is_zero(self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }
}

impl Add for FVec3 {
    type Output = FVec3;
    fn add(self, other: FVec3) -> FVec3 {
        FVec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for FVec3 {
    type Output = FVec3;
    fn sub(self, other: FVec3) -> FVec3 {
        FVec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

/// Fast 2-D distance estimate: `max + min/2`. At most ~12% high, monotone,
/// and branch-cheap, which is what range gates and speed caps want.
pub fn approx_dist(dx: Fixed, dy: Fixed) -> Fixed {
    let dx = dx.abs();
    let dy = dy.abs();
    if dx.0 >= dy.0 {
        Fixed(dx.0.saturating_add(dy.0 >> 1))
    } else {
        Fixed(dy.0.saturating_add(dx.0 >> 1))
    }
}

const HALF_TURN_STEPS: i64 = 1 << 15;

/// Binary angle: the full turn is the full `u32` range, so wrapping
/// arithmetic is angle arithmetic and no normalization pass ever runs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Angle(pub u32);

impl Angle {
    pub const ZERO: Angle = Angle(0);
    pub const QUARTER: Angle = Angle(0x4000_0000);
    pub const HALF: Angle = Angle(0x8000_0000);
    pub const THREE_QUARTER: Angle = Angle(0xC000_0000);

    pub const fn from_degrees(degrees: i32) -> Angle {
        // 2^32 / 360 scaled through i64 to keep negatives exact.
        let mut folded = degrees as i64 % 360;
        if folded < 0 {
            folded += 360;
        }
        Angle(((folded << 32) / 360) as u32)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn turned(self, delta: Angle) -> Angle {
        Angle(self.0.wrapping_add(delta.0))
    }

    pub const fn turned_back(self, delta: Angle) -> Angle {
        Angle(self.0.wrapping_sub(delta.0))
    }

    pub const fn reversed(self) -> Angle {
        Angle(self.0.wrapping_add(0x8000_0000))
    }

    /// Signed shortest rotation from `self` to `other`.
    pub const fn delta_to(self, other: Angle) -> i32 {
        other.0.wrapping_sub(self.0) as i32
    }

    /// Integer Bhaskara approximation of sine. All-integer so the result is
    /// identical on every platform; worst-case error is under 0.2% of unit,
    /// well inside what slope projection and steering can tolerate.
    pub fn sine(self) -> Fixed {
        let (negate, half) = if self.0 >= 0x8000_0000 {
            (true, self.0 - 0x8000_0000)
        } else {
            (false, self.0)
        };
        let u = (half >> 16) as i64; // 0..HALF_TURN_STEPS
        let p = u * (HALF_TURN_STEPS - u);
        let denominator = 5 * HALF_TURN_STEPS * HALF_TURN_STEPS - 4 * p;
        let value = ((16 * p) << FRAC_BITS) / denominator;
        if negate {
            Fixed(-(value as i32))
        } else {
            Fixed(value as i32)
        }
    }

    pub fn cosine(self) -> Fixed {
        self.turned(Angle::QUARTER).sine()
    }

    /// Unit direction vector in the horizontal plane.
    pub fn unit_vector(self) -> (Fixed, Fixed) {
        (self.cosine(), self.sine())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_int_to_int_round_trips() {
        assert_eq!(Fixed::from_int(17).to_int(), 17);
        assert_eq!(Fixed::from_int(-9).to_int(), -9);
        assert_eq!(Fixed::ZERO.to_int(), 0);
    }

    #[test]
    fn to_int_floors_toward_negative_infinity() {
        let just_below_zero = Fixed::from_raw(-1);
        assert_eq!(just_below_zero.to_int(), -1);
        let one_and_a_half = Fixed::from_int(1) + Fixed::HALF;
        assert_eq!(one_and_a_half.to_int(), 1);
        let minus_one_and_a_half = -(Fixed::from_int(1) + Fixed::HALF);
        assert_eq!(minus_one_and_a_half.to_int(), -2);
    }

    #[test]
    fn mul_matches_integer_products() {
        let three = Fixed::from_int(3);
        let four = Fixed::from_int(4);
        assert_eq!(three.mul(four), Fixed::from_int(12));
        assert_eq!(three.mul(-four), Fixed::from_int(-12));
        assert_eq!(Fixed::HALF.mul(Fixed::HALF), Fixed::from_raw(1 << 14));
    }

    #[test]
    fn div_matches_integer_quotients() {
        let twelve = Fixed::from_int(12);
        let four = Fixed::from_int(4);
        assert_eq!(twelve.div(four), Fixed::from_int(3));
        assert_eq!(Fixed::ONE.div(Fixed::from_int(2)), Fixed::HALF);
    }

    #[test]
    fn mul_div_round_trip_is_close() {
        let value = Fixed::from_raw(123_456);
        let factor = Fixed::from_raw(78_901);
        let round_tripped = value.mul(factor).div(factor);
        assert!((round_tripped - value).abs().raw() <= 2);
    }

    #[test]
    fn sqrt_of_perfect_squares_is_exact() {
        assert_eq!(Fixed::from_int(0).sqrt(), Fixed::ZERO);
        assert_eq!(Fixed::from_int(1).sqrt(), Fixed::ONE);
        assert_eq!(Fixed::from_int(4).sqrt(), Fixed::from_int(2));
        assert_eq!(Fixed::from_int(144).sqrt(), Fixed::from_int(12));
    }

    #[test]
    fn sqrt_of_negative_is_zero() {
        assert_eq!(Fixed::from_int(-4).sqrt(), Fixed::ZERO);
    }

    #[test]
    fn display_is_integer_only_decimal() {
        assert_eq!(format!("{}", Fixed::from_int(3)), "3.0000");
        assert_eq!(format!("{}", Fixed::HALF), "0.5000");
        assert_eq!(format!("{}", -Fixed::HALF), "-0.5000");
    }

    #[test]
    fn approx_dist_is_exact_on_axes() {
        assert_eq!(
            approx_dist(Fixed::from_int(10), Fixed::ZERO),
            Fixed::from_int(10)
        );
        assert_eq!(
            approx_dist(Fixed::ZERO, Fixed::from_int(-7)),
            Fixed::from_int(7)
        );
    }

    #[test]
    fn approx_dist_overestimates_diagonals_mildly() {
        let estimate = approx_dist(Fixed::from_int(3), Fixed::from_int(4));
        assert!(estimate >= Fixed::from_int(5));
        assert!(estimate <= Fixed::from_int(6));
    }

    #[test]
    fn angle_from_degrees_hits_cardinal_points() {
        assert_eq!(Angle::from_degrees(0), Angle::ZERO);
        assert_eq!(Angle::from_degrees(90), Angle::QUARTER);
        assert_eq!(Angle::from_degrees(180), Angle::HALF);
        assert_eq!(Angle::from_degrees(270), Angle::THREE_QUARTER);
        assert_eq!(Angle::from_degrees(-90), Angle::THREE_QUARTER);
        assert_eq!(Angle::from_degrees(360), Angle::ZERO);
    }

    #[test]
    fn angle_arithmetic_wraps() {
        let almost_full = Angle::from_degrees(315);
        assert_eq!(almost_full.turned(Angle::from_degrees(90)), Angle::from_degrees(45));
        assert_eq!(
            Angle::from_degrees(45).turned_back(Angle::from_degrees(90)),
            Angle::from_degrees(315)
        );
    }

    #[test]
    fn delta_to_takes_shortest_signed_path() {
        let a = Angle::from_degrees(10);
        let b = Angle::from_degrees(350);
        assert!(a.delta_to(b) < 0);
        assert!(b.delta_to(a) > 0);
    }

    #[test]
    fn sine_quadrant_values() {
        assert_eq!(Angle::ZERO.sine(), Fixed::ZERO);
        assert_eq!(Angle::HALF.sine(), Fixed::ZERO);
        let quarter = Angle::QUARTER.sine();
        assert!((quarter - Fixed::ONE).abs() < Fixed::from_raw(1 << 10));
        let three_quarter = Angle::THREE_QUARTER.sine();
        assert!((three_quarter + Fixed::ONE).abs() < Fixed::from_raw(1 << 10));
    }

    #[test]
    fn sine_is_antisymmetric() {
        for degrees in [10, 45, 60, 135] {
            let positive = Angle::from_degrees(degrees).sine();
            let negative = Angle::from_degrees(-degrees).sine();
            assert!((positive + negative).abs() <= Fixed::from_raw(8), "degrees {degrees}");
        }
    }

    #[test]
    fn cosine_leads_sine_by_a_quarter_turn() {
        for degrees in [0, 30, 90, 200, 315] {
            let angle = Angle::from_degrees(degrees);
            assert_eq!(angle.cosine(), angle.turned(Angle::QUARTER).sine(), "degrees {degrees}");
        }
    }

    #[test]
    fn unit_vector_cardinal_directions() {
        let (east_x, east_y) = Angle::ZERO.unit_vector();
        assert!((east_x - Fixed::ONE).abs() < Fixed::from_raw(1 << 10));
        assert_eq!(east_y, Fixed::ZERO);

        let (north_x, north_y) = Angle::QUARTER.unit_vector();
        assert_eq!(north_x, Fixed::ZERO);
        assert!((north_y - Fixed::ONE).abs() < Fixed::from_raw(1 << 10));
    }

    #[test]
    fn fvec3_component_arithmetic() {
        let a = FVec3::new(Fixed::from_int(1), Fixed::from_int(2), Fixed::from_int(3));
        let b = FVec3::new(Fixed::from_int(4), Fixed::from_int(5), Fixed::from_int(6));
        let sum = a + b;
        assert_eq!(sum.x, Fixed::from_int(5));
        assert_eq!(sum.y, Fixed::from_int(7));
        assert_eq!(sum.z, Fixed::from_int(9));
        let diff = b - a;
        assert_eq!(diff.x, Fixed::from_int(3));
        let scaled = a.scaled(Fixed::from_int(2));
        assert_eq!(scaled.z, Fixed::from_int(6));
    }
}
