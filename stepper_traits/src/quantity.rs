use std::fmt::{Debug, Display};

/// Numeric value a stepper can hold.
///
/// - checked_add()/checked_sub(): `None` on overflow (integers) or on a
///   non-finite result (floats)
/// - is_positive(): strictly greater than zero; used to validate `step`
pub trait Quantity: Copy + PartialOrd + Debug + Display + 'static {
    fn zero() -> Self;
    fn checked_add(self, rhs: Self) -> Option<Self>;
    fn checked_sub(self, rhs: Self) -> Option<Self>;

    #[inline]
    fn is_positive(self) -> bool {
        self > Self::zero()
    }

    /// Bound `self` to `[min, max]`. Assumes `min <= max`.
    #[inline]
    fn clamp_to(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }
}

macro_rules! impl_int_quantity {
    ($($t:ty),*) => {
        $(
            impl Quantity for $t {
                #[inline]
                fn zero() -> Self {
                    0
                }
                #[inline]
                fn checked_add(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_add(self, rhs)
                }
                #[inline]
                fn checked_sub(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_sub(self, rhs)
                }
            }
        )*
    };
}

macro_rules! impl_float_quantity {
    ($($t:ty),*) => {
        $(
            impl Quantity for $t {
                #[inline]
                fn zero() -> Self {
                    0.0
                }
                #[inline]
                fn checked_add(self, rhs: Self) -> Option<Self> {
                    let v = self + rhs;
                    v.is_finite().then_some(v)
                }
                #[inline]
                fn checked_sub(self, rhs: Self) -> Option<Self> {
                    let v = self - rhs;
                    v.is_finite().then_some(v)
                }
            }
        )*
    };
}

impl_int_quantity!(i32, i64);
impl_float_quantity!(f32, f64);
