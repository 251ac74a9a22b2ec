//! Revenue expression for Q5

/// `l_extendedprice * (1 - l_discount)`
#[inline(always)]
pub fn disc_price(extendedprice: f64, discount: f64) -> f64 {
    extendedprice * (1.0 - discount)
}
