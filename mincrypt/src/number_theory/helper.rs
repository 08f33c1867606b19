use num_integer::Integer;

/// Computes the greatest common divisor of two numbers.
pub fn gcd(a: u64, b: u64) -> u64 {
    a.gcd(&b)
}

/// Finds (g, x, y) such that ax + by = g = gcd(a, b).
///
/// Works on `i128` so that Bezout coefficients of any pair of `u64` values fit.
pub fn extended_gcd(a: i128, b: i128) -> (i128, i128, i128) {
    if a == 0 {
        if b.is_negative() {
            return (-b, 0, -1);
        }

        return (b, 0, 1);
    }

    let (g, x1, y1) = extended_gcd(b % a, a);
    let x = y1 - (b / a) * x1;
    let y = x1;
    (g, x, y)
}

/// Integer square root, `floor(sqrt(n))`.
pub fn isqrt(n: u64) -> u64 {
    num_integer::Roots::sqrt(&n)
}

/// Number of significant bits of `n` (0 for 0).
pub fn bit_length(n: u64) -> u32 {
    u64::BITS - n.leading_zeros()
}
