use std::{cmp::Ordering, fmt, num::NonZeroU64};

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Num, One, Pow, Signed, Zero};

use crate::{
    error::RuntimeError,
    interpreter::evaluator::core::EvalResult,
    util::num::{bigint_to_i64_checked, bigint_to_u32_checked, bigint_to_u64_checked,
                bigint_to_usize_checked},
};

/// Significant digits kept by decimal division and exponentiation.
///
/// Addition, subtraction, and multiplication stay exact; only the
/// operations that can produce non-terminating results round, and only when
/// the exact result would exceed this many digits.
pub const PRECISION: u64 = 34;

/// An arbitrary-precision number, either integer or decimal.
///
/// Arithmetic between two integers stays integer (division truncates
/// toward zero); as soon as one operand is decimal, the other is promoted
/// and the result is decimal. Comparison is numeric and scale-invariant,
/// so `2`, `2.0`, and `2.000` are all equal.
///
/// # Example
/// ```
/// use rill::NumVal;
///
/// let a = NumVal::parse("2.000").unwrap();
/// let b = NumVal::parse("2").unwrap();
/// assert_eq!(a.compare(&b), std::cmp::Ordering::Equal);
/// ```
#[derive(Debug, Clone)]
pub enum NumVal {
    /// An arbitrary-precision integer.
    Int(BigInt),
    /// An arbitrary-precision decimal.
    Dec(BigDecimal),
}

impl NumVal {
    /// Parses a numeric literal.
    ///
    /// A literal containing `.` becomes [`Dec`](Self::Dec); a `0x` prefix
    /// makes a hexadecimal [`Int`](Self::Int); anything else is a decimal
    /// integer. Leading- and trailing-dot forms (`.5`, `2.`) are accepted.
    ///
    /// # Errors
    /// Returns `RuntimeError::BadLiteral` if the text is not a number.
    pub fn parse(text: &str) -> EvalResult<Self> {
        let bad = || RuntimeError::BadLiteral { text: text.to_string() };
        if text.contains('.') {
            normalize_decimal(text).parse::<BigDecimal>()
                                   .map(Self::Dec)
                                   .map_err(|_| bad())
        } else if let Some(digits) = text.strip_prefix("0x") {
            BigInt::from_str_radix(digits, 16).map(Self::Int)
                                              .map_err(|_| bad())
        } else if let Some(digits) = text.strip_prefix("-0x") {
            BigInt::from_str_radix(digits, 16).map(|v| Self::Int(-v))
                                              .map_err(|_| bad())
        } else {
            text.parse::<BigInt>().map(Self::Int).map_err(|_| bad())
        }
    }

    /// The integer one, the step used by `++` and `--`.
    #[must_use]
    pub fn one() -> Self {
        Self::Int(BigInt::one())
    }

    /// Returns `true` if the value is numerically zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(v) => v.is_zero(),
            Self::Dec(v) => v.is_zero(),
        }
    }

    /// Adds two numbers, promoting to decimal if either side is decimal.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => Self::Int(l + r),
            _ => Self::Dec(self.to_dec() + other.to_dec()),
        }
    }

    /// Subtracts `other`, promoting to decimal if either side is decimal.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => Self::Int(l - r),
            _ => Self::Dec(self.to_dec() - other.to_dec()),
        }
    }

    /// Multiplies two numbers, promoting to decimal if either side is
    /// decimal. Integer and decimal multiplication are both exact.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => Self::Int(l * r),
            _ => Self::Dec(self.to_dec() * other.to_dec()),
        }
    }

    /// Divides by `other`.
    ///
    /// Integer ÷ integer truncates toward zero and stays integer. If
    /// either side is decimal the division is decimal, rounded to
    /// [`PRECISION`] significant digits when the exact quotient needs more.
    ///
    /// # Errors
    /// Returns `RuntimeError::DivisionByZero` if `other` is zero.
    pub fn divide(&self, other: &Self) -> EvalResult<Self> {
        if other.is_zero() {
            return Err(RuntimeError::DivisionByZero);
        }
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => Ok(Self::Int(l / r)),
            _ => Ok(Self::Dec(round_to_context(self.to_dec() / other.to_dec()))),
        }
    }

    /// Remainder after division, integers only. The modulus must be
    /// positive and the result is always non-negative.
    ///
    /// # Errors
    /// `TypeMismatch` for decimal operands, `InvalidArgument` for a
    /// non-positive modulus.
    pub fn modulo(&self, other: &Self) -> EvalResult<Self> {
        let (l, r) = self.both_int(other, "%")?;
        if r.is_zero() || r.is_negative() {
            return Err(RuntimeError::InvalidArgument { details: format!("modulus must be positive, got {r}") });
        }
        Ok(Self::Int(l.mod_floor(r)))
    }

    /// Bitwise AND, integers only, two's-complement for negatives.
    ///
    /// # Errors
    /// `TypeMismatch` for decimal operands.
    pub fn and(&self, other: &Self) -> EvalResult<Self> {
        let (l, r) = self.both_int(other, "&")?;
        Ok(Self::Int(l & r))
    }

    /// Bitwise OR, integers only, two's-complement for negatives.
    ///
    /// # Errors
    /// `TypeMismatch` for decimal operands.
    pub fn or(&self, other: &Self) -> EvalResult<Self> {
        let (l, r) = self.both_int(other, "|")?;
        Ok(Self::Int(l | r))
    }

    /// Bitwise XOR, integers only, two's-complement for negatives.
    ///
    /// # Errors
    /// `TypeMismatch` for decimal operands.
    pub fn xor(&self, other: &Self) -> EvalResult<Self> {
        let (l, r) = self.both_int(other, "^")?;
        Ok(Self::Int(l ^ r))
    }

    /// Bitwise NOT, integers only: `!v == -(v + 1)` in two's complement.
    ///
    /// # Errors
    /// `TypeMismatch` for a decimal operand.
    pub fn not(&self) -> EvalResult<Self> {
        match self {
            Self::Int(v) => Ok(Self::Int(-(v + BigInt::one()))),
            Self::Dec(_) => Err(RuntimeError::TypeMismatch { op: "!".to_string() }),
        }
    }

    /// Left shift, integers only.
    ///
    /// # Errors
    /// `TypeMismatch` for decimal operands, `InvalidArgument` for a
    /// negative or oversized shift count.
    pub fn shl(&self, other: &Self) -> EvalResult<Self> {
        let (l, r) = self.both_int(other, "<<")?;
        let count = bigint_to_usize_checked(r, "shift count")?;
        Ok(Self::Int(l << count))
    }

    /// Right shift, integers only, realised as division by a power of two
    /// so that negative values truncate toward zero: `-8 >> 2 == -2`.
    ///
    /// # Errors
    /// `TypeMismatch` for decimal operands, `InvalidArgument` for a
    /// negative or oversized shift count.
    pub fn shr(&self, other: &Self) -> EvalResult<Self> {
        let (l, r) = self.both_int(other, ">>")?;
        let count = bigint_to_usize_checked(r, "shift count")?;
        let divisor = BigInt::one() << count;
        Ok(Self::Int(l / divisor))
    }

    /// The `>>>` shift, integers only. In this dialect it is an arithmetic
    /// shift that rounds toward negative infinity, not a logical shift;
    /// `-8 >>> 2 == -2` but `-9 >>> 2 == -3`.
    ///
    /// # Errors
    /// `TypeMismatch` for decimal operands, `InvalidArgument` for a
    /// negative or oversized shift count.
    pub fn ushr(&self, other: &Self) -> EvalResult<Self> {
        let (l, r) = self.both_int(other, ">>>")?;
        let count = bigint_to_usize_checked(r, "shift count")?;
        Ok(Self::Int(l >> count))
    }

    /// Raises to an integer power. A decimal base gives a decimal result
    /// under the [`PRECISION`] context and accepts negative exponents; an
    /// integer base gives an integer and requires a non-negative exponent.
    ///
    /// # Errors
    /// `TypeMismatch` for a decimal exponent, `InvalidArgument` for a
    /// negative exponent on an integer base or an oversized exponent.
    pub fn pow(&self, exponent: &Self) -> EvalResult<Self> {
        let Self::Int(exp) = exponent else {
            return Err(RuntimeError::TypeMismatch { op: "pow".to_string() });
        };
        match self {
            Self::Int(base) => {
                if exp.is_negative() {
                    return Err(RuntimeError::InvalidArgument { details: format!("negative exponent {exp} for integer base") });
                }
                let exp = bigint_to_u32_checked(exp, "exponent")?;
                Ok(Self::Int(Pow::pow(base, exp)))
            },
            Self::Dec(base) => {
                let negative = exp.is_negative();
                let mut remaining = bigint_to_u64_checked(&exp.abs(), "exponent")?;
                let mut result = BigDecimal::one();
                let mut factor = base.clone();
                while remaining > 0 {
                    if remaining & 1 == 1 {
                        result = round_to_context(&result * &factor);
                    }
                    remaining >>= 1;
                    if remaining > 0 {
                        factor = round_to_context(&factor * &factor);
                    }
                }
                if negative {
                    if result.is_zero() {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    result = round_to_context(BigDecimal::one() / result);
                }
                Ok(Self::Dec(result))
            },
        }
    }

    /// Returns the smaller of the two numbers.
    #[must_use]
    pub fn min(&self, other: &Self) -> Self {
        if self.compare(other) == Ordering::Greater {
            other.clone()
        } else {
            self.clone()
        }
    }

    /// Returns the larger of the two numbers.
    #[must_use]
    pub fn max(&self, other: &Self) -> Self {
        if self.compare(other) == Ordering::Less {
            other.clone()
        } else {
            self.clone()
        }
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        match self {
            Self::Int(v) => Self::Int(v.abs()),
            Self::Dec(v) => Self::Dec(v.abs()),
        }
    }

    /// Numeric comparison across variants. Decimals compare
    /// scale-invariantly, and a mixed pair compares through decimal
    /// promotion, so `2 == 2.00` holds.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => l.cmp(r),
            _ => self.to_dec().cmp(&other.to_dec()),
        }
    }

    /// Converts an integer value into an array index.
    ///
    /// # Errors
    /// `BadIndex` for decimal values or values outside the index range.
    pub fn as_index(&self) -> EvalResult<i64> {
        match self {
            Self::Int(v) => bigint_to_i64_checked(v, "array index"),
            Self::Dec(_) => Err(RuntimeError::BadIndex { details: "array index must be an integer".to_string() }),
        }
    }

    /// Returns `true` if the value is the integer variant.
    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(..))
    }

    fn to_dec(&self) -> BigDecimal {
        match self {
            Self::Int(v) => BigDecimal::from(v.clone()),
            Self::Dec(v) => v.clone(),
        }
    }

    fn both_int<'a>(&'a self, other: &'a Self, op: &str) -> EvalResult<(&'a BigInt, &'a BigInt)> {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => Ok((l, r)),
            _ => Err(RuntimeError::TypeMismatch { op: op.to_string() }),
        }
    }
}

impl PartialEq for NumVal {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl PartialOrd for NumVal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl From<i64> for NumVal {
    fn from(v: i64) -> Self {
        Self::Int(BigInt::from(v))
    }
}

impl From<BigInt> for NumVal {
    fn from(v: BigInt) -> Self {
        Self::Int(v)
    }
}

impl From<BigDecimal> for NumVal {
    fn from(v: BigDecimal) -> Self {
        Self::Dec(v)
    }
}

impl fmt::Display for NumVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Dec(v) => write!(f, "{v}"),
        }
    }
}

/// Rounds a decimal back to the [`PRECISION`] context when the exact value
/// carries more significant digits; exact short results pass through with
/// their scale untouched.
fn round_to_context(value: BigDecimal) -> BigDecimal {
    if value.digits() <= PRECISION {
        return value;
    }
    match NonZeroU64::new(PRECISION) {
        Some(precision) => value.with_precision_round(precision, RoundingMode::HalfEven),
        None => value,
    }
}

fn normalize_decimal(text: &str) -> String {
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    let mut body = body.to_string();
    if body.starts_with('.') {
        body.insert(0, '0');
    }
    if body.ends_with('.') {
        body.push('0');
    }
    format!("{sign}{body}")
}
