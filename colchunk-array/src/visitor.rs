//! Push-based bulk traversal of chunks.
//!
//! A chunk scan hands every row to a [`RowVisitor`] instead of having the consumer call back into
//! the chunk once per row. The visitor declares once, through [`RowVisitor::value_mode`], whether
//! it wants fully decoded doubles or the cheaper expanded `(mantissa, exponent)` form.

/// The form in which a visitor receives values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueMode {
    /// Values arrive through [`RowVisitor::add_value`] or [`RowVisitor::add_long`].
    #[default]
    Decoded,
    /// Values arrive through [`RowVisitor::add_expanded`] as `mantissa * 10^exponent`, with
    /// missing rows reported through [`RowVisitor::add_nas`].
    Expanded,
}

/// A consumer of the rows of a chunk scan.
pub trait RowVisitor {
    /// Read once at the start of each traversal call.
    fn value_mode(&self) -> ValueMode {
        ValueMode::Decoded
    }

    /// Receive a decoded value. Decimal chunks scanned in [`ValueMode::Decoded`] report a missing
    /// row as `NaN`.
    fn add_value(&mut self, value: f64);

    /// Receive an integral value from an integer encoding.
    fn add_long(&mut self, value: i64) {
        self.add_value(value as f64)
    }

    /// Receive the value `mantissa * 10^exponent`.
    fn add_expanded(&mut self, mantissa: i64, exponent: i32) {
        self.add_value(expanded_to_f64(mantissa, exponent))
    }

    /// Receive `count` missing rows.
    fn add_nas(&mut self, count: usize);
}

/// `10^exponent`, exact for exponents up to 22.
#[inline]
pub fn pow10(exponent: u32) -> f64 {
    10f64.powi(i32::try_from(exponent).unwrap_or(i32::MAX))
}

/// Decode an expanded value the same way decimal chunks decode their mantissas, so that the two
/// traversal modes agree bit-for-bit.
#[inline]
pub fn expanded_to_f64(mantissa: i64, exponent: i32) -> f64 {
    if exponent < 0 {
        mantissa as f64 / pow10(exponent.unsigned_abs())
    } else {
        mantissa as f64 * pow10(exponent.unsigned_abs())
    }
}

/// Collects decoded values, replacing missing rows with a fill value.
#[derive(Debug, Clone, PartialEq)]
pub struct DoublesVisitor {
    values: Vec<f64>,
    na_fill: f64,
}

impl DoublesVisitor {
    pub fn new(na_fill: f64) -> Self {
        Self::with_capacity(na_fill, 0)
    }

    pub fn with_capacity(na_fill: f64, capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            na_fill,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl RowVisitor for DoublesVisitor {
    fn add_value(&mut self, value: f64) {
        self.values
            .push(if value.is_nan() { self.na_fill } else { value });
    }

    fn add_nas(&mut self, count: usize) {
        self.values
            .extend(std::iter::repeat_n(self.na_fill, count));
    }
}

/// Row count, missing count, minimum, maximum and sum of a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollupVisitor {
    rows: usize,
    nas: usize,
    min: f64,
    max: f64,
    sum: f64,
}

impl Default for RollupVisitor {
    fn default() -> Self {
        Self {
            rows: 0,
            nas: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
        }
    }
}

impl RollupVisitor {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn nas(&self) -> usize {
        self.nas
    }

    /// Smallest non-missing value, `None` if every row was missing.
    pub fn min(&self) -> Option<f64> {
        (self.rows > self.nas).then_some(self.min)
    }

    /// Largest non-missing value, `None` if every row was missing.
    pub fn max(&self) -> Option<f64> {
        (self.rows > self.nas).then_some(self.max)
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the non-missing values, `None` if every row was missing.
    pub fn mean(&self) -> Option<f64> {
        (self.rows > self.nas).then(|| self.sum / (self.rows - self.nas) as f64)
    }
}

impl RowVisitor for RollupVisitor {
    fn add_value(&mut self, value: f64) {
        if value.is_nan() {
            self.add_nas(1);
            return;
        }
        self.rows += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
    }

    fn add_nas(&mut self, count: usize) {
        self.rows += count;
        self.nas += count;
    }
}
