//! Memoization of function evaluations for a single sampling pass.
//!
//! Recursive bisection computes the same abscissae over and over
//! (the midpoint of a half is a quarter point of the whole) but with
//! floating-point jitter.  Keys are therefore rounded to a fixed
//! number of significant digits before lookup.

use std::collections::HashMap;

/// Number of significant decimal digits kept in cache keys.
const SIGNIFICANT_DIGITS: i32 = 12;

/// Values that a user function may return.  `None`, `Err(_)` and
/// non-finite numbers all mean "the function is not defined here".
pub trait Evaluation<V> {
    /// Return the value if it is valid (i.e., finite).
    fn finite(self) -> Option<V>;
}

impl Evaluation<f64> for f64 {
    #[inline]
    fn finite(self) -> Option<f64> {
        if self.is_finite() { Some(self) } else { None }
    }
}

impl Evaluation<[f64; 2]> for [f64; 2] {
    #[inline]
    fn finite(self) -> Option<[f64; 2]> {
        if self[0].is_finite() && self[1].is_finite() { Some(self) }
        else { None }
    }
}

impl Evaluation<[f64; 2]> for (f64, f64) {
    #[inline]
    fn finite(self) -> Option<[f64; 2]> { [self.0, self.1].finite() }
}

impl<V, T: Evaluation<V>> Evaluation<V> for Option<T> {
    #[inline]
    fn finite(self) -> Option<V> { self.and_then(T::finite) }
}

impl<V, T: Evaluation<V>, E> Evaluation<V> for Result<T, E> {
    #[inline]
    fn finite(self) -> Option<V> { self.ok().and_then(T::finite) }
}

/// Rounded representation of an abscissa: a mantissa with
/// [`SIGNIFICANT_DIGITS`] digits and a decimal exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key(i64, i32);

const TOP: i64 = 10i64.pow(SIGNIFICANT_DIGITS as u32);

impl Key {
    fn new(t: f64) -> Self {
        if t == 0. { return Key(0, 0) } // Both signed zeros.
        let e = t.abs().log10().floor() as i32;
        let scale = 10f64.powi(SIGNIFICANT_DIGITS - 1 - e);
        if scale.is_finite() {
            let m = (t * scale).round() as i64;
            if m.abs() == TOP {
                // Rounded up to the next decade: 9.99…96 and 10 agree.
                Key(m / 10, e + 1)
            } else {
                Key(m, e)
            }
        } else {
            // Subnormal: no rounding.
            Key(t.to_bits() as i64, i32::MIN)
        }
    }
}

/// Return `true` if `a` and `b` share the same cache entry.
pub(crate) fn same_key(a: f64, b: f64) -> bool {
    Key::new(a) == Key::new(b)
}

/// Result of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<V> {
    /// A valid value was stored for this abscissa.
    Value(V),
    /// The function was evaluated here and is not defined.
    Invalid,
    /// Never evaluated.
    Miss,
}

/// Cache of the evaluations of one function during one pass.
#[derive(Debug, Clone)]
pub struct EvalCache<V> {
    map: HashMap<Key, Option<V>>,
    hits: usize,
    misses: usize,
}

impl<V: Copy> Default for EvalCache<V> {
    fn default() -> Self { Self::new() }
}

impl<V: Copy> EvalCache<V> {
    pub fn new() -> Self {
        Self { map: HashMap::new(), hits: 0, misses: 0 }
    }

    /// Look `t` up, without evaluating anything.
    pub fn get(&self, t: f64) -> Lookup<V> {
        match self.map.get(&Key::new(t)) {
            Some(Some(v)) => Lookup::Value(*v),
            Some(None) => Lookup::Invalid,
            None => Lookup::Miss,
        }
    }

    /// Record the outcome of an evaluation at `t`.  An existing entry
    /// for the same rounded key is kept.
    pub fn put(&mut self, t: f64, v: Option<V>) {
        self.map.entry(Key::new(t)).or_insert(v);
    }

    /// Return the cached outcome at `t`, calling `f` on a miss.
    pub fn eval<F>(&mut self, t: f64, f: F) -> Option<V>
    where F: FnOnce(f64) -> Option<V> {
        let key = Key::new(t);
        if let Some(&v) = self.map.get(&key) {
            self.hits += 1;
            return v
        }
        self.misses += 1;
        let v = f(t);
        self.map.insert(key, v);
        v
    }

    /// Number of times the function was actually called.
    pub fn evaluations(&self) -> usize { self.misses }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize { self.hits }

    /// Number of distinct (rounded) abscissae stored.
    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }
}
