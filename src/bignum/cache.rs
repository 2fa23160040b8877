//! Per-VM `BigNumber` temp-register pool and cached transcendental
//! constants (pi, e, ln 10).

use std::cell::RefCell;

use crate::error::{Result, VmError};

use super::BigNumber;

/// Round a requested precision up to the next multiple of 8, for cache
/// hysteresis: a cache slot is reallocated to the maximum precision
/// requested so far, rounded up to the next multiple of 8.
fn hysteresis(precision: u16) -> u16 {
    ((precision + 7) / 8) * 8
}

/// Handle to a leased temp register; releases it back to the pool on
/// `Drop` so register leases are never forgotten on an early return or a
/// thrown error.
pub struct RegisterLease<'a> {
    pool: &'a RegisterPool,
    index: usize,
    taken: bool,
}

impl<'a> RegisterLease<'a> {
    /// The leased register's current value.
    pub fn get(&self) -> BigNumber {
        self.pool.slots.borrow()[self.index].clone().expect("lease holds a live slot")
    }

    /// Overwrite the leased register's value.
    pub fn set(&self, value: BigNumber) {
        self.pool.slots.borrow_mut()[self.index] = Some(value);
    }
}

impl<'a> Drop for RegisterLease<'a> {
    fn drop(&mut self) {
        if self.taken {
            self.pool.free.borrow_mut().push(self.index);
        }
    }
}

/// A small pool of scratch `BigNumber` registers, leased in strict
/// LIFO-per-operation discipline by transcendental functions that need
/// working storage at `result_precision + guard_digits`.
#[derive(Default)]
pub struct RegisterPool {
    slots: RefCell<Vec<Option<BigNumber>>>,
    free: RefCell<Vec<usize>>,
}

impl RegisterPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lease one register, growing the pool if nothing is free.
    pub fn lease(&self, precision: u16) -> RegisterLease<'_> {
        let index = self.free.borrow_mut().pop().unwrap_or_else(|| {
            let mut slots = self.slots.borrow_mut();
            slots.push(None);
            slots.len() - 1
        });
        self.slots.borrow_mut()[index] = Some(BigNumber::zero(precision));
        RegisterLease {
            pool: self,
            index,
            taken: true,
        }
    }

    /// Lease `n` registers at once; fails with `bignum-no-regs` only when
    /// the pool has an explicit hard cap (this in-memory pool grows freely,
    /// so the error exists for API parity with bounded embedders).
    pub fn lease_many(&self, n: usize, precision: u16, cap: Option<usize>) -> Result<Vec<RegisterLease<'_>>> {
        if let Some(cap) = cap {
            let in_use = self.slots.borrow().len() - self.free.borrow().len();
            if in_use + n > cap {
                return Err(VmError::BignumNoRegs);
            }
        }
        Ok((0..n).map(|_| self.lease(precision)).collect())
    }
}

/// Per-VM cache of pi, e and ln 10, each recomputed from scratch only when
/// a caller requests more precision than is currently cached.
#[derive(Default)]
pub struct ConstantCache {
    pi: RefCell<Option<BigNumber>>,
    e: RefCell<Option<BigNumber>>,
    ln10: RefCell<Option<BigNumber>>,
}

impl ConstantCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_compute(
        slot: &RefCell<Option<BigNumber>>,
        precision: u16,
        compute: impl FnOnce(u16) -> BigNumber,
    ) -> BigNumber {
        let target = hysteresis(precision);
        {
            let cached = slot.borrow();
            if let Some(v) = cached.as_ref() {
                if v.precision() >= precision {
                    return v.round_to(precision);
                }
            }
        }
        let fresh = compute(target);
        let rounded = fresh.round_to(precision);
        *slot.borrow_mut() = Some(fresh);
        rounded
    }

    /// pi at (at least) `precision` digits, via `4 * asin(sqrt(1/2))`.
    /// Computed on demand rather than from a precomputed constant table.
    pub fn pi(&self, precision: u16, compute: impl FnOnce(u16) -> BigNumber) -> BigNumber {
        Self::get_or_compute(&self.pi, precision, compute)
    }

    /// e at (at least) `precision` digits, via `exp(1)`.
    pub fn e(&self, precision: u16, compute: impl FnOnce(u16) -> BigNumber) -> BigNumber {
        Self::get_or_compute(&self.e, precision, compute)
    }

    /// ln 10 at (at least) `precision` digits, via `2 * ln(sqrt(10))`.
    pub fn ln10(&self, precision: u16, compute: impl FnOnce(u16) -> BigNumber) -> BigNumber {
        Self::get_or_compute(&self.ln10, precision, compute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hysteresis_rounds_up_to_multiple_of_eight() {
        assert_eq!(hysteresis(1), 8);
        assert_eq!(hysteresis(8), 8);
        assert_eq!(hysteresis(9), 16);
    }

    #[test]
    fn register_lease_returns_to_pool_on_drop() {
        let pool = RegisterPool::new();
        {
            let lease = pool.lease(10);
            lease.set(BigNumber::from_i32(42, None));
        }
        assert_eq!(pool.free.borrow().len(), 1);
    }

    #[test]
    fn constant_cache_reuses_sufficient_precision() {
        let cache = ConstantCache::new();
        let mut calls = 0;
        let v1 = cache.pi(10, |p| {
            calls += 1;
            BigNumber::from_i32(3, Some(p))
        });
        let v2 = cache.pi(8, |p| {
            calls += 1;
            BigNumber::from_i32(3, Some(p))
        });
        assert_eq!(calls, 1);
        assert_eq!(v1.precision(), 10);
        assert_eq!(v2.precision(), 8);
    }
}
