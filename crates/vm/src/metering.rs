use serde::{Deserialize, Serialize};

use types::{MemoryAccess, VmError, VmResult, WORD_SIZE};

/// Unit the memory expansion formula is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryUnit {
    /// `units` = number of 32-byte words covered.
    #[default]
    Words,
    /// `units` = number of bytes covered (always a multiple of 32).
    Bytes,
}

/// Gas pricing table for the data regions:
/// - memory growth is charged on the cumulative size, `linear * units +
///   units^2 / quadratic_divisor`, billing only the increase
/// - bulk copies into memory are charged per word
/// - storage access is free unless `metered_storage` is set, in which case
///   slots are priced cold on first touch and warm afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    pub memory_unit: MemoryUnit,
    pub memory_linear: u64,
    pub memory_quadratic_divisor: u64,
    pub copy_word: u64,
    pub metered_storage: bool,
    pub sload_cold: u64,
    pub sload_warm: u64,
    pub sstore_set: u64,
    pub sstore_reset: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        // Yellow Paper memory pricing, Berlin storage access costs.
        Self {
            memory_unit: MemoryUnit::Words,
            memory_linear: 3,
            memory_quadratic_divisor: 512,
            copy_word: 3,
            metered_storage: false,
            sload_cold: 2100,
            sload_warm: 100,
            sstore_set: 20_000,
            sstore_reset: 2900,
        }
    }
}

impl GasSchedule {
    /// Byte-denominated memory pricing: `3 * bytes + bytes^2 / 32`.
    /// Covering 32 bytes costs 128 and covering 64 bytes costs 320.
    pub fn byte_denominated() -> Self {
        Self {
            memory_unit: MemoryUnit::Bytes,
            memory_linear: 3,
            memory_quadratic_divisor: 32,
            ..Self::default()
        }
    }

    /// Rejects parameters the memory formula cannot be evaluated with.
    pub fn validate(&self) -> VmResult<()> {
        if self.memory_quadratic_divisor == 0 {
            return Err(VmError::InvalidConfig(
                "memory_quadratic_divisor must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Exact total cost of a memory region covering `size_bytes` (a
    /// multiple of 32).
    ///
    /// ARITHMETIC: evaluated in `u128`. Returns `None` when the result does
    /// not fit in `u64` or the divisor is zero; no gas limit can pay for
    /// such a region.
    pub fn memory_cost(&self, size_bytes: usize) -> Option<u64> {
        let units = match self.memory_unit {
            MemoryUnit::Words => (size_bytes / WORD_SIZE) as u128,
            MemoryUnit::Bytes => size_bytes as u128,
        };
        let linear = u128::from(self.memory_linear).checked_mul(units)?;
        let quadratic = units
            .checked_mul(units)?
            .checked_div(u128::from(self.memory_quadratic_divisor))?;
        u64::try_from(linear.checked_add(quadratic)?).ok()
    }

    /// Incremental charge for growing from `before` to `after` bytes; zero
    /// when `after` does not exceed `before`. `None` when the cost of
    /// `after` cannot be represented.
    pub fn memory_expansion_cost(&self, before: usize, after: usize) -> Option<u64> {
        if after <= before {
            return Some(0);
        }
        let after_cost = self.memory_cost(after)?;
        let before_cost = self.memory_cost(before)?;
        Some(after_cost - before_cost)
    }

    /// Per-word charge for bulk copies into memory, rounded up to whole
    /// words. `None` when the charge does not fit in `u64`.
    pub fn copy_cost(&self, bytes: usize) -> Option<u64> {
        let words = u64::try_from(bytes.div_ceil(WORD_SIZE)).ok()?;
        self.copy_word.checked_mul(words)
    }

    /// Read charge for one slot; zero unless `metered_storage` is set.
    pub fn sload_cost(&self, warm: bool) -> u64 {
        if !self.metered_storage {
            return 0;
        }
        if warm {
            self.sload_warm
        } else {
            self.sload_cold
        }
    }

    /// `sstore_set` when a zero slot becomes non-zero, `sstore_reset`
    /// otherwise, plus the cold surcharge on first touch. `None` when the
    /// configured constants add up past `u64`.
    pub fn sstore_cost(&self, warm: bool, current_is_zero: bool, new_is_zero: bool) -> Option<u64> {
        if !self.metered_storage {
            return Some(0);
        }
        let base = if current_is_zero && !new_is_zero {
            self.sstore_set
        } else {
            self.sstore_reset
        };
        let cold = if warm { 0 } else { self.sload_cold };
        base.checked_add(cold)
    }
}

/// Running gas counter against a fixed ceiling.
///
/// INVARIANT: `used <= limit` at all times. A charge either fits entirely
/// and is added, or is refused with [`VmError::OutOfGas`] and the counter
/// keeps its previous value.
///
/// PRICING: the accountant only counts. What an operation costs is looked
/// up in its [`GasSchedule`] by the region performing the operation.
#[derive(Debug, Clone)]
pub struct GasAccountant {
    schedule: GasSchedule,
    limit: u64,
    used: u64,
}

impl GasAccountant {
    /// Creates an accountant with `limit` gas priced by the default
    /// word-based schedule.
    pub fn new(limit: u64) -> Self {
        Self::with_schedule(limit, GasSchedule::default())
    }

    /// Creates an accountant with `limit` gas priced by `schedule`.
    pub fn with_schedule(limit: u64, schedule: GasSchedule) -> Self {
        Self {
            schedule,
            limit,
            used: 0,
        }
    }

    pub fn schedule(&self) -> &GasSchedule {
        &self.schedule
    }

    /// Gas charged so far.
    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// `limit - used`; never underflows.
    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    /// Adds `amount` to the running total. Over-budget charges are refused
    /// and leave the counter untouched.
    pub fn charge(&mut self, amount: u64) -> VmResult<()> {
        self.charge_for(amount, None)
    }

    /// Same as [`charge`](Self::charge) but tags the failure with the memory
    /// access that needed the gas.
    pub fn charge_for(&mut self, amount: u64, access: Option<MemoryAccess>) -> VmResult<()> {
        if amount > self.remaining() {
            tracing::warn!(required = amount, remaining = self.remaining(), ?access, "out of gas");
            return Err(VmError::OutOfGas {
                required: amount,
                remaining: self.remaining(),
                access,
            });
        }
        self.used += amount;
        Ok(())
    }
}
