use thiserror::Error;

/// The running total at which accumulation halts.
pub const SUM_TARGET: i64 = 42;

pub const SUM_TARGET_MESSAGE: &str = "Sum is 42, no further addition needed";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid range: until = {until} is below -1")]
    BelowNegativeOne { until: i32 },
}

/// Distinguishes a sum that ran to the end of its range from one that was
/// clamped because the running total hit [SUM_TARGET] exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumOutcome {
    Finished(i64),
    HitTarget(i64),
}

impl SumOutcome {
    pub fn value(self) -> i64 {
        match self {
            SumOutcome::Finished(n) | SumOutcome::HitTarget(n) => n,
        }
    }

    pub fn hit_target(self) -> bool {
        matches!(self, SumOutcome::HitTarget(_))
    }
}

/// Sums `0 + 1 + … + (until - 1)` in increasing order, stopping as soon as
/// the running total equals [SUM_TARGET]. `notify` receives the informational
/// message when the early exit fires.
///
/// `until` below `-1` is rejected; `-1` and `0` are accepted and produce an
/// empty sum.
pub fn clamped_triangular_sum(
    until: i32,
    notify: impl FnMut(&str),
) -> Result<SumOutcome, RangeError> {
    if until < -1 {
        return Err(RangeError::BelowNegativeOne { until });
    }

    Ok(clamped_sum((0..until).map(i64::from), notify))
}

/// Accumulates an arbitrary sequence with the same early-exit rule.
pub fn clamped_sum(values: impl IntoIterator<Item = i64>, mut notify: impl FnMut(&str)) -> SumOutcome {
    let mut sum = 0;

    for value in values {
        sum += value;
        if sum == SUM_TARGET {
            notify(SUM_TARGET_MESSAGE);
            return SumOutcome::HitTarget(sum);
        }
    }

    SumOutcome::Finished(sum)
}
