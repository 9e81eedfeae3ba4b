use std::fmt::Display;

use crate::constant::fault::{FAILURE_THRESHOLD, SWITCH_OFF};

/// decides whether the current request should fail on purpose,
/// used for exercising error handling paths of the downstream clients
pub trait AbstFaultStrategy: Send + Sync {
    fn should_fail(&self) -> bool;
}

pub struct RandomFaultStrategy {
    threshold: f64,
}

impl RandomFaultStrategy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for RandomFaultStrategy {
    fn default() -> Self {
        Self::new(FAILURE_THRESHOLD)
    }
}

impl AbstFaultStrategy for RandomFaultStrategy {
    fn should_fail(&self) -> bool {
        // uniform draw in [0, 1)
        rand::random::<f64>() > self.threshold
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticFault;

impl Display for SyntheticFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("spurious error!!!")
    }
}

/// absent switch keeps the injector active, only the string `false`
/// (case-insensitive) turns it off
pub fn is_switched_off(switch: Option<&str>) -> bool {
    switch
        .map(|s| s.eq_ignore_ascii_case(SWITCH_OFF))
        .unwrap_or(false)
}

pub fn maybe_fail(
    switch: Option<&str>,
    strategy: &dyn AbstFaultStrategy,
) -> Result<(), SyntheticFault> {
    if is_switched_off(switch) {
        Ok(())
    } else if strategy.should_fail() {
        Err(SyntheticFault)
    } else {
        Ok(())
    }
}
