//! Host functions available to every program

use core_types::Value;
use memory_manager::NativeFn;
use std::time::{SystemTime, UNIX_EPOCH};

/// Natives installed by [`crate::Vm::new`]: name, arity, function
pub const STANDARD_NATIVES: &[(&str, u8, NativeFn)] = &[("clock", 0, clock)];

/// `clock()` - seconds since the UNIX epoch
pub fn clock(_args: &[Value]) -> Result<Value, String> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("System clock is before the epoch: {e}"))?;
    Ok(Value::number(elapsed.as_secs_f64()))
}
