//! VM configuration

use memory_manager::GcConfig;

/// Configuration for a [`crate::Vm`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VmConfig {
    /// Collector tuning
    pub gc: GcConfig,
    /// Log the stack and every instruction at `trace` level
    pub trace_execution: bool,
    /// Log the disassembly of each compiled function at `debug` level
    pub print_code: bool,
}

impl VmConfig {
    /// Collect on every allocation
    pub fn stress_gc() -> Self {
        Self {
            gc: GcConfig::stress(),
            ..Self::default()
        }
    }
}
