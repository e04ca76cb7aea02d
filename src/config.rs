use std::ffi::OsStr;

use crate::word::Width;

/// Options fixed when a machine is constructed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MachineConfig {
    /// Bits per register and memory cell
    pub width: u32,
    /// Trace every fetch and dump memory and registers after each instruction
    pub verbose: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            width: Width::default().bits(),
            verbose: false,
        }
    }
}

impl MachineConfig {
    /// Defaults, overridden by `ACCUM_BITS` and `ACCUM_VERBOSE=1` when set.
    ///
    /// An unparsable `ACCUM_BITS` is ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(bits) = std::env::var("ACCUM_BITS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            config.width = bits;
        }
        config.verbose = var_is("ACCUM_VERBOSE", "1");
        config
    }

    pub fn with_width(mut self, bits: u32) -> Self {
        self.width = bits;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
