//! Exit codes for the `opm` binary.
//!
//! These are a stable contract for scripts that launch the server.

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed (or the stdio loop reached end of input).
    Success = 0,

    /// Runtime failure: I/O, backend setup, template store.
    RuntimeError = 1,

    /// Configuration could not be loaded or failed validation.
    ConfigError = 2,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Success
    }

    /// Stable name for logs.
    pub fn code_name(self) -> &'static str {
        match self {
            ExitCode::Success => "OK",
            ExitCode::RuntimeError => "RUNTIME_ERROR",
            ExitCode::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::RuntimeError.as_i32(), 1);
        assert_eq!(ExitCode::ConfigError.as_i32(), 2);
        assert_eq!(i32::from(ExitCode::ConfigError), 2);
    }

    #[test]
    fn display_includes_name_and_code() {
        assert_eq!(ExitCode::ConfigError.to_string(), "CONFIG_ERROR (2)");
        assert!(ExitCode::Success.is_success());
        assert!(!ExitCode::RuntimeError.is_success());
    }
}
