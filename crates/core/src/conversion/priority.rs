//! OS scheduling priority for the spawned ffmpeg process.

use serde::{Deserialize, Serialize};

/// Scheduling priority classes, mapped to nice values on unix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessPriority {
    Idle,
    BelowNormal,
    Normal,
    AboveNormal,
    High,
    RealTime,
}

impl ProcessPriority {
    /// The nice value used for this class.
    pub fn nice_value(&self) -> i32 {
        match self {
            Self::Idle => 19,
            Self::BelowNormal => 10,
            Self::Normal => 0,
            Self::AboveNormal => -5,
            Self::High => -10,
            Self::RealTime => -20,
        }
    }

    /// Maps a nice value back to the closest class.
    pub fn from_nice(nice: i32) -> Self {
        match nice {
            n if n >= 15 => Self::Idle,
            n if n >= 5 => Self::BelowNormal,
            n if n > -5 => Self::Normal,
            n if n > -10 => Self::AboveNormal,
            n if n > -20 => Self::High,
            _ => Self::RealTime,
        }
    }

    /// Priority of the current process, or `None` if it cannot be read.
    ///
    /// A nice value of -1 is indistinguishable from a failure without errno
    /// being cleared first, so it is only accepted when no OS error is set.
    #[cfg(unix)]
    pub fn current() -> Option<Self> {
        let nice = unsafe { libc::getpriority(libc::PRIO_PROCESS, 0) };
        if nice == -1 && nice_read_failed(std::io::Error::last_os_error()) {
            return None;
        }
        Some(Self::from_nice(nice))
    }

    #[cfg(not(unix))]
    pub fn current() -> Option<Self> {
        None
    }

    /// Applies this priority to a running process.
    #[cfg(unix)]
    pub fn apply(&self, pid: u32) -> std::io::Result<()> {
        let result = unsafe {
            libc::setpriority(libc::PRIO_PROCESS, pid as libc::id_t, self.nice_value())
        };
        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    pub fn apply(&self, _pid: u32) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "process priority is only supported on unix",
        ))
    }
}

#[cfg(unix)]
fn nice_read_failed(error: std::io::Error) -> bool {
    error.raw_os_error().is_some_and(|code| code != 0)
}
