use serde::{Deserialize, Serialize};

/// Host operating system, as far as the pipeline cares about it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Osx,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Osx
        } else {
            Platform::Linux
        }
    }

    /// Glyphs cycled by the status-line spinner.
    pub fn spinner_frames(self) -> &'static [&'static str] {
        match self {
            Platform::Osx => &["\u{25d0}", "\u{25d3}", "\u{25d1}", "\u{25d2}"],
            Platform::Windows | Platform::Linux => &["|", "/", "-", "\\"],
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }
}
