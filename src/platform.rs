//! Distribution detection from `/etc/os-release`.
use std::fmt;
use std::path::Path;

/// Location of the os-release file consulted by [`Distro::detect`].
pub const OS_RELEASE: &str = "/etc/os-release";

/// Linux distribution family, as far as package installation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    /// Arch Linux and derivatives (pacman).
    Arch,
    /// Ubuntu and derivatives (apt, PPAs available).
    Ubuntu,
    /// Debian and derivatives without PPA support (apt).
    Debian,
    /// Anything else, or no os-release file.
    Unknown,
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arch => write!(f, "arch"),
            Self::Ubuntu => write!(f, "ubuntu"),
            Self::Debian => write!(f, "debian"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl Distro {
    /// Detect the distribution from [`OS_RELEASE`].
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_from(Path::new(OS_RELEASE))
    }

    /// Detect the distribution from an arbitrary os-release file.
    ///
    /// A missing or unreadable file classifies as [`Distro::Unknown`].
    #[must_use]
    pub fn detect_from(path: &Path) -> Self {
        std::fs::read_to_string(path).map_or(Self::Unknown, |content| {
            Self::from_os_release(&content)
        })
    }

    /// Classify os-release content.
    ///
    /// `ID` is checked before `ID_LIKE`, so Ubuntu (`ID_LIKE=debian`) stays
    /// Ubuntu while Linux Mint (`ID=linuxmint`, `ID_LIKE="ubuntu debian"`)
    /// inherits Ubuntu.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotfiles_cli::platform::Distro;
    ///
    /// assert_eq!(Distro::from_os_release("ID=arch\n"), Distro::Arch);
    /// assert_eq!(Distro::from_os_release("ID=\"ubuntu\"\n"), Distro::Ubuntu);
    /// assert_eq!(Distro::from_os_release(""), Distro::Unknown);
    /// ```
    #[must_use]
    pub fn from_os_release(content: &str) -> Self {
        let mut id = String::new();
        let mut id_like = String::new();
        for line in content.lines() {
            if let Some((key, value)) = line.trim().split_once('=') {
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                match key.trim() {
                    "ID" => id = value.to_lowercase(),
                    "ID_LIKE" => id_like = value.to_lowercase(),
                    _ => {}
                }
            }
        }

        match Self::from_id(&id) {
            Self::Unknown => id_like
                .split_whitespace()
                .map(Self::from_id)
                .find(|d| *d != Self::Unknown)
                .unwrap_or(Self::Unknown),
            known => known,
        }
    }

    fn from_id(id: &str) -> Self {
        match id {
            "arch" | "archarm" => Self::Arch,
            "ubuntu" => Self::Ubuntu,
            "debian" => Self::Debian,
            _ => Self::Unknown,
        }
    }
}
