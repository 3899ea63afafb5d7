//! Platform-specific helpers
//!
//! Names here follow the package server's vocabulary rather than Rust's:
//! the server publishes `darwin` (not `macos`) and `amd64`/`arm64`/`x86`
//! (not `x86_64`/`aarch64`/`x86`), so [`os_name`] and [`arch_name`]
//! translate the compile-time target into those names.

/// Checks if a command is available on the search path.
///
/// # Examples
///
/// ```rust,no_run
/// use tsupdate::utils::platform::command_exists;
///
/// if command_exists("apt-get") {
///     println!("apt-get is available");
/// }
/// ```
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Operating-system name as used in the version metadata query.
#[must_use]
pub fn os_name() -> &'static str {
    go_os_name(std::env::consts::OS)
}

fn go_os_name(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        _ => os,
    }
}

/// Processor architecture as used in installer artifact names.
#[must_use]
pub fn arch_name() -> &'static str {
    server_arch_name(std::env::consts::ARCH)
}

fn server_arch_name(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "x86",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        _ => arch,
    }
}

/// Message for a missing super-user identity on Unix-like systems.
#[must_use]
pub fn root_required_message(os: &str) -> &'static str {
    match os {
        "linux" => "must be root; use sudo",
        "freebsd" | "openbsd" => "must be root; use doas",
        _ => "must be root",
    }
}

/// Message for a missing elevation on Windows.
pub const ADMIN_REQUIRED_MESSAGE: &str = "must be run as Administrator";
