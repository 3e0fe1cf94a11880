use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// When set, mpv is only looked up on `PATH`, never beside the executable.
static USE_SYSTEM_DEPS: AtomicBool = AtomicBool::new(false);

pub fn set_use_system_deps(use_system: bool) {
    USE_SYSTEM_DEPS.store(use_system, Ordering::Relaxed);
}

pub fn should_use_system_deps() -> bool {
    USE_SYSTEM_DEPS.load(Ordering::Relaxed)
}

#[cfg(unix)]
pub fn mpv_socket_name() -> String {
    format!(
        "{}/jukebox-mpv-{}.sock",
        std::env::temp_dir().display(),
        std::process::id()
    )
}

#[cfg(windows)]
pub fn mpv_socket_name() -> String {
    format!("jukebox-mpv-{}", std::process::id())
}

#[cfg(unix)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server={}", socket_name)
}

#[cfg(windows)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{}", socket_name)
}

pub fn data_dir() -> PathBuf {
    // XDG layout on macOS too, so logs live in the same place everywhere.
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("jukebox")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jukebox")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("jukebox")
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jukebox")
    }
}

pub fn log_file_path() -> PathBuf {
    data_dir().join("jukebox.log")
}

pub fn mpv_stderr_path() -> PathBuf {
    data_dir().join("mpv-stderr.log")
}

#[cfg(unix)]
pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

#[cfg(windows)]
pub fn mpv_binary_name() -> &'static str {
    "mpv.exe"
}

/// Find mpv for playback: beside the current executable (unless system deps
/// are forced), then `PATH`.
pub fn find_mpv_binary() -> Option<PathBuf> {
    let exe_name = mpv_binary_name();

    if !should_use_system_deps() {
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        {
            for candidate in [dir.join(exe_name), dir.join("external").join(exe_name)] {
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(exe_name))
        .find(|p| p.exists())
}
