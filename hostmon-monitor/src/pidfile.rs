use std::path::Path;

/// Writes the current process id to `path` with overwrite semantics, for
/// external process-supervision tooling. Called once at startup; an
/// unwritable path is a fatal configuration error.
pub fn write_pid_file(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, std::process::id().to_string())
}
