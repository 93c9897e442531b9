use std::env;
use std::io;
use std::path::{Path, PathBuf};

use scopeguard::ScopeGuard;
use tracing::{debug, error};

/// Changes the process working directory to `dir` until the returned guard
/// is dropped, which restores the previous one. The guard also fires while
/// unwinding from a panic.
pub fn enter(dir: &Path) -> io::Result<ScopeGuard<PathBuf, impl FnOnce(PathBuf)>> {
    let previous = env::current_dir()?;
    env::set_current_dir(dir)?;
    debug!(from = %previous.display(), to = %dir.display(), "entered directory");

    Ok(scopeguard::guard(previous, |previous| {
        if let Err(e) = env::set_current_dir(&previous) {
            error!(dir = %previous.display(), error = %e, "failed to restore working directory");
        }
    }))
}
