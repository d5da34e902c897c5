use std::cmp::{max, min};
use std::sync::Mutex;

use anyhow::{anyhow, Context};
use rlimit::{getrlimit, Resource, setrlimit};

/// NOFILE soft limit shared by all merges of the process. The limit in place before the first
/// merge is restored when the last running merge ends.
struct SharedLimit {
    active: usize,
    original_soft: u64,
}

static SHARED_LIMIT: Mutex<SharedLimit> = Mutex::new(SharedLimit { active: 0, original_soft: 0 });

/// Keeps the NOFILE soft limit raised while a merge holds it
pub(crate) struct FileLimitGuard {
    _private: (),
}

impl FileLimitGuard {
    /// Raise the soft limit to hold `files` open chunk files, capped at the hard limit. A limit
    /// already raised by a concurrent merge is never lowered.
    pub(crate) fn acquire(files: usize) -> Result<FileLimitGuard, anyhow::Error> {
        let mut shared = SHARED_LIMIT
            .lock()
            .map_err(|_| anyhow!("file limit lock poisoned"))?;
        let (current_soft, current_hard) = getrlimit(Resource::NOFILE).with_context(|| "getrlimit")?;
        log::info!("Current rlimit NOFILE, soft: {}, hard: {}, active merges: {}", current_soft, current_hard, shared.active);

        let new_soft = min(max(files.saturating_add(256) as u64, current_soft), current_hard);
        if new_soft > current_soft {
            log::info!("Set new rlimit NOFILE, soft: {}, hard: {}", new_soft, current_hard);
            set_soft_limit(new_soft, current_hard)?;
        }
        if shared.active == 0 {
            shared.original_soft = current_soft;
        }
        shared.active += 1;
        Ok(FileLimitGuard { _private: () })
    }
}

impl Drop for FileLimitGuard {
    fn drop(&mut self) {
        let mut shared = SHARED_LIMIT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        shared.active = shared.active.saturating_sub(1);
        if shared.active > 0 {
            return;
        }
        let restored = getrlimit(Resource::NOFILE)
            .with_context(|| "getrlimit")
            .and_then(|(_, hard)| {
                log::info!("Restore rlimit NOFILE, soft: {}, hard: {}", shared.original_soft, hard);
                set_soft_limit(shared.original_soft, hard)
            });
        if let Err(e) = restored {
            log::warn!("Failed to restore rlimit NOFILE: {:#}", e);
        }
    }
}

fn set_soft_limit(soft: u64, hard: u64) -> Result<(), anyhow::Error> {
    setrlimit(Resource::NOFILE, soft, hard)
        .with_context(|| format!("set rlimit NOFILE, soft: {}, hard: {}", soft, hard))?;
    Ok(())
}
