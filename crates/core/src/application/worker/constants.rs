// Worker constants (no magic values inline)
use std::time::Duration;

/// Sleep duration when no processes are scheduled (100ms)
pub const IDLE_SLEEP_DURATION: Duration = Duration::from_millis(100);

/// Sleep duration after worker error before retry (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Default recovery window for orphaned processes (5 minutes)
pub const DEFAULT_RECOVERY_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Graceful subprocess shutdown timeout (5 seconds)
pub const GRACEFUL_SHUTDOWN_TIMEOUT_MS: i64 = 5000;
