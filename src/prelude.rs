pub use crate::config::DaemonConfig;
pub use crate::error::{RequestError, Result, ServerError};
pub use origin_log::{debug, error, info, trace, warn};
pub use std::path::{Path, PathBuf};
pub use std::time::{Duration, Instant};

pub const ACCEPT_POLL_TIMEOUT_MS: i32 = 1_000;
pub const SHUTDOWN_WINDOW: Duration = Duration::from_secs(5);
pub const REAP_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const REQUEST_BUFFER_BOUND: usize = origin_http::request::MAX_BODY_LEN + 4096 + 2048 + 16 + 4;
