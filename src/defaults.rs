//! Default configuration constants for voicereq.
//!
//! Shared between `Config`, `RequestOptions` and the driver so the values stay
//! consistent.

/// Whether audio requests use immediate activation by default.
///
/// Deferred activation lets the audio session wait for its own trigger
/// (e.g. wake word or min volume) before streaming begins.
pub const ACTIVATE_IMMEDIATELY: bool = false;

/// Default transport timeout in milliseconds.
pub const TIMEOUT_MS: u64 = 10_000;

/// Default capacity of a driven request's caller command queue.
///
/// Callers block while it is full. Adapter events use a separate unbounded
/// queue and never block.
pub const COMMAND_CAPACITY: usize = 64;

/// Default log level when `RUST_LOG` is unset.
pub const LOG_LEVEL: &str = "info";

/// Maximum number of payload characters kept in a decode error.
pub const DECODE_EXCERPT_CHARS: usize = 120;

/// Envelope code used when a payload fails to decode.
pub const DECODE_ERROR_CODE: &str = "decode_error";

/// Environment variable overriding `audio.activate_immediately`.
pub const ENV_ACTIVATE_IMMEDIATELY: &str = "VOICEREQ_ACTIVATE_IMMEDIATELY";

/// Environment variable overriding `transport.timeout_ms`.
pub const ENV_TIMEOUT_MS: &str = "VOICEREQ_TIMEOUT_MS";

/// Environment variable overriding `logging.level`.
pub const ENV_LOG: &str = "VOICEREQ_LOG";
