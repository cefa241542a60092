//! Fixed constants shared across the application core.
//!
//! Values here are part of observable behaviour (exit codes, yield window
//! bounds, built-in identifiers) and should not be tuned casually.

// ─────────────────────────────────────────────────────────────────────────────
// Messaging
// ─────────────────────────────────────────────────────────────────────────────

/// Result returned by a blocking send when the handler never set one.
pub const MESSAGE_RESULT_UNSET: i32 = -1;

/// Capacity of the announcement broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Cooperative external-call window
// ─────────────────────────────────────────────────────────────────────────────

/// Lower bound of the external-call window (ms).
pub const EXTERNAL_CALL_MIN_WINDOW_MS: u64 = 2;

/// Upper bound of the external-call window while video renders (ms).
pub const EXTERNAL_CALL_MAX_WINDOW_VIDEO_MS: u64 = 10;

/// Upper bound of the external-call window otherwise (ms).
pub const EXTERNAL_CALL_MAX_WINDOW_IDLE_MS: u64 = 80;

/// Frames after a yield before the processed-call counter resets.
pub const EXTERNAL_CALL_DECAY_FRAMES: u32 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Event loop
// ─────────────────────────────────────────────────────────────────────────────

/// Minimum interval between slow housekeeping passes (ms).
pub const PROCESS_SLOW_INTERVAL_MS: u64 = 500;

/// Longest frame time fed to time-based updates (ms).
///
/// Avoids large jumps after a debugger break or system suspend.
pub const MAX_FRAME_TIME_MS: u64 = 500;

// ─────────────────────────────────────────────────────────────────────────────
// Screensaver
// ─────────────────────────────────────────────────────────────────────────────

/// Built-in screensaver that dims the GUI.
pub const SCREENSAVER_DIM: &str = "screensaver.xbmc.builtin.dim";

/// Built-in screensaver that blanks the GUI.
pub const SCREENSAVER_BLACK: &str = "screensaver.xbmc.builtin.black";

// ─────────────────────────────────────────────────────────────────────────────
// Volume
// ─────────────────────────────────────────────────────────────────────────────

/// Minimum volume level.
pub const VOLUME_MINIMUM: f32 = 0.0;

/// Maximum volume level.
pub const VOLUME_MAXIMUM: f32 = 1.0;

/// Number of volume-up/down steps between minimum and maximum.
pub const VOLUME_STEPS: u32 = 90;

// ─────────────────────────────────────────────────────────────────────────────
// Files and identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Skin that ships with the application and is always loadable.
pub const DEFAULT_SKIN: &str = "skin.estuary";

/// Add-on manifest file name inside each add-on directory.
pub const ADDON_MANIFEST_FILE: &str = "addon.json";

/// Player configuration file inside the profile folder.
pub const PLAYER_CORE_CONFIG_FILE: &str = "playercorefactory.xml";

/// Key map file inside the profile folder.
pub const KEYMAP_FILE: &str = "keymap.json";

/// Protocol prefix of stacked (multi-part) items.
pub const STACK_PROTOCOL: &str = "stack://";

/// Separator between parts of a stacked item.
pub const STACK_SEPARATOR: &str = " , ";

/// Number of worker threads on the background job runtime.
pub const JOB_WORKER_THREADS: usize = 2;
