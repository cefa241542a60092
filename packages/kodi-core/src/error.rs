//! Centralized error types for the Kodi application core.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Gives every error a machine-readable code for logs and script callers
//! - Converts subsystem errors into [`KodiError`] with `From`

use thiserror::Error;

use crate::player::PlayerError;
use crate::playlist::formats::PlaylistFormatError;
use crate::services::addons::AddonError;
use crate::services::network::NetworkError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for AddonError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "addon_io_failed",
            Self::InvalidManifest { .. } => "addon_manifest_invalid",
            Self::NotFound(_) => "addon_not_found",
        }
    }
}

impl ErrorCode for PlayerError {
    fn code(&self) -> &'static str {
        match self {
            Self::NoPlayerFor(_) => "no_player_for_item",
            Self::UnknownPlayer(_) => "unknown_player",
            Self::OpenFailed { .. } => "player_open_failed",
            Self::InvalidConfig(_) => "player_config_invalid",
        }
    }
}

impl ErrorCode for PlaylistFormatError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "playlist_io_failed",
            Self::Parse(_) => "playlist_parse_failed",
            Self::Unsupported(_) => "playlist_format_unsupported",
        }
    }
}

impl ErrorCode for NetworkError {
    fn code(&self) -> &'static str {
        match self {
            Self::Detection(_) => "ip_detection_failed",
            Self::Hostname(_) => "hostname_unavailable",
        }
    }
}

/// Application-wide error type for the Kodi core.
#[derive(Debug, Error)]
pub enum KodiError {
    /// A service stage failed to construct one of its subsystems.
    ///
    /// Fatal at startup: the host aborts and unwinds whatever stages are live.
    #[error("Service construction failed: {0}")]
    Construction(String),

    /// Stage transitions were requested out of order.
    #[error("Service stage {requested} cannot run at init level {current}")]
    StageOrder {
        /// Stage that was requested.
        requested: u8,
        /// Init level at the time of the request.
        current: u8,
    },

    /// A service accessor was called before its stage was initialized.
    #[error("Service {service} requires init level {required}, current level is {current}")]
    ServiceUnavailable {
        /// Name of the requested service.
        service: &'static str,
        /// Stage that constructs the service.
        required: u8,
        /// Init level at the time of the request.
        current: u8,
    },

    /// Add-on discovery or lookup failed.
    #[error("Add-on error: {0}")]
    Addon(String),

    /// Player selection or playback failed.
    #[error("Player error: {0}")]
    Player(String),

    /// Playlist file could not be loaded.
    #[error("Playlist error: {0}")]
    Playlist(String),

    /// Neither the requested nor the default skin could be loaded.
    #[error("Skin error: {0}")]
    Skin(String),

    /// Script could not be started.
    #[error("Script error: {0}")]
    Script(String),

    /// Profile lookup or switch failed.
    #[error("Profile error: {0}")]
    Profile(String),

    /// Network-related error (IP detection, hostname).
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid settings or startup parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KodiError {
    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Construction(_) => "construction_failed",
            Self::StageOrder { .. } => "stage_order",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::Addon(_) => "addon_error",
            Self::Player(_) => "player_error",
            Self::Playlist(_) => "playlist_error",
            Self::Skin(_) => "skin_error",
            Self::Script(_) => "script_error",
            Self::Profile(_) => "profile_error",
            Self::Network(_) => "network_error",
            Self::Configuration(_) => "configuration_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns true if the error must abort startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Construction(_) | Self::StageOrder { .. } | Self::Skin(_)
        )
    }
}

/// Convenient Result alias for application-wide operations.
pub type KodiResult<T> = Result<T, KodiError>;

impl From<AddonError> for KodiError {
    fn from(err: AddonError) -> Self {
        Self::Addon(err.to_string())
    }
}

impl From<PlayerError> for KodiError {
    fn from(err: PlayerError) -> Self {
        Self::Player(err.to_string())
    }
}

impl From<PlaylistFormatError> for KodiError {
    fn from(err: PlaylistFormatError) -> Self {
        Self::Playlist(err.to_string())
    }
}

impl From<NetworkError> for KodiError {
    fn from(err: NetworkError) -> Self {
        Self::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_unavailable_reports_levels() {
        let err = KodiError::ServiceUnavailable {
            service: "player_core_factory",
            required: 3,
            current: 1,
        };
        assert_eq!(err.code(), "service_unavailable");
        assert_eq!(
            err.to_string(),
            "Service player_core_factory requires init level 3, current level is 1"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn construction_errors_are_fatal() {
        assert!(KodiError::Construction("addons".into()).is_fatal());
        assert!(KodiError::Skin("default skin missing".into()).is_fatal());
        assert!(!KodiError::Script("no handler".into()).is_fatal());
    }

    #[test]
    fn subsystem_errors_convert_with_codes() {
        let err = AddonError::NotFound("skin.confluence".into());
        assert_eq!(err.code(), "addon_not_found");
        let converted: KodiError = err.into();
        assert_eq!(converted.code(), "addon_error");
    }
}
