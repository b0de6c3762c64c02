// MIT License - Copyright (c) 2026 Peter Wright
// Bridge error types

/// All errors that can occur in the hikax-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Device rejected credentials (HTTP 401)")]
    Authentication,

    #[error("Device returned HTTP {status} for {endpoint}")]
    DeviceStatus { endpoint: String, status: u16 },

    #[error("Invalid device response: {details}")]
    InvalidResponse { details: String },

    #[error("MQTT connection error: {0}")]
    MqttConnection(#[from] rumqttc::ConnectionError),

    #[error("MQTT client error: {0}")]
    MqttClient(#[from] rumqttc::ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether this error is transient: the next poll cycle may succeed
    /// without any configuration change.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BridgeError::Transport(_)
                | BridgeError::DeviceStatus { .. }
                | BridgeError::InvalidResponse { .. }
                | BridgeError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
