use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("RPC transport failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    RpcError { code: i64, message: String },

    #[error("Failed to decode {context}: {source}")]
    CodecError {
        context: String,
        #[source]
        source: parity_scale_codec::Error,
    },

    #[error("Invalid block hash '{hash}': {reason}")]
    InvalidBlockHash { hash: String, reason: String },

    #[error("Invalid hex data: {0}")]
    HexError(#[from] hex::FromHexError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration field {field} is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Value does not exist: {map} key: {key}")]
    MissingStorage { map: String, key: String },

    #[error("Block #{0} not found on chain")]
    BlockNotFound(u32),

    #[error("Invalid address '{address}': {reason}")]
    AddressError { address: String, reason: String },

    #[error("Sanity check failed: {message}")]
    InvariantViolation { message: String },
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Decoding,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ExportError {
    pub fn codec(context: impl Into<String>, source: parity_scale_codec::Error) -> Self {
        Self::CodecError {
            context: context.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TransportError(_) | Self::RpcError { .. } | Self::BlockNotFound(_) => {
                ErrorCategory::Network
            }
            Self::CodecError { .. } | Self::InvalidBlockHash { .. } | Self::HexError(_) => {
                ErrorCategory::Decoding
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. }
            | Self::AddressError { .. } => ErrorCategory::Configuration,
            Self::MissingStorage { .. } | Self::InvariantViolation { .. } => ErrorCategory::Data,
            Self::CsvError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TransportError(_) | Self::RpcError { .. } => ErrorSeverity::Medium,
            Self::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the node is reachable at WS_URL and that the requested block exists"
            }
            ErrorCategory::Decoding => {
                "The runtime storage layout does not match this exporter; verify the node's runtime version"
            }
            ErrorCategory::Configuration => {
                "Review command line flags, environment variables and the config file"
            }
            ErrorCategory::Data => {
                "Chain state is inconsistent at this block; try another AT_BLOCK_NUMBER or inspect the reported key"
            }
            ErrorCategory::System => "Check output directory permissions and free disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::TransportError(e) if e.is_timeout() => {
                "Timed out waiting for the chain node".to_string()
            }
            Self::TransportError(e) if e.is_connect() => {
                "Could not connect to the chain node".to_string()
            }
            Self::BlockNotFound(number) => format!("Block #{} is not known to the node", number),
            Self::MissingStorage { map, key } => {
                format!("Expected entry {} in {} is missing", key, map)
            }
            other => other.to_string(),
        }
    }

    /// 依嚴重程度決定行程結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_violation_is_fatal_data_error() {
        let err = ExportError::InvariantViolation {
            message: "sum exceeds issuance".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_rpc_error_is_network_medium() {
        let err = ExportError::RpcError {
            code: -32602,
            message: "Invalid params".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "RPC error -32602: Invalid params");
    }

    #[test]
    fn test_invalid_block_hash_is_decoding_error() {
        let err = ExportError::InvalidBlockHash {
            hash: "0xabcd".to_string(),
            reason: "expected 32 bytes, got 2".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Decoding);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_storage_message() {
        let err = ExportError::MissingStorage {
            map: "Forum.PostById".to_string(),
            key: "7".to_string(),
        };
        assert_eq!(
            err.user_friendly_message(),
            "Expected entry 7 in Forum.PostById is missing"
        );
    }
}
