//! Broker error codes.
//!
//! Only the codes that administrative calls (create/describe/delete topics, describe cluster and configs) can
//! produce are named; everything else is carried as [`Error::Unknown`].
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_error_codes>

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    #[error("UnknownServerError")]
    UnknownServerError,

    #[error("UnknownTopicOrPartition")]
    UnknownTopicOrPartition,

    #[error("LeaderNotAvailable")]
    LeaderNotAvailable,

    #[error("RequestTimedOut")]
    RequestTimedOut,

    #[error("BrokerNotAvailable")]
    BrokerNotAvailable,

    #[error("NetworkException")]
    NetworkException,

    #[error("InvalidTopicException")]
    InvalidTopicException,

    #[error("NotEnoughReplicas")]
    NotEnoughReplicas,

    #[error("TopicAuthorizationFailed")]
    TopicAuthorizationFailed,

    #[error("ClusterAuthorizationFailed")]
    ClusterAuthorizationFailed,

    #[error("TopicAlreadyExists")]
    TopicAlreadyExists,

    #[error("InvalidPartitions")]
    InvalidPartitions,

    #[error("InvalidReplicationFactor")]
    InvalidReplicationFactor,

    #[error("InvalidReplicaAssignment")]
    InvalidReplicaAssignment,

    #[error("InvalidConfig")]
    InvalidConfig,

    #[error("NotController")]
    NotController,

    #[error("PolicyViolation")]
    PolicyViolation,

    #[error("TopicDeletionDisabled")]
    TopicDeletionDisabled,

    #[error("Unknown error: {0}")]
    Unknown(i16),
}

impl Error {
    /// Maps a wire error code to an error, `0` meaning "no error".
    pub fn new(code: i16) -> Option<Self> {
        match code {
            0 => None,
            -1 => Some(Self::UnknownServerError),
            3 => Some(Self::UnknownTopicOrPartition),
            5 => Some(Self::LeaderNotAvailable),
            7 => Some(Self::RequestTimedOut),
            8 => Some(Self::BrokerNotAvailable),
            13 => Some(Self::NetworkException),
            17 => Some(Self::InvalidTopicException),
            19 => Some(Self::NotEnoughReplicas),
            29 => Some(Self::TopicAuthorizationFailed),
            31 => Some(Self::ClusterAuthorizationFailed),
            36 => Some(Self::TopicAlreadyExists),
            37 => Some(Self::InvalidPartitions),
            38 => Some(Self::InvalidReplicationFactor),
            39 => Some(Self::InvalidReplicaAssignment),
            40 => Some(Self::InvalidConfig),
            41 => Some(Self::NotController),
            44 => Some(Self::PolicyViolation),
            73 => Some(Self::TopicDeletionDisabled),
            _ => Some(Self::Unknown(code)),
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::LeaderNotAvailable
                | Self::RequestTimedOut
                | Self::BrokerNotAvailable
                | Self::NetworkException
                | Self::NotEnoughReplicas
                | Self::NotController
        )
    }
}

impl From<Error> for i16 {
    fn from(error: Error) -> Self {
        match error {
            Error::UnknownServerError => -1,
            Error::UnknownTopicOrPartition => 3,
            Error::LeaderNotAvailable => 5,
            Error::RequestTimedOut => 7,
            Error::BrokerNotAvailable => 8,
            Error::NetworkException => 13,
            Error::InvalidTopicException => 17,
            Error::NotEnoughReplicas => 19,
            Error::TopicAuthorizationFailed => 29,
            Error::ClusterAuthorizationFailed => 31,
            Error::TopicAlreadyExists => 36,
            Error::InvalidPartitions => 37,
            Error::InvalidReplicationFactor => 38,
            Error::InvalidReplicaAssignment => 39,
            Error::InvalidConfig => 40,
            Error::NotController => 41,
            Error::PolicyViolation => 44,
            Error::TopicDeletionDisabled => 73,
            Error::Unknown(code) => code,
        }
    }
}
