// Core domain types shared across all PairChat crates.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// One of the two fixed chat identities.
///
/// On the wire and in storage a participant is its numeric id: `1` for
/// [`ParticipantId::PeerA`] and `2` for [`ParticipantId::PeerB`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ParticipantId {
    PeerA,
    PeerB,
}

impl ParticipantId {
    pub const ALL: [Self; 2] = [Self::PeerA, Self::PeerB];

    /// The participant allowed to run administrative operations.
    pub const PRIVILEGED: Self = Self::PeerA;

    pub const fn as_i16(self) -> i16 {
        match self {
            Self::PeerA => 1,
            Self::PeerB => 2,
        }
    }

    /// The other participant of the conversation.
    pub const fn peer(self) -> Self {
        match self {
            Self::PeerA => Self::PeerB,
            Self::PeerB => Self::PeerA,
        }
    }

    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::PeerA)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i16())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseParticipantError {
    #[error("unknown participant id {0}; expected 1 or 2")]
    Unknown(i64),
    #[error("participant id must be an integer, got {0:?}")]
    NotANumber(String),
}

impl TryFrom<i64> for ParticipantId {
    type Error = ParseParticipantError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::PeerA),
            2 => Ok(Self::PeerB),
            other => Err(ParseParticipantError::Unknown(other)),
        }
    }
}

impl TryFrom<i16> for ParticipantId {
    type Error = ParseParticipantError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<ParticipantId> for i64 {
    fn from(value: ParticipantId) -> Self {
        i64::from(value.as_i16())
    }
}

impl FromStr for ParticipantId {
    type Err = ParseParticipantError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseParticipantError::NotANumber(raw.to_string()))?;
        Self::try_from(value)
    }
}
