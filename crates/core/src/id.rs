use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from [`FileId`] parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileIdParseError {
    /// The input was not a valid UUID.
    #[error("file id must be a UUID, got {0:?}")]
    Malformed(String),

    /// The input was the nil UUID, which is never minted.
    #[error("file id must not be the nil UUID")]
    Nil,
}

/// Opaque unique identifier for a stored file.
///
/// Minted once at the first successful store of a given content digest.
/// Random (UUID v4) so no shared counter or collision scan is needed.
///
/// Deserialization goes through [`TryFrom<Uuid>`], so the nil UUID is
/// rejected everywhere an id enters the system, including path and body
/// extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Uuid", into = "Uuid")]
pub struct FileId(Uuid);

impl FileId {
    /// Mint a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form, rejecting the nil UUID.
    pub fn parse(input: &str) -> Result<Self, FileIdParseError> {
        let uuid = Uuid::parse_str(input.trim())
            .map_err(|_| FileIdParseError::Malformed(input.to_owned()))?;
        if uuid.is_nil() {
            return Err(FileIdParseError::Nil);
        }
        Ok(Self(uuid))
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl TryFrom<Uuid> for FileId {
    type Error = FileIdParseError;

    fn try_from(uuid: Uuid) -> Result<Self, Self::Error> {
        if uuid.is_nil() {
            return Err(FileIdParseError::Nil);
        }
        Ok(Self(uuid))
    }
}

impl From<FileId> for Uuid {
    fn from(id: FileId) -> Self {
        id.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for FileId {
    type Err = FileIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
