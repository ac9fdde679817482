use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier of one analysis job, as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Audience a result view is requested for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Persona {
    #[default]
    Developer,
    Qa,
    SalesEngineer,
    /// Any persona tag the backend knows about that this client does not.
    Other(String),
}

impl Persona {
    /// Wire tag used in query strings and cache keys.
    pub fn as_str(&self) -> &str {
        match self {
            Persona::Developer => "developer",
            Persona::Qa => "qa",
            Persona::SalesEngineer => "salesEngineer",
            Persona::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("persona tag must not be empty")]
pub struct EmptyPersona;

impl FromStr for Persona {
    type Err = EmptyPersona;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let tag = raw.trim();
        let persona = match tag {
            "" => return Err(EmptyPersona),
            "developer" => Persona::Developer,
            "qa" => Persona::Qa,
            "salesEngineer" => Persona::SalesEngineer,
            other => Persona::Other(other.to_string()),
        };
        Ok(persona)
    }
}

impl Serialize for Persona {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Persona {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One polled view: a job seen through a persona.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollKey {
    pub job_id: JobId,
    pub persona: Persona,
}

impl PollKey {
    pub fn new(job_id: impl Into<JobId>, persona: Persona) -> Self {
        Self {
            job_id: job_id.into(),
            persona,
        }
    }

    /// Persistent cache key, `results-{jobId}-{persona}`.
    pub fn cache_key(&self) -> String {
        format!("results-{}-{}", self.job_id, self.persona)
    }

    pub fn with_persona(&self, persona: Persona) -> Self {
        Self {
            job_id: self.job_id.clone(),
            persona,
        }
    }
}

impl fmt::Display for PollKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.job_id, self.persona)
    }
}
