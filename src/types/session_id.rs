//! Session identity and the filename prefix derived from it

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Identifies one session between two counterparties.
///
/// Optional parts are empty strings when absent. The store only uses the id
/// to derive a stable filename prefix and for log context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId {
    pub begin_string: String,
    pub sender_comp_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sender_sub_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sender_location_id: String,
    pub target_comp_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_sub_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_location_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub qualifier: String,
}

impl SessionId {
    /// Create a session id from the three mandatory parts
    pub fn new(
        begin_string: impl Into<String>,
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
            ..Default::default()
        }
    }

    pub fn with_sender_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sender_sub_id = sub_id.into();
        self
    }

    pub fn with_sender_location_id(mut self, location_id: impl Into<String>) -> Self {
        self.sender_location_id = location_id.into();
        self
    }

    pub fn with_target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = sub_id.into();
        self
    }

    pub fn with_target_location_id(mut self, location_id: impl Into<String>) -> Self {
        self.target_location_id = location_id.into();
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// Prefix shared by all five store files of this session.
    ///
    /// Format: `BEGIN-SENDER[_SUB][_LOC]-TARGET[_SUB][_LOC][-QUALIFIER]`
    pub fn filename_prefix(&self) -> String {
        let sender = join_present(
            &self.sender_comp_id,
            &[&self.sender_sub_id, &self.sender_location_id],
            "_",
        );
        let target = join_present(
            &self.target_comp_id,
            &[&self.target_sub_id, &self.target_location_id],
            "_",
        );

        let mut parts = vec![self.begin_string.clone(), sender, target];
        if !self.qualifier.is_empty() {
            parts.push(self.qualifier.clone());
        }
        parts.join("-")
    }
}

fn join_present(head: &str, optional: &[&str], sep: &str) -> String {
    let mut out = head.to_string();
    for part in optional.iter().filter(|p| !p.is_empty()) {
        out.push_str(sep);
        out.push_str(part);
    }
    out
}

/// Writes `COMP[/SUB[/LOC]]`, keeping an empty sub id when only a location is set
fn write_party(f: &mut fmt::Formatter<'_>, comp: &str, sub: &str, location: &str) -> fmt::Result {
    write!(f, "{}", comp)?;
    if !sub.is_empty() || !location.is_empty() {
        write!(f, "/{}", sub)?;
    }
    if !location.is_empty() {
        write!(f, "/{}", location)?;
    }
    Ok(())
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.begin_string)?;
        write_party(f, &self.sender_comp_id, &self.sender_sub_id, &self.sender_location_id)?;
        write!(f, "->")?;
        write_party(f, &self.target_comp_id, &self.target_sub_id, &self.target_location_id)?;
        if !self.qualifier.is_empty() {
            write!(f, ":{}", self.qualifier)?;
        }
        Ok(())
    }
}

fn parse_party(s: &str, input: &str) -> Result<(String, String, String), StoreError> {
    let mut pieces = s.splitn(3, '/');
    let comp = pieces.next().unwrap_or_default();
    if comp.is_empty() {
        return Err(StoreError::InvalidSessionId(input.to_string()));
    }
    let sub = pieces.next().unwrap_or_default();
    let location = pieces.next().unwrap_or_default();
    Ok((comp.to_string(), sub.to_string(), location.to_string()))
}

impl FromStr for SessionId {
    type Err = StoreError;

    /// Parses `BEGIN:SENDER[/SUB[/LOC]]->TARGET[/SUB[/LOC]][:QUALIFIER]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidSessionId(s.to_string());

        let (begin_string, rest) = s.split_once(':').ok_or_else(invalid)?;
        if begin_string.is_empty() {
            return Err(invalid());
        }
        let (sender, target_part) = rest.split_once("->").ok_or_else(invalid)?;
        let (target, qualifier) = match target_part.split_once(':') {
            Some((target, qualifier)) => (target, qualifier),
            None => (target_part, ""),
        };

        let (sender_comp_id, sender_sub_id, sender_location_id) = parse_party(sender, s)?;
        let (target_comp_id, target_sub_id, target_location_id) = parse_party(target, s)?;

        Ok(Self {
            begin_string: begin_string.to_string(),
            sender_comp_id,
            sender_sub_id,
            sender_location_id,
            target_comp_id,
            target_sub_id,
            target_location_id,
            qualifier: qualifier.to_string(),
        })
    }
}
