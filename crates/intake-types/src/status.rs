use std::fmt;
use std::str::FromStr;

/// Form-completion progress attached to a record when it is relayed.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum StatusTag {
    Filling,
    Submitted,
    Inactive,
}

impl StatusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::Filling => "filling",
            StatusTag::Submitted => "submitted",
            StatusTag::Inactive => "inactive",
        }
    }

    /// Only submitted entries are mirrored to the dashboard's persisted slot.
    pub fn is_persisted(&self) -> bool {
        matches!(self, StatusTag::Submitted)
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filling" => Ok(StatusTag::Filling),
            "submitted" => Ok(StatusTag::Submitted),
            "inactive" => Ok(StatusTag::Inactive),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}
