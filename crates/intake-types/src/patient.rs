//! Patient intake record and its enumerated fields.

use crate::PatientId;
use std::fmt;
use std::str::FromStr;

/// Administrative gender as offered by the intake form.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender '{other}'")),
        }
    }
}

/// Preferred language for communication.
///
/// Any non-empty value outside the fixed list is read as [`PreferredLanguage::Other`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PreferredLanguage {
    English,
    Spanish,
    French,
    German,
    Chinese,
    Arabic,
    Hindi,
    #[default]
    Other,
}

impl PreferredLanguage {
    pub const ALL: [PreferredLanguage; 8] = [
        PreferredLanguage::English,
        PreferredLanguage::Spanish,
        PreferredLanguage::French,
        PreferredLanguage::German,
        PreferredLanguage::Chinese,
        PreferredLanguage::Arabic,
        PreferredLanguage::Hindi,
        PreferredLanguage::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferredLanguage::English => "english",
            PreferredLanguage::Spanish => "spanish",
            PreferredLanguage::French => "french",
            PreferredLanguage::German => "german",
            PreferredLanguage::Chinese => "chinese",
            PreferredLanguage::Arabic => "arabic",
            PreferredLanguage::Hindi => "hindi",
            PreferredLanguage::Other => "other",
        }
    }
}

impl fmt::Display for PreferredLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferredLanguage {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Ok(Self::ALL
            .into_iter()
            .find(|lang| lang.as_str() == lowered)
            .unwrap_or_default())
    }
}

/// Text members accept `null` as well as a string, so records from other producers on the
/// channel are not dropped for an explicit `null`.
mod text {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// A patient intake record.
///
/// Text fields may be empty while a form is still being filled in; completeness is only
/// enforced by the form at submission time.
///
/// `gender` and `preferredLanguage` are kept exactly as received. The form only ever writes
/// the canonical lowercase values; [`PatientRecord::gender`] and
/// [`PatientRecord::preferred_language`] give the typed reading.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[schema(value_type = String, example = "550e8400e29b41d4a716446655440000")]
    pub id: PatientId,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub first_name: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub last_name: String,
    /// ISO date, `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "text::deserialize")]
    pub date_of_birth: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    #[schema(value_type = Gender)]
    pub gender: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub email: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub phone: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub address: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    #[schema(value_type = PreferredLanguage)]
    pub preferred_language: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub nationality: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub emergency_contact: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub religion: String,
}

impl PatientRecord {
    /// An all-empty record carrying the given identity.
    pub fn empty(id: PatientId) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            date_of_birth: String::new(),
            gender: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            preferred_language: String::new(),
            nationality: String::new(),
            emergency_contact: String::new(),
            religion: String::new(),
        }
    }

    /// Raw value of a field as it travels on the wire.
    pub fn value(&self, field: PatientField) -> &str {
        match field {
            PatientField::FirstName => &self.first_name,
            PatientField::LastName => &self.last_name,
            PatientField::DateOfBirth => &self.date_of_birth,
            PatientField::Gender => &self.gender,
            PatientField::Email => &self.email,
            PatientField::Phone => &self.phone,
            PatientField::Address => &self.address,
            PatientField::PreferredLanguage => &self.preferred_language,
            PatientField::Nationality => &self.nationality,
            PatientField::EmergencyContact => &self.emergency_contact,
            PatientField::Religion => &self.religion,
        }
    }

    /// Required fields that are still blank, in form order.
    pub fn missing_required(&self) -> Vec<PatientField> {
        PatientField::ALL
            .into_iter()
            .filter(|f| f.is_required() && self.value(*f).trim().is_empty())
            .collect()
    }

    /// `None` when unset or outside the offered options.
    pub fn gender(&self) -> Option<Gender> {
        self.gender.parse().ok()
    }

    /// `None` when unset; any other value outside the fixed list reads as `Other`.
    pub fn preferred_language(&self) -> Option<PreferredLanguage> {
        if self.preferred_language.trim().is_empty() {
            return None;
        }
        self.preferred_language.parse().ok()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Addressable fields of a [`PatientRecord`], in the order the form presents them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatientField {
    FirstName,
    LastName,
    DateOfBirth,
    Gender,
    Phone,
    Email,
    Address,
    EmergencyContact,
    PreferredLanguage,
    Nationality,
    Religion,
}

impl PatientField {
    pub const ALL: [PatientField; 11] = [
        PatientField::FirstName,
        PatientField::LastName,
        PatientField::DateOfBirth,
        PatientField::Gender,
        PatientField::Phone,
        PatientField::Email,
        PatientField::Address,
        PatientField::EmergencyContact,
        PatientField::PreferredLanguage,
        PatientField::Nationality,
        PatientField::Religion,
    ];

    /// The camelCase name used on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            PatientField::FirstName => "firstName",
            PatientField::LastName => "lastName",
            PatientField::DateOfBirth => "dateOfBirth",
            PatientField::Gender => "gender",
            PatientField::Phone => "phone",
            PatientField::Email => "email",
            PatientField::Address => "address",
            PatientField::EmergencyContact => "emergencyContact",
            PatientField::PreferredLanguage => "preferredLanguage",
            PatientField::Nationality => "nationality",
            PatientField::Religion => "religion",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PatientField::FirstName => "First Name",
            PatientField::LastName => "Last Name",
            PatientField::DateOfBirth => "Date of Birth",
            PatientField::Gender => "Gender",
            PatientField::Phone => "Phone Number",
            PatientField::Email => "Email Address",
            PatientField::Address => "Address",
            PatientField::EmergencyContact => "Emergency Contact",
            PatientField::PreferredLanguage => "Preferred Language",
            PatientField::Nationality => "Nationality",
            PatientField::Religion => "Religion",
        }
    }

    /// Religion is the only optional field.
    pub fn is_required(&self) -> bool {
        !matches!(self, PatientField::Religion)
    }
}

impl fmt::Display for PatientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for PatientField {
    type Err = String;

    /// Accepts the wire name (`dateOfBirth`) as well as `date_of_birth` / `date-of-birth`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        PatientField::ALL
            .into_iter()
            .find(|f| f.wire_name().to_ascii_lowercase() == folded)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> PatientRecord {
        PatientRecord {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            date_of_birth: "1990-04-01".into(),
            gender: "female".into(),
            email: "ann@example.com".into(),
            phone: "+1 555 0100".into(),
            address: "1 Main St".into(),
            preferred_language: "english".into(),
            nationality: "Canadian".into(),
            emergency_contact: "Bob Lee 555 0101".into(),
            ..PatientRecord::empty(PatientId::parse("p1").unwrap())
        }
    }

    #[test]
    fn serializes_with_camel_case_wire_names() {
        let json = serde_json::to_value(ann()).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["firstName"], "Ann");
        assert_eq!(json["dateOfBirth"], "1990-04-01");
        assert_eq!(json["gender"], "female");
        assert_eq!(json["preferredLanguage"], "english");
        assert_eq!(json["emergencyContact"], "Bob Lee 555 0101");
        assert_eq!(json["religion"], "");
    }

    #[test]
    fn unset_enums_travel_as_empty_strings() {
        let draft = PatientRecord::empty(PatientId::parse("d1").unwrap());
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["gender"], "");
        assert_eq!(json["preferredLanguage"], "");

        let back: PatientRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, draft);
    }

    #[test]
    fn partial_payload_fills_defaults() {
        let record: PatientRecord =
            serde_json::from_str(r#"{"id":"p2","firstName":"Jo","religion":null}"#).unwrap();
        assert_eq!(record.first_name, "Jo");
        assert_eq!(record.religion, "");
        assert_eq!(record.gender(), None);
        assert!(record.missing_required().contains(&PatientField::LastName));
    }

    #[test]
    fn foreign_enum_values_are_kept_verbatim() {
        let payload = serde_json::json!({
            "id": "p3",
            "gender": "Nonbinary",
            "preferredLanguage": "Klingon"
        });
        let record: PatientRecord = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(record.gender(), None);
        assert_eq!(record.preferred_language(), Some(PreferredLanguage::Other));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["gender"], "Nonbinary");
        assert_eq!(back["preferredLanguage"], "Klingon");
    }

    #[test]
    fn typed_readings_are_case_insensitive() {
        let record = PatientRecord {
            gender: "Female".into(),
            preferred_language: "English".into(),
            ..PatientRecord::empty(PatientId::parse("p4").unwrap())
        };
        assert_eq!(record.gender(), Some(Gender::Female));
        assert_eq!(record.preferred_language(), Some(PreferredLanguage::English));
    }

    #[test]
    fn non_text_members_are_rejected() {
        let result: Result<PatientRecord, _> =
            serde_json::from_str(r#"{"id":"p5","firstName":{"given":"Jo"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn complete_record_has_no_missing_fields() {
        assert!(ann().missing_required().is_empty());
    }

    #[test]
    fn field_names_parse_in_several_spellings() {
        assert_eq!("dateOfBirth".parse::<PatientField>(), Ok(PatientField::DateOfBirth));
        assert_eq!("date_of_birth".parse::<PatientField>(), Ok(PatientField::DateOfBirth));
        assert_eq!("emergency-contact".parse::<PatientField>(), Ok(PatientField::EmergencyContact));
        assert!("shoeSize".parse::<PatientField>().is_err());
    }
}
