use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// A ten-digit mobile number. Counterparties are often only known by their
/// phone, so this is also the lookup key for borrowers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mobile(String);

impl Mobile {
    pub fn parse(input: &str) -> Result<Self, InvalidMobile> {
        let input = input.trim();
        if input.len() == 10 && input.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(input.to_string()))
        } else {
            Err(InvalidMobile(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Mobile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for Mobile {
    type Error = InvalidMobile;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Mobile::parse(&value)
    }
}

impl From<Mobile> for String {
    fn from(mobile: Mobile) -> Self {
        mobile.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMobile(pub String);

impl std::fmt::Display for InvalidMobile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mobile number must be exactly 10 digits, got '{}'", self.0)
    }
}

impl std::error::Error for InvalidMobile {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub mobile: Option<Mobile>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            mobile: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_mobile(mut self, mobile: Mobile) -> Self {
        self.mobile = Some(mobile);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_accepts_ten_digits() {
        let mobile = Mobile::parse("9876543210").unwrap();
        assert_eq!(mobile.as_str(), "9876543210");
        assert_eq!(Mobile::parse(" 9876543210 ").unwrap(), mobile);
    }

    #[test]
    fn test_mobile_rejects_other_shapes() {
        assert!(Mobile::parse("987654321").is_err());
        assert!(Mobile::parse("98765432100").is_err());
        assert!(Mobile::parse("98765abcde").is_err());
        assert!(Mobile::parse("+919876543").is_err());
        assert!(Mobile::parse("").is_err());
    }

    #[test]
    fn test_mobile_serde_validates() {
        let ok: Mobile = serde_json::from_str("\"9876543210\"").unwrap();
        assert_eq!(ok.as_str(), "9876543210");
        assert!(serde_json::from_str::<Mobile>("\"12345\"").is_err());
    }
}
