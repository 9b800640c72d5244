use serde::{Deserialize, Serialize};

/// Kind of accommodation a listing offers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccommodationType {
    Hostel,
    Pg,
    Flat,
}

impl AccommodationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hostel => "hostel",
            Self::Pg => "pg",
            Self::Flat => "flat",
        }
    }

    /// Case-insensitive parse of a stored or requested value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hostel" => Some(Self::Hostel),
            "pg" => Some(Self::Pg),
            "flat" => Some(Self::Flat),
            _ => None,
        }
    }
}

/// Who a listing accepts as tenants
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenderPolicy {
    Male,
    Female,
    Any,
}

impl GenderPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Any => "any",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

/// One listing row as served to clients.
///
/// Rows are owned by the data store; the service only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccommodationRecord {
    pub id: i64,
    pub name: String,
    pub accommodation_type: AccommodationType,
    /// Kilometers from campus
    pub distance: f64,
    pub gender: GenderPolicy,
    pub room_type: String,
    /// Monthly rent
    pub rent: f64,
    /// Amenity tags in stored order
    pub amenities: Vec<String>,
}
