use crate::models::{AccommodationType, GenderPolicy};

/// Raw values that mean "no constraint"
pub const SENTINELS: &[&str] = &["", "all", "none"];

pub fn is_sentinel(value: &str) -> bool {
    let value = value.trim();
    SENTINELS.iter().any(|s| value.eq_ignore_ascii_case(s))
}

/// Distance constraint in kilometers
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DistanceFilter {
    #[default]
    Any,
    /// distance <= km
    AtMost(f64),
    /// distance > km, the "more than 2 km" style band
    MoreThan(f64),
}

/// Fixed rent bands. Every band is half-open: lower bound inclusive,
/// upper bound exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentBand {
    Under5k,
    From5kTo10k,
    From10kTo15k,
    From15kTo20k,
    From20k,
}

impl RentBand {
    pub const ALL: [RentBand; 5] = [
        RentBand::Under5k,
        RentBand::From5kTo10k,
        RentBand::From10kTo15k,
        RentBand::From15kTo20k,
        RentBand::From20k,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Under5k => "5k",
            Self::From5kTo10k => "5k-10k",
            Self::From10kTo15k => "10k-15k",
            Self::From15kTo20k => "15k-20k",
            Self::From20k => "20k+",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Under5k => "Below 5,000",
            Self::From5kTo10k => "5,000 - 10,000",
            Self::From10kTo15k => "10,000 - 15,000",
            Self::From15kTo20k => "15,000 - 20,000",
            Self::From20k => "20,000 and above",
        }
    }

    /// (inclusive lower, exclusive upper)
    pub fn bounds(&self) -> (Option<i64>, Option<i64>) {
        match self {
            Self::Under5k => (None, Some(5_000)),
            Self::From5kTo10k => (Some(5_000), Some(10_000)),
            Self::From10kTo15k => (Some(10_000), Some(15_000)),
            Self::From15kTo20k => (Some(15_000), Some(20_000)),
            Self::From20k => (Some(20_000), None),
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|band| band.key().eq_ignore_ascii_case(key))
    }
}

/// Rent constraint. A request carries exactly one of these, so at most one
/// rent predicate is ever compiled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RentFilter {
    #[default]
    Any,
    AtMost(f64),
    Band(RentBand),
    /// Inclusive price range from the JSON listing endpoints
    Range { min: Option<f64>, max: Option<f64> },
}

/// Normalized constraints for one listing query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterRequest {
    pub distance: DistanceFilter,
    pub accommodation_type: Option<AccommodationType>,
    pub gender: Option<GenderPolicy>,
    pub room_type: Option<String>,
    pub rent: RentFilter,
    /// Requested amenity tags, lowercased and deduplicated. Not yet checked
    /// against the vocabulary.
    pub amenities: Vec<String>,
}

impl FilterRequest {
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    /// Human readable summary of the active constraints
    pub fn describe(&self) -> Vec<String> {
        let mut parts = Vec::new();

        match self.distance {
            DistanceFilter::Any => {}
            DistanceFilter::AtMost(km) => parts.push(format!("within {km} km")),
            DistanceFilter::MoreThan(km) => parts.push(format!("more than {km} km away")),
        }
        if let Some(kind) = self.accommodation_type {
            parts.push(format!("type {}", kind.as_str()));
        }
        if let Some(gender) = self.gender {
            parts.push(format!("gender {}", gender.as_str()));
        }
        if let Some(room_type) = &self.room_type {
            parts.push(format!("room {room_type}"));
        }
        match self.rent {
            RentFilter::Any => {}
            RentFilter::AtMost(max) => parts.push(format!("rent up to {max}")),
            RentFilter::Band(band) => parts.push(format!("rent {}", band.label())),
            RentFilter::Range { min, max } => {
                let min = min.map_or_else(|| "0".to_string(), |v| v.to_string());
                let max = max.map_or_else(|| "any".to_string(), |v| v.to_string());
                parts.push(format!("rent {min} to {max}"));
            }
        }
        if !self.amenities.is_empty() {
            parts.push(format!("with {}", self.amenities.join(", ")));
        }

        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_case_insensitive() {
        assert!(is_sentinel("ALL"));
        assert!(is_sentinel(" none "));
        assert!(is_sentinel(""));
        assert!(!is_sentinel("any"));
        assert!(!is_sentinel("hostel"));
    }

    #[test]
    fn rent_bands_are_contiguous() {
        for pair in RentBand::ALL.windows(2) {
            assert_eq!(pair[0].bounds().1, pair[1].bounds().0);
        }
        assert_eq!(RentBand::ALL[0].bounds().0, None);
        assert_eq!(RentBand::ALL[4].bounds().1, None);
    }

    #[test]
    fn rent_band_lookup_by_key() {
        assert_eq!(RentBand::from_key("5K"), Some(RentBand::Under5k));
        assert_eq!(RentBand::from_key("10k-15k"), Some(RentBand::From10kTo15k));
        assert_eq!(RentBand::from_key("20k+"), Some(RentBand::From20k));
        assert_eq!(RentBand::from_key("7k"), None);
    }

    #[test]
    fn default_request_is_unconstrained() {
        let mut filter = FilterRequest::default();
        assert!(filter.is_unconstrained());
        assert!(filter.describe().is_empty());

        filter.amenities.push("wifi".to_string());
        assert!(!filter.is_unconstrained());
        assert_eq!(filter.describe(), vec!["with wifi".to_string()]);
    }
}
