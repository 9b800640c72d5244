//! Turns loosely typed request parameters into a [`FilterRequest`].

use std::collections::HashMap;

use crate::error::{ListingError, Result};
use crate::models::{AccommodationType, GenderPolicy};

use super::types::{is_sentinel, DistanceFilter, FilterRequest, RentBand, RentFilter};

/// Keys whose values are collected as amenity tags
const AMENITY_KEYS: &[&str] = &["amenity", "amenities", "amenity[]", "amenities[]"];

/// Raw string parameters from a query string or form body.
///
/// Single-valued fields keep their first occurrence. Amenity keys may repeat
/// and may also carry comma separated tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams {
    values: HashMap<String, String>,
    amenities: Vec<String>,
}

impl RawParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value = value.as_ref();
            if AMENITY_KEYS.contains(&key) {
                params
                    .amenities
                    .extend(value.split(',').map(|tag| tag.to_string()));
            } else {
                params
                    .values
                    .entry(key.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        params
    }

    /// Parse an `application/x-www-form-urlencoded` payload
    pub fn from_urlencoded(input: &[u8]) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(input))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key` unless absent or a sentinel
    fn concrete(&self, key: &str) -> Option<&str> {
        self.untrimmed(key).map(str::trim)
    }

    /// Like [`concrete`](Self::concrete) but keeps trailing whitespace, which
    /// is what an unescaped `+` decodes to.
    fn untrimmed(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !is_sentinel(v))
    }

    pub fn amenities(&self) -> &[String] {
        &self.amenities
    }
}

/// Build a filter from raw parameters. Unknown keys are dropped; values that
/// cannot be coerced to their field's type are rejected.
pub fn normalize(raw: &RawParams) -> Result<FilterRequest> {
    Ok(FilterRequest {
        distance: distance_filter(raw)?,
        accommodation_type: raw
            .concrete("accommodation")
            .map(|v| {
                AccommodationType::parse(v).ok_or_else(|| {
                    ListingError::validation("accommodation", v, "expected hostel, pg or flat")
                })
            })
            .transpose()?,
        gender: raw
            .concrete("gender")
            .map(|v| {
                GenderPolicy::parse(v).ok_or_else(|| {
                    ListingError::validation("gender", v, "expected male, female or any")
                })
            })
            .transpose()?,
        room_type: raw.concrete("roomtype").map(str::to_string),
        rent: rent_filter(raw)?,
        amenities: amenity_tags(raw.amenities()),
    })
}

fn distance_filter(raw: &RawParams) -> Result<DistanceFilter> {
    if let Some(value) = raw.untrimmed("distance") {
        return parse_distance(value);
    }
    match raw.concrete("max_distance") {
        Some(value) => Ok(DistanceFilter::AtMost(parse_amount(
            "max_distance",
            value,
            "expected kilometers",
        )?)),
        None => Ok(DistanceFilter::Any),
    }
}

/// Splits an open-ended marker off `value`: a trailing `+`, the space an
/// unescaped `+` decodes to in a query string, or a `-plus` suffix.
/// Returns the lowercased remainder and whether a marker was present.
fn split_open_ended(value: &str) -> (String, bool) {
    let lowered = value.trim_start().to_ascii_lowercase();
    if let Some(rest) = lowered.strip_suffix('+') {
        return (rest.trim().to_string(), true);
    }
    if let Some(rest) = lowered.strip_suffix("-plus") {
        return (rest.trim().to_string(), true);
    }
    let trimmed = lowered.trim_end();
    (trimmed.to_string(), trimmed.len() != lowered.len())
}

/// `1.5` / `1.5km` / `800m` cap the distance; a trailing `+` (`2+`, or
/// `2km-plus`) asks for listings further away than the given distance.
pub(crate) fn parse_distance(value: &str) -> Result<DistanceFilter> {
    let (length, open_upper) = split_open_ended(value);
    let length = length.as_str();

    let km = if let Some(km) = length.strip_suffix("km") {
        parse_amount("distance", km.trim(), "expected a distance such as 1.5, 800m or 2+")?
    } else if let Some(meters) = length.strip_suffix('m') {
        parse_amount("distance", meters.trim(), "expected a distance such as 1.5, 800m or 2+")?
            / 1000.0
    } else {
        parse_amount("distance", length, "expected a distance such as 1.5, 800m or 2+")?
    };

    Ok(if open_upper {
        DistanceFilter::MoreThan(km)
    } else {
        DistanceFilter::AtMost(km)
    })
}

fn rent_filter(raw: &RawParams) -> Result<RentFilter> {
    if let Some(raw_value) = raw.untrimmed("rent") {
        let value = raw_value.trim();
        if let Some(band) = RentBand::from_key(value) {
            return Ok(RentFilter::Band(band));
        }
        let (base, open_ended) = split_open_ended(raw_value);
        if open_ended {
            if let Some(band) = RentBand::from_key(&format!("{base}+")) {
                return Ok(RentFilter::Band(band));
            }
        }
        let max = parse_amount("rent", value, "expected a rent band key or a number")?;
        return Ok(RentFilter::AtMost(max));
    }

    let min = raw
        .concrete("min_price")
        .map(|v| parse_amount("min_price", v, "expected a number"))
        .transpose()?;
    let max = raw
        .concrete("max_price")
        .map(|v| parse_amount("max_price", v, "expected a number"))
        .transpose()?;

    Ok(match (min, max) {
        (None, None) => RentFilter::Any,
        (min, max) => RentFilter::Range { min, max },
    })
}

fn parse_amount(field: &'static str, value: &str, reason: &'static str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(ListingError::validation(field, value, reason)),
    }
}

fn amenity_tags(raw: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.is_empty() || is_sentinel(&tag) || tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
    }
    tags
}
