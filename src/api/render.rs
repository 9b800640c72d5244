//! Server-rendered listing page.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::models::AccommodationRecord;
use crate::query::normalize::parse_distance;
use crate::query::types::{DistanceFilter, RentFilter};
use crate::query::{AmenityVocabulary, FilterRequest, RentBand};

const DISTANCE_CHOICES: &[(&str, &str)] = &[
    ("all", "Any distance"),
    ("0.5", "Within 500 m"),
    ("1", "Within 1 km"),
    ("2", "Within 2 km"),
    ("2+", "More than 2 km"),
];

const ACCOMMODATION_CHOICES: &[(&str, &str)] = &[
    ("all", "All types"),
    ("hostel", "Hostel"),
    ("pg", "PG"),
    ("flat", "Flat"),
];

const GENDER_CHOICES: &[(&str, &str)] = &[
    ("all", "Any policy"),
    ("male", "Male"),
    ("female", "Female"),
    ("any", "Co-living"),
];

fn select(out: &mut String, name: &str, choices: &[(String, String)], current: &str) {
    let _ = write!(out, r#"<select name="{}">"#, attr(name));
    for (value, label) in choices {
        let selected = if value.eq_ignore_ascii_case(current) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            out,
            r#"<option value="{}"{selected}>{}</option>"#,
            attr(value),
            text(label)
        );
    }
    out.push_str("</select>");
}

fn owned(choices: &[(&str, &str)]) -> Vec<(String, String)> {
    choices
        .iter()
        .map(|(v, l)| (v.to_string(), l.to_string()))
        .collect()
}

/// Distance options with the active filter selected. A distance that none of
/// the preset options expresses gets an option of its own.
fn distance_choices(filter: DistanceFilter) -> (Vec<(String, String)>, String) {
    let mut choices = owned(DISTANCE_CHOICES);
    let preset = DISTANCE_CHOICES.iter().find(|(value, _)| {
        let parsed = if *value == "all" {
            Some(DistanceFilter::Any)
        } else {
            parse_distance(value).ok()
        };
        parsed == Some(filter)
    });
    if let Some((value, _)) = preset {
        return (choices, value.to_string());
    }

    let (value, label) = match filter {
        DistanceFilter::Any => ("all".to_string(), String::new()),
        DistanceFilter::AtMost(km) => (km.to_string(), format!("Within {}", distance_label(km))),
        DistanceFilter::MoreThan(km) => {
            (format!("{km}+"), format!("More than {}", distance_label(km)))
        }
    };
    choices.push((value.clone(), label));
    (choices, value)
}

/// Rent options with the active filter selected. A price range from the JSON
/// style `min_price`/`max_price` parameters is carried in hidden inputs.
fn rent_choices(out: &mut String, filter: RentFilter) -> (Vec<(String, String)>, String) {
    let mut choices = vec![("all".to_string(), "Any rent".to_string())];
    choices.extend(
        RentBand::ALL
            .iter()
            .map(|band| (band.key().to_string(), band.label().to_string())),
    );

    let current = match filter {
        RentFilter::Any => "all".to_string(),
        RentFilter::Band(band) => band.key().to_string(),
        RentFilter::AtMost(max) => {
            choices.push((max.to_string(), format!("Up to {max}")));
            max.to_string()
        }
        RentFilter::Range { min, max } => {
            for (name, bound) in [("min_price", min), ("max_price", max)] {
                if let Some(bound) = bound {
                    let _ = write!(
                        out,
                        r#"<input type="hidden" name="{name}" value="{}">"#,
                        attr(&bound.to_string())
                    );
                }
            }
            "all".to_string()
        }
    };
    (choices, current)
}

fn filter_form(out: &mut String, vocabulary: &AmenityVocabulary, filter: &FilterRequest) {
    out.push_str(r#"<form method="post" action="/" class="filters">"#);

    let (distances, current) = distance_choices(filter.distance);
    select(out, "distance", &distances, &current);

    let accommodation = filter.accommodation_type.map_or("all", |t| t.as_str());
    select(out, "accommodation", &owned(ACCOMMODATION_CHOICES), accommodation);

    let gender = filter.gender.map_or("all", |g| g.as_str());
    select(out, "gender", &owned(GENDER_CHOICES), gender);

    let room_type = filter.room_type.as_deref().unwrap_or("");
    let _ = write!(
        out,
        r#"<input type="text" name="roomtype" placeholder="Room type" value="{}">"#,
        attr(room_type)
    );

    let (rents, current) = rent_choices(out, filter.rent);
    select(out, "rent", &rents, &current);

    out.push_str(r#"<fieldset class="amenities">"#);
    for amenity in vocabulary.iter() {
        let tag = amenity.tag();
        let checked = if filter.amenities.iter().any(|a| a == tag) {
            " checked"
        } else {
            ""
        };
        let _ = write!(
            out,
            r#"<label><input type="checkbox" name="amenity" value="{}"{checked}> {}</label>"#,
            attr(tag),
            text(tag)
        );
    }
    out.push_str("</fieldset>");
    out.push_str(r#"<button type="submit">Search</button></form>"#);
}

fn distance_label(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{km:.1} km")
    }
}

fn record_row(out: &mut String, record: &AccommodationRecord) {
    let amenities = if record.amenities.is_empty() {
        "-".to_string()
    } else {
        record.amenities.join(", ")
    };
    let _ = write!(
        out,
        concat!(
            r#"<tr><td><a href="/details/{}">{}</a></td><td>{}</td><td>{}</td>"#,
            r#"<td>{}</td><td>{}</td><td>{:.0}/month</td><td>{}</td></tr>"#,
        ),
        record.id,
        text(&record.name),
        record.accommodation_type.as_str(),
        distance_label(record.distance),
        record.gender.as_str(),
        text(&record.room_type),
        record.rent,
        text(&amenities),
    );
}

/// Full page: filter form, active filter summary and matched listings
pub fn listing_page(
    vocabulary: &AmenityVocabulary,
    filter: &FilterRequest,
    records: &[AccommodationRecord],
) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Stay Scout</title></head><body>",
    );
    out.push_str("<h1>Student accommodation near campus</h1>");

    filter_form(&mut out, vocabulary, filter);

    let summary = filter.describe();
    if filter.is_unconstrained() {
        out.push_str("<p class=\"summary\">Showing every listing.</p>");
    } else {
        let _ = write!(
            out,
            "<p class=\"summary\">Filters: {}</p>",
            text(&summary.join("; "))
        );
    }
    if matches!(filter.distance, DistanceFilter::MoreThan(_)) {
        out.push_str("<p class=\"note\">Showing places further from campus.</p>");
    }

    if records.is_empty() {
        out.push_str("<p class=\"empty\">No accommodation matches these filters.</p>");
    } else {
        let _ = write!(out, "<p class=\"count\">{} found</p>", records.len());
        out.push_str(
            "<table><thead><tr><th>Name</th><th>Type</th><th>Distance</th><th>Gender</th>\
             <th>Room</th><th>Rent</th><th>Amenities</th></tr></thead><tbody>",
        );
        for record in records {
            record_row(&mut out, record);
        }
        out.push_str("</tbody></table>");
    }

    out.push_str("</body></html>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccommodationType, GenderPolicy};
    use crate::query::{normalize, RawParams};

    fn record(name: &str) -> AccommodationRecord {
        AccommodationRecord {
            id: 5,
            name: name.to_string(),
            accommodation_type: AccommodationType::Pg,
            distance: 0.8,
            gender: GenderPolicy::Any,
            room_type: "single".to_string(),
            rent: 8500.0,
            amenities: vec!["wifi".to_string(), "ac".to_string()],
        }
    }

    #[test]
    fn escapes_record_text() {
        let page = listing_page(
            &AmenityVocabulary::default(),
            &FilterRequest::default(),
            &[record("<script>alert(1)</script>")],
        );
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("800 m"));
        assert!(page.contains("8500/month"));
        assert!(page.contains("wifi, ac"));
    }

    #[test]
    fn echoes_current_filters() {
        let params = RawParams::from_urlencoded(b"rent=5k-10k&amenity=wifi&roomtype=single");
        let filter = normalize(&params).unwrap();
        let page = listing_page(&AmenityVocabulary::default(), &filter, &[]);

        assert!(page.contains(r#"<option value="5k-10k" selected>"#));
        assert!(page.contains(r#"value="wifi" checked"#));
        assert!(page.contains(r#"name="roomtype" placeholder="Room type" value="single""#));
        assert!(page.contains("No accommodation matches"));
    }

    fn page_for(query: &str) -> String {
        let filter = normalize(&RawParams::from_urlencoded(query.as_bytes())).unwrap();
        listing_page(&AmenityVocabulary::default(), &filter, &[])
    }

    #[test]
    fn echoes_normalized_distance() {
        for query in ["distance=1.0", "distance=1km", "distance=1000m", "max_distance=1"] {
            let page = page_for(query);
            assert!(page.contains(r#"<option value="1" selected>"#), "{query}");
            assert!(!page.contains(r#"<option value="all" selected>Any distance"#), "{query}");
        }

        assert!(page_for("distance=2+").contains(r#"<option value="2+" selected>"#));

        let custom = page_for("distance=1.5");
        assert!(custom.contains(r#"<option value="1.5" selected>Within 1.5 km</option>"#));
    }

    #[test]
    fn echoes_enum_filters_and_price_range() {
        let page = page_for("accommodation=PG&gender=Female&rent=20k-plus");
        assert!(page.contains(r#"<option value="pg" selected>"#));
        assert!(page.contains(r#"<option value="female" selected>"#));
        assert!(page.contains(r#"<option value="20k+" selected>"#));

        let range = page_for("min_price=300&max_price=600");
        assert!(range.contains(r#"<input type="hidden" name="min_price" value="300">"#));
        assert!(range.contains(r#"<input type="hidden" name="max_price" value="600">"#));
        assert!(range.contains(r#"<option value="all" selected>Any rent"#));
    }
}
