use serde::{Deserialize, Serialize};

// ==================== LISTING (upstream, read-only) ====================
// Field names follow the RESO shapes the feed serves; listings are fetched on
// demand and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "ListingKey")]
    pub listing_key: String,
    #[serde(rename = "StandardStatus")]
    pub standard_status: Option<StandardStatus>,
    #[serde(rename = "PropertyType")]
    pub property_type: Option<String>,
    #[serde(rename = "ListPrice")]
    pub list_price: Option<f64>,
    #[serde(rename = "StreetNumber")]
    pub street_number: Option<String>,
    #[serde(rename = "StreetName")]
    pub street_name: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "StateOrProvince")]
    pub state_or_province: Option<String>,
    #[serde(rename = "PostalCode")]
    pub postal_code: Option<String>,
    #[serde(rename = "BedroomsTotal")]
    pub bedrooms_total: Option<i32>,
    #[serde(rename = "BathroomsTotalInteger")]
    pub bathrooms_total_integer: Option<i32>,
    #[serde(rename = "LivingArea")]
    pub living_area: Option<f64>,
    #[serde(rename = "Media")]
    pub media: Option<Vec<MediaItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "MediaURL")]
    pub media_url: String,
    #[serde(rename = "Order")]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandardStatus {
    Active,
    Pending,
    Sold,
    ComingSoon,
    // The feed occasionally serves statuses outside the marketed set.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_deserializes_from_feed_payload() {
        let payload = json!({
            "ListingKey": "MDBC2012345",
            "StandardStatus": "Active",
            "PropertyType": "Residential",
            "ListPrice": 425000.0,
            "City": "Baltimore",
            "BedroomsTotal": 4,
            "BathroomsTotalInteger": 2,
            "LivingArea": 2150.0,
            "Media": [
                {"MediaURL": "https://cdn.example/1.jpg", "Order": 1},
                {"MediaURL": "https://cdn.example/0.jpg", "Order": 0}
            ],
            "ListOfficeName": "ignored extra field"
        });

        let listing: Listing = serde_json::from_value(payload).unwrap();
        assert_eq!(listing.listing_key, "MDBC2012345");
        assert_eq!(listing.standard_status, Some(StandardStatus::Active));
        assert_eq!(listing.list_price, Some(425_000.0));
        assert_eq!(listing.media.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn unrecognized_status_maps_to_unknown() {
        let listing: Listing = serde_json::from_value(json!({
            "ListingKey": "X1",
            "StandardStatus": "Expired"
        }))
        .unwrap();
        assert_eq!(listing.standard_status, Some(StandardStatus::Unknown));
    }
}
