use crate::data::schema::*;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Raw attributes of one apartment, as entered by a user.
///
/// Missing JSON fields take the defaults of a typical three-bedroom listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingInput {
    pub area_sqm: f64,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub floor_number: i64,
    pub building_age_years: i64,
    pub district: String,
    pub compound_name: Option<String>,
    pub distance_to_auc_km: f64,
    pub distance_to_mall_km: f64,
    pub distance_to_metro_km: f64,
    pub finishing_type: String,
    pub has_balcony: bool,
    pub has_parking: bool,
    pub has_security: bool,
    pub has_amenities: bool,
    pub is_negotiable: bool,
    pub view_type: String,
    pub seller_type: String,
    pub days_on_market: i64,
}

impl Default for ListingInput {
    fn default() -> Self {
        Self {
            area_sqm: 150.0,
            bedrooms: 3,
            bathrooms: 2,
            floor_number: 3,
            building_age_years: 5,
            district: "Madinaty".to_string(),
            compound_name: Some("Madinaty B1".to_string()),
            distance_to_auc_km: 5.0,
            distance_to_mall_km: 3.0,
            distance_to_metro_km: 8.0,
            finishing_type: "Super Lux".to_string(),
            has_balcony: true,
            has_parking: true,
            has_security: true,
            has_amenities: true,
            is_negotiable: true,
            view_type: "Street".to_string(),
            seller_type: "Owner".to_string(),
            days_on_market: 60,
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl ListingInput {
    /// Parse a listing from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Single-row raw table with the dataset's column names and flag encoding
    pub fn to_frame(&self) -> Result<DataFrame> {
        let df = df!(
            AREA_SQM => [self.area_sqm],
            BEDROOMS => [self.bedrooms],
            BATHROOMS => [self.bathrooms],
            FLOOR_NUMBER => [self.floor_number],
            BUILDING_AGE_YEARS => [self.building_age_years],
            DISTRICT => [self.district.as_str()],
            COMPOUND_NAME => [self.compound_name.as_deref()],
            DISTANCE_TO_AUC_KM => [self.distance_to_auc_km],
            DISTANCE_TO_MALL_KM => [self.distance_to_mall_km],
            DISTANCE_TO_METRO_KM => [self.distance_to_metro_km],
            FINISHING_TYPE => [self.finishing_type.as_str()],
            HAS_BALCONY => [yes_no(self.has_balcony)],
            HAS_PARKING => [yes_no(self.has_parking)],
            HAS_SECURITY => [yes_no(self.has_security)],
            HAS_AMENITIES => [yes_no(self.has_amenities)],
            IS_NEGOTIABLE => [yes_no(self.is_negotiable)],
            VIEW_TYPE => [self.view_type.as_str()],
            SELLER_TYPE => [self.seller_type.as_str()],
            DAYS_ON_MARKET => [self.days_on_market],
        )?;
        Ok(df)
    }
}
