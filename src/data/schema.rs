//! Column names of the listing dataset

pub const LISTING_ID: &str = "listing_id";
pub const LISTING_DATE: &str = "listing_date";

pub const AREA_SQM: &str = "area_sqm";
pub const BEDROOMS: &str = "bedrooms";
pub const BATHROOMS: &str = "bathrooms";
pub const FLOOR_NUMBER: &str = "floor_number";
pub const BUILDING_AGE_YEARS: &str = "building_age_years";
pub const DISTANCE_TO_AUC_KM: &str = "distance_to_auc_km";
pub const DISTANCE_TO_MALL_KM: &str = "distance_to_mall_km";
pub const DISTANCE_TO_METRO_KM: &str = "distance_to_metro_km";
pub const DAYS_ON_MARKET: &str = "days_on_market";

pub const DISTRICT: &str = "district";
pub const COMPOUND_NAME: &str = "compound_name";
pub const FINISHING_TYPE: &str = "finishing_type";
pub const VIEW_TYPE: &str = "view_type";
pub const SELLER_TYPE: &str = "seller_type";

pub const HAS_BALCONY: &str = "has_balcony";
pub const HAS_PARKING: &str = "has_parking";
pub const HAS_SECURITY: &str = "has_security";
pub const HAS_AMENITIES: &str = "has_amenities";
pub const IS_NEGOTIABLE: &str = "is_negotiable";

/// Sale price, the regression target
pub const PRICE_EGP: &str = "price_egp";

// Engineered columns
pub const FINISHING_TYPE_ENCODED: &str = "finishing_type_encoded";
pub const PRICE_PER_SQM: &str = "price_per_sqm";
pub const PROXIMITY_SCORE: &str = "proximity_score";
pub const DISTRICT_AVG_PRICE: &str = "district_avg_price";
pub const COMPOUND_QUALITY_SCORE: &str = "compound_quality_score";

/// Identifier and date columns that are never modeled
pub const IDENTIFIER_COLUMNS: [&str; 2] = [LISTING_ID, LISTING_DATE];

/// Yes/no flag columns
pub const FLAG_COLUMNS: [&str; 5] = [
    HAS_BALCONY,
    HAS_PARKING,
    HAS_SECURITY,
    HAS_AMENITIES,
    IS_NEGOTIABLE,
];

/// Distances summed into the proximity score
pub const DISTANCE_COLUMNS: [&str; 3] = [
    DISTANCE_TO_AUC_KM,
    DISTANCE_TO_MALL_KM,
    DISTANCE_TO_METRO_KM,
];

/// Bedroom counts the models are trained on
pub const SUPPORTED_BEDROOMS: [i64; 2] = [2, 3];

/// Sentinel for listings without a compound
pub const UNKNOWN_COMPOUND: &str = "Unknown";
