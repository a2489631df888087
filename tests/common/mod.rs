//! Shared fixtures for integration tests

#![allow(dead_code)]

use apartment_pricing::estimators::{EstimatorSpec, GradientBoostingConfig, RandomForestParams};
use apartment_pricing::training::CandidateSpec;
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const DISTRICTS: [&str; 4] = ["Madinaty", "Fifth Settlement", "Rehab City", "Katameya"];
pub const COMPOUNDS: [&str; 5] = ["Rehab 1", "Madinaty B2", "Hyde Park", "Palm Hills", "Mountain View"];
pub const FINISHING: [&str; 4] = ["Super Lux", "Lux", "Semi-finished", "Unfinished"];

/// Synthetic listings shaped like the Cairo dataset. Bedrooms cycle through
/// 2, 3, 1, 3, 2, 4 so a third of the rows fall outside the trained range.
pub fn listings(n_rows: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let bedroom_cycle = [2i64, 3, 1, 3, 2, 4];

    let mut ids = Vec::with_capacity(n_rows);
    let mut dates = Vec::with_capacity(n_rows);
    let mut area = Vec::with_capacity(n_rows);
    let mut bedrooms = Vec::with_capacity(n_rows);
    let mut bathrooms = Vec::with_capacity(n_rows);
    let mut floor = Vec::with_capacity(n_rows);
    let mut age = Vec::with_capacity(n_rows);
    let mut district = Vec::with_capacity(n_rows);
    let mut compound: Vec<Option<&str>> = Vec::with_capacity(n_rows);
    let mut auc = Vec::with_capacity(n_rows);
    let mut mall = Vec::with_capacity(n_rows);
    let mut metro = Vec::with_capacity(n_rows);
    let mut finishing = Vec::with_capacity(n_rows);
    let mut balcony = Vec::with_capacity(n_rows);
    let mut parking = Vec::with_capacity(n_rows);
    let mut security = Vec::with_capacity(n_rows);
    let mut amenities = Vec::with_capacity(n_rows);
    let mut negotiable = Vec::with_capacity(n_rows);
    let mut view = Vec::with_capacity(n_rows);
    let mut seller = Vec::with_capacity(n_rows);
    let mut days = Vec::with_capacity(n_rows);
    let mut price = Vec::with_capacity(n_rows);

    for i in 0..n_rows {
        let d = i % DISTRICTS.len();
        let f = rng.gen_range(0..FINISHING.len());
        let a: f64 = rng.gen_range(60.0..300.0);
        let years: i64 = rng.gen_range(0..30);
        let dist_auc: f64 = rng.gen_range(1.0..20.0);

        ids.push(format!("L{:05}", i));
        dates.push("2024-05-01");
        area.push(a);
        bedrooms.push(bedroom_cycle[i % bedroom_cycle.len()]);
        bathrooms.push(rng.gen_range(1i64..4));
        floor.push(rng.gen_range(1i64..20));
        age.push(years);
        district.push(DISTRICTS[d]);
        compound.push(if i % 7 == 0 { None } else { Some(COMPOUNDS[i % COMPOUNDS.len()]) });
        auc.push(dist_auc);
        mall.push(rng.gen_range(0.5..10.0));
        metro.push(rng.gen_range(0.5..15.0));
        finishing.push(FINISHING[f]);
        balcony.push(if rng.gen_bool(0.5) { "yes" } else { "no" });
        parking.push(if rng.gen_bool(0.5) { "Yes" } else { "No" });
        security.push(if rng.gen_bool(0.5) { "1" } else { "0" });
        amenities.push(if rng.gen_bool(0.5) { "yes" } else { "no" });
        negotiable.push(if rng.gen_bool(0.5) { "yes" } else { "no" });
        view.push(["Street", "Garden", "Nile"][i % 3]);
        seller.push(["Owner", "Broker"][i % 2]);
        days.push(rng.gen_range(1i64..300));

        let finishing_level = (FINISHING.len() - 1 - f) as f64;
        let noise: f64 = rng.gen_range(-50_000.0..50_000.0);
        price.push(
            a * 25_000.0 + d as f64 * 400_000.0 + finishing_level * 150_000.0
                - years as f64 * 10_000.0
                - dist_auc * 20_000.0
                + noise,
        );
    }

    df!(
        "listing_id" => ids,
        "listing_date" => dates,
        "area_sqm" => area,
        "bedrooms" => bedrooms,
        "bathrooms" => bathrooms,
        "floor_number" => floor,
        "building_age_years" => age,
        "district" => district,
        "compound_name" => compound,
        "distance_to_auc_km" => auc,
        "distance_to_mall_km" => mall,
        "distance_to_metro_km" => metro,
        "finishing_type" => finishing,
        "has_balcony" => balcony,
        "has_parking" => parking,
        "has_security" => security,
        "has_amenities" => amenities,
        "is_negotiable" => negotiable,
        "view_type" => view,
        "seller_type" => seller,
        "days_on_market" => days,
        "price_egp" => price,
    )
    .unwrap()
}

/// The three default candidate families, shrunk so tests stay fast
pub fn small_candidates() -> Vec<CandidateSpec> {
    vec![
        CandidateSpec::new("LinearRegression", EstimatorSpec::LinearRegression),
        CandidateSpec::new(
            "RandomForest",
            EstimatorSpec::RandomForest(RandomForestParams {
                n_estimators: 15,
                max_depth: Some(8),
                random_state: Some(42),
                ..Default::default()
            }),
        ),
        CandidateSpec::new(
            "GradientBoosting",
            EstimatorSpec::GradientBoosting(GradientBoostingConfig {
                n_estimators: 40,
                learning_rate: 0.1,
                max_depth: 3,
                random_state: Some(42),
                ..Default::default()
            }),
        ),
    ]
}

/// Write a frame to CSV
pub fn write_csv(df: &DataFrame, path: &std::path::Path) {
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df.clone()).unwrap();
}
