use super::*;

use chrono::TimeZone;
use hopdb_core::{RawProduct, Shop, StockStatus};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn raw(url: &str, name: &str, status: StockStatus, shop: Shop) -> RawProduct {
    RawProduct {
        name: name.to_string(),
        price_text: Some("¥1,200".to_string()),
        image_url: None,
        product_url: url.to_string(),
        stock_status: status,
        shop,
    }
}

fn prior(url: &str, status: &str, first_seen: DateTime<Utc>) -> (String, KnownProduct) {
    (
        url.to_string(),
        KnownProduct {
            product_url: url.to_string(),
            first_seen,
            stock_status: status.to_string(),
            external_beer_ref: None,
        },
    )
}

#[test]
fn new_items_get_monotonic_first_seen_oldest_first() {
    let known = HashMap::new();
    // Listing order is newest first; the merge reverses it so "c" (oldest)
    // gets the earliest stamp.
    let per_shop = vec![vec![
        raw("https://s/a", "a", StockStatus::InStock, Shop::BeerVolta),
        raw("https://s/b", "b", StockStatus::InStock, Shop::BeerVolta),
        raw("https://s/c", "c", StockStatus::InStock, Shop::BeerVolta),
    ]];

    let outcome = merge_sightings(&known, per_shop, base(), false, false);

    assert_eq!(outcome.new_items, 3);
    let by_url: HashMap<&str, &ProductUpsert> = outcome
        .upserts
        .iter()
        .map(|u| (u.product_url.as_str(), u))
        .collect();
    let a = by_url["https://s/a"].first_seen;
    let b = by_url["https://s/b"].first_seen;
    let c = by_url["https://s/c"].first_seen;
    assert!(c < b && b < a);
    assert_eq!(c, base());
}

#[test]
fn timestamps_keep_increasing_across_shops() {
    let known = HashMap::new();
    let per_shop = vec![
        vec![raw("https://s1/a", "a", StockStatus::InStock, Shop::BeerVolta)],
        vec![raw("https://s2/b", "b", StockStatus::InStock, Shop::Chouseiya)],
    ];

    let outcome = merge_sightings(&known, per_shop, base(), false, false);

    assert_eq!(outcome.upserts[0].first_seen, base());
    assert_eq!(
        outcome.upserts[1].first_seen,
        base() + Duration::microseconds(1)
    );
}

#[test]
fn restock_resets_first_seen_and_plain_resighting_preserves_it() {
    let old = base() - Duration::days(30);
    let known: HashMap<String, KnownProduct> = [
        prior("https://s/restocked", "Sold Out", old),
        prior("https://s/steady", "In Stock", old),
    ]
    .into_iter()
    .collect();
    let per_shop = vec![vec![
        raw("https://s/restocked", "r", StockStatus::InStock, Shop::Arome),
        raw("https://s/steady", "s", StockStatus::InStock, Shop::Arome),
    ]];

    let outcome = merge_sightings(&known, per_shop, base(), false, false);

    assert_eq!(outcome.restocks, 1);
    assert_eq!(outcome.new_items, 0);
    let by_url: HashMap<&str, &ProductUpsert> = outcome
        .upserts
        .iter()
        .map(|u| (u.product_url.as_str(), u))
        .collect();
    assert_eq!(by_url["https://s/steady"].first_seen, old);
    assert!(by_url["https://s/restocked"].first_seen >= base());
    // A re-sighting still bumps last_seen to this run.
    assert!(by_url["https://s/steady"].last_seen >= base());
}

#[test]
fn sold_out_sighting_of_sold_out_product_is_not_a_restock() {
    let old = base() - Duration::days(7);
    let known: HashMap<String, KnownProduct> =
        [prior("https://s/p", "Sold Out", old)].into_iter().collect();
    let per_shop = vec![vec![raw(
        "https://s/p",
        "p",
        StockStatus::SoldOut,
        Shop::Chouseiya,
    )]];

    let outcome = merge_sightings(&known, per_shop, base(), false, false);

    assert_eq!(outcome.restocks, 0);
    assert_eq!(outcome.upserts[0].first_seen, old);
}

#[test]
fn new_only_skips_known_products_but_keeps_restocks() {
    let old = base() - Duration::days(7);
    let known: HashMap<String, KnownProduct> = [
        prior("https://s/known", "In Stock", old),
        prior("https://s/back", "Sold Out", old),
    ]
    .into_iter()
    .collect();
    let per_shop = vec![vec![
        raw("https://s/known", "k", StockStatus::InStock, Shop::BeerVolta),
        raw("https://s/back", "b", StockStatus::InStock, Shop::BeerVolta),
        raw("https://s/fresh", "f", StockStatus::InStock, Shop::BeerVolta),
    ]];

    let outcome = merge_sightings(&known, per_shop, base(), true, false);

    let urls: Vec<&str> = outcome
        .upserts
        .iter()
        .map(|u| u.product_url.as_str())
        .collect();
    assert!(urls.contains(&"https://s/fresh"));
    assert!(urls.contains(&"https://s/back"));
    assert!(!urls.contains(&"https://s/known"));
    assert_eq!(outcome.new_items, 1);
    assert_eq!(outcome.restocks, 1);
}

#[test]
fn reset_first_seen_restamps_every_known_product() {
    let old = base() - Duration::days(90);
    let known: HashMap<String, KnownProduct> =
        [prior("https://s/p", "In Stock", old)].into_iter().collect();
    let per_shop = vec![vec![raw(
        "https://s/p",
        "p",
        StockStatus::InStock,
        Shop::IchigoIchie,
    )]];

    let outcome = merge_sightings(&known, per_shop, base(), false, true);

    assert_eq!(outcome.upserts[0].first_seen, base());
    assert_eq!(outcome.upserts[0].last_seen, base());
}

#[test]
fn price_numeric_is_derived_from_price_text() {
    let outcome = merge_sightings(
        &HashMap::new(),
        vec![vec![raw(
            "https://s/p",
            "p",
            StockStatus::InStock,
            Shop::BeerVolta,
        )]],
        base(),
        false,
        false,
    );

    assert_eq!(outcome.upserts[0].price_numeric, Some(1200));
}
