use super::*;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The live site serves EUC-JP, so the mock must too; a UTF-8 body would be
/// mis-decoded by the shop's encoding preference list.
fn euc_jp_body(body: &str) -> ResponseTemplate {
    let (encoded, _, _) = EUC_JP.encode(body);
    ResponseTemplate::new(200).set_body_raw(encoded.into_owned(), "text/html")
}

const ORIGIN: &str = "https://beer-chouseiya.shop";

fn item(slug: &str, name: &str, price: &str, quantity: &str) -> String {
    format!(
        r#"<div class="innerBox">
             <div class="imgWrap"><a href="/shopdetail/{slug}"><img src="/img/{slug}.jpg"></a></div>
             <div class="detail">
               <p class="name">{name}</p>
               <p class="price">{price}</p>
               <p class="quantity">{quantity}</p>
             </div>
           </div>"#
    )
}

#[test]
fn parses_listing_items() {
    let body = format!(
        "<html><body>{}{}</body></html>",
        item("000001", "うちゅうブルーイング DO IT", "968円(税込)", "残り12個"),
        item("000002", "ヨロッコビール Session Ale", "825円(税込)", "売り切れ"),
    );
    let products = parse_list_page(ORIGIN, &body).unwrap();
    assert_eq!(products.len(), 2);

    assert_eq!(
        products[0].product_url,
        "https://beer-chouseiya.shop/shopdetail/000001"
    );
    assert_eq!(
        products[0].image_url.as_deref(),
        Some("https://beer-chouseiya.shop/img/000001.jpg")
    );
    assert_eq!(products[0].name, "うちゅうブルーイング DO IT");
    assert_eq!(products[0].stock_status, StockStatus::InStock);
    assert_eq!(products[0].shop, Shop::Chouseiya);

    assert_eq!(products[1].stock_status, StockStatus::SoldOut);
}

#[test]
fn zero_quantity_counts_as_sold_out() {
    let body = item("000003", "Far Yeast 東京ホワイト", "550円", "残り0個");
    let products = parse_list_page(ORIGIN, &body).unwrap();
    assert_eq!(products[0].stock_status, StockStatus::SoldOut);
}

#[test]
fn missing_quantity_defaults_to_in_stock() {
    let body = r#"<div class="innerBox">
        <div class="imgWrap"><a href="/shopdetail/000004"><img src="/i.jpg"></a></div>
        <div class="detail"><p class="name">Minoh Beer Stout</p></div>
      </div>"#;
    let products = parse_list_page(ORIGIN, body).unwrap();
    assert_eq!(products[0].stock_status, StockStatus::InStock);
    assert!(products[0].price_text.is_none());
}

#[test]
fn skips_items_without_a_link() {
    let body = r#"<div class="innerBox"><div class="imgWrap"><img src="/i.jpg"></div></div>"#;
    let products = parse_list_page(ORIGIN, body).unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn pagination_stops_on_not_found() {
    let server = MockServer::start().await;
    let page1 = format!(
        "<html><body>{}</body></html>",
        item("000001", "こまいぬブルワリー 柴犬IPA", "748円", "残り3個")
    );

    Mock::given(method("GET"))
        .and(path("/shopbrand/all_items/page1/order/"))
        .respond_with(euc_jp_body(&page1))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shopbrand/all_items/page2/order/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(5, "test-agent").unwrap();
    let opts = ScrapeOptions {
        sold_out_threshold: 30,
        ..ScrapeOptions::default()
    };
    let products = scrape_from(&server.uri(), &fetcher, &opts).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "こまいぬブルワリー 柴犬IPA");
}

#[tokio::test]
async fn sold_out_streak_stops_pagination() {
    let server = MockServer::start().await;
    let body: String = (1..=10)
        .map(|i| item(&format!("{i:06}"), "Vintage Barleywine", "1980円", "売り切れ"))
        .collect();

    Mock::given(method("GET"))
        .respond_with(euc_jp_body(&format!("<html>{body}</html>")))
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(5, "test-agent").unwrap();
    let opts = ScrapeOptions {
        sold_out_threshold: 5,
        ..ScrapeOptions::default()
    };
    let products = scrape_from(&server.uri(), &fetcher, &opts).await.unwrap();
    // Stops mid-page at the fifth consecutive sold-out item.
    assert_eq!(products.len(), 5);
}
