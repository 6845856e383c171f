use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hopdb_core::EnrichmentRules;

use super::{BeerQuery, SearchOutcome, UntappdClient};

fn results_page(items: &[(&str, &str)]) -> String {
    let mut body = String::from("<html><body>");
    for (href, brewery) in items {
        body.push_str(&format!(
            r#"<div class="beer-item">
                 <p class="name"><a href="{href}">Some Beer</a></p>
                 <p class="brewery">{brewery}</p>
               </div>"#
        ));
    }
    body.push_str("</body></html>");
    body
}

fn client_for(server: &MockServer) -> UntappdClient {
    UntappdClient::with_base_url(server.uri()).expect("client should build")
}

async fn mount_empty_catch_all(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_query_match_with_validated_brewery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "UGUISU Inkhorn Brewing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[(
            "/b/inkhorn-brewing-uguisu/6441649",
            "Inkhorn Brewing",
        )])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rules = EnrichmentRules::default();
    let outcome = client
        .find_beer(
            &rules,
            &BeerQuery {
                beer_latin: Some("UGUISU"),
                brewery: Some("Inkhorn Brewing"),
                ..BeerQuery::default()
            },
        )
        .await;

    assert_eq!(
        outcome,
        SearchOutcome::Match(format!("{}/b/inkhorn-brewing-uguisu/6441649", server.uri()))
    );
}

#[tokio::test]
async fn mismatched_brewery_is_rejected_and_cascade_ends_in_placeholder() {
    let server = MockServer::start().await;
    // Every attempt returns the same wrong-brewery hit.
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[(
            "/b/other-brewing-uguisu/999",
            "Other Brewing",
        )])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rules = EnrichmentRules::default();
    let outcome = client
        .find_beer(
            &rules,
            &BeerQuery {
                beer_latin: Some("UGUISU"),
                brewery: Some("Inkhorn Brewing"),
                ..BeerQuery::default()
            },
        )
        .await;

    match outcome {
        SearchOutcome::Placeholder(url) => {
            assert!(url.contains("/search?q="), "placeholder keeps the query URL: {url}");
        }
        SearchOutcome::Match(url) => panic!("wrong brewery must not match: {url}"),
    }
}

#[tokio::test]
async fn suffix_stripped_retry_finds_the_beer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Sunrise Uchu Brewing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[(
            "/b/uchu-brewing-sunrise/12345",
            "Uchu Brewing",
        )])))
        .mount(&server)
        .await;
    mount_empty_catch_all(&server).await;

    let client = client_for(&server);
    let rules = EnrichmentRules::default();
    let outcome = client
        .find_beer(
            &rules,
            &BeerQuery {
                beer_latin: Some("Sunrise Double IPA"),
                brewery: Some("Uchu Brewing"),
                ..BeerQuery::default()
            },
        )
        .await;

    assert_eq!(
        outcome,
        SearchOutcome::Match(format!("{}/b/uchu-brewing-sunrise/12345", server.uri()))
    );
}

#[tokio::test]
async fn brewery_scoped_listing_is_tried_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/uchu-brewing/4321/beer"))
        .and(query_param("name", "Sunrise"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[(
            "/b/uchu-brewing-sunrise/12345",
            "Uchu Brewing",
        )])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rules = EnrichmentRules::default();
    let hint = format!("{}/w/uchu-brewing/4321", server.uri());
    let outcome = client
        .find_beer(
            &rules,
            &BeerQuery {
                beer_latin: Some("Sunrise"),
                brewery: Some("Uchu Brewing"),
                brewery_page_hint: Some(&hint),
                ..BeerQuery::default()
            },
        )
        .await;

    assert_eq!(
        outcome,
        SearchOutcome::Match(format!("{}/b/uchu-brewing-sunrise/12345", server.uri()))
    );
    // The scoped listing answered, so the general search endpoint was never hit.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.path().starts_with("/search")));
}

#[tokio::test]
async fn alias_validates_a_renamed_brewery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[(
            "/b/wakasaimo-oni-densetsu/777",
            "Wakasaimo Honpo",
        )])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rules = EnrichmentRules::default();
    let aliases = vec!["Wakasaimo".to_string()];
    let outcome = client
        .find_beer(
            &rules,
            &BeerQuery {
                beer_latin: Some("Oni Densetsu Pilsner"),
                brewery: Some("鬼伝説"),
                brewery_aliases: &aliases,
                ..BeerQuery::default()
            },
        )
        .await;

    assert!(matches!(outcome, SearchOutcome::Match(_)));
}

#[tokio::test]
async fn cleaned_native_name_is_searched_before_the_raw_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "ゆずエール"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[(
            "/b/some-brewing-yuzu-ale/888",
            "Some Brewing",
        )])))
        .mount(&server)
        .await;
    mount_empty_catch_all(&server).await;

    let client = client_for(&server);
    let rules = EnrichmentRules::default();
    let outcome = client
        .find_beer(
            &rules,
            &BeerQuery {
                beer_native: Some("ゆずエール〜冬季限定〜"),
                ..BeerQuery::default()
            },
        )
        .await;

    assert_eq!(
        outcome,
        SearchOutcome::Match(format!("{}/b/some-brewing-yuzu-ale/888", server.uri()))
    );
}

#[tokio::test]
async fn only_top_results_are_considered() {
    let server = MockServer::start().await;
    // The only validating hit sits in fourth position.
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[
            ("/b/a/1", "Wrong One"),
            ("/b/b/2", "Wrong Two"),
            ("/b/c/3", "Wrong Three"),
            ("/b/d/4", "Inkhorn Brewing"),
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rules = EnrichmentRules::default();
    let outcome = client
        .find_beer(
            &rules,
            &BeerQuery {
                beer_latin: Some("UGUISU"),
                brewery: Some("Inkhorn Brewing"),
                ..BeerQuery::default()
            },
        )
        .await;

    assert!(matches!(outcome, SearchOutcome::Placeholder(_)));
}

#[tokio::test]
async fn placeholder_url_uses_the_cleaned_primary_query() {
    let server = MockServer::start().await;
    mount_empty_catch_all(&server).await;

    let client = client_for(&server);
    let rules = EnrichmentRules::default();
    let outcome = client
        .find_beer(
            &rules,
            &BeerQuery {
                beer_latin: Some("Hazy Dream #12"),
                ..BeerQuery::default()
            },
        )
        .await;

    assert_eq!(
        outcome,
        SearchOutcome::Placeholder(format!("{}/search?q=Hazy%20Dream", server.uri()))
    );
}

#[tokio::test]
async fn search_fetch_error_falls_through_to_the_next_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "UGUISU Inkhorn Brewing"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "UGUISU"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[(
            "/b/inkhorn-brewing-uguisu/6441649",
            "Inkhorn Brewing",
        )])))
        .mount(&server)
        .await;
    mount_empty_catch_all(&server).await;

    let client = client_for(&server);
    let rules = EnrichmentRules::default();
    let outcome = client
        .find_beer(
            &rules,
            &BeerQuery {
                beer_latin: Some("UGUISU"),
                brewery: Some("Inkhorn Brewing"),
                ..BeerQuery::default()
            },
        )
        .await;

    assert!(matches!(outcome, SearchOutcome::Match(_)));
}

#[tokio::test]
async fn fetch_beer_surfaces_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/gone-brewing-gone/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let url = format!("{}/b/gone-brewing-gone/1", server.uri());
    let err = client.fetch_beer(&url).await.unwrap_err();
    assert!(matches!(
        err,
        super::UntappdError::UnexpectedStatus { status: 404, .. }
    ));
}
