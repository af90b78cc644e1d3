// tests/provider_rss.rs
use semicon_news_digest::source::rss::RssSource;
use semicon_news_digest::source::NewsSource;

const YONHAP: &str = include_str!("fixtures/yonhap_rss.xml");
const DUP_GUID: &str = include_str!("fixtures/dup_guid_rss.xml");

#[tokio::test]
async fn fixture_parses_into_normalized_articles() {
    let source = RssSource::from_fixture("Yonhap News", YONHAP);
    let articles = source.fetch("semiconductor", 10).await.unwrap();

    assert_eq!(articles.len(), 5);
    let first = &articles[0];
    // markup in the title is stripped, entities decoded
    assert_eq!(
        first.title,
        "Samsung breaks ground on new foundry line in Pyeongtaek"
    );
    assert_eq!(first.source, "Yonhap News");
    assert_eq!(first.topic, "semiconductor");
    assert_eq!(first.url, "https://www.yna.co.kr/view/AKR20260806001");
    // +0900 pubDate lands in UTC
    assert_eq!(first.published_at.to_rfc3339(), "2026-08-06T13:10:00+00:00");
    assert!(!first.excerpt.is_empty());
}

#[tokio::test]
async fn ids_are_stable_across_fetches() {
    let source = RssSource::from_fixture("Yonhap News", YONHAP);
    let a = source.fetch("semiconductor", 10).await.unwrap();
    let b = source.fetch("semiconductor", 10).await.unwrap();
    let ids_a: Vec<&str> = a.iter().map(|x| x.id.as_str()).collect();
    let ids_b: Vec<&str> = b.iter().map(|x| x.id.as_str()).collect();
    assert_eq!(ids_a, ids_b);
    assert!(ids_a.iter().all(|id| id.len() == 16));
}

#[tokio::test]
async fn one_fetch_never_yields_a_duplicate_id() {
    // the fixture syndicates story-100 twice under different URLs
    let source = RssSource::from_fixture("Wire", DUP_GUID);
    let articles = source.fetch("semiconductor", 10).await.unwrap();
    assert_eq!(articles.len(), 2);
    assert_ne!(articles[0].id, articles[1].id);
    assert_eq!(articles[0].title, "Foundry utilization climbs past 90%");
}

#[tokio::test]
async fn max_items_truncates_the_feed() {
    let source = RssSource::from_fixture("Yonhap News", YONHAP);
    let articles = source.fetch("semiconductor", 2).await.unwrap();
    assert_eq!(articles.len(), 2);
}

#[tokio::test]
async fn garbage_xml_is_a_parse_error() {
    let source = RssSource::from_fixture("Broken", "this is not xml");
    let err = source.fetch("semiconductor", 10).await.unwrap_err();
    assert!(matches!(
        err,
        semicon_news_digest::DigestError::Parse(_)
    ));
}
