mod helpers;

use std::fs;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use harvest::fetcher::{Fetcher, FetcherConfig};
use harvest::handoff;
use harvest::pipeline::{Pipeline, PipelineRunner, Stage};

use helpers::{ESSAY, ListingProvider, MemoryStoreProvider, scratch_dir, test_config};

async fn essay_site(essays: &[&str], missing: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    for at in essays {
        Mock::given(method("GET"))
            .and(path(*at))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(ESSAY)
                    .insert_header("Content-Type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;
    }
    for at in missing {
        Mock::given(method("GET"))
            .and(path(*at))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
    }
    server
}

fn pipeline(
    server: &MockServer,
    stores: Arc<MemoryStoreProvider>,
    browsers: Arc<ListingProvider>,
) -> Pipeline {
    let config = test_config(&server.uri(), &scratch_dir());
    let fetcher = Fetcher::with_client(
        reqwest::Client::new(),
        FetcherConfig {
            max_attempts: 1,
            base_delay: Duration::from_millis(10),
            session_timeout: Duration::from_secs(5),
        },
    );
    Pipeline::new(config, stores, browsers, fetcher)
}

#[tokio::test]
async fn test_first_run_walks_everything_and_loads_articles() {
    let server = essay_site(&["/essays/a", "/essays/b"], &["/essays/c"]).await;
    let stores = Arc::new(MemoryStoreProvider::default());
    let browsers = Arc::new(ListingProvider::new(&[
        &["/essays/a", "/essays/b", "/about"],
        &["/essays/a", "/essays/b", "/about", "/essays/c"],
    ]));

    let pipeline = pipeline(&server, stores.clone(), browsers.clone());
    let report = pipeline.run_once().await;

    assert!(report.succeeded());
    assert_eq!(report.links, Some(3));
    assert_eq!(report.records, Some(3));

    let load = report.load.unwrap();
    assert_eq!(load.total, 2);
    assert_eq!(load.removed, 1);
    assert_eq!(load.successful, 2);

    let mut urls = stores.state.urls();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{}/essays/a", server.uri()),
            format!("{}/essays/b", server.uri()),
        ]
    );

    // Bulk walks never ask the store about individual links
    assert!(stores.state.lookups().is_empty());
    assert_eq!(stores.state.opened(), 2);
    assert_eq!(stores.state.closed(), 2);
    assert_eq!(browsers.launches(), 1);

    let links = handoff::read_links(&pipeline.config().links_file).unwrap();
    assert_eq!(links, vec!["/essays/a", "/essays/b", "/essays/c"]);
}

#[tokio::test]
async fn test_incremental_run_stops_at_first_known_link() {
    let server = essay_site(&["/essays/new"], &[]).await;
    let stores = Arc::new(MemoryStoreProvider::default());
    stores.state.seed(&format!("{}/essays/known", server.uri()));
    let browsers = Arc::new(ListingProvider::new(&[&[
        "/essays/new",
        "/essays/known",
        "/essays/older",
    ]]));

    let report = pipeline(&server, stores.clone(), browsers)
        .run_once()
        .await;

    assert!(report.succeeded());
    assert_eq!(report.links, Some(1));
    assert_eq!(
        stores.state.lookups(),
        vec![
            format!("{}/essays/new", server.uri()),
            format!("{}/essays/known", server.uri()),
        ]
    );
    assert_eq!(stores.state.urls().len(), 2);
}

#[tokio::test]
async fn test_rerun_adds_nothing() {
    let server = essay_site(&["/essays/a"], &[]).await;
    let stores = Arc::new(MemoryStoreProvider::default());
    let browsers = Arc::new(ListingProvider::new(&[&["/essays/a"]]));
    let pipeline = pipeline(&server, stores.clone(), browsers);

    assert!(pipeline.run_once().await.succeeded());
    assert_eq!(stores.state.urls().len(), 1);

    let second = pipeline.run_once().await;
    assert!(second.succeeded());
    assert_eq!(second.links, Some(0));
    assert_eq!(stores.state.urls().len(), 1);
}

#[tokio::test]
async fn test_unreachable_store_aborts_remaining_stages() {
    let server = essay_site(&[], &[]).await;
    let stores = Arc::new(MemoryStoreProvider {
        unreachable: true,
        ..MemoryStoreProvider::default()
    });
    let browsers = Arc::new(ListingProvider::new(&[&["/essays/a"]]));

    let pipeline = pipeline(&server, stores, browsers.clone());
    let report = pipeline.run_once().await;

    assert_eq!(report.failed_stage, Some(Stage::Discover));
    assert!(report.records.is_none());
    assert!(report.load.is_none());
    assert_eq!(browsers.launches(), 0);
    assert!(!pipeline.config().articles_file.exists());
}

#[tokio::test]
async fn test_load_stage_filters_placeholder_content() {
    let server = essay_site(&[], &[]).await;
    let stores = Arc::new(MemoryStoreProvider::default());
    let browsers = Arc::new(ListingProvider::new(&[]));
    let pipeline = pipeline(&server, stores.clone(), browsers);

    fs::write(
        &pipeline.config().articles_file,
        "url,title,content,tags,date,image,headline\n\
         https://aeon.co/essays/a,A,Body,\"Mind, Ethics\",12 March 2024,/a.jpg,Sub\n\
         https://aeon.co/essays/b,Error,Content not found,,Date not found,,Headline not found\n\
         https://aeon.co/essays/c,C,More body,,2024-03-13,/c.jpg,Headline not found\n",
    )
    .unwrap();

    let summary = pipeline.load_articles().await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.successful, 2);
    assert_eq!(
        stores.state.urls(),
        vec!["https://aeon.co/essays/a", "https://aeon.co/essays/c"]
    );
}

#[tokio::test]
async fn test_extract_stage_requires_link_file() {
    let server = essay_site(&[], &[]).await;
    let pipeline = pipeline(
        &server,
        Arc::new(MemoryStoreProvider::default()),
        Arc::new(ListingProvider::new(&[])),
    );

    assert!(pipeline.extract_articles().await.is_err());
}
