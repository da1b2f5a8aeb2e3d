//! End-to-end crawl scenarios against the in-memory browser

use crate::support::{params, url, FakeConverter, FakeLauncher, FakeOracle, FakePage, FakeSite, Harness, SITE};
use job_scout::browser::LinkCandidate;
use job_scout::crawler::{collect_postings, scrape_website, scrape_websites, CrawlReport, PageOutcome};
use job_scout::{ErrorKind, ScoutError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn crawl(harness: &Harness) -> CrawlReport {
    harness
        .orchestrator
        .run(&params(), &CancellationToken::new())
        .await
        .expect("crawl should start")
}

fn titles(report: &CrawlReport) -> Vec<String> {
    report.postings.iter().map(|p| p.title.clone()).collect()
}

#[tokio::test]
async fn test_dead_end_start_page() {
    let site = FakeSite::new().page(SITE, FakePage::new().link("About us", &url("/about")));
    let harness = Harness::new(site, FakeOracle::default(), FakeConverter::new());

    let report = crawl(&harness).await;

    assert!(report.postings.is_empty());
    assert_eq!(harness.site.navigations(), vec![SITE.to_string()]);
    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].outcome, PageOutcome::DeadEnd);
    assert_eq!(harness.oracle.classified(), vec![url("/about")]);
    assert!(harness.converter.calls().is_empty());
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_single_job_page_with_apply_link() {
    let site = FakeSite::new().page(
        SITE,
        FakePage::new().link("Apply now", "https://ats.other.com/apply/1"),
    );
    let converter =
        FakeConverter::new().text(SITE, "Senior Engineer\nPOSTING: Senior Engineer\nBerlin\n");
    let harness = Harness::new(site, FakeOracle::default(), converter);

    let report = crawl(&harness).await;

    assert_eq!(titles(&report), vec!["Senior Engineer"]);
    assert_eq!(report.postings[0].location, "Remote");
    assert!(report.pages[0].apply_signal);
    assert_eq!(
        report.pages[0].outcome,
        PageOutcome::Explored {
            postings: 1,
            followed: 0
        }
    );
    assert_eq!(harness.converter.calls(), vec![SITE.to_string()]);
    // Off-site links never reach the classifier
    assert!(harness.oracle.classified().is_empty());
}

#[tokio::test]
async fn test_apply_now_link_to_detail_page() {
    let site = FakeSite::new()
        .page(SITE, FakePage::new().link("Apply Now", &url("/jobs/1")))
        .page(url("/jobs/1"), FakePage::new().link("Apply", "https://ats.other.com/1"));
    let converter = FakeConverter::new()
        .text(SITE, "# Careers\nJoin us")
        .text(url("/jobs/1"), "# Engineer\nPOSTING: Engineer");
    let harness = Harness::new(site, FakeOracle::with_jobs([url("/jobs/1")]), converter);

    let report = harness
        .orchestrator
        .run(&params().with_max_depth(2), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(titles(&report), vec!["Engineer"]);
    assert_eq!(
        harness.site.navigations(),
        vec![SITE.to_string(), url("/jobs/1")]
    );
    // The start page carries the apply text too, so it is converted as well
    assert_eq!(harness.converter.calls(), vec![SITE.to_string(), url("/jobs/1")]);
}

#[tokio::test]
async fn test_listing_to_detail_depth_first() {
    let site = FakeSite::new()
        .page(
            SITE,
            FakePage::new()
                .link("Backend Engineer", &url("/jobs/1"))
                .link("Designer", &url("/jobs/2"))
                .link("About", &url("/about")),
        )
        .page(
            url("/jobs/1"),
            FakePage::new()
                .link("Apply", &url("/jobs/1/apply"))
                .link("Similar role", &url("/jobs/3")),
        )
        .page(
            url("/jobs/2"),
            FakePage::new().link("Submit application", "https://ats.other.com/2"),
        );
    let oracle = FakeOracle::with_jobs([url("/jobs/1"), url("/jobs/2"), url("/jobs/3")]);
    let converter = FakeConverter::new()
        .text(url("/jobs/1"), "POSTING: Backend Engineer")
        .text(url("/jobs/2"), "POSTING: Designer");
    let harness = Harness::new(site, oracle, converter);

    let report = crawl(&harness).await;

    assert_eq!(
        harness.site.navigations(),
        vec![
            SITE.to_string(),
            url("/jobs/1"),
            url("/jobs/3"),
            url("/jobs/2")
        ]
    );
    assert_eq!(titles(&report), vec!["Backend Engineer", "Designer"]);
    assert_eq!(harness.site.launches(), 1);
    assert_eq!(harness.site.quits(), 1);
    assert_eq!(report.visited, 4);
}

#[tokio::test]
async fn test_breadth_cap_keeps_first_links_in_order() {
    let mut start = FakePage::new();
    let mut jobs = Vec::new();
    for i in 0..20 {
        let href = url(&format!("/jobs/{}", i));
        start = start.link(&format!("Job {}", i), &href);
        jobs.push(href);
    }
    let site = FakeSite::new().page(SITE, start);
    let harness = Harness::new(site, FakeOracle::with_jobs(jobs.clone()), FakeConverter::new());

    let report = harness
        .orchestrator
        .run(&params().with_max_breadth(5), &CancellationToken::new())
        .await
        .unwrap();

    let mut expected = vec![SITE.to_string()];
    expected.extend(jobs[..5].iter().cloned());
    assert_eq!(harness.site.navigations(), expected);
    assert_eq!(
        report.pages[0].outcome,
        PageOutcome::Explored {
            postings: 0,
            followed: 5
        }
    );
}

#[tokio::test]
async fn test_depth_one_visits_only_start_page() {
    let site = FakeSite::new().page(SITE, FakePage::new().link("Engineer", &url("/jobs/1")));
    let harness = Harness::new(site, FakeOracle::with_jobs([url("/jobs/1")]), FakeConverter::new());

    let report = harness
        .orchestrator
        .run(&params().with_max_depth(1), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(harness.site.navigations(), vec![SITE.to_string()]);
    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.pages[1].outcome, PageOutcome::Skipped);
    assert_eq!(report.pages_visited(), 1);
}

#[tokio::test]
async fn test_no_url_is_navigated_twice() {
    let site = FakeSite::new()
        .page(
            SITE,
            FakePage::new().link("A", &url("/a")).link("B", &url("/b")),
        )
        .page(
            url("/a"),
            FakePage::new()
                .link("B", &url("/b"))
                .link("Home", SITE)
                .link("C", &url("/c")),
        )
        .page(
            url("/b"),
            FakePage::new().link("A", &url("/a")).link("C", &url("/c#openings")),
        );
    let oracle = FakeOracle::with_jobs([url("/a"), url("/b"), url("/c"), SITE.to_string()]);
    let harness = Harness::new(site, oracle, FakeConverter::new());

    crawl(&harness).await;

    let navigations = harness.site.navigations();
    let unique: HashSet<_> = navigations.iter().collect();
    assert_eq!(unique.len(), navigations.len());
    assert_eq!(
        navigations,
        vec![SITE.to_string(), url("/a"), url("/c"), url("/b")]
    );
}

#[tokio::test]
async fn test_fragment_variants_are_one_link() {
    let site = FakeSite::new().page(
        SITE,
        FakePage::new()
            .link("Engineer", &url("/jobs/1#top"))
            .link("Engineer (details)", &url("/jobs/1")),
    );
    let harness = Harness::new(site, FakeOracle::with_jobs([url("/jobs/1")]), FakeConverter::new());

    crawl(&harness).await;

    assert_eq!(harness.oracle.classified(), vec![url("/jobs/1")]);
    assert_eq!(
        harness.site.navigations(),
        vec![SITE.to_string(), url("/jobs/1")]
    );
}

#[tokio::test]
async fn test_navigation_links_are_ignored() {
    let site = FakeSite::new().page(
        SITE,
        FakePage::new()
            .nav_link("All jobs", &url("/jobs"))
            .link("Engineer", &url("/jobs/1")),
    );
    let oracle = FakeOracle::with_jobs([url("/jobs"), url("/jobs/1")]);
    let harness = Harness::new(site, oracle, FakeConverter::new());

    crawl(&harness).await;

    assert_eq!(harness.oracle.classified(), vec![url("/jobs/1")]);
    assert_eq!(
        harness.site.navigations(),
        vec![SITE.to_string(), url("/jobs/1")]
    );
}

#[tokio::test]
async fn test_launch_failure_yields_empty_report() {
    let site = Arc::new(FakeSite::new());
    let launcher = Arc::new(FakeLauncher::failing(Arc::clone(&site)));
    let harness = Harness::with_launcher(site, launcher, FakeOracle::default(), FakeConverter::new());
    let cancel = CancellationToken::new();

    let err = harness.orchestrator.run(&params(), &cancel).await.unwrap_err();
    assert!(matches!(err, ScoutError::SessionInit(_)));

    let report = scrape_website(&harness.orchestrator, &params(), &cancel).await;
    assert!(report.postings.is_empty());
    assert!(report.pages.is_empty());
    assert!(report.error.is_some());
    assert!(harness.site.navigations().is_empty());
}

#[tokio::test]
async fn test_classifier_failure_follows_nothing() {
    let site = FakeSite::new().page(
        SITE,
        FakePage::new()
            .link("Engineer", &url("/jobs/1"))
            .link("Designer", &url("/jobs/2")),
    );
    let harness = Harness::new(site, FakeOracle::failing_classification(), FakeConverter::new());

    let report = crawl(&harness).await;

    assert_eq!(harness.site.navigations(), vec![SITE.to_string()]);
    assert_eq!(harness.oracle.classified().len(), 2);
    assert_eq!(report.pages[0].outcome, PageOutcome::DeadEnd);
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_navigation_failure_abandons_only_that_branch() {
    let site = FakeSite::new()
        .page(
            SITE,
            FakePage::new()
                .link("Engineer", &url("/jobs/1"))
                .link("Designer", &url("/jobs/2")),
        )
        .page(url("/jobs/1"), FakePage::failing())
        .page(url("/jobs/2"), FakePage::new().link("Apply", "https://ats.other.com/2"));
    let oracle = FakeOracle::with_jobs([url("/jobs/1"), url("/jobs/2")]);
    let converter = FakeConverter::new().text(url("/jobs/2"), "POSTING: Designer");
    let harness = Harness::new(site, oracle, converter);

    let report = crawl(&harness).await;

    assert_eq!(
        harness.site.navigations(),
        vec![SITE.to_string(), url("/jobs/1"), url("/jobs/2")]
    );
    assert_eq!(titles(&report), vec!["Designer"]);

    let abandoned = report
        .pages
        .iter()
        .find(|page| page.url == url("/jobs/1"))
        .unwrap();
    assert_eq!(abandoned.outcome, PageOutcome::Abandoned(ErrorKind::Navigation));
}

#[tokio::test]
async fn test_page_panic_is_contained() {
    let site = FakeSite::new()
        .page(
            SITE,
            FakePage::new()
                .link("Engineer", &url("/jobs/1"))
                .link("Designer", &url("/jobs/2")),
        )
        .page(url("/jobs/1"), FakePage::panicking())
        .page(url("/jobs/2"), FakePage::new().link("Apply", "https://ats.other.com/2"));
    let oracle = FakeOracle::with_jobs([url("/jobs/1"), url("/jobs/2")]);
    let converter = FakeConverter::new().text(url("/jobs/2"), "POSTING: Designer");
    let harness = Harness::new(site, oracle, converter);

    let report = crawl(&harness).await;

    assert_eq!(titles(&report), vec!["Designer"]);
    assert!(report
        .pages
        .iter()
        .any(|page| page.outcome == PageOutcome::Abandoned(ErrorKind::Panic)));
    assert_eq!(harness.site.quits(), 1);
}

#[tokio::test]
async fn test_same_site_iframe_is_converted_and_followed() {
    let site = FakeSite::new().page(
        SITE,
        FakePage::new()
            .frame(
                &url("/embed"),
                vec![LinkCandidate::new("Data Engineer", url("/jobs/9"))],
            )
            .frame(
                "https://widgets.other.com/board",
                vec![LinkCandidate::new("Widget job", "https://widgets.other.com/1")],
            ),
    );
    let oracle = FakeOracle::with_jobs([url("/jobs/9")]);
    let converter = FakeConverter::new().text(url("/embed"), "POSTING: Embedded Role");
    let harness = Harness::new(site, oracle, converter);

    let report = crawl(&harness).await;

    assert_eq!(titles(&report), vec!["Embedded Role"]);
    assert_eq!(harness.converter.calls(), vec![url("/embed")]);
    assert_eq!(
        harness.site.navigations(),
        vec![SITE.to_string(), url("/jobs/9")]
    );
    assert_eq!(
        report.pages[0].outcome,
        PageOutcome::Explored {
            postings: 1,
            followed: 1
        }
    );
}

#[tokio::test]
async fn test_conversion_failure_skips_extraction() {
    let site = FakeSite::new().page(SITE, FakePage::new().link("Apply now", "https://ats.other.com/1"));
    let harness = Harness::new(site, FakeOracle::default(), FakeConverter::new());

    let report = crawl(&harness).await;

    assert!(report.postings.is_empty());
    assert_eq!(harness.converter.calls(), vec![SITE.to_string()]);
    assert_eq!(harness.oracle.extractions(), 0);
}

#[tokio::test]
async fn test_cancelled_crawl_releases_browser() {
    let site = FakeSite::new().page(SITE, FakePage::new().link("Engineer", &url("/jobs/1")));
    let harness = Harness::new(site, FakeOracle::with_jobs([url("/jobs/1")]), FakeConverter::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = harness.orchestrator.run(&params(), &cancel).await.unwrap();

    assert!(report.cancelled);
    assert!(report.error.is_none());
    assert!(harness.site.navigations().is_empty());
    assert_eq!(harness.site.quits(), 1);
}

#[tokio::test]
async fn test_scrape_websites_concatenates_in_order() {
    let other = "https://jobs.other.org/";
    let site = FakeSite::new()
        .page(SITE, FakePage::new().link("Apply", "https://ats.other.com/1"))
        .page(other, FakePage::new().link("Apply", "https://ats.other.com/2"));
    let converter = FakeConverter::new()
        .text(SITE, "POSTING: First")
        .text(other, "POSTING: Second");
    let harness = Harness::new(site, FakeOracle::default(), converter);

    let reports = scrape_websites(
        &harness.orchestrator,
        &[SITE.to_string(), other.to_string()],
        &params(),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(reports.len(), 2);
    let all: Vec<_> = collect_postings(&reports).into_iter().map(|p| p.title).collect();
    assert_eq!(all, vec!["First", "Second"]);
    assert_eq!(harness.site.launches(), 2);
    assert_eq!(harness.site.quits(), 2);
}
