use company_scrape::{BrowserSession, BrowserSource, LaunchOptions, Pipeline, RevealConfig, ScrapeError, presets};
use std::time::Duration;

/// Page that appends rows whenever the viewport nears the bottom, up to a fixed total
const LAZY_FEED: &str = "data:text/html,<html><body style='margin:0'><div id='feed'></div><script>\
let n=0;function more(){for(let i=0;i<20&&n<100;i++,n++){const d=document.createElement('div');\
d.style.height='50px';d.className='row';d.textContent='row '+n;document.getElementById('feed').appendChild(d);}}\
more();window.addEventListener('scroll',()=>{if(window.innerHeight+window.scrollY>=document.body.scrollHeight-100)more();});\
</script></body></html>";

#[test]
#[ignore] // Requires Chrome to be installed
fn test_reveal_loads_all_rows() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true).window_size(800, 600))
        .expect("Failed to launch browser");
    session.navigate(LAZY_FEED).expect("Failed to navigate");

    let config = RevealConfig::new().step_size(200).poll_interval(Duration::from_millis(50)).max_ticks(500);
    let progress = session.reveal(&config).expect("Reveal failed");
    assert!(progress.ticks > 0);

    let rows = session.evaluate("document.querySelectorAll('.row').length").expect("Failed to count rows");
    assert_eq!(rows.as_u64(), Some(100));
}

#[test]
#[ignore]
fn test_reveal_short_page_does_not_scroll() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    session.navigate("data:text/html,<html><body><p>short</p></body></html>").expect("Failed to navigate");

    let progress = session.reveal(&RevealConfig::default()).expect("Reveal failed");
    assert_eq!(progress.ticks, 0);
    assert_eq!(progress.distance_covered, 0);
}

#[test]
#[ignore]
fn test_navigate_waits_for_late_requests() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true).network_idle_timeout(Duration::from_secs(5)))
        .expect("Failed to launch browser");

    // Data arrives from a request issued well after the load event
    session
        .navigate(
            "data:text/html,<html><body><ul id='list'></ul><script>\
window.addEventListener('load',()=>setTimeout(()=>fetch('data:text/plain,late entry')\
.then(r=>r.text()).then(t=>{const li=document.createElement('li');li.textContent=t;\
document.getElementById('list').appendChild(li);}),300));</script></body></html>",
        )
        .expect("Failed to navigate");

    let html = session.content().expect("Failed to read content");
    assert!(html.contains("<li>late entry</li>"));
}

#[test]
#[ignore]
fn test_network_idle_reports_quiet_page() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true).network_idle_timeout(Duration::ZERO))
        .expect("Failed to launch browser");
    session.navigate("data:text/html,<html><body><p>static</p></body></html>").expect("Failed to navigate");

    assert!(session.wait_for_network_idle(Duration::from_secs(5)).expect("Idle check failed"));
}

#[test]
#[ignore]
fn test_missing_landmark_times_out() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    session.navigate("data:text/html,<html><body><p>blocked</p></body></html>").expect("Failed to navigate");

    let err = session.wait_for_landmark("h1.heading", Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, ScrapeError::LandmarkNotFound { .. }));
}

#[test]
#[ignore]
fn test_pipeline_on_live_page() {
    let source = BrowserSource::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let pipeline = Pipeline::new(presets::by_name("crunchbase").unwrap()).unwrap();

    let record = pipeline
        .run(
            source,
            "data:text/html,<html><body><h1 class='profile-heading'>Acme</h1><span class='company-stage'>Seed</span></body></html>",
        )
        .expect("Scrape failed");

    assert_eq!(record.get_str("name"), Some("Acme"));
    assert_eq!(record.get_str("stage"), Some("Seed"));
}
