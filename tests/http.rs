use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct RecordPayload {
    id: u64,
    date: String,
    item: String,
    amount: f64,
    photo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DayResponse {
    date: String,
    records: Vec<RecordPayload>,
    total: f64,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    year: i32,
    month: u32,
    daily: BTreeMap<String, f64>,
    total: f64,
}

struct TestServer {
    base_url: String,
    photo_dir: PathBuf,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_temp_path(suffix: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("diet_diary_http_{}_{}{}", std::process::id(), nanos, suffix));
    path
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/records")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_temp_path(".csv");
    let photo_dir = unique_temp_path("_photos");
    std::fs::create_dir_all(&photo_dir).expect("create photo dir");

    let child = Command::new(env!("CARGO_BIN_EXE_diet_diary"))
        .env("PORT", port.to_string())
        .env("DIARY_DATA_PATH", &data_path)
        .env("DIARY_PHOTO_DIR", &photo_dir)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        photo_dir,
        child,
    }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn add_record(
    client: &Client,
    base_url: &str,
    date: &str,
    item: &str,
    amount: f64,
) -> RecordPayload {
    let response = client
        .post(format!("{base_url}/api/records"))
        .json(&serde_json::json!({ "date": date, "item": item, "amount": amount }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

async fn day(client: &Client, base_url: &str, date: &str) -> DayResponse {
    client
        .get(format!("{base_url}/api/day?date={date}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_add_then_day_lists_record() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let created = client
        .post(format!("{}/api/records", server.base_url))
        .json(&serde_json::json!({
            "date": "2030-01-05",
            "item": "bubble tea",
            "amount": 65.0,
            "photo": "tea.jpg"
        }))
        .send()
        .await
        .unwrap();
    assert!(created.status().is_success());
    let record: RecordPayload = created.json().await.unwrap();
    assert!(record.id > 0);
    assert_eq!(record.date, "2030-01-05");
    assert_eq!(record.item, "bubble tea");
    assert_eq!(record.amount, 65.0);
    assert_eq!(record.photo.as_deref(), Some("tea.jpg"));

    let today = day(&client, &server.base_url, "2030-01-05").await;
    assert_eq!(today.date, "2030-01-05");
    assert_eq!(today.records.len(), 1);
    assert_eq!(today.records[0].id, record.id);
    assert_eq!(today.total, 65.0);
}

#[tokio::test]
async fn http_delete_removes_only_that_record() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let date = "2030-02-10";
    add_record(&client, &server.base_url, date, "tea", 10.0).await;
    let middle = add_record(&client, &server.base_url, date, "toast", 20.0).await;
    add_record(&client, &server.base_url, date, "soup", 30.0).await;

    let response = client
        .delete(format!("{}/api/records/{}", server.base_url, middle.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let remaining = day(&client, &server.base_url, date).await;
    let items: Vec<&str> = remaining
        .records
        .iter()
        .map(|record| record.item.as_str())
        .collect();
    assert_eq!(items, vec!["tea", "soup"]);
    assert_eq!(remaining.total, 40.0);
}

#[tokio::test]
async fn http_summary_aggregates_by_day() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    add_record(&client, &server.base_url, "2031-03-01", "breakfast", 50.0).await;
    add_record(&client, &server.base_url, "2031-03-01", "snack", 30.0).await;
    add_record(&client, &server.base_url, "2031-03-02", "drink", 10.0).await;
    add_record(&client, &server.base_url, "2031-04-01", "cake", 99.0).await;

    let summary: SummaryResponse = client
        .get(format!("{}/api/summary?year=2031&month=3", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(summary.year, 2031);
    assert_eq!(summary.month, 3);
    assert_eq!(
        summary.daily,
        BTreeMap::from([("1".to_string(), 80.0), ("2".to_string(), 10.0)])
    );
    assert_eq!(summary.total, 90.0);
}

#[tokio::test]
async fn http_delete_unknown_id_is_not_found() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before: Vec<RecordPayload> = client
        .get(format!("{}/api/records", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .delete(format!("{}/api/records/999999999", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let after: Vec<RecordPayload> = client
        .get(format!("{}/api/records", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after.len(), before.len());
}

#[tokio::test]
async fn http_rejects_invalid_records() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let blank_item = client
        .post(format!("{}/api/records", server.base_url))
        .json(&serde_json::json!({ "date": "2030-03-01", "item": "   ", "amount": 5.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank_item.status().as_u16(), 400);

    let negative_amount = client
        .post(format!("{}/api/records", server.base_url))
        .json(&serde_json::json!({ "date": "2030-03-01", "item": "tea", "amount": -5.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(negative_amount.status().as_u16(), 400);
}

#[tokio::test]
async fn http_index_renders_calendar() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/?year=2030&month=1&date=2030-01-05", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body = response.text().await.unwrap();
    assert!(body.contains("Diet Diary"));
    assert!(body.contains("<table class=\"calendar\""));
    assert!(body.contains("Editing 2030-01-05"));
}

#[tokio::test]
async fn http_serves_photos_by_name() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let missing = client
        .get(format!("{}/photos/missing.jpg", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let bytes = [0x89u8, 0x50, 0x4e, 0x47];
    std::fs::write(server.photo_dir.join("snack.png"), bytes).expect("write photo");

    let found = client
        .get(format!("{}/photos/snack.png", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(found.status().is_success());
    assert_eq!(
        found.headers()["content-type"].to_str().unwrap(),
        "image/png"
    );
    assert_eq!(found.bytes().await.unwrap().as_ref(), &bytes[..]);
}

#[tokio::test]
async fn http_form_post_appends_and_redirects() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = client
        .post(format!("{}/records", server.base_url))
        .form(&[
            ("date", "2030-04-02"),
            ("item", "lunch box"),
            ("amount", "120"),
            ("photo", ""),
        ])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "/?date=2030-04-02"
    );

    let added = day(&client, &server.base_url, "2030-04-02").await;
    assert_eq!(added.records.len(), 1);
    assert_eq!(added.records[0].item, "lunch box");
    assert_eq!(added.records[0].photo, None);
    assert_eq!(added.total, 120.0);
}

#[tokio::test]
async fn http_rejects_month_out_of_range() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/summary?year=2031&month=13", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}
