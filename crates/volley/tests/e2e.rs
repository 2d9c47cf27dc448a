// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests that drive the `volley` binary against a mock gateway.
//!
//! Each test gets its own temp directory holding the config file, the SQLite
//! database, and the campaign inputs. Tests are independent and
//! order-insensitive.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("volley.toml");
        let db = dir.path().join("volley.db");
        std::fs::write(
            &config,
            format!(
                r#"
[engine]
log_level = "debug"

[storage]
database_path = "{}"

[queue]
poll_interval_ms = 20
lease_secs = 120

[gateway]
typing_delay_ms = 0
"#,
                db.display()
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_volley"));
        cmd.arg("--config").arg(&self.config).args(args);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().unwrap()
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "volley {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn json(&self, args: &[&str]) -> Value {
        serde_json::from_str(&self.run_ok(args)).unwrap()
    }

    fn spawn_worker(&self) -> Child {
        self.command(&["work"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap()
    }

    fn write_campaign(&self, id: &str, gateway: &str, messages_per_minute: i64) -> PathBuf {
        let file = self.path().join(format!("{id}.toml"));
        std::fs::write(
            &file,
            format!(
                r#"
id = "{id}"
name = "Spring sale"
message_template = "Hi $contact_name"
messages_per_minute = {messages_per_minute}

[connection]
base_url = "{gateway}"
api_key = "test-key"
instance = "store-01"
"#
            ),
        )
        .unwrap();
        file
    }

    fn write_contacts(&self, numbers: &[&str]) -> PathBuf {
        let file = self.path().join("contacts.csv");
        let mut csv = String::from("number,name\n");
        for (i, number) in numbers.iter().enumerate() {
            csv.push_str(&format!("{number},Contact {i}\n"));
        }
        std::fs::write(&file, csv).unwrap();
        file
    }

    fn start(&self, campaign: &Path, contacts: &Path) -> String {
        self.run_ok(&[
            "start",
            "--campaign",
            campaign.to_str().unwrap(),
            "--contacts",
            contacts.to_str().unwrap(),
        ])
    }

    /// Polls `volley stats` until the ledger holds `total` entries.
    fn wait_for_total(&self, id: &str, total: u64) -> Value {
        let deadline = Instant::now() + Duration::from_secs(20);
        loop {
            let stats = self.json(&["stats", id]);
            if stats["total"].as_u64() == Some(total) {
                return stats;
            }
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {total} deliveries, last stats: {stats}"
            );
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

fn stop(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

async fn gateway(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/store-01"))
        .respond_with(ResponseTemplate::new(status).set_body_string("gateway says no"))
        .mount(&server)
        .await;
    server
}

// ---- Test 1: start, work, stats ----

#[tokio::test(flavor = "multi_thread")]
async fn campaign_is_delivered_by_worker_process() {
    let server = gateway(201).await;
    let ws = Workspace::new();
    let campaign = ws.write_campaign("spring-sale", &server.uri(), 6000);
    let contacts = ws.write_contacts(&["5511900000001", "5511900000002", "5511900000003"]);

    let out = ws.start(&campaign, &contacts);
    assert!(out.contains("3 jobs enqueued"), "unexpected output: {out}");
    assert_eq!(ws.json(&["depth"])["pending"], 3);

    let worker = ws.spawn_worker();
    let stats = ws.wait_for_total("spring-sale", 3);
    stop(worker);

    assert_eq!(stats["status"], "processing");
    assert_eq!(stats["counts"]["sent"], 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);

    let log = ws.json(&["log", "spring-sale"]);
    let entries = log.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e["status"] == "sent"));
    assert_eq!(ws.json(&["depth"])["pending"], 0);
}

// ---- Test 2: gateway failures are recorded, not retried ----

#[tokio::test(flavor = "multi_thread")]
async fn gateway_failures_land_in_the_ledger() {
    let server = gateway(500).await;
    let ws = Workspace::new();
    let campaign = ws.write_campaign("failing", &server.uri(), 6000);
    let contacts = ws.write_contacts(&["5511900000001", "5511900000002"]);
    ws.start(&campaign, &contacts);

    let worker = ws.spawn_worker();
    let stats = ws.wait_for_total("failing", 2);
    stop(worker);

    assert_eq!(stats["counts"]["failed"], 2);
    let log = ws.json(&["log", "failing"]);
    assert_eq!(log[0]["error_message"], "gateway says no");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

// ---- Test 3: pause and resume through the CLI ----

#[tokio::test(flavor = "multi_thread")]
async fn resume_replaces_queued_jobs_instead_of_duplicating_them() {
    let server = gateway(201).await;
    let ws = Workspace::new();
    let campaign = ws.write_campaign("paced", &server.uri(), 6000);
    let contacts = ws.write_contacts(&["5511900000001", "5511900000002", "5511900000003"]);
    ws.start(&campaign, &contacts);

    ws.run_ok(&["pause", "paced"]);
    assert_eq!(ws.json(&["stats", "paced"])["status"], "paused");
    // Pausing twice is fine.
    ws.run_ok(&["pause", "paced"]);

    let out = ws.run_ok(&["resume", "paced"]);
    assert!(out.contains("3 jobs enqueued"), "unexpected output: {out}");
    assert_eq!(ws.json(&["depth"])["pending"], 3);
    assert_eq!(ws.json(&["stats", "paced"])["status"], "processing");

    let worker = ws.spawn_worker();
    ws.wait_for_total("paced", 3);
    stop(worker);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);

    let log = ws.json(&["log", "paced"]);
    for entry in log.as_array().unwrap() {
        let key = entry["idempotency_key"].as_str().unwrap();
        assert!(key.ends_with(":2"), "expected second generation key, got {key}");
    }
}

// ---- Test 4: error exits ----

#[test]
fn resume_of_processing_campaign_fails() {
    let ws = Workspace::new();
    let campaign = ws.write_campaign("busy", "http://127.0.0.1:9", 60);
    let contacts = ws.write_contacts(&["5511900000001"]);
    ws.start(&campaign, &contacts);

    let output = ws.run(&["resume", "busy"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("precondition failed"), "stderr: {stderr}");
}

#[test]
fn zero_cadence_is_rejected_before_anything_is_enqueued() {
    let ws = Workspace::new();
    let campaign = ws.write_campaign("broken", "http://127.0.0.1:9", 0);
    let contacts = ws.write_contacts(&["5511900000001"]);

    let output = ws.run(&[
        "start",
        "--campaign",
        campaign.to_str().unwrap(),
        "--contacts",
        contacts.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration error"));
    assert_eq!(ws.json(&["depth"])["pending"], 0);
}

#[test]
fn unknown_campaign_stats_fail() {
    let ws = Workspace::new();
    let output = ws.run(&["stats", "nobody"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("campaign not found"));
}

#[test]
fn invalid_config_exits_with_failure() {
    let ws = Workspace::new();
    std::fs::write(&ws.config, "[queue]\nprefetch = 0\n").unwrap();
    let output = ws.run(&["depth"]);
    assert_eq!(output.status.code(), Some(1));
}
