#![allow(dead_code)]

use anyhow::Context as _;
use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

pub const SENTIMENT_ANALYZER: &str = env!("CARGO_BIN_EXE_sentiment-analyzer");
pub const TRANSLATION_SERVICE: &str = env!("CARGO_BIN_EXE_translation-service");

const CLEARED_ENV: [&str; 12] = [
    "PORT",
    "RUST_LOG",
    "OPENMESH_CONFIG",
    "OPENMESH_BIND",
    "OPENMESH_MANIFEST",
    "OPENMESH_FREE",
    "OPENMESH_X402_AMOUNT",
    "OPENMESH_X402_ASSET",
    "OPENMESH_X402_NETWORK",
    "OPENMESH_X402_RECIPIENT",
    "OPENMESH_X402_FACILITATOR_URL",
    "OPENMESH_CALL_TIMEOUT_SECS",
];

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Does not reserve the port; another process may still take it first.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
}

/// A command for `bin` running in `workdir` with a clean `OPENMESH_*` environment.
pub fn command(bin: &str, workdir: &Path) -> Command {
    let mut cmd = Command::new(bin);
    cmd.current_dir(workdir)
        .arg("--log-level")
        .arg("debug")
        .stdout(Stdio::null())
        .stderr(Stdio::inherit());
    for var in CLEARED_ENV {
        cmd.env_remove(var);
    }
    cmd
}

/// Spawn `cmd` and wait until `/health` answers on `port`.
pub async fn start(mut cmd: Command, port: u16) -> anyhow::Result<(KillOnDrop, String)> {
    let child = cmd.spawn().context("spawn demo server")?;
    let guard = KillOnDrop(child);
    let base = format!("http://127.0.0.1:{port}");
    wait_http_ok(&format!("{base}/health"), Duration::from_secs(20)).await?;
    Ok((guard, base))
}
