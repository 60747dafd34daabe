//! Playwright browser automation
//!
//! A [`PlaywrightSession`] keeps one `node` process alive for the whole
//! journey. The process runs an embedded bridge script that owns the browser
//! and answers line-delimited JSON requests on stdin/stdout:
//!
//! ```text
//! -> {"id":3,"op":"count","locator":[{"kind":"css","selector":".SelectLegacyDate__available"}]}
//! <- {"id":3,"ok":true,"value":14}
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::browser::{Locator, PageDriver, WaitState};
use crate::error::{E2eError, E2eResult};

/// Extra time granted to the bridge on top of the operation's own timeout
const BRIDGE_SLACK: Duration = Duration::from_secs(5);

/// Budget for requests that carry no timeout of their own
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

const BRIDGE_SCRIPT: &str = r#"
const { chromium, firefox, webkit } = require('playwright');
const readline = require('readline');

const engines = { chromium, firefox, webkit };
const opts = JSON.parse(process.argv[2] || '{}');

function resolve(page, segments) {
  let target = page;
  for (const seg of segments) {
    switch (seg.kind) {
      case 'css': target = target.locator(seg.selector); break;
      case 'role': target = target.getByRole(seg.role, { name: new RegExp(seg.name_pattern, 'i') }); break;
      case 'nth': target = target.nth(seg.index); break;
      case 'last': target = target.last(); break;
      default: throw new Error('unknown segment kind: ' + seg.kind);
    }
  }
  return target;
}

async function handle(page, req) {
  const target = () => resolve(page, req.locator || []);
  switch (req.op) {
    case 'goto':
      await page.goto(req.url, { waitUntil: 'domcontentloaded', timeout: req.timeout });
      return null;
    case 'url': return page.url();
    case 'title': return await page.title();
    case 'count': return await target().count();
    case 'is_visible': return await target().isVisible();
    case 'wait_for':
      try {
        await target().waitFor({ state: req.state, timeout: req.timeout });
        return true;
      } catch (e) {
        if (e && e.name === 'TimeoutError') return false;
        throw e;
      }
    case 'scroll_into_view':
      await target().scrollIntoViewIfNeeded({ timeout: req.timeout });
      return null;
    case 'click':
      await target().click({ timeout: req.timeout });
      return null;
    case 'text_content': return await target().textContent();
    case 'get_attribute': return await target().getAttribute(req.name);
    case 'select_option':
      await target().selectOption(req.value, { timeout: req.timeout });
      return null;
    case 'close': return null;
    default: throw new Error('unknown op: ' + req.op);
  }
}

(async () => {
  const engine = engines[opts.browser] || chromium;
  const browser = await engine.launch({ headless: opts.headless !== false, slowMo: opts.slow_mo_ms || 0 });
  const context = await browser.newContext({
    viewport: { width: opts.viewport_width || 1280, height: opts.viewport_height || 720 }
  });
  const page = await context.newPage();
  page.setDefaultTimeout(opts.default_timeout_ms || 5000);

  const send = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');
  send({ id: 0, ok: true, value: 'ready' });

  const rl = readline.createInterface({ input: process.stdin });
  let chain = Promise.resolve();
  rl.on('line', (line) => {
    chain = chain.then(async () => {
      let req;
      try { req = JSON.parse(line); } catch (e) { return; }
      try {
        const value = await handle(page, req);
        send({ id: req.id, ok: true, value: value === undefined ? null : value });
        if (req.op === 'close') {
          await browser.close();
          process.exit(0);
        }
      } catch (e) {
        send({ id: req.id, ok: false, error: String((e && e.message) || e), timeout: !!(e && e.name === 'TimeoutError') });
      }
    });
  });
  rl.on('close', async () => {
    await chain;
    await browser.close();
    process.exit(0);
  });
})().catch((e) => {
  process.stderr.write(String((e && e.stack) || e) + '\n');
  process.exit(1);
});
"#;

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "firefox" => Browser::Firefox,
            "webkit" => Browser::Webkit,
            _ => Browser::Chromium,
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub slow_mo_ms: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Project directory whose `node_modules` contains `playwright`
    pub working_dir: PathBuf,

    pub node_binary: String,

    /// Budget for the browser to launch and report ready
    pub launch_timeout: Duration,

    /// Playwright's own default for operations without an explicit timeout
    pub default_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            slow_mo_ms: 0,
            viewport_width: 1280,
            viewport_height: 720,
            working_dir: PathBuf::from("."),
            node_binary: "node".to_string(),
            launch_timeout: Duration::from_secs(30),
            default_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
}

/// Request/reply framing over the bridge's stdin and stdout
struct BridgeIo<W, R> {
    writer: W,
    lines: Lines<BufReader<R>>,
    next_id: u64,
}

impl<W, R> BridgeIo<W, R>
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncRead + Unpin + Send,
{
    fn new(writer: W, reader: R) -> Self {
        Self {
            writer,
            lines: BufReader::new(reader).lines(),
            next_id: 0,
        }
    }

    /// Read until the reply for `id`; stale replies and stray output are skipped
    async fn read_reply(&mut self, id: u64) -> E2eResult<BridgeReply> {
        loop {
            let line = self
                .lines
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Bridge("bridge process closed its output".to_string()))?;

            match serde_json::from_str::<BridgeReply>(&line) {
                Ok(reply) if reply.id == id => return Ok(reply),
                Ok(reply) => debug!("Discarding stale bridge reply {}", reply.id),
                Err(_) => debug!("[bridge] {}", line),
            }
        }
    }

    /// Send one request and wait up to `budget` plus slack for its reply
    async fn exchange(&mut self, op: &str, mut payload: Value, budget: Duration) -> E2eResult<Value> {
        self.next_id += 1;
        let id = self.next_id;

        payload["id"] = json!(id);
        payload["op"] = json!(op);
        let mut line = serde_json::to_string(&payload)?;
        line.push('\n');

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;

        let reply = timeout(budget + BRIDGE_SLACK, self.read_reply(id))
            .await
            .map_err(|_| E2eError::Timeout(format!("bridge reply to '{}'", op)))??;

        if reply.ok {
            Ok(reply.value)
        } else {
            let message = reply.error.unwrap_or_else(|| "unknown bridge error".to_string());
            if reply.timeout {
                Err(E2eError::Timeout(format!("{}: {}", op, message)))
            } else {
                Err(E2eError::Playwright(message))
            }
        }
    }
}

/// A live browser page behind the node bridge
pub struct PlaywrightSession {
    io: Mutex<BridgeIo<ChildStdin, ChildStdout>>,
    child: Mutex<Child>,
    _script_dir: TempDir,
}

impl PlaywrightSession {
    /// Launch the browser and wait for the bridge to report ready
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config)?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        let options = json!({
            "browser": config.browser.as_str(),
            "headless": config.headless,
            "slow_mo_ms": config.slow_mo_ms,
            "viewport_width": config.viewport_width,
            "viewport_height": config.viewport_height,
            "default_timeout_ms": config.default_timeout.as_millis() as u64,
        });

        info!(
            "Launching {} (headless: {}) via Playwright bridge",
            config.browser.as_str(),
            config.headless
        );

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .arg(options.to_string())
            .current_dir(&config.working_dir)
            .env("NODE_PATH", config.working_dir.join("node_modules"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Bridge(format!("Failed to spawn {}: {}", config.node_binary, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdout unavailable".to_string()))?;

        let mut io = BridgeIo::new(stdin, stdout);

        match timeout(config.launch_timeout, io.read_reply(0)).await {
            Ok(Ok(reply)) if reply.ok => {}
            Ok(Ok(reply)) => {
                return Err(E2eError::Playwright(
                    reply.error.unwrap_or_else(|| "browser failed to start".to_string()),
                ))
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(E2eError::Timeout(format!(
                    "browser launch ({:?})",
                    config.launch_timeout
                )))
            }
        }

        info!("Playwright bridge ready");
        Ok(Self {
            io: Mutex::new(io),
            child: Mutex::new(child),
            _script_dir: script_dir,
        })
    }

    /// Check if Playwright is installed
    pub fn check_playwright_installed(config: &PlaywrightConfig) -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .current_dir(&config.working_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    async fn request(&self, op: &str, payload: Value, budget: Duration) -> E2eResult<Value> {
        self.io.lock().await.exchange(op, payload, budget).await
    }

    async fn locator_request(
        &self,
        op: &str,
        locator: &Locator,
        mut extra: Value,
        budget: Duration,
    ) -> E2eResult<Value> {
        extra["locator"] = serde_json::to_value(locator)?;
        self.request(op, extra, budget).await
    }

    /// Close the browser, escalating to signals if the bridge does not exit
    pub async fn close(&self) -> E2eResult<()> {
        if let Err(e) = self.request("close", json!({}), QUERY_TIMEOUT).await {
            debug!("Bridge close request failed: {}", e);
        }

        let mut child = self.child.lock().await;
        if let Ok(Ok(status)) = timeout(Duration::from_secs(2), child.wait()).await {
            debug!("Bridge exited with {}", status);
            return Ok(());
        }

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && timeout(Duration::from_millis(500), child.wait()).await.is_ok()
                {
                    return Ok(());
                }
            }
        }

        warn!("Bridge did not exit; killing it");
        child.kill().await?;
        Ok(())
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

fn expect_bool(value: Value, op: &str) -> E2eResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| E2eError::Bridge(format!("'{}' returned non-boolean {}", op, value)))
}

fn optional_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

#[async_trait]
impl PageDriver for PlaywrightSession {
    async fn goto(&self, url: &str, timeout: Duration) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        self.request(
            "goto",
            json!({ "url": url, "timeout": millis(timeout) }),
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn url(&self) -> E2eResult<String> {
        let value = self.request("url", json!({}), QUERY_TIMEOUT).await?;
        Ok(optional_string(value).unwrap_or_default())
    }

    async fn title(&self) -> E2eResult<String> {
        let value = self.request("title", json!({}), QUERY_TIMEOUT).await?;
        Ok(optional_string(value).unwrap_or_default())
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let value = self
            .locator_request("count", locator, json!({}), QUERY_TIMEOUT)
            .await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| E2eError::Bridge(format!("'count' returned {}", value)))
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let value = self
            .locator_request("is_visible", locator, json!({}), QUERY_TIMEOUT)
            .await?;
        expect_bool(value, "is_visible")
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> E2eResult<bool> {
        let value = self
            .locator_request(
                "wait_for",
                locator,
                json!({ "state": state, "timeout": millis(timeout) }),
                timeout,
            )
            .await?;
        expect_bool(value, "wait_for")
    }

    async fn scroll_into_view(&self, locator: &Locator, timeout: Duration) -> E2eResult<()> {
        self.locator_request(
            "scroll_into_view",
            locator,
            json!({ "timeout": millis(timeout) }),
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> E2eResult<()> {
        self.locator_request("click", locator, json!({ "timeout": millis(timeout) }), timeout)
            .await?;
        Ok(())
    }

    async fn text_content(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let value = self
            .locator_request("text_content", locator, json!({}), QUERY_TIMEOUT)
            .await?;
        Ok(optional_string(value))
    }

    async fn get_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        let value = self
            .locator_request("get_attribute", locator, json!({ "name": name }), QUERY_TIMEOUT)
            .await?;
        Ok(optional_string(value))
    }

    async fn select_option(
        &self,
        locator: &Locator,
        value: &str,
        timeout: Duration,
    ) -> E2eResult<()> {
        self.locator_request(
            "select_option",
            locator,
            json!({ "value": value, "timeout": millis(timeout) }),
            timeout,
        )
        .await?;
        Ok(())
    }
}
