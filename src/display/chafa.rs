use log::{debug, warn};
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Longest a single render may take before chafa is killed.
const RENDER_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, PartialEq, Eq)]
pub enum ImageRender {
    Rendered(String),
    Missing,
    Failed(String),
}

/// Turns room images into block-character art by shelling out to `chafa`.
///
/// Every failure mode degrades to "no picture". Nothing here can stop a turn.
#[derive(Debug, Clone)]
pub struct ImageRenderer {
    program: String,
    enabled: bool,
    timeout: Duration,
}

impl ImageRenderer {
    /// Looks for `chafa` on the PATH.
    pub fn detect() -> Self {
        Self::with_program("chafa")
    }

    pub fn with_program(program: &str) -> Self {
        let enabled = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);

        if enabled {
            debug!("image support enabled ({} found)", program);
        } else {
            warn!("image support disabled: {} not available", program);
        }

        ImageRenderer {
            program: program.to_string(),
            enabled,
            timeout: RENDER_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        ImageRenderer {
            program: String::new(),
            enabled: false,
            timeout: RENDER_TIMEOUT,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn render(&self, path: &Path, width: u16, height: u16) -> ImageRender {
        if !self.enabled || !path.exists() {
            return ImageRender::Missing;
        }

        let spawned = Command::new(&self.program)
            .arg("--format")
            .arg("symbols")
            .arg("--symbols")
            .arg("block")
            .arg("--colors")
            .arg("none")
            .arg("--size")
            .arg(format!("{}x{}", width, height))
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!("could not run {}: {}", self.program, e);
                return ImageRender::Failed(e.to_string());
            }
        };

        // Drain both pipes off-thread so a chatty child cannot fill them and stall
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        match wait_with_deadline(&mut child, self.timeout) {
            Ok(Some(status)) if status.success() => {
                let out = collect(stdout);
                ImageRender::Rendered(clean_render_output(&String::from_utf8_lossy(&out)))
            }
            Ok(Some(_)) => {
                let err = collect(stderr);
                let stderr = String::from_utf8_lossy(&err).trim().to_string();
                warn!("{} failed on {}: {}", self.program, path.display(), stderr);
                ImageRender::Failed(stderr)
            }
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                warn!(
                    "{} timed out after {:?} on {}",
                    self.program,
                    self.timeout,
                    path.display()
                );
                ImageRender::Failed(format!("timed out after {:?}", self.timeout))
            }
            Err(e) => {
                let _ = child.kill();
                warn!("lost track of {}: {}", self.program, e);
                ImageRender::Failed(e.to_string())
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Polls the child until it exits. `Ok(None)` means the deadline passed first.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn clean_render_output(stdout: &str) -> String {
    // Strip the cursor show/hide escapes chafa wraps around its output
    stdout
        .replace("\x1b[?25l", "")
        .replace("\x1b[?25h", "")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn disabled_renderer_reports_missing() {
        let renderer = ImageRenderer::disabled();
        assert!(!renderer.is_enabled());
        assert_eq!(
            renderer.render(Path::new("temple/images/entrance.png"), 40, 20),
            ImageRender::Missing
        );
    }

    #[test]
    fn unknown_program_is_disabled() {
        let renderer = ImageRenderer::with_program("definitely-not-a-real-chafa-binary");
        assert!(!renderer.is_enabled());
    }

    #[cfg(unix)]
    fn script_renderer(dir: &Path, body: &str, timeout: Duration) -> (ImageRenderer, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-chafa");
        fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let image = dir.join("room.png");
        fs::write(&image, b"not really a png").unwrap();

        let renderer = ImageRenderer {
            program: script.to_string_lossy().into_owned(),
            enabled: true,
            timeout,
        };
        (renderer, image)
    }

    #[cfg(unix)]
    #[test]
    fn hung_renderer_is_killed() {
        let tmp = TempDir::new().unwrap();
        let (renderer, image) =
            script_renderer(tmp.path(), "exec sleep 30", Duration::from_millis(200));

        let started = Instant::now();
        let result = renderer.render(&image, 40, 20);
        assert!(started.elapsed() < Duration::from_secs(10));
        match result {
            ImageRender::Failed(msg) => assert!(msg.starts_with("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn renderer_output_is_cleaned() {
        let tmp = TempDir::new().unwrap();
        let (renderer, image) =
            script_renderer(tmp.path(), "printf '##  \\n ##\\n'", Duration::from_secs(5));

        assert_eq!(
            renderer.render(&image, 40, 20),
            ImageRender::Rendered("##\n ##".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_renderer_reports_stderr() {
        let tmp = TempDir::new().unwrap();
        let (renderer, image) =
            script_renderer(tmp.path(), "echo 'bad image' >&2; exit 1", Duration::from_secs(5));

        assert_eq!(
            renderer.render(&image, 40, 20),
            ImageRender::Failed("bad image".to_string())
        );
    }

    #[test]
    fn cleans_cursor_escapes() {
        let raw = "\x1b[?25l##  \n ## \x1b[?25h";
        assert_eq!(clean_render_output(raw), "##\n ##");
    }
}
