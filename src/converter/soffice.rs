use super::{ConvertError, Converter, Invocation};
use crate::{config::Config, job::ConversionJob, util::resolve_absolute};
use anyhow::{Context, Result, anyhow};
use regex::Regex;
use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Drives LibreOffice's `soffice --headless --convert-to pdf`.
#[derive(Debug, Clone, Default)]
pub struct SofficeConverter {
    timeout: Option<Duration>,
}

impl SofficeConverter {
    pub fn new(cfg: &Config) -> Self {
        Self::with_timeout(match cfg.converter.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        })
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Arguments after the executable. `input` must already be absolute.
    pub fn build_args(out_dir: &Path, input: &Path) -> Vec<OsString> {
        vec![
            "--headless".into(),
            "--convert-to".into(),
            "pdf".into(),
            "--outdir".into(),
            out_dir.as_os_str().to_owned(),
            input.as_os_str().to_owned(),
        ]
    }

    /// Runs `<exe> --version` and pulls the release number out of the banner.
    pub fn version(exe: &Path) -> Result<Option<String>> {
        let output = Command::new(exe)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawning {} --version", exe.display()))?;
        if !output.status.success() {
            return Err(anyhow!(
                "{} --version failed: {}",
                exe.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(parse_version(&String::from_utf8_lossy(&output.stdout)))
    }

    fn run(&self, exe: &Path, args: &[OsString]) -> Result<Output, ConvertError> {
        let mut cmd = Command::new(exe);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // soffice hands off to soffice.bin; a group lets a timeout reach both.
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        debug!("spawn {} {:?}", exe.display(), args);
        let mut child = cmd.spawn().map_err(|source| ConvertError::NotInvocable {
            exe: exe.to_path_buf(),
            source,
        })?;

        match self.timeout {
            Some(timeout) => wait_bounded(&mut child, timeout),
            None => child
                .wait_with_output()
                .with_context(|| format!("waiting for {}", exe.display()))
                .map_err(ConvertError::Unclassified),
        }
    }
}

impl Converter for SofficeConverter {
    fn convert(&self, exe: &Path, job: &ConversionJob) -> Result<Invocation, ConvertError> {
        let input = resolve_absolute(&job.input).map_err(ConvertError::Unclassified)?;
        let args = Self::build_args(job.output_dir(), &input);

        let output = self.run(exe, &args)?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ConvertError::ProcessFailed {
                code: output.status.code(),
                stdout,
                stderr,
            });
        }
        if !stderr.trim().is_empty() {
            debug!("soffice stderr {}: {}", job.input.display(), stderr.trim());
        }
        Ok(Invocation { stdout, stderr })
    }
}

pub fn parse_version(banner: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^LibreOffice\S*\s+(\d+(?:\.\d+)*)").ok()?;
    if let Some(caps) = re.captures(banner) {
        return Some(caps[1].to_string());
    }
    banner
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// How long captured output keeps being collected once the child is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(2);
const POLL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Forwards everything read from `pipe` as chunks; ends at EOF.
fn forward<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<(Stream, Vec<u8>)>) {
    std::thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

#[derive(Default)]
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Captured {
    fn push(&mut self, (stream, bytes): (Stream, Vec<u8>)) {
        match stream {
            Stream::Stdout => self.stdout.extend(bytes),
            Stream::Stderr => self.stderr.extend(bytes),
        }
    }

    /// Collects chunks until every writer has closed its end or `grace` runs
    /// out. Pipes still held by an unkillable descendant are abandoned.
    fn drain(&mut self, rx: &Receiver<(Stream, Vec<u8>)>, grace: Duration) {
        let until = Instant::now() + grace;
        while let Some(left) = until.checked_duration_since(Instant::now()) {
            match rx.recv_timeout(left) {
                Ok(chunk) => self.push(chunk),
                Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {
                    warn!("abandoning output pipes still held after exit");
                    return;
                }
            }
        }
    }
}

fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        // The child leads its own process group, so this also reaches soffice.bin.
        let pgid = child.id() as libc::pid_t;
        unsafe { libc::kill(-pgid, libc::SIGKILL) };
    }
    let _ = child.kill();
}

fn wait_bounded(child: &mut Child, timeout: Duration) -> Result<Output, ConvertError> {
    let (tx, rx) = mpsc::channel();
    if let Some(out) = child.stdout.take() {
        forward(out, Stream::Stdout, tx.clone());
    }
    if let Some(err) = child.stderr.take() {
        forward(err, Stream::Stderr, tx.clone());
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    let mut captured = Captured::default();
    let status = loop {
        let polled = child
            .try_wait()
            .with_context(|| "try_wait")
            .map_err(ConvertError::Unclassified)?;
        if let Some(status) = polled {
            break Some(status);
        }
        if Instant::now() >= deadline {
            warn!("soffice timed out after {:?}", timeout);
            kill_tree(child);
            break None;
        }
        match rx.recv_timeout(POLL) {
            Ok(chunk) => captured.push(chunk),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => std::thread::sleep(POLL),
        }
    };

    let status = match status {
        Some(status) => status,
        None => {
            child
                .wait()
                .with_context(|| "wait after kill")
                .map_err(ConvertError::Unclassified)?;
            captured.drain(&rx, DRAIN_GRACE);
            return Err(ConvertError::TimedOut {
                secs: timeout.as_secs(),
                stderr: String::from_utf8_lossy(&captured.stderr).into_owned(),
            });
        }
    };

    captured.drain(&rx, DRAIN_GRACE);
    Ok(Output {
        status,
        stdout: captured.stdout,
        stderr: captured.stderr,
    })
}
