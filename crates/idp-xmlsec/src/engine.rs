//! The security engine capability and its `xmlsec1` implementation.
//!
//! Each call spawns one engine process. The document is written to the
//! child's standard input while standard output and standard error are
//! drained concurrently, so a child that fills one pipe before reading its
//! input cannot deadlock the exchange.

use std::ffi::OsString;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use idp_core::XmlSecConfig;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tracing::{debug, warn};

use crate::classify::{classify, VALIDITY_ERROR_MARKER};
use crate::error::{SecurityError, XmlSecError, XmlSecResult};
use crate::options::{Invocation, ValidationOptions};
use crate::template::EncryptedDataTemplate;

/// Signing, verification, encryption and decryption of XML documents.
#[async_trait]
pub trait SecurityEngine: Send + Sync {
    /// Completes the signature templates in `xml` with the private key.
    async fn sign(
        &self,
        xml: &[u8],
        private_key: &Path,
        options: &ValidationOptions,
    ) -> XmlSecResult<Vec<u8>>;

    /// Verifies the signature in `xml` against the certificate.
    ///
    /// Returns the engine's output on success.
    async fn verify(
        &self,
        xml: &[u8],
        certificate: &Path,
        options: &ValidationOptions,
    ) -> XmlSecResult<Vec<u8>>;

    /// Encrypts `xml` into `template` for the holder of the certificate.
    async fn encrypt(
        &self,
        template: &EncryptedDataTemplate,
        xml: &[u8],
        certificate: &Path,
    ) -> XmlSecResult<Vec<u8>>;

    /// Decrypts the encrypted element in `xml` with the private key.
    async fn decrypt(&self, xml: &[u8], private_key: &Path) -> XmlSecResult<Vec<u8>>;
}

/// The `xmlsec1` command-line engine.
#[derive(Debug, Clone)]
pub struct Xmlsec1 {
    program: PathBuf,
    launcher_args: Vec<OsString>,
    timeout: Option<Duration>,
    temp_dir: Option<PathBuf>,
}

impl Default for Xmlsec1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Xmlsec1 {
    /// Creates an engine running `xmlsec1` from `PATH` without a deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&XmlSecConfig::default())
    }

    /// Creates an engine from configuration.
    #[must_use]
    pub fn from_config(config: &XmlSecConfig) -> Self {
        Self {
            program: config.binary.clone(),
            launcher_args: config.launcher_args.iter().map(OsString::from).collect(),
            timeout: config.timeout(),
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Sets the program to execute.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets arguments placed before the engine arguments.
    #[must_use]
    pub fn with_launcher_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.launcher_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the invocation deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the directory for temporary template files.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Returns the program executed.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn template_file(&self, template: &EncryptedDataTemplate) -> XmlSecResult<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("xmlsec").suffix(".xml");
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(template.to_xml().as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    /// Runs one invocation, feeding `input` on standard input.
    pub async fn run(&self, invocation: &Invocation<'_>, input: &[u8]) -> XmlSecResult<Vec<u8>> {
        let operation = invocation.operation();
        let mut command = Command::new(&self.program);
        command
            .args(&self.launcher_args)
            .args(invocation.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            operation = %operation,
            program = %self.program.display(),
            input_len = input.len(),
            "invoking security engine"
        );

        let mut child = command.spawn().map_err(|source| XmlSecError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        let stdin = child.stdin.take().ok_or(XmlSecError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(XmlSecError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(XmlSecError::MissingPipe("stderr"))?;

        let exchange = async {
            tokio::join!(
                feed(stdin, input),
                drain(stdout),
                drain(stderr),
                child.wait()
            )
        };
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange).await.ok(),
            None => Some(exchange.await),
        };
        let Some((written, stdout, stderr, status)) = outcome else {
            let limit = self.timeout.unwrap_or_default();
            warn!(operation = %operation, ?limit, "security engine timed out, killing it");
            let _ = child.start_kill();
            let _ = child.wait().await;
            return Err(XmlSecError::Timeout(limit));
        };

        let stdout = stdout?;
        let stderr = stderr?;
        let status = status?;
        let invalid = operation.checks_validity() && contains(&stderr, VALIDITY_ERROR_MARKER.as_bytes());

        debug!(
            operation = %operation,
            %status,
            output_len = stdout.len(),
            diagnostic_len = stderr.len(),
            "security engine finished"
        );

        if !status.success() || invalid {
            if stderr.is_empty() {
                written?;
                return Err(XmlSecError::ExitStatus(status));
            }
            let diagnostic = operation.diagnostic_text(&stdout, &stderr);
            return match classify(&diagnostic) {
                None => Ok(stdout),
                Some(kind) => {
                    debug!(operation = %operation, %kind, "security engine reported a failure");
                    Err(SecurityError::new(kind, &diagnostic, stdout).into())
                }
            };
        }

        written?;
        Ok(stdout)
    }
}

#[async_trait]
impl SecurityEngine for Xmlsec1 {
    async fn sign(
        &self,
        xml: &[u8],
        private_key: &Path,
        options: &ValidationOptions,
    ) -> XmlSecResult<Vec<u8>> {
        let invocation = Invocation::Sign {
            key: private_key,
            options,
        };
        self.run(&invocation, xml).await
    }

    async fn verify(
        &self,
        xml: &[u8],
        certificate: &Path,
        options: &ValidationOptions,
    ) -> XmlSecResult<Vec<u8>> {
        let invocation = Invocation::Verify {
            cert: certificate,
            options,
        };
        self.run(&invocation, xml).await
    }

    async fn encrypt(
        &self,
        template: &EncryptedDataTemplate,
        xml: &[u8],
        certificate: &Path,
    ) -> XmlSecResult<Vec<u8>> {
        // Removed when dropped at the end of this call, whatever the outcome.
        let template_file = self.template_file(template)?;
        let invocation = Invocation::Encrypt {
            cert: certificate,
            session_key: template.session_key(),
            template: template_file.path(),
        };
        self.run(&invocation, xml).await
    }

    async fn decrypt(&self, xml: &[u8], private_key: &Path) -> XmlSecResult<Vec<u8>> {
        self.run(&Invocation::Decrypt { key: private_key }, xml).await
    }
}

async fn feed(mut stdin: ChildStdin, input: &[u8]) -> std::io::Result<()> {
    stdin.write_all(input).await?;
    stdin.shutdown().await
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
