//! Engine invocation options and argument construction.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Reference URI kinds the engine may follow while signing or verifying.
///
/// Remote and local file references are never enabled.
pub const ENABLED_REFERENCE_URIS: &str = "empty,same-doc";

/// Element types whose `ID` attribute is declared to the engine by the
/// ID-attribute hack.
pub const ID_ATTR_ELEMENTS: [&str; 3] = [
    "urn:oasis:names:tc:SAML:2.0:protocol:Response",
    "urn:oasis:names:tc:SAML:2.0:assertion:Assertion",
    "urn:oasis:names:tc:SAML:2.0:protocol:AuthnRequest",
];

const STDIN: &str = "/dev/stdin";
const STDOUT: &str = "/dev/stdout";

/// Options for sign and verify runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// DTD file declaring ID attributes.
    pub dtd_file: Option<PathBuf>,
    /// Declare `ID` on the SAML Response, Assertion and AuthnRequest types.
    pub enable_id_attr_hack: bool,
    /// Further `--id-attr` declarations, appended after the hack entries.
    pub id_attrs: Vec<String>,
}

impl ValidationOptions {
    /// Options with the ID-attribute hack enabled.
    #[must_use]
    pub fn id_attr_hack() -> Self {
        Self {
            enable_id_attr_hack: true,
            ..Self::default()
        }
    }

    /// Sets the DTD file.
    #[must_use]
    pub fn with_dtd_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dtd_file = Some(path.into());
        self
    }

    /// Adds an `--id-attr` declaration.
    #[must_use]
    pub fn with_id_attr(mut self, element: impl Into<String>) -> Self {
        self.id_attrs.push(element.into());
        self
    }

    fn push_args(&self, args: &mut Vec<OsString>) {
        if let Some(dtd) = &self.dtd_file {
            args.push("--dtd-file".into());
            args.push(dtd.into());
        }
        if self.enable_id_attr_hack {
            for element in ID_ATTR_ELEMENTS {
                args.push("--id-attr:ID".into());
                args.push(element.into());
            }
        }
        for element in &self.id_attrs {
            args.push("--id-attr:ID".into());
            args.push(element.into());
        }
    }
}

/// Engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Complete a signature template.
    Sign,
    /// Verify a signature.
    Verify,
    /// Complete an encryption template.
    Encrypt,
    /// Decrypt an encrypted element.
    Decrypt,
}

impl Operation {
    /// Returns the operation name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Verify => "verify",
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
        }
    }

    /// Whether a validity error on the diagnostic stream fails the run even
    /// when the engine exits successfully.
    #[must_use]
    pub const fn checks_validity(&self) -> bool {
        matches!(self, Self::Sign | Self::Verify)
    }

    /// Builds the diagnostic text for a failed run.
    ///
    /// Sign and verify report on both streams; encrypt and decrypt only on
    /// the error stream.
    #[must_use]
    pub fn diagnostic_text(&self, stdout: &[u8], stderr: &[u8]) -> String {
        let stderr = String::from_utf8_lossy(stderr);
        if self.checks_validity() {
            format!("{}\n{}", String::from_utf8_lossy(stdout), stderr)
        } else {
            stderr.into_owned()
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single engine invocation with its inputs.
///
/// The document always travels over standard input and the result over
/// standard output.
#[derive(Debug, Clone, Copy)]
pub enum Invocation<'a> {
    /// Sign with a private key.
    Sign {
        /// PEM private key file.
        key: &'a Path,
        /// Validation options.
        options: &'a ValidationOptions,
    },
    /// Verify with a certificate.
    Verify {
        /// PEM certificate file.
        cert: &'a Path,
        /// Validation options.
        options: &'a ValidationOptions,
    },
    /// Encrypt the standard input into a template.
    Encrypt {
        /// PEM certificate of the recipient.
        cert: &'a Path,
        /// Session key specification such as `aes-128-cbc`.
        session_key: &'a str,
        /// Encryption template file.
        template: &'a Path,
    },
    /// Decrypt with a private key.
    Decrypt {
        /// PEM private key file.
        key: &'a Path,
    },
}

impl Invocation<'_> {
    /// Returns the operation performed.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Sign { .. } => Operation::Sign,
            Self::Verify { .. } => Operation::Verify,
            Self::Encrypt { .. } => Operation::Encrypt,
            Self::Decrypt { .. } => Operation::Decrypt,
        }
    }

    /// Builds the engine argument list.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        match *self {
            Self::Sign { key, options } => {
                args.extend([OsString::from("--sign"), "--privkey-pem".into(), key.into()]);
                args.extend([OsString::from("--enabled-reference-uris"), ENABLED_REFERENCE_URIS.into()]);
                options.push_args(&mut args);
                args.extend([OsString::from("--output"), STDOUT.into(), STDIN.into()]);
            }
            Self::Verify { cert, options } => {
                args.extend([OsString::from("--verify"), "--pubkey-cert-pem".into(), cert.into()]);
                args.extend([OsString::from("--enabled-reference-uris"), ENABLED_REFERENCE_URIS.into()]);
                options.push_args(&mut args);
                args.push(STDIN.into());
            }
            Self::Encrypt {
                cert,
                session_key,
                template,
            } => {
                args.extend([OsString::from("--encrypt"), "--session-key".into(), session_key.into()]);
                args.extend([OsString::from("--pubkey-cert-pem"), cert.into()]);
                args.extend([OsString::from("--output"), STDOUT.into()]);
                args.extend([OsString::from("--xml-data"), STDIN.into(), template.into()]);
            }
            Self::Decrypt { key } => {
                args.extend([OsString::from("--decrypt"), "--privkey-pem".into(), key.into()]);
                args.extend([OsString::from("--output"), STDOUT.into(), STDIN.into()]);
            }
        }
        args
    }
}
