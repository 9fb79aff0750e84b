//! Scripted stand-in for the `xmlsec1` engine.
//!
//! The stand-in is a shell script run through `/bin/sh`, passed as the
//! launcher argument, so the engine arguments follow the script path: `$1`
//! is the mode flag and the last argument is the input or template file.

use std::io;
use std::path::{Path, PathBuf};

use idp_core::XmlSecConfig;
use idp_xmlsec::Xmlsec1;
use tempfile::TempDir;

/// Shell used to run stand-in scripts.
pub const SHELL: &str = "/bin/sh";

/// Script body of a working engine.
///
/// Signing prepends an XML declaration and echoes the document. Encryption
/// base64-encodes the document into an `EncryptedData` element and decryption
/// reverses it. Every run records its arguments in `<mode>.args`; encryption
/// also records the template path and a copy of the template.
const ROUND_TRIP: &str = r#"
mode="$1"
for last in "$@"; do :; done
printf '%s\n' "$@" > "$dir/${mode#--}.args"
case "$mode" in
--sign)
    printf '<?xml version="1.0"?>\n'
    cat
    ;;
--encrypt)
    printf '%s' "$last" > "$dir/template.path"
    cp "$last" "$dir/template.xml"
    printf '<?xml version="1.0"?>\n<xenc:EncryptedData xmlns:xenc="http://www.w3.org/2001/04/xmlenc#">'
    base64 | tr -d '\n'
    printf '</xenc:EncryptedData>\n'
    ;;
--decrypt)
    sed -e 's/<[^>]*>//g' | tr -d ' \n' | base64 -d
    ;;
*)
    cat >/dev/null
    echo "unsupported mode $mode" >&2
    exit 2
    ;;
esac
"#;

/// A stand-in engine script in its own scratch directory.
///
/// The directory also receives the engine's temporary template files and
/// the records the script writes. Everything is removed on drop.
#[derive(Debug)]
pub struct StandInEngine {
    dir: TempDir,
    script: PathBuf,
}

impl StandInEngine {
    /// Writes a stand-in running `body`.
    ///
    /// `$dir` is set to the scratch directory before `body` runs.
    pub fn new(body: &str) -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let script = dir.path().join("engine.sh");
        let prelude = format!("dir='{}'\n", dir.path().display());
        std::fs::write(&script, prelude + body)?;
        Ok(Self { dir, script })
    }

    /// Writes a stand-in behaving like a working engine.
    pub fn round_trip() -> io::Result<Self> {
        Self::new(ROUND_TRIP)
    }

    /// Returns the scratch directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the path of a record written by the script.
    #[must_use]
    pub fn record(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Reads the arguments recorded for a mode such as `sign`.
    pub fn recorded_args(&self, mode: &str) -> io::Result<Vec<String>> {
        let args = std::fs::read_to_string(self.record(&format!("{mode}.args")))?;
        Ok(args.lines().map(str::to_string).collect())
    }

    /// Returns engine configuration running this stand-in.
    #[must_use]
    pub fn config(&self) -> XmlSecConfig {
        XmlSecConfig {
            binary: PathBuf::from(SHELL),
            launcher_args: vec![self.script.display().to_string()],
            timeout_secs: None,
            temp_dir: Some(self.dir.path().to_path_buf()),
        }
    }

    /// Returns an engine running this stand-in.
    #[must_use]
    pub fn engine(&self) -> Xmlsec1 {
        Xmlsec1::from_config(&self.config())
    }
}
