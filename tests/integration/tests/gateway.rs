//! Security gateway integration tests.
//!
//! Each test runs the engine protocol against a stand-in script: argument
//! construction, concurrent stream handling, diagnostic classification and
//! the waiver policy.

use std::path::Path;
use std::time::{Duration, Instant};

use idp_integration_tests::StandInEngine;
use idp_xmlsec::{
    EncryptedDataTemplate, ExceptionPolicy, Operation, SecurityEngine, SecurityErrorKind, SecurityOpts,
    ValidationOptions, XmlSecError, Xmlsec1,
};

use crate::common::init_tracing;

const KEY: &str = "/keys/idp-key.pem";
const CERT: &str = "/keys/sp-cert.pem";

fn waive_all() -> ExceptionPolicy {
    ExceptionPolicy::new(SecurityOpts {
        allow_self_signed_cert: true,
        trust_unknown_authority: true,
    })
}

/// Tests that a 1 MiB document and 1 MiB of diagnostics cannot deadlock the
/// exchange.
#[tokio::test]
async fn test_large_streams_do_not_deadlock() -> anyhow::Result<()> {
    init_tracing();
    let standin = StandInEngine::new("head -c 1048576 /dev/zero | tr '\\000' e >&2\ncat\n")?;
    let input = vec![b'x'; 1 << 20];

    let output = tokio::time::timeout(
        Duration::from_secs(30),
        standin.engine().decrypt(&input, Path::new(KEY)),
    )
    .await??;

    assert_eq!(output.len(), input.len());
    assert!(output == input, "engine output must be the document it was fed");
    Ok(())
}

/// Tests that sign and verify fail on a validity error even when the engine
/// exits successfully.
#[tokio::test]
async fn test_validity_error_fails_despite_success_exit() -> anyhow::Result<()> {
    init_tracing();
    let standin = StandInEngine::new(
        "cat\necho 'func=xmlSecDSigCtxProcessNode:validity error: ID attribute not found' >&2\nexit 0\n",
    )?;
    let engine = standin.engine();
    let options = ValidationOptions::id_attr_hack();

    let err = engine.sign(b"<doc/>", Path::new(KEY), &options).await.unwrap_err();
    assert_eq!(err.security_kind(), Some(SecurityErrorKind::ValidityError));
    assert!(ExceptionPolicy::new(SecurityOpts::default()).gate(Operation::Sign, Err(err)).is_err());

    let err = engine.verify(b"<doc/>", Path::new(CERT), &options).await.unwrap_err();
    assert_eq!(err.security_kind(), Some(SecurityErrorKind::ValidityError));
    assert!(waive_all().is_security_exception(&err));

    let decrypted = engine.decrypt(b"<doc/>", Path::new(KEY)).await?;
    assert_eq!(decrypted, b"<doc/>");
    Ok(())
}

/// Tests that trust failures carry the partial output and are waived only
/// by their own setting.
#[tokio::test]
async fn test_trust_failures_follow_waivers() -> anyhow::Result<()> {
    init_tracing();
    let self_signed = StandInEngine::new(
        "cat\necho 'func=xmlSecOpenSSLX509StoreVerify:err=18 msg=self signed certificate' >&2\nexit 1\n",
    )?;
    let unknown_issuer = StandInEngine::new(
        "cat\necho 'func=xmlSecOpenSSLX509StoreVerify:err=20 msg=unable to get local issuer certificate' >&2\nexit 1\n",
    )?;
    let options = ValidationOptions::id_attr_hack();

    let err = self_signed
        .engine()
        .sign(b"<signed/>", Path::new(KEY), &options)
        .await
        .unwrap_err();
    assert_eq!(err.security_kind(), Some(SecurityErrorKind::SelfSignedCertificate));
    match &err {
        XmlSecError::Security(security) => assert_eq!(security.output(), b"<signed/>"),
        other => panic!("expected a security error, got {other:?}"),
    }
    let strict = ExceptionPolicy::new(SecurityOpts {
        allow_self_signed_cert: false,
        trust_unknown_authority: true,
    });
    assert!(strict.is_security_exception(&err));
    let waived = ExceptionPolicy::new(SecurityOpts {
        allow_self_signed_cert: true,
        trust_unknown_authority: false,
    })
    .gate(Operation::Sign, Err(err))?;
    assert_eq!(waived, b"<signed/>");

    let err = unknown_issuer
        .engine()
        .sign(b"<signed/>", Path::new(KEY), &options)
        .await
        .unwrap_err();
    assert_eq!(err.security_kind(), Some(SecurityErrorKind::UnknownIssuer));
    assert!(strict.gate(Operation::Sign, Err(err)).is_ok());
    Ok(())
}

/// Tests that a signature failure outranks trust markers and is never
/// waived.
#[tokio::test]
async fn test_signature_failure_is_never_waived() -> anyhow::Result<()> {
    init_tracing();
    let standin = StandInEngine::new(
        "cat >/dev/null\necho 'msg=self signed certificate' >&2\necho 'func=xmlSecDSigCtxVerify:status=signature failed' >&2\nexit 1\n",
    )?;
    let err = standin
        .engine()
        .verify(b"<doc/>", Path::new(CERT), &ValidationOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.security_kind(), Some(SecurityErrorKind::SignatureFailure));
    assert!(waive_all().gate(Operation::Verify, Err(err)).is_err());
    Ok(())
}

/// Tests failures that carry no recognizable diagnostic.
#[tokio::test]
async fn test_unclassified_and_silent_failures() -> anyhow::Result<()> {
    init_tracing();
    let noisy = StandInEngine::new("cat >/dev/null\necho 'Error: failed to load private key' >&2\nexit 1\n")?;
    let err = noisy.engine().decrypt(b"<doc/>", Path::new(KEY)).await.unwrap_err();
    assert_eq!(err.security_kind(), Some(SecurityErrorKind::Unclassified));
    assert!(err.to_string().starts_with("xmlsec: "));

    let silent = StandInEngine::new("cat >/dev/null\nexit 3\n")?;
    let err = silent.engine().decrypt(b"<doc/>", Path::new(KEY)).await.unwrap_err();
    match err {
        XmlSecError::ExitStatus(status) => assert_eq!(status.code(), Some(3)),
        other => panic!("expected an exit status error, got {other:?}"),
    }
    Ok(())
}

/// Tests that a missing engine is an invocation failure, not a security
/// error.
#[tokio::test]
async fn test_missing_engine_is_not_classified() {
    init_tracing();
    let err = Xmlsec1::new()
        .with_program("/nonexistent/xmlsec1")
        .sign(b"<doc/>", Path::new(KEY), &ValidationOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, XmlSecError::Spawn { .. }));
    assert_eq!(err.security_kind(), None);
    assert!(waive_all().gate(Operation::Sign, Err(err)).is_err());
}

/// Tests that a hung engine is killed at the deadline.
#[tokio::test]
async fn test_deadline_kills_hung_engine() -> anyhow::Result<()> {
    init_tracing();
    let standin = StandInEngine::new("exec sleep 10\n")?;
    let engine = standin.engine().with_timeout(Some(Duration::from_millis(200)));

    let started = Instant::now();
    let err = engine.decrypt(b"", Path::new(KEY)).await.unwrap_err();
    assert!(matches!(err, XmlSecError::Timeout(limit) if limit == Duration::from_millis(200)));
    assert!(started.elapsed() < Duration::from_secs(5));
    Ok(())
}

/// Tests the arguments handed to the engine for signing.
#[tokio::test]
async fn test_sign_arguments_restrict_references() -> anyhow::Result<()> {
    init_tracing();
    let standin = StandInEngine::round_trip()?;
    let options = ValidationOptions::id_attr_hack().with_dtd_file("/etc/idp/saml.dtd");
    standin.engine().sign(b"<doc/>", Path::new(KEY), &options).await?;

    let args = standin.recorded_args("sign")?;
    assert_eq!(&args[..3], ["--sign", "--privkey-pem", KEY]);
    let uris = args
        .iter()
        .position(|a| a == "--enabled-reference-uris")
        .map(|i| args[i + 1].as_str());
    assert_eq!(uris, Some("empty,same-doc"));
    assert!(args.iter().all(|a| !a.contains("local") && !a.contains("remote")));
    assert!(args.contains(&"/etc/idp/saml.dtd".to_string()));
    assert_eq!(args.iter().filter(|a| *a == "--id-attr:ID").count(), 3);
    assert!(args.contains(&"urn:oasis:names:tc:SAML:2.0:assertion:Assertion".to_string()));
    Ok(())
}

/// Tests that encrypting then decrypting returns the original document and
/// that the template file is gone afterwards.
#[tokio::test]
async fn test_encrypt_decrypt_round_trip() -> anyhow::Result<()> {
    init_tracing();
    let standin = StandInEngine::round_trip()?;
    let engine = standin.engine();
    let document = br#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="id-1">Ada &amp; friends</saml:Assertion>"#;

    let encrypted = engine
        .encrypt(&EncryptedDataTemplate::default(), document, Path::new(CERT))
        .await?;
    let encrypted = String::from_utf8(encrypted)?;
    let payload = encrypted
        .trim()
        .strip_prefix(r#"<?xml version="1.0"?>"#)
        .unwrap_or(&encrypted)
        .trim();
    assert!(payload.starts_with("<xenc:EncryptedData"));

    let decrypted = engine.decrypt(payload.as_bytes(), Path::new(KEY)).await?;
    assert_eq!(decrypted, document);

    let template_path = std::fs::read_to_string(standin.record("template.path"))?;
    assert!(template_path.starts_with(&standin.dir().display().to_string()));
    assert!(!Path::new(&template_path).exists());
    let template = std::fs::read_to_string(standin.record("template.xml"))?;
    assert!(template.contains("http://www.w3.org/2001/04/xmlenc#aes128-cbc"));
    assert!(template.contains("http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p"));

    let args = standin.recorded_args("encrypt")?;
    assert_eq!(&args[..3], ["--encrypt", "--session-key", "aes-128-cbc"]);
    Ok(())
}

/// Tests that the template file is removed when encryption fails.
#[tokio::test]
async fn test_template_removed_on_failure() -> anyhow::Result<()> {
    init_tracing();
    let standin = StandInEngine::new(
        "for last in \"$@\"; do :; done\nprintf '%s' \"$last\" > \"$dir/template.path\"\ncat >/dev/null\necho 'failed to encrypt data' >&2\nexit 1\n",
    )?;
    let err = standin
        .engine()
        .encrypt(&EncryptedDataTemplate::default(), b"<doc/>", Path::new(CERT))
        .await
        .unwrap_err();
    assert_eq!(err.security_kind(), Some(SecurityErrorKind::Unclassified));

    let template_path = std::fs::read_to_string(standin.record("template.path"))?;
    assert!(!template_path.is_empty());
    assert!(!Path::new(&template_path).exists());
    Ok(())
}
