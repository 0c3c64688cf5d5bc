//! Pipeline tests
//!
//! These tests drive the full synthesize -> expand -> extract flow with
//! stand-in expanders, so they run without clang or the macOS SDK.

use super::*;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::fs;
use std::io;
use tempfile::TempDir;

const EXPANDED: &str = r#"
# 1 "fourcc-1.c"
# 1 "/SDK/CoreMedia.framework/Headers/CMFormatDescription.h" 1
typedef FourCharCode CMPixelFormatType;
enum {
 kCMPixelFormat_32ARGB = 32,
 kCMPixelFormat_32BGRA = 'BGRA',
};
enum {
 kCMVideoCodecType_H264 = 'avc1',
};
enum { SOME_OTHER_CONST = 'notf' };
"#;

/// Writes fixed text as the expanded output and remembers the unit it saw
struct FixedExpander {
    text: Vec<u8>,
    seen_source: RefCell<Option<String>>,
}

impl FixedExpander {
    fn new(text: &str) -> Self {
        Self {
            text: text.as_bytes().to_vec(),
            seen_source: RefCell::new(None),
        }
    }
}

impl MacroExpander for FixedExpander {
    fn expand(&self, source: &Path, dest: &Path) -> std::result::Result<PreprocessResult, PreprocessError> {
        *self.seen_source.borrow_mut() = fs::read_to_string(source).ok();
        fs::write(dest, &self.text).map_err(|source| PreprocessError::Spawn {
            path: PathBuf::from("fixed"),
            source,
        })?;
        Ok(PreprocessResult {
            output: dest.to_path_buf(),
            warnings: vec!["warning: test".to_string()],
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Leaves a partial output behind, then fails like a missing header would
struct FailingExpander;

impl MacroExpander for FailingExpander {
    fn expand(&self, _source: &Path, dest: &Path) -> std::result::Result<PreprocessResult, PreprocessError> {
        let _ = fs::write(dest, "# 1 \"partial\"\n");
        Err(PreprocessError::Spawn {
            path: PathBuf::from("clang"),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                "fatal error: 'CoreMediaIO/CMIOHardware.h' file not found",
            ),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Reports success without producing any output
struct SilentExpander;

impl MacroExpander for SilentExpander {
    fn expand(&self, _source: &Path, dest: &Path) -> std::result::Result<PreprocessResult, PreprocessError> {
        Ok(PreprocessResult {
            output: dest.to_path_buf(),
            warnings: Vec::new(),
        })
    }

    fn name(&self) -> &str {
        "silent"
    }
}

fn config_in(dir: &TempDir) -> Config {
    Config {
        work_dir: dir.path().to_path_buf(),
        ..Default::default()
    }
}

fn assert_no_artifacts<E: MacroExpander>(pipeline: &Pipeline<E>) {
    let (source, expanded) = pipeline.artifact_paths();
    assert!(!source.exists(), "{:?} was left behind", source);
    assert!(!expanded.exists(), "{:?} was left behind", expanded);
}

#[test]
fn test_pipeline_extracts_known_constants() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(FixedExpander::new(EXPANDED), &config_in(&dir)).unwrap();

    let entries = pipeline.run().unwrap();
    let json = serde_json::to_string(&entries).unwrap();

    assert_eq!(
        json,
        concat!(
            r#"[{"constantName":"kCMPixelFormat_32BGRA","fourCC":"BGRA","rawValue":1111970369},"#,
            r#"{"constantName":"kCMVideoCodecType_H264","fourCC":"avc1","rawValue":1635148593}]"#
        )
    );
}

#[test]
fn test_pipeline_feeds_synthesized_unit() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.headers = vec!["CoreMedia/CMFormatDescription.h".to_string()];
    let pipeline = Pipeline::new(FixedExpander::new(""), &config).unwrap();

    let entries = pipeline.run().unwrap();

    assert!(entries.is_empty());
    assert_eq!(
        pipeline.expander().seen_source.borrow().as_deref(),
        Some("#include <CoreMedia/CMFormatDescription.h>\n")
    );
}

#[test]
fn test_pipeline_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(FixedExpander::new(EXPANDED), &config_in(&dir)).unwrap();

    let first = serde_json::to_string(&pipeline.run().unwrap()).unwrap();
    let second = serde_json::to_string(&pipeline.run().unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_cleanup_after_success() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(FixedExpander::new(EXPANDED), &config_in(&dir)).unwrap();

    pipeline.run().unwrap();

    assert_no_artifacts(&pipeline);
    assert!(pipeline.expander().seen_source.borrow().is_some());
}

#[test]
fn test_cleanup_after_preprocess_failure() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(FailingExpander, &config_in(&dir)).unwrap();

    let err = pipeline.run().unwrap_err();

    assert!(matches!(err, ParserError::Preprocess(_)));
    assert!(err.to_string().contains("CMIOHardware.h"));
    assert_no_artifacts(&pipeline);
}

#[test]
fn test_missing_output_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(SilentExpander, &config_in(&dir)).unwrap();

    let err = pipeline.run().unwrap_err();

    assert!(matches!(err, ParserError::ReadExpanded { .. }));
    assert_no_artifacts(&pipeline);
}

#[test]
fn test_unwritable_work_dir_is_a_synthesis_error() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        work_dir: dir.path().join("does-not-exist"),
        ..Default::default()
    };
    let pipeline = Pipeline::new(FixedExpander::new(EXPANDED), &config).unwrap();

    let err = pipeline.run().unwrap_err();

    assert!(matches!(err, ParserError::Synthesis { .. }));
    assert!(pipeline.expander().seen_source.borrow().is_none());
}

#[test]
fn test_cleanup_tolerates_missing_files() {
    let dir = TempDir::new().unwrap();
    let artifacts = TempArtifacts::in_dir(dir.path());
    fs::write(artifacts.source(), "int x;").unwrap();
    let source = artifacts.source().to_path_buf();

    drop(artifacts);

    assert!(!source.exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.extract.prefixes.clear();

    let err = Pipeline::new(SilentExpander, &config).err().unwrap();
    assert!(matches!(err, ParserError::Config(_)));
}

#[test]
fn test_custom_prefixes_flow_through() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.extract.prefixes = vec!["SOME_".to_string()];
    let pipeline = Pipeline::new(FixedExpander::new(EXPANDED), &config).unwrap();

    let entries = pipeline.run().unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].constant_name(), "SOME_OTHER_CONST");
}

/// First C preprocessor on this host that answers `--version`
fn host_preprocessor() -> Option<PathBuf> {
    ["clang", "gcc", "cc"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| ClangPreprocessor::with_path(path.clone()).is_available())
}

/// Stand-in for the three framework headers under a plain include dir
fn write_fake_headers(root: &Path) {
    let write = |rel: &str, text: &str| {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    };

    write(
        "CoreMedia/CMFormatDescription.h",
        "#define CM_FOURCC(code) code\n\
         enum {\n\
         \tkCMPixelFormat_24RGB = 24,\n\
         \tkCMPixelFormat_32BGRA = CM_FOURCC('BGRA'),\n\
         };\n\
         enum { kCMVideoCodecType_H264 = 'avc1' };\n",
    );
    write(
        "CoreMediaIO/CMIOHardware.h",
        "enum { kCMIOObjectPropertyClass = 'clas' };\n\
         enum { SOME_OTHER_CONST = 'notf' };\n",
    );
    write(
        "IOKit/audio/IOAudioTypes.h",
        "enum { kIOAudioDeviceTransportTypeUSB = 'usb ' };\n\
         #ifdef FOURCC_EXTRA_TRANSPORTS\n\
         enum { kIOAudioDeviceTransportTypeFireWire = '1394' };\n\
         #endif\n",
    );
}

fn host_config(preprocessor: PathBuf, include_dir: &Path, work_dir: &Path) -> Config {
    let mut config = Config {
        work_dir: work_dir.to_path_buf(),
        ..Default::default()
    };
    config.preprocessor.clang_path = Some(preprocessor);
    config.preprocessor.include_dirs = vec![include_dir.to_path_buf()];
    config.preprocessor.defines = vec!["FOURCC_EXTRA_TRANSPORTS".to_string()];
    config
}

#[test]
fn test_build_database_with_host_preprocessor() {
    let Some(preprocessor) = host_preprocessor() else {
        eprintln!("no C preprocessor on this host, skipping");
        return;
    };
    let headers = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_fake_headers(headers.path());

    let entries = build_database(&host_config(preprocessor, headers.path(), work.path())).unwrap();
    let found: Vec<(&str, u32)> = entries
        .iter()
        .map(|e| (e.constant_name(), e.raw_value()))
        .collect();

    assert_eq!(
        found,
        vec![
            ("kCMPixelFormat_32BGRA", 1111970369),
            ("kCMVideoCodecType_H264", 1635148593),
            ("kCMIOObjectPropertyClass", u32::from_be_bytes(*b"clas")),
            ("kIOAudioDeviceTransportTypeUSB", 1970496032),
            ("kIOAudioDeviceTransportTypeFireWire", u32::from_be_bytes(*b"1394")),
        ]
    );
    assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_header_fails_with_preprocessor_diagnostic() {
    let Some(preprocessor) = host_preprocessor() else {
        eprintln!("no C preprocessor on this host, skipping");
        return;
    };
    let headers = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_fake_headers(headers.path());
    fs::remove_file(headers.path().join("IOKit/audio/IOAudioTypes.h")).unwrap();

    let err = build_database(&host_config(preprocessor, headers.path(), work.path())).unwrap_err();

    match &err {
        ParserError::Preprocess(PreprocessError::PreprocessFailed { status, stderr }) => {
            assert!(!status.success());
            assert!(stderr.contains("IOAudioTypes.h"), "stderr was: {}", stderr);
        }
        other => panic!("expected a preprocessor failure, got {:?}", other),
    }
    assert!(err.to_string().contains("IOAudioTypes.h"));
    assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
}

/// Runs the real preprocessor against the installed SDK headers
#[test]
#[ignore]
#[cfg(target_os = "macos")]
fn test_build_database_with_sdk() {
    let dir = TempDir::new().unwrap();
    let entries = build_database(&config_in(&dir)).unwrap();

    assert!(entries
        .iter()
        .any(|e| e.constant_name() == "kCMVideoCodecType_H264" && e.raw_value() == 1635148593));
}
