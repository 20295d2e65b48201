//! Module collection — resolve, extract, validate, cache.
//!
//! An identifier such as `lockfreequeues.ops` is resolved against the search
//! paths, handed to the `nimdocinfo` extractor, and the JSON payload found
//! between the output markers becomes a [`Module`].

use crate::config::ExtractorConfig;
use crate::error::{CollectionError, Result};
use crate::model::Module;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;
use tracing::{debug, warn};

pub const JSON_START_MARKER: &str = "<<<NIMDOCINFO_JSON_START>>>";
pub const JSON_END_MARKER: &str = "<<<NIMDOCINFO_JSON_END>>>";

const MODULE_REQUIRED: &[&str] = &["module", "file"];
const ENTRY_REQUIRED: &[&str] = &["name", "kind", "line", "signature"];

/// Collects documentation for Nim modules, one extractor run per identifier.
#[derive(Debug)]
pub struct Collector {
    paths: Vec<PathBuf>,
    base_dir: PathBuf,
    extractor: ExtractorConfig,
    cache: HashMap<String, Module>,
}

impl Collector {
    pub fn new(paths: &[String], base_dir: impl Into<PathBuf>, extractor: ExtractorConfig) -> Self {
        Self {
            paths: paths.iter().map(PathBuf::from).collect(),
            base_dir: base_dir.into(),
            extractor,
            cache: HashMap::new(),
        }
    }

    /// Collect documentation for a module identifier.
    ///
    /// Results are cached per identifier for the lifetime of the collector.
    pub fn collect(&mut self, identifier: &str) -> Result<Module> {
        if let Some(module) = self.cache.get(identifier) {
            debug!(identifier, "module cache hit");
            return Ok(module.clone());
        }

        let path = self.resolve_identifier(identifier)?;
        debug!(identifier, path = %path.display(), "collecting");
        let data = self.run_extractor(&path)?;
        let module = parse_module(data)?;

        self.cache.insert(identifier.to_string(), module.clone());
        Ok(module)
    }

    /// Resolve `a.b.c` to `<path>/a/b/c.nim`, falling back to `<path>/c.nim`.
    pub fn resolve_identifier(&self, identifier: &str) -> Result<PathBuf> {
        let rel_path = format!("{}.nim", identifier.replace('.', "/"));
        let filename = format!("{}.nim", identifier.rsplit('.').next().unwrap_or(identifier));

        [rel_path, filename]
            .iter()
            .flat_map(|rel| {
                self.paths
                    .iter()
                    .map(move |search| self.base_dir.join(search).join(rel))
            })
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| CollectionError::NotFound(identifier.to_string()))
    }

    /// Path of the extractor binary, compiling it first when built from source.
    fn extractor_binary(&self) -> Result<PathBuf> {
        match self.extractor.source {
            Some(ref source) => ensure_compiled(
                &self.base_dir.join(source),
                self.extractor.nim(),
                &self.extractor.cache_dir(),
            ),
            None => Ok(self.extractor.command()),
        }
    }

    fn run_extractor(&self, path: &Path) -> Result<Value> {
        let binary = self.extractor_binary()?;

        let output = Command::new(&binary)
            .arg(path)
            .current_dir(&self.base_dir)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    CollectionError::ExtractorMissing(binary.display().to_string())
                }
                _ => CollectionError::Io(e),
            })?;

        if !output.status.success() {
            return Err(CollectionError::Extractor {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                command: format!("{} {}", binary.display(), path.display()),
            });
        }

        extract_json(&String::from_utf8_lossy(&output.stdout), path)
    }
}

/// Compile the extractor into `cache_dir` unless the cached binary is current.
pub fn ensure_compiled(source: &Path, nim: &str, cache_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(cache_dir)?;

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "nimdocinfo".to_string());
    let binary = cache_dir.join(format!("{}{}", stem, std::env::consts::EXE_SUFFIX));

    if !needs_compile(source, &binary) {
        return Ok(binary);
    }

    debug!(source = %source.display(), "compiling extractor (first run can be slow)");
    let output = Command::new(nim)
        .arg("c")
        .arg(format!("--outdir:{}", cache_dir.display()))
        .arg(source)
        .output()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CollectionError::CompilerMissing,
            _ => CollectionError::Io(e),
        })?;

    if !output.status.success() {
        return Err(CollectionError::Compile(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(binary)
}

/// True when the binary is missing or older than any `.nim` file next to `source`.
pub fn needs_compile(source: &Path, binary: &Path) -> bool {
    let Some(built) = modified(binary) else {
        return true;
    };

    let mut sources = vec![source.to_path_buf()];
    if let Some(dir) = source.parent() {
        if let Ok(entries) = fs::read_dir(dir) {
            sources.extend(
                entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "nim")),
            );
        }
    }

    sources
        .iter()
        .filter_map(|p| modified(p))
        .any(|m| m > built)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Pull the JSON payload out from between the extractor's output markers.
///
/// Compiler hints and other noise around the markers are ignored.
pub fn extract_json(stdout: &str, path: &Path) -> Result<Value> {
    let payload = stdout.find(JSON_START_MARKER).and_then(|start| {
        let body = &stdout[start + JSON_START_MARKER.len()..];
        body.find(JSON_END_MARKER).map(|end| &body[..end])
    });

    let Some(payload) = payload else {
        warn!(path = %path.display(), "no JSON markers in extractor output");
        return Err(CollectionError::MissingMarkers {
            path: path.to_path_buf(),
        });
    };

    Ok(serde_json::from_str(payload.trim())?)
}

/// Validate required keys, then deserialize the payload into a [`Module`].
pub fn parse_module(data: Value) -> Result<Module> {
    let missing = missing_keys(&data, MODULE_REQUIRED);
    if !missing.is_empty() {
        return Err(CollectionError::MissingModuleFields(missing));
    }

    if let Some(entries) = data.get("entries").and_then(Value::as_array) {
        for (index, entry) in entries.iter().enumerate() {
            let fields = missing_keys(entry, ENTRY_REQUIRED);
            if !fields.is_empty() {
                return Err(CollectionError::MissingEntryFields { index, fields });
            }
        }
    }

    Ok(serde_json::from_value(data)?)
}

fn missing_keys(value: &Value, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|key| value.get(key).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn collector(dir: &TempDir) -> Collector {
        Collector::new(&["src".to_string()], dir.path(), ExtractorConfig::default())
    }

    #[test]
    fn resolve_simple() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("mymodule.nim"), "## Test module").unwrap();

        let path = collector(&dir).resolve_identifier("mymodule").unwrap();
        assert_eq!(path, src.join("mymodule.nim"));
    }

    #[test]
    fn resolve_nested() {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("src/package");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("submodule.nim"), "## Test module").unwrap();

        let path = collector(&dir).resolve_identifier("package.submodule").unwrap();
        assert_eq!(path, pkg.join("submodule.nim"));
    }

    #[test]
    fn resolve_falls_back_to_filename() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("mymodule.nim"), "## Test").unwrap();

        let path = collector(&dir)
            .resolve_identifier("some.nested.mymodule")
            .unwrap();
        assert_eq!(path, src.join("mymodule.nim"));
    }

    #[test]
    fn resolve_searches_paths_in_order() {
        let dir = TempDir::new().unwrap();
        for p in ["lib", "src"] {
            fs::create_dir(dir.path().join(p)).unwrap();
            fs::write(dir.path().join(p).join("m.nim"), "").unwrap();
        }
        let c = Collector::new(
            &["lib".to_string(), "src".to_string()],
            dir.path(),
            ExtractorConfig::default(),
        );
        assert_eq!(c.resolve_identifier("m").unwrap(), dir.path().join("lib/m.nim"));
    }

    #[test]
    fn resolve_not_found() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();

        let err = collector(&dir).resolve_identifier("nonexistent").unwrap_err();
        assert!(matches!(err, CollectionError::NotFound(_)));
        assert!(err.to_string().contains("could not find Nim file"));
    }

    #[test]
    fn extract_json_between_markers() {
        let stdout = format!(
            "Hint: compiling [Processing]\n{JSON_START_MARKER}{{\"module\": \"test\", \"file\": \"test.nim\", \"entries\": []}}{JSON_END_MARKER}\ntrailing\n"
        );
        let value = extract_json(&stdout, Path::new("test.nim")).unwrap();
        assert_eq!(value["module"], "test");
        assert_eq!(value["entries"], json!([]));
    }

    #[test]
    fn extract_json_missing_markers() {
        let err = extract_json("{\"module\": \"test\"}", Path::new("test.nim")).unwrap_err();
        assert!(err.to_string().contains("could not find JSON markers"));
    }

    #[test]
    fn extract_json_invalid() {
        let stdout = format!("{JSON_START_MARKER}{{invalid json}}{JSON_END_MARKER}");
        let err = extract_json(&stdout, Path::new("test.nim")).unwrap_err();
        assert!(matches!(err, CollectionError::InvalidJson(_)));
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn parse_module_missing_required_fields() {
        let err = parse_module(json!({"module": "test"})).unwrap_err();
        assert_eq!(err.to_string(), "module record missing required fields: file");
    }

    #[test]
    fn parse_module_missing_entry_fields() {
        let err = parse_module(json!({
            "module": "test",
            "file": "test.nim",
            "entries": [{"name": "foo"}]
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Entry 0 missing required fields: kind, line, signature"
        );
    }

    #[test]
    fn parse_module_with_all_fields() {
        let module = parse_module(json!({
            "module": "test",
            "file": "test.nim",
            "doc": "Module doc",
            "entries": [{
                "name": "foo",
                "kind": "proc",
                "line": 10,
                "signature": "proc foo()",
                "doc": "Proc doc",
                "params": [{"name": "x", "type": "int"}],
                "returns": "string",
                "pragmas": ["inline"],
                "raises": ["ValueError"],
                "exported": false
            }]
        }))
        .unwrap();

        assert_eq!(module.module, "test");
        assert_eq!(module.doc, "Module doc");
        let entry = &module.entries[0];
        assert_eq!(entry.name, "foo");
        assert_eq!(entry.params[0].name, "x");
        assert_eq!(entry.params[0].ty, "int");
        assert_eq!(entry.returns, "string");
        assert_eq!(entry.pragmas, ["inline"]);
        assert_eq!(entry.raises, ["ValueError"]);
        assert!(!entry.exported);
    }

    #[test]
    fn parse_module_with_fields_and_values() {
        let module = parse_module(json!({
            "module": "test",
            "file": "test.nim",
            "entries": [
                {
                    "name": "Point", "kind": "type", "line": 1,
                    "signature": "type Point = object",
                    "fields": [
                        {"name": "x", "type": "int", "doc": "X coord", "exported": true, "branch": ""},
                        {"name": "y", "type": "int", "doc": "Y coord", "exported": false, "branch": ""}
                    ]
                },
                {
                    "name": "Color", "kind": "type", "line": 5,
                    "signature": "type Color = enum",
                    "values": [
                        {"name": "Red", "type": "", "doc": "Red color"},
                        {"name": "Green", "type": "1"}
                    ]
                }
            ]
        }))
        .unwrap();

        let point = &module.entries[0];
        assert_eq!(point.fields.len(), 2);
        assert_eq!(point.fields[0].doc, "X coord");
        assert!(!point.fields[1].exported);
        let color = &module.entries[1];
        assert_eq!(color.values[0].name, "Red");
        assert_eq!(color.values[1].ty, "1");
    }

    #[test]
    fn parse_module_wrong_type_is_invalid_json() {
        let err = parse_module(json!({"module": "m", "file": "m.nim", "entries": [
            {"name": "x", "kind": "const", "line": "ten", "signature": "const x = 1"}
        ]}))
        .unwrap_err();
        assert!(matches!(err, CollectionError::InvalidJson(_)));
    }

    #[test]
    fn needs_compile_when_binary_missing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("nimdocinfo.nim");
        fs::write(&source, "").unwrap();
        assert!(needs_compile(&source, &dir.path().join("missing-binary")));
    }

    #[test]
    fn binary_newer_than_sources_is_current() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("nimdocinfo.nim");
        fs::write(&source, "").unwrap();
        let binary = dir.path().join("nimdocinfo");
        fs::write(&binary, "").unwrap();
        let later = SystemTime::now() + std::time::Duration::from_secs(60);
        fs::File::options()
            .write(true)
            .open(&binary)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert!(!needs_compile(&source, &binary));
    }

    #[cfg(unix)]
    fn fake_extractor(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-nimdocinfo");
        fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn collect_runs_extractor_and_caches() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/queue.nim"), "").unwrap();
        let counter = dir.path().join("runs");
        let script = fake_extractor(
            dir.path(),
            &format!(
                "echo run >> '{}'\necho 'Hint: noise'\necho '{JSON_START_MARKER}{{\"module\": \"queue\", \"file\": \"'\"$1\"'\", \"entries\": []}}{JSON_END_MARKER}'",
                counter.display()
            ),
        );

        let mut c = Collector::new(
            &["src".to_string()],
            dir.path(),
            ExtractorConfig {
                command: Some(script),
                ..Default::default()
            },
        );

        let first = c.collect("queue").unwrap();
        assert_eq!(first.module, "queue");
        assert!(first.file.ends_with("queue.nim"));
        let second = c.collect("queue").unwrap();
        assert_eq!(second.module, "queue");
        assert_eq!(fs::read_to_string(&counter).unwrap().lines().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn collect_reports_extractor_failure() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/broken.nim"), "").unwrap();
        let script = fake_extractor(dir.path(), "echo 'Error: undeclared identifier' >&2\nexit 1");

        let mut c = Collector::new(
            &["src".to_string()],
            dir.path(),
            ExtractorConfig {
                command: Some(script),
                ..Default::default()
            },
        );

        let err = c.collect("broken").unwrap_err().to_string();
        assert!(err.contains("nimdocinfo failed"));
        assert!(err.contains("undeclared identifier"));
        assert!(err.contains("To debug, run manually"));
    }

    #[test]
    fn collect_missing_extractor() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/m.nim"), "").unwrap();

        let mut c = Collector::new(
            &["src".to_string()],
            dir.path(),
            ExtractorConfig {
                command: Some(dir.path().join("no-such-extractor")),
                ..Default::default()
            },
        );
        let err = c.collect("m").unwrap_err();
        assert!(matches!(err, CollectionError::ExtractorMissing(_)));
    }
}
