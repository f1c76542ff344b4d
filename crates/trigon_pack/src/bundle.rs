use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::descriptor::{BuildDescriptor, PackError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emitted {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub emitted: Vec<Emitted>,
}

/// Write the entry script and copy every asset into the output directory.
///
/// All inputs are checked before anything is written, so a failing
/// descriptor leaves the output directory untouched.
pub fn bundle(desc: &BuildDescriptor) -> Result<BuildReport, PackError> {
    let plan = plan(desc)?;

    fs::create_dir_all(&desc.output.path).map_err(|source| PackError::Write {
        path: desc.output.path.clone(),
        source,
    })?;

    let mut emitted = Vec::with_capacity(plan.len());
    for (src, dst) in plan {
        let bytes = fs::copy(&src, &dst).map_err(|source| PackError::Write {
            path: dst.clone(),
            source,
        })?;
        debug!(from = %src.display(), to = %dst.display(), bytes, "emitted");
        emitted.push(Emitted { path: dst, bytes });
    }

    info!(
        out = %desc.output.path.display(),
        files = emitted.len(),
        "bundle written"
    );
    Ok(BuildReport {
        output_dir: desc.output.path.clone(),
        emitted,
    })
}

/// Whether `dst` already is `src`. A destination that does not exist yet
/// cannot be.
fn same_file(src: &Path, dst: &Path) -> bool {
    match (fs::canonicalize(src), fs::canonicalize(dst)) {
        (Ok(src), Ok(dst)) => src == dst,
        _ => false,
    }
}

/// Source/destination pairs, entry first.
fn plan(desc: &BuildDescriptor) -> Result<Vec<(PathBuf, PathBuf)>, PackError> {
    if !desc.entry.exists() {
        return Err(PackError::MissingEntry(desc.entry.clone()));
    }
    if !desc.entry.is_file() {
        return Err(PackError::EntryNotFile(desc.entry.clone()));
    }

    let filename = desc.output.filename.as_str();
    if Path::new(filename).file_name() != Some(OsStr::new(filename)) {
        return Err(PackError::InvalidFilename(filename.to_string()));
    }

    let mut names = HashSet::new();
    names.insert(filename.to_string());
    let mut plan = vec![(desc.entry.clone(), desc.output_file())];

    for asset in &desc.copy {
        if !asset.is_file() {
            return Err(PackError::MissingAsset(asset.clone()));
        }
        let name = asset
            .file_name()
            .ok_or_else(|| PackError::AssetNameless(asset.clone()))?;
        let name = name.to_string_lossy().into_owned();
        if !names.insert(name.clone()) {
            return Err(PackError::DuplicateOutput(name));
        }
        plan.push((asset.clone(), desc.output.path.join(name)));
    }

    // `fs::copy` truncates the destination before reading the source.
    if let Some((src, _)) = plan.iter().find(|(src, dst)| same_file(src, dst)) {
        return Err(PackError::SourceIsOutput(src.clone()));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_JS: &str = "import('../pkg')\n    .then(wasm => wasm.Scene.new().draw());\n";
    const INDEX_HTML: &str = "<!doctype html>\n<canvas id=\"canvas\"></canvas>\n<script src=\"main.js\"></script>\n";

    fn fixture() -> (tempfile::TempDir, BuildDescriptor) {
        let dir = tempfile::tempdir().unwrap();
        let static_dir = dir.path().join("static");
        fs::create_dir(&static_dir).unwrap();
        fs::write(static_dir.join("main.js"), MAIN_JS).unwrap();
        fs::write(static_dir.join("index.html"), INDEX_HTML).unwrap();

        let mut desc = BuildDescriptor::new("static/main.js");
        desc.copy.push(PathBuf::from("static/index.html"));
        let desc = desc.resolve(dir.path());
        (dir, desc)
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn emits_script_and_one_asset_only() {
        let (dir, desc) = fixture();

        let report = bundle(&desc).unwrap();

        let out = dir.path().join("dist");
        assert_eq!(report.output_dir, out);
        assert_eq!(listing(&out), vec!["index.html", "main.js"]);
        assert_eq!(fs::read_to_string(out.join("main.js")).unwrap(), MAIN_JS);
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), INDEX_HTML);
        assert_eq!(report.emitted.len(), 2);
        assert_eq!(report.emitted[0].path, out.join("main.js"));
        assert_eq!(report.emitted[0].bytes, MAIN_JS.len() as u64);
    }

    #[test]
    fn custom_filename_is_honored() {
        let (dir, mut desc) = fixture();
        desc.output.filename = "bundle.js".to_string();

        bundle(&desc).unwrap();

        assert_eq!(
            listing(&dir.path().join("dist")),
            vec!["bundle.js", "index.html"]
        );
    }

    #[test]
    fn rebundling_overwrites_in_place() {
        let (dir, desc) = fixture();
        bundle(&desc).unwrap();
        let second = bundle(&desc).unwrap();
        assert_eq!(second.emitted.len(), 2);
        assert_eq!(listing(&dir.path().join("dist")).len(), 2);
    }

    #[test]
    fn missing_entry_writes_nothing() {
        let (dir, mut desc) = fixture();
        desc.entry = dir.path().join("static/absent.js");

        let err = bundle(&desc).unwrap_err();

        assert!(matches!(err, PackError::MissingEntry(_)));
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn directory_entry_is_rejected() {
        let (dir, mut desc) = fixture();
        desc.entry = dir.path().join("static");
        assert!(matches!(bundle(&desc), Err(PackError::EntryNotFile(_))));
    }

    #[test]
    fn asset_colliding_with_script_is_rejected() {
        let (dir, mut desc) = fixture();
        desc.copy.push(dir.path().join("static/main.js"));

        match bundle(&desc) {
            Err(PackError::DuplicateOutput(name)) => assert_eq!(name, "main.js"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn nested_filename_is_rejected() {
        let (_dir, mut desc) = fixture();
        desc.output.filename = "js/main.js".to_string();
        assert!(matches!(bundle(&desc), Err(PackError::InvalidFilename(_))));
    }

    #[test]
    fn output_into_source_dir_keeps_entry_intact() {
        let (dir, mut desc) = fixture();
        let static_dir = dir.path().join("static");
        desc.output.path = static_dir.clone();

        match bundle(&desc) {
            Err(PackError::SourceIsOutput(path)) => assert_eq!(path, static_dir.join("main.js")),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(fs::read_to_string(static_dir.join("main.js")).unwrap(), MAIN_JS);
        assert_eq!(fs::read_to_string(static_dir.join("index.html")).unwrap(), INDEX_HTML);
    }

    #[test]
    fn asset_already_in_output_dir_is_rejected() {
        let (dir, mut desc) = fixture();
        desc.output.path = dir.path().join("static");
        desc.output.filename = "bundle.js".to_string();

        match bundle(&desc) {
            Err(PackError::SourceIsOutput(path)) => {
                assert_eq!(path, dir.path().join("static/index.html"))
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(
            fs::read_to_string(dir.path().join("static/index.html")).unwrap(),
            INDEX_HTML
        );
        assert!(!dir.path().join("static/bundle.js").exists());
    }

    #[test]
    fn web_crate_packages_the_init_bootstrap() {
        let web = Path::new(env!("CARGO_MANIFEST_DIR")).join("../trigon_web");
        let out = tempfile::tempdir().unwrap();
        let mut desc = BuildDescriptor::load(&web.join("pack.json")).unwrap();
        desc.output.path = out.path().to_path_buf();

        bundle(&desc).unwrap();

        let script = fs::read_to_string(out.path().join("main.js")).unwrap();
        assert!(script.contains("from './pkg/trigon_web.js'"));
        assert!(script.contains("await init()"));
        let page = fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(page.contains(r#"<script type="module" src="main.js">"#));
    }

    #[test]
    fn missing_asset_is_reported() {
        let (dir, mut desc) = fixture();
        desc.copy = vec![dir.path().join("static/favicon.ico")];
        assert!(matches!(bundle(&desc), Err(PackError::MissingAsset(_))));
    }
}
