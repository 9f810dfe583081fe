use anyhow::Context;
use clap::Subcommand;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use worktime_offline::{
    shared, CacheManifest, CacheStorage, DirNetwork, Network, Registration, Request, Served,
    ServedFrom, SharedStorage, UnreachableNetwork, UpdateOutcome,
};
use worktime_store::{Config, WorktimePaths};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum OfflineCmd {
    /// Install and activate the manifest's version from an origin directory
    Install {
        /// Directory served as the origin
        #[arg(long)]
        origin: PathBuf,
        /// Manifest JSON (default: config `manifest`, then the built-in app shell)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Fetch one URL, cache first
    Fetch {
        url: String,
        /// Origin directory for cache misses (omit to behave as offline)
        #[arg(long)]
        origin: Option<PathBuf>,
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// List stored cache versions
    Versions {
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

// ── Dispatch ──

pub fn run(cmd: OfflineCmd, paths: &WorktimePaths) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    match cmd {
        OfflineCmd::Install { origin, manifest } => {
            match rt.block_on(install(paths, origin, manifest.as_deref()))? {
                UpdateOutcome::AlreadyActive { version } => {
                    println!("{version} is already active");
                }
                UpdateOutcome::Activated { version, deleted } => {
                    println!("Activated {version}");
                    for old in deleted {
                        println!("  deleted {old}");
                    }
                }
            }
            Ok(())
        }
        OfflineCmd::Fetch {
            url,
            origin,
            manifest,
        } => {
            let served = rt.block_on(fetch(paths, &url, origin, manifest.as_deref()))?;
            let from = match served.from {
                ServedFrom::Cache => "cache",
                ServedFrom::Network => "network",
            };
            eprintln!("{} {} (from {from})", served.response.status, url);
            std::io::stdout().write_all(&served.response.body)?;
            Ok(())
        }
        OfflineCmd::Versions { manifest } => {
            let (versions, active) = rt.block_on(versions(paths, manifest.as_deref()))?;
            if versions.is_empty() {
                println!("(no cached versions)");
            }
            for v in versions {
                let marker = if active.as_deref() == Some(v.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {v}");
            }
            Ok(())
        }
    }
}

// ── Helpers ──

/// Explicit path, then config `manifest`, then the built-in app shell.
fn load_manifest(paths: &WorktimePaths, explicit: Option<&Path>) -> anyhow::Result<CacheManifest> {
    let configured = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Config::load(&paths.config_json)?.manifest_path(),
    };
    match configured {
        Some(path) => CacheManifest::load(&path)
            .with_context(|| format!("loading manifest {}", path.display())),
        None => Ok(CacheManifest::default()),
    }
}

fn open_storage(paths: &WorktimePaths) -> anyhow::Result<SharedStorage> {
    let storage = CacheStorage::open_dir(&paths.cache_dir)
        .with_context(|| format!("opening cache at {}", paths.cache_dir.display()))?;
    Ok(shared(storage))
}

fn network_for(origin: Option<PathBuf>) -> Arc<dyn Network> {
    match origin {
        Some(root) => Arc::new(DirNetwork::new(root)),
        None => Arc::new(UnreachableNetwork),
    }
}

async fn open_registration(
    paths: &WorktimePaths,
    origin: Option<PathBuf>,
    manifest: &CacheManifest,
) -> anyhow::Result<Registration> {
    let storage = open_storage(paths)?;
    Ok(Registration::restore(storage, network_for(origin), manifest).await)
}

// ── Command Implementations ──

/// `worktime offline install --origin <dir>`
async fn install(
    paths: &WorktimePaths,
    origin: PathBuf,
    manifest: Option<&Path>,
) -> anyhow::Result<UpdateOutcome> {
    let manifest = load_manifest(paths, manifest)?;
    let mut registration = open_registration(paths, Some(origin), &manifest).await?;
    Ok(registration.update(manifest).await?)
}

/// `worktime offline fetch <url>`
async fn fetch(
    paths: &WorktimePaths,
    url: &str,
    origin: Option<PathBuf>,
    manifest: Option<&Path>,
) -> anyhow::Result<Served> {
    let manifest = load_manifest(paths, manifest)?;
    let registration = open_registration(paths, origin, &manifest).await?;
    Ok(registration.fetch(&Request::get(url)).await?)
}

/// `worktime offline versions`; also returns the version that would be active.
async fn versions(
    paths: &WorktimePaths,
    manifest: Option<&Path>,
) -> anyhow::Result<(Vec<String>, Option<String>)> {
    let manifest = load_manifest(paths, manifest)?;
    let registration = open_registration(paths, None, &manifest).await?;
    let active = registration.active_version().map(str::to_string);
    Ok((registration.versions().await, active))
}

#[cfg(test)]
mod tests {
    use super::*;
    use worktime_offline::{CacheError, NetworkError, DEFAULT_ASSETS};

    fn origin() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for asset in DEFAULT_ASSETS {
            let name = asset.trim_start_matches("./");
            if !name.is_empty() {
                std::fs::write(dir.path().join(name), format!("/* {name} */")).unwrap();
            }
        }
        dir
    }

    fn write_manifest(dir: &Path, version: &str) -> PathBuf {
        let path = dir.join(format!("{version}.json"));
        let json = serde_json::json!({ "version": version, "assets": ["./", "./app.js"] });
        std::fs::write(&path, json.to_string()).unwrap();
        path
    }

    #[tokio::test]
    async fn install_then_serve_offline() {
        let home = tempfile::tempdir().unwrap();
        let paths = WorktimePaths::discover(home.path());
        let origin = origin();

        let outcome = install(&paths, origin.path().to_path_buf(), None).await.unwrap();
        assert!(matches!(
            outcome,
            UpdateOutcome::Activated { ref version, .. } if version == "worktime-v1"
        ));

        let served = fetch(&paths, "/app.js", None, None).await.unwrap();
        assert_eq!(served.from, ServedFrom::Cache);
        assert_eq!(served.response.body, b"/* app.js */");

        let again = install(&paths, origin.path().to_path_buf(), None).await.unwrap();
        assert!(matches!(again, UpdateOutcome::AlreadyActive { .. }));
    }

    #[tokio::test]
    async fn offline_miss_is_a_network_error() {
        let home = tempfile::tempdir().unwrap();
        let paths = WorktimePaths::discover(home.path());
        let origin = origin();
        install(&paths, origin.path().to_path_buf(), None).await.unwrap();

        let err = fetch(&paths, "./api/today", None, None).await.unwrap_err();
        let cache_err = err.downcast_ref::<CacheError>().unwrap();
        assert!(matches!(cache_err, CacheError::Network(NetworkError::Unreachable(_))));
    }

    #[tokio::test]
    async fn new_manifest_version_replaces_old() {
        let home = tempfile::tempdir().unwrap();
        let paths = WorktimePaths::discover(home.path());
        let origin = origin();
        let v1 = write_manifest(home.path(), "worktime-v1");
        let v2 = write_manifest(home.path(), "worktime-v2");

        install(&paths, origin.path().to_path_buf(), Some(&v1)).await.unwrap();
        let outcome = install(&paths, origin.path().to_path_buf(), Some(&v2)).await.unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Activated {
                version: "worktime-v2".into(),
                deleted: vec!["worktime-v1".into()],
            }
        );

        let (stored, active) = versions(&paths, Some(&v2)).await.unwrap();
        assert_eq!(stored, ["worktime-v2"]);
        assert_eq!(active.as_deref(), Some("worktime-v2"));
    }

    #[tokio::test]
    async fn incomplete_origin_keeps_previous_version() {
        let home = tempfile::tempdir().unwrap();
        let paths = WorktimePaths::discover(home.path());
        let origin = origin();
        install(&paths, origin.path().to_path_buf(), None).await.unwrap();

        let v2 = home.path().join("v2.json");
        std::fs::write(&v2, r#"{"version": "worktime-v2", "assets": ["./", "./missing.js"]}"#)
            .unwrap();
        assert!(install(&paths, origin.path().to_path_buf(), Some(&v2)).await.is_err());

        let (stored, active) = versions(&paths, Some(&v2)).await.unwrap();
        assert_eq!(stored, ["worktime-v1"]);
        assert_eq!(active.as_deref(), Some("worktime-v1"));

        // offline, through the manifest whose install failed
        let served = fetch(&paths, "./app.js", None, Some(&v2)).await.unwrap();
        assert_eq!(served.from, ServedFrom::Cache);
        assert_eq!(served.response.body, b"/* app.js */");
    }

    #[test]
    fn configured_manifest_is_used() {
        let home = tempfile::tempdir().unwrap();
        let paths = WorktimePaths::discover(home.path());
        let v3 = write_manifest(home.path(), "worktime-v3");
        let mut config = Config::default();
        config.set("manifest", &v3.to_string_lossy()).unwrap();
        config.save(&paths.config_json).unwrap();

        assert_eq!(load_manifest(&paths, None).unwrap().version, "worktime-v3");
        assert!(load_manifest(&paths, Some(Path::new("/nonexistent.json"))).is_err());
    }
}
