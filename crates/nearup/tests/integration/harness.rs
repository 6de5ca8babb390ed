//! Test localnet harness built around a stand-in node binary.

use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nearup::{
    HomePlan, HostProcesses as _, LocalnetConfig, NearupPaths, NodeBinary, SystemHost, Topology,
    read_records,
};

/// Name of the stand-in binary. Deliberately not `neard` so a test localnet
/// never trips the already-running guard of another test.
pub const FAKE_BINARY_NAME: &str = "fakeneard";

/// Writes one node directory per node on `localnet`, idles on `run`.
const FAKE_NEARD: &str = r#"#!/bin/sh
echo "$0 $*"
home=""
cmd=""
v=0
n=0
while [ $# -gt 0 ]; do
  case "$1" in
    --home) home="$2"; shift 2 ;;
    --verbose) shift 2 ;;
    --v) v="$2"; shift 2 ;;
    --n) n="$2"; shift 2 ;;
    localnet|run) cmd="$1"; shift ;;
    *) shift ;;
  esac
done

case "$cmd" in
  localnet)
    [ @INIT_EXIT@ -eq 0 ] || exit @INIT_EXIT@
    i=0
    while [ "$i" -lt $((v + n)) ]; do
      d="$home/node$i"
      mkdir -p "$d"
      printf '{"rpc":{"addr":"0.0.0.0:3030","polling_config":{}},"network":{"addr":"0.0.0.0:24567","boot_nodes":""},"consensus":{"min_num_peers":1}}' > "$d/config.json"
      printf '{"chain_id":"test-chain","validators":[],"epoch_length":60}' > "$d/genesis.json"
      printf '{"account_id":"node%s","public_key":"ed25519:KEY%s","secret_key":"ed25519:SECRET%s"}' "$i" "$i" "$i" > "$d/node_key.json"
      i=$((i + 1))
    done
    ;;
  run)
    while true; do sleep 1; done
    ;;
esac
"#;

/// Install the stand-in binary into `dir`. `localnet` exits with
/// `init_exit_code` without creating anything when it is non-zero.
pub fn install_fake_neard(dir: &Path, init_exit_code: i32) -> std::io::Result<PathBuf> {
    let path = dir.join(FAKE_BINARY_NAME);
    std::fs::write(
        &path,
        FAKE_NEARD.replace("@INIT_EXIT@", &init_exit_code.to_string()),
    )?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// A temporary localnet home, nearup state directory and stand-in binary.
///
/// Dropping it terminates every process recorded in its PID file.
pub struct TestLocalnet {
    pub binary: NodeBinary,
    pub paths: NearupPaths,
    pub home: PathBuf,
    /// Temporary directory guard; dropped last so processes are stopped first.
    _temp_dir: tempfile::TempDir,
}

impl TestLocalnet {
    pub fn new() -> color_eyre::Result<Self> {
        Self::with_init_exit_code(0)
    }

    pub fn with_init_exit_code(init_exit_code: i32) -> color_eyre::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let binary = NodeBinary::new(install_fake_neard(temp_dir.path(), init_exit_code)?);
        Ok(Self {
            binary,
            paths: NearupPaths::new(temp_dir.path().join(".nearup")),
            home: temp_dir.path().join("localnet"),
            _temp_dir: temp_dir,
        })
    }

    pub fn config(&self) -> LocalnetConfig {
        LocalnetConfig::new(self.home.clone(), &self.paths)
    }

    /// A fresh topology of `num_validators` validators and nothing else.
    pub fn create_plan(num_validators: usize) -> HomePlan {
        HomePlan::Create {
            remove_existing: true,
            topology: Topology {
                num_validators,
                ..Default::default()
            },
        }
    }

    pub fn log_file(&self, node: usize) -> PathBuf {
        self.paths.logs_dir().join(format!("node{node}.log"))
    }
}

impl Drop for TestLocalnet {
    fn drop(&mut self) {
        let Ok(records) = read_records(&self.paths.pid_file()) else {
            return;
        };
        let host = SystemHost::new();
        for record in records {
            host.terminate(record.pid);
        }
    }
}

/// Poll `path` until it contains `needle`, returning its final content.
pub fn wait_for_log(path: &Path, needle: &str) -> String {
    let mut content = String::new();
    for _ in 0..50 {
        content = std::fs::read_to_string(path).unwrap_or_default();
        if content.contains(needle) {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    content
}
