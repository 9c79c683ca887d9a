//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a kvdn-pillar command with an isolated environment.
    ///
    /// Returns a Command configured with:
    /// - HOME set to the temporary home directory
    /// - Current directory set to the test directory
    /// - No inherited KVDN token, log filter or colors
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("kvdn-pillar").expect("failed to find kvdn-pillar binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("KVDN_TOKEN");
        cmd.env_remove("KVDN_PILLAR_LOG");
        cmd.env_remove("KVDN_PILLAR_SETTINGS");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `kvdn-pillar pillar` against the fixture store and mapping.
    pub fn pillar(&self, minion_id: &str, extra: &[&str]) -> Output {
        self.cmd()
            .args(["pillar", minion_id])
            .args(["--store", &self.arg("store.yml")])
            .args(["--config", &self.arg("kvdn.yml")])
            .args(extra)
            .output()
            .expect("failed to run kvdn-pillar pillar")
    }

    /// Shortcut for `kvdn-pillar couple` against the fixture store.
    pub fn couple(&self, location: &str, extra: &[&str]) -> Output {
        self.cmd()
            .args(["couple", location])
            .args(["--store", &self.arg("store.yml")])
            .args(extra)
            .output()
            .expect("failed to run kvdn-pillar couple")
    }

    /// Shortcut for `kvdn-pillar match`.
    pub fn matches(&self, minion_id: &str, expr: &str, extra: &[&str]) -> Output {
        self.cmd()
            .args(["match", minion_id, expr])
            .args(extra)
            .output()
            .expect("failed to run kvdn-pillar match")
    }
}
