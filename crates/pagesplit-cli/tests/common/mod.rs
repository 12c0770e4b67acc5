#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;

pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Create a `pagesplit` command isolated from the user's config and cache.
pub fn pagesplit_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pagesplit"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("PAGESPLIT_CONFIG");
    cmd.env_remove("PAGESPLIT_CACHE_TTL");
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join("config"));
    cmd.env("XDG_CACHE_HOME", home.join("cache"));
    cmd.env("PAGESPLIT_CACHE_DIR", home.join("pagesplit-cache"));
    cmd.env("NO_COLOR", "1");
    cmd
}
