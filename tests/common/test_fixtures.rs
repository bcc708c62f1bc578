//! Test fixtures backed by local bare repositories
//!
//! Layout under the fixture's temporary root:
//! `server/<owner>/<name>` holds bare repositories, `authoring/<owner>/<name>`
//! the clones used to create commits, and `workspaces/` the sync targets.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use reposync::common::retry::RetryPolicy;
use reposync::domain::{ServerUrl, SyncSettings};

pub const OWNER: &str = "octo";
pub const NAME: &str = "hello";

/// Run git in `dir` and return trimmed stdout, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=reposync-test",
            "-c",
            "user.email=reposync-test@example.com",
            "-c",
            "init.defaultBranch=main",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("failed to spawn git");

    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A fake hosting server with one or more repositories
pub struct RemoteFixture {
    temp: TempDir,
}

impl RemoteFixture {
    /// Server with `octo/hello` whose `main` holds a README
    pub fn new() -> Self {
        let fixture = Self {
            temp: TempDir::new().expect("failed to create temp dir"),
        };
        fixture.create_repository(OWNER, NAME);
        fixture.commit_file(OWNER, NAME, "main", "README.md", "hello\n");
        fixture
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn server_dir(&self) -> PathBuf {
        self.root().join("server")
    }

    /// `file://` URL of the server directory
    pub fn server_url(&self) -> ServerUrl {
        ServerUrl::new(&format!("file://{}", self.server_dir().display()))
            .expect("fixture server url is valid")
    }

    /// URL the sync writes to `remote.origin.url`
    pub fn fetch_url(&self, owner: &str, name: &str) -> String {
        format!("file://{}/{}/{}", self.server_dir().display(), owner, name)
    }

    pub fn workspace(&self, name: &str) -> PathBuf {
        self.root().join("workspaces").join(name)
    }

    fn bare_dir(&self, owner: &str, name: &str) -> PathBuf {
        self.server_dir().join(owner).join(name)
    }

    fn authoring_dir(&self, owner: &str, name: &str) -> PathBuf {
        self.root().join("authoring").join(owner).join(name)
    }

    /// Create an empty bare repository plus its authoring clone
    pub fn create_repository(&self, owner: &str, name: &str) {
        let bare = self.bare_dir(owner, name);
        std::fs::create_dir_all(&bare).expect("failed to create bare dir");
        git(&bare, &["init", "--bare", "-q"]);

        let authoring = self.authoring_dir(owner, name);
        std::fs::create_dir_all(&authoring).expect("failed to create authoring dir");
        git(&authoring, &["init", "-q"]);
        git(
            &authoring,
            &["remote", "add", "origin", &bare.display().to_string()],
        );
    }

    /// Commit `contents` to `file` on `branch` and push. Returns the new SHA.
    pub fn commit_file(
        &self,
        owner: &str,
        name: &str,
        branch: &str,
        file: &str,
        contents: &str,
    ) -> String {
        let authoring = self.authoring_dir(owner, name);
        let verify = |reference: &str| {
            Command::new("git")
                .args(["rev-parse", "--verify", "-q", reference])
                .current_dir(&authoring)
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        };

        if verify(&format!("refs/heads/{}", branch)) {
            git(&authoring, &["checkout", "-q", branch]);
        } else if verify("HEAD") {
            git(&authoring, &["checkout", "-q", "-b", branch]);
        } else {
            git(&authoring, &["checkout", "-q", "--orphan", branch]);
        }

        let path = authoring.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("failed to write file");
        git(&authoring, &["add", "-A"]);
        git(&authoring, &["commit", "-q", "-m", &format!("update {}", file)]);
        git(
            &authoring,
            &["push", "-q", "-f", "origin", &format!("HEAD:refs/heads/{}", branch)],
        );
        git(&authoring, &["rev-parse", "HEAD"])
    }

    /// Create a lightweight tag at `target` and push it
    pub fn tag(&self, owner: &str, name: &str, tag: &str, target: &str) {
        let authoring = self.authoring_dir(owner, name);
        git(&authoring, &["tag", "-f", tag, target]);
        git(
            &authoring,
            &["push", "-q", "-f", "origin", &format!("refs/tags/{}", tag)],
        );
    }

    /// Publish `target` as `refs/pull/<number>/merge` on the server
    pub fn pull_request(&self, owner: &str, name: &str, number: u32, target: &str) {
        let authoring = self.authoring_dir(owner, name);
        git(
            &authoring,
            &[
                "push",
                "-q",
                "-f",
                "origin",
                &format!("{}:refs/pull/{}/merge", target, number),
            ],
        );
    }

    /// Tip of `branch` on the server
    pub fn head(&self, owner: &str, name: &str, branch: &str) -> String {
        git(
            &self.bare_dir(owner, name),
            &["rev-parse", &format!("refs/heads/{}", branch)],
        )
    }

    /// Record `sub_owner/sub_name` as a submodule at `path` on `branch`. Returns the new SHA.
    pub fn add_submodule(
        &self,
        owner: &str,
        name: &str,
        branch: &str,
        path: &str,
        sub_owner: &str,
        sub_name: &str,
    ) -> String {
        let authoring = self.authoring_dir(owner, name);
        git(&authoring, &["checkout", "-q", branch]);
        git(
            &authoring,
            &[
                "-c",
                "protocol.file.allow=always",
                "submodule",
                "add",
                "-q",
                &self.fetch_url(sub_owner, sub_name),
                path,
            ],
        );
        git(&authoring, &["commit", "-q", "-m", &format!("add submodule {}", path)]);
        git(
            &authoring,
            &["push", "-q", "-f", "origin", &format!("HEAD:refs/heads/{}", branch)],
        );
        git(&authoring, &["rev-parse", "HEAD"])
    }

    /// A `git` wrapper that allows submodules over `file://`
    #[cfg(unix)]
    pub fn git_allowing_file_transport(&self) -> PathBuf {
        self.git_wrapper(
            "git-file-transport",
            "#!/bin/sh\nexec git -c protocol.file.allow=always \"$@\"\n",
        )
    }

    /// A `git` wrapper whose `fetch` always fails like an unreachable remote
    #[cfg(unix)]
    pub fn git_failing_fetch(&self) -> PathBuf {
        self.git_wrapper(
            "git-failing-fetch",
            concat!(
                "#!/bin/sh\n",
                "for arg in \"$@\"; do\n",
                "    if [ \"$arg\" = \"fetch\" ]; then\n",
                "        echo \"fatal: unable to access the remote repository\" >&2\n",
                "        exit 128\n",
                "    fi\n",
                "done\n",
                "exec git \"$@\"\n",
            ),
        )
    }

    #[cfg(unix)]
    fn git_wrapper(&self, file_name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let bin = self.root().join("bin");
        std::fs::create_dir_all(&bin).expect("failed to create bin dir");
        let path = bin.join(file_name);
        std::fs::write(&path, script).expect("failed to write git wrapper");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("failed to make git wrapper executable");
        path
    }

    /// Settings for syncing `octo/hello` into `workspace`
    pub fn settings(&self, workspace: &Path) -> SyncSettings {
        self.settings_for(OWNER, NAME, workspace)
    }

    pub fn settings_for(&self, owner: &str, name: &str, workspace: &Path) -> SyncSettings {
        SyncSettings::new(owner, name, workspace)
            .with_server_url(self.server_url())
            .with_temp_dir(self.root().join("tmp"))
            .with_retry_policy(RetryPolicy::new(1, 0, 0).expect("valid retry policy"))
    }
}
