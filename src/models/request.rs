// file: src/models/request.rs
// description: inbound setup request naming the repository to analyse
// reference: repository setup request

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Deserialize, Serialize)]
pub struct SetupRepository {
    pub github_token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl SetupRepository {
    pub fn new(
        github_token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            github_token: github_token.into(),
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }

    /// Directory name the checkout is stored under.
    pub fn storage_dir_name(&self) -> String {
        format!("{}_{}", self.owner, self.repo)
    }
}

// The token must never reach a log line.
impl fmt::Debug for SetupRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupRepository")
            .field("github_token", &"***")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish()
    }
}
