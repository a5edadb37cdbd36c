use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

impl RunMeta {
    pub fn current() -> Self {
        Self {
            schema_version: 1,
            bench_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
            git_sha: git_sha_short(),
        }
    }
}

const SHORT_SHA_LEN: usize = 12;

/// Commit of the benchmarked checkout, when the caller exports one.
fn git_sha_short() -> Option<String> {
    let sha = std::env::var("GIT_SHA").or_else(|_| std::env::var("GITHUB_SHA"));
    sha.ok().as_deref().and_then(shorten_sha)
}

fn shorten_sha(sha: &str) -> Option<String> {
    let sha = sha.trim();
    (!sha.is_empty()).then(|| sha.chars().take(SHORT_SHA_LEN).collect())
}

/// One (action, metric) row; `values[i]` belongs to `versions[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub action: String,
    pub metric: String,
    pub values: Vec<Option<u64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub run: RunMeta,
    pub versions: Vec<String>,
    pub rows: Vec<ReportRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_sha() {
        assert_eq!(
            shorten_sha("3f9c2ab71d0e4c55aa01b2c3d4e5f60718293a4b").as_deref(),
            Some("3f9c2ab71d0e")
        );
        assert_eq!(shorten_sha(" abc123\n").as_deref(), Some("abc123"));
        assert_eq!(shorten_sha("   "), None);
    }
}
