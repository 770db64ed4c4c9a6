use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::foundation::error::{PlaceError, PlaceResult};

/// Separators tried, in order, when joining identifier tokens into an exact filename stem.
const TOKEN_SEPARATORS: [&str; 4] = ["", "_", "-", " "];

const PER_TOKEN_SCORE: u32 = 2;
const CONTIGUOUS_BONUS: u32 = 3;

/// Which library a file is looked up in. Drives extensions and traversal depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Product photographs; searched recursively.
    Photo,
    /// Decoration sources; searched in the given directory only.
    Decoration,
}

impl AssetKind {
    /// Supported file extensions, lowercase, in ladder order.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            AssetKind::Photo => &["png", "jpg", "jpeg", "bmp", "tiff", "tif"],
            AssetKind::Decoration => &["png", "jpg", "jpeg", "svg", "pdf"],
        }
    }

    fn recursive(self) -> bool {
        matches!(self, AssetKind::Photo)
    }

    fn supports(self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions().contains(&e.as_str())
            })
            .unwrap_or(false)
    }
}

/// How an asset was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    /// A joined-token filename existed verbatim.
    Exact,
    /// Best token-overlap score among all candidates.
    Fuzzy {
        /// Winning score (0 when no token matched at all).
        score: u32,
    },
}

/// Result of [`resolve_asset`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Path to the chosen file.
    pub path: PathBuf,
    /// Whether the exact ladder or the fuzzy scan produced it.
    pub matched: MatchKind,
}

/// Locate an asset under `root/sub_dir` from loosely-named identifier tokens.
///
/// An empty `sub_dir` searches `root` itself. The exact ladder runs first; the fuzzy scan
/// always returns something as long as at least one supported file exists.
#[tracing::instrument(level = "debug", skip(root), fields(root = %root.display()))]
pub fn resolve_asset(
    root: &Path,
    sub_dir: &str,
    tokens: &[&str],
    kind: AssetKind,
) -> PlaceResult<ResolvedAsset> {
    let tokens: Vec<&str> = tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(PlaceError::validation(format!(
            "no identifier tokens given for {kind:?} lookup"
        )));
    }

    let dir = if sub_dir.trim().is_empty() {
        root.to_path_buf()
    } else {
        root.join(sub_dir.trim())
    };
    if !dir.is_dir() {
        return Err(PlaceError::asset_not_found(format!(
            "directory '{}' does not exist",
            dir.display()
        )));
    }

    if let Some(path) = exact_match(&dir, &tokens, kind) {
        tracing::debug!(path = %path.display(), "exact asset match");
        return Ok(ResolvedAsset {
            path,
            matched: MatchKind::Exact,
        });
    }

    let (path, score) = fuzzy_match(&dir, &tokens, kind).ok_or_else(|| {
        PlaceError::asset_not_found(format!(
            "no {} files under '{}' (wanted {})",
            kind.extensions().join("/"),
            dir.display(),
            tokens.join(" ")
        ))
    })?;
    if score == 0 {
        tracing::warn!(
            path = %path.display(),
            tokens = ?tokens,
            "no filename shares a token with the request; using first candidate"
        );
    } else {
        tracing::info!(path = %path.display(), score, "fuzzy asset match");
    }
    Ok(ResolvedAsset {
        path,
        matched: MatchKind::Fuzzy { score },
    })
}

fn exact_match(dir: &Path, tokens: &[&str], kind: AssetKind) -> Option<PathBuf> {
    let mut tried: Vec<String> = Vec::with_capacity(TOKEN_SEPARATORS.len());
    for sep in TOKEN_SEPARATORS {
        let stem = tokens.join(sep);
        if tried.contains(&stem) {
            continue;
        }
        for ext in kind.extensions() {
            let candidate = dir.join(format!("{stem}.{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        tried.push(stem);
    }
    None
}

fn fuzzy_match(dir: &Path, tokens: &[&str], kind: AssetKind) -> Option<(PathBuf, u32)> {
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let concatenated = lowered.concat();

    let mut best: Option<(PathBuf, u32)> = None;
    for path in candidate_files(dir, kind) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let score = score_filename(&name.to_lowercase(), &lowered, &concatenated);
        match &best {
            Some((_, best_score)) if score <= *best_score => {}
            _ => best = Some((path, score)),
        }
    }
    best
}

/// Score a lowercase filename against lowercase tokens.
pub(crate) fn score_filename(name: &str, tokens: &[String], concatenated: &str) -> u32 {
    let mut score = tokens
        .iter()
        .filter(|t| name.contains(t.as_str()))
        .count() as u32
        * PER_TOKEN_SCORE;
    if !concatenated.is_empty() && name.contains(concatenated) {
        score += CONTIGUOUS_BONUS;
    }
    score
}

fn candidate_files(dir: &Path, kind: AssetKind) -> impl Iterator<Item = PathBuf> {
    let max_depth = if kind.recursive() { usize::MAX } else { 1 };
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(move |p| kind.supports(p))
}

/// List the immediate subdirectories of `root` (supplier folders), sorted by name.
pub fn list_subdirectories(root: &Path) -> PlaceResult<Vec<String>> {
    use anyhow::Context as _;

    let mut out = Vec::new();
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("read directory '{}'", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", root.display()))?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            out.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    out.sort();
    Ok(out)
}

/// Decide whether the photo and decoration roots look like they were passed the wrong way
/// round.
///
/// Swaps when the photo root is named like a logo folder while the decoration root is named
/// like an image folder, or when the photo root holds almost no JPEGs while the decoration
/// root holds many.
pub fn detect_swapped_roots(photo_root: &Path, decoration_root: &Path) -> bool {
    let folder_name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    };
    let photo_name = folder_name(photo_root);
    let decoration_name = folder_name(decoration_root);
    if photo_name.contains("logo") && decoration_name.contains("image") {
        return true;
    }

    let photo_jpegs = count_jpegs(photo_root);
    let decoration_jpegs = count_jpegs(decoration_root);
    photo_jpegs < 10 && decoration_jpegs > photo_jpegs * 5
}

fn count_jpegs(root: &Path) -> usize {
    if !root.is_dir() {
        return 0;
    }
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .map(|x| matches!(x.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
                .unwrap_or(false)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowered(tokens: &[&str]) -> (Vec<String>, String) {
        let t: Vec<String> = tokens.iter().map(|s| s.to_lowercase()).collect();
        let c = t.concat();
        (t, c)
    }

    #[test]
    fn score_counts_tokens_and_contiguous_bonus() {
        let (t, c) = lowered(&["ABC123", "Red"]);
        assert_eq!(score_filename("abc123red.png", &t, &c), 7);
        assert_eq!(score_filename("abc123_red_v2.png", &t, &c), 4);
        assert_eq!(score_filename("abc123_blue.png", &t, &c), 2);
        assert_eq!(score_filename("zzz.png", &t, &c), 0);
    }

    #[test]
    fn extension_support_is_case_insensitive() {
        assert!(AssetKind::Photo.supports(Path::new("a/B.JPG")));
        assert!(AssetKind::Decoration.supports(Path::new("logo.PDF")));
        assert!(!AssetKind::Photo.supports(Path::new("logo.pdf")));
        assert!(!AssetKind::Decoration.supports(Path::new("noext")));
    }
}
