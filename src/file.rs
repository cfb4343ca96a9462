use std::path::{Path, PathBuf};

/// Characters that are replaced with `_` before a title is used as a file name.
pub const FILENAME_BLACKLIST: [char; 10] = ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Makes a remote title safe to use as a file name.
///
/// Only blacklisted characters change. Length, whitespace and Unicode are left alone.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| if FILENAME_BLACKLIST.contains(&c) { '_' } else { c })
        .collect()
}

/// Picks `directory/base_name.extension`, or the first free `base_name_{n}.extension`.
///
/// The existence check and the later write are not atomic. Another process writing
/// into the same directory in between can still take the returned path.
pub fn resolve_unique_path(directory: &Path, base_name: &str, extension: &str) -> PathBuf {
    let mut candidate = directory.join(format!("{}.{}", base_name, extension));
    let mut counter = 1;

    while candidate.exists() {
        candidate = directory.join(format!("{}_{}.{}", base_name, counter, extension));
        counter += 1;
    }

    tracing::debug!("Resolved destination {}", candidate.display());

    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_every_blacklisted_char() {
        assert_eq!(sanitize_filename(r#"a/b\c?d%e*f:g|h"i<j>k"#), "a_b_c_d_e_f_g_h_i_j_k");
    }

    #[test]
    fn sanitize_leaves_everything_else_alone() {
        let title = "  Ünïcødé — title [4K] (2023)!  ";
        assert_eq!(sanitize_filename(title), title);
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn sanitize_changes_only_blacklisted_positions() {
        let title = "What? 50% off: \"deals\" <now>";
        let sanitized = sanitize_filename(title);

        assert_eq!(sanitized.chars().count(), title.chars().count());
        for (original, cleaned) in title.chars().zip(sanitized.chars()) {
            assert!(!FILENAME_BLACKLIST.contains(&cleaned));
            if FILENAME_BLACKLIST.contains(&original) {
                assert_eq!(cleaned, '_');
            } else {
                assert_eq!(cleaned, original);
            }
        }
    }

    #[test]
    fn unique_path_uses_plain_name_when_free() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_unique_path(dir.path(), "MyVideo", "mp4");
        assert_eq!(path, dir.path().join("MyVideo.mp4"));
    }

    #[test]
    fn unique_path_appends_counter_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MyVideo.mp4"), b"").unwrap();

        let path = resolve_unique_path(dir.path(), "MyVideo", "mp4");
        assert_eq!(path, dir.path().join("MyVideo_1.mp4"));
    }

    #[test]
    fn unique_path_skips_taken_counters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["clip.mp4", "clip_1.mp4", "clip_2.mp4"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let path = resolve_unique_path(dir.path(), "clip", "mp4");
        assert_eq!(path, dir.path().join("clip_3.mp4"));
        assert!(!path.exists());
    }

    #[test]
    fn unique_path_ignores_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.webm"), b"").unwrap();

        let path = resolve_unique_path(dir.path(), "clip", "mp4");
        assert_eq!(path, dir.path().join("clip.mp4"));
    }
}
