use crate::engine::TMP_MARKER;
use std::path::Path;
use walkdir::WalkDir;

/// Walks a namespace directory and returns the logical keys starting with `prefix`, sorted.
///
/// Physical paths carry two shard directories in front of any filename of four or more
/// characters (see `security::resolve_sharding`); they are stripped here.
pub(crate) fn logical_keys(base: &Path, prefix: &str) -> Vec<String> {
    if !base.is_dir() {
        return Vec::new();
    }

    let mut keys: Vec<String> = WalkDir::new(base)
        .follow_links(false)
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(base).ok()?;
            let segments: Vec<&str> =
                relative.components().map(|c| c.as_os_str().to_str()).collect::<Option<_>>()?;
            unshard(&segments)
        })
        .filter(|key| key.starts_with(prefix))
        .collect();

    keys.sort_unstable();
    keys
}

fn unshard(segments: &[&str]) -> Option<String> {
    let (file_name, dirs) = segments.split_last()?;
    if file_name.contains(TMP_MARKER) {
        return None;
    }

    let chars: Vec<char> = file_name.chars().collect();
    if chars.len() < 4 {
        return Some(segments.join("/"));
    }

    let shard1: String = chars[0..2].iter().collect();
    let shard2: String = chars[2..4].iter().collect();
    match dirs {
        [parents @ .., s1, s2] if *s1 == shard1 && *s2 == shard2 => {
            let mut logical: Vec<&str> = parents.to_vec();
            logical.push(file_name);
            Some(logical.join("/"))
        },
        // Not written by this engine; ignore it.
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::unshard;

    #[test]
    fn short_names_are_not_sharded() {
        assert_eq!(unshard(&["domains", "acme", "x"]).as_deref(), Some("domains/acme/x"));
    }

    #[test]
    fn shard_directories_are_stripped() {
        assert_eq!(
            unshard(&["domains", "acme", "ty", "pe", "types"]).as_deref(),
            Some("domains/acme/types")
        );
    }

    #[test]
    fn foreign_and_temp_files_are_skipped() {
        assert_eq!(unshard(&["domains", "types"]), None);
        assert_eq!(unshard(&["ty", "pe", "types.cftmp.3"]), None);
    }
}
