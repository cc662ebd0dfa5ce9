use std::collections::BTreeSet;
use std::path::Path;

pub const DEFAULT_SEPARATOR: &str = "_";

/// Department tags recognised in scene file names.
pub const KNOWN_TAGS: &[&str] = &[
    "anim",
    "animation",
    "capture",
    "comp",
    "compositing",
    "fx",
    "layout",
    "light",
    "lighting",
    "lookdev",
    "realtime",
    "script",
    "storyboard",
];

/// First `separator`-delimited token of the file stem, e.g. `shot010_anim_v003.ma` -> `shot010`.
pub fn description_from_filename(path: Option<&Path>, separator: &str) -> String {
    file_stem(path)
        .and_then(|stem| stem.split(separator).next().map(str::to_string))
        .unwrap_or_default()
}

pub fn tags_from_filename(path: Option<&Path>, separator: &str) -> BTreeSet<String> {
    let Some(stem) = file_stem(path) else {
        return BTreeSet::new();
    };
    stem.split(separator)
        .map(str::to_lowercase)
        .filter(|token| KNOWN_TAGS.contains(&token.as_str()))
        .collect()
}

fn file_stem(path: Option<&Path>) -> Option<&str> {
    path?.file_stem()?.to_str().filter(|stem| !stem.is_empty())
}
