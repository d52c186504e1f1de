use std::path::Path;

use lofty::prelude::{Accessor, TaggedFileExt};

/// "Artist - Title" from the file's tags, falling back to the file stem.
pub fn track_label(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let Ok(tagged) = lofty::read_from_path(path) else {
        return stem;
    };
    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return stem;
    };

    let title = tag
        .title()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or(stem);
    let artist = tag.artist().map(|a| a.trim().to_string());
    join_label(&title, artist.as_deref())
}

pub(super) fn join_label(title: &str, artist: Option<&str>) -> String {
    match artist {
        Some(a) if !a.trim().is_empty() => format!("{} - {}", a.trim(), title),
        _ => title.to_string(),
    }
}
