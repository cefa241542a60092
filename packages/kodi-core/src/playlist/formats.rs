//! Playlist file formats (M3U and WPL).

use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;

use crate::media::MediaItem;
use crate::utils::{self, xml_attr};

#[derive(Debug, Error)]
pub enum PlaylistFormatError {
    #[error("Failed to read playlist: {0}")]
    Io(String),

    #[error("Malformed playlist: {0}")]
    Parse(String),

    #[error("Unsupported playlist format: {0}")]
    Unsupported(String),
}

/// Loads a playlist file, choosing the format from its extension.
///
/// Relative entries resolve against the playlist's directory.
pub fn load_playlist(path: &Path) -> Result<Vec<MediaItem>, PlaylistFormatError> {
    let display = path.display().to_string();
    let ext = utils::extension(&display)
        .ok_or_else(|| PlaylistFormatError::Unsupported(display.clone()))?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| PlaylistFormatError::Io(format!("{}: {}", display, e)))?;
    let base = path.parent();

    let items = match ext.as_str() {
        "m3u" | "m3u8" => parse_m3u(&content, base),
        "wpl" => parse_wpl(&content, base)?,
        other => return Err(PlaylistFormatError::Unsupported(other.to_string())),
    };
    log::debug!("[Playlist] Loaded {} item(s) from {}", items.len(), display);
    Ok(items)
}

fn resolve(entry: &str, base: Option<&Path>) -> String {
    let is_absolute = Path::new(entry).is_absolute() || utils::protocol(entry).is_some();
    match base {
        Some(base) if !is_absolute => base.join(entry).display().to_string(),
        _ => entry.to_string(),
    }
}

/// Parses an (extended) M3U document.
///
/// `#EXTINF:<seconds>,<title>` lines label and time the entry that follows.
pub fn parse_m3u(content: &str, base: Option<&Path>) -> Vec<MediaItem> {
    let mut items = Vec::new();
    let mut pending: Option<(Option<u64>, String)> = None;

    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if let Some(info) = line.strip_prefix("#EXTINF:") {
            let (duration, title) = info.split_once(',').unwrap_or((info, ""));
            let duration_ms = duration
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(|secs| secs as u64 * 1000);
            pending = Some((duration_ms, title.trim().to_string()));
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let mut item = MediaItem::new(resolve(line, base));
        if let Some((duration_ms, title)) = pending.take() {
            if !title.is_empty() {
                item = item.with_label(title);
            }
            item.duration_ms = duration_ms;
        }
        items.push(item);
    }
    items
}

/// Parses a Windows Media Player (WPL) document.
pub fn parse_wpl(content: &str, base: Option<&Path>) -> Result<Vec<MediaItem>, PlaylistFormatError> {
    let mut items = Vec::new();
    let mut reader = Reader::from_str(content);
    let mut buf = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"smil" => saw_root = true,
                b"media" => {
                    if let Some(src) = xml_attr(e, b"src") {
                        items.push(MediaItem::new(resolve(src.trim(), base)));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(PlaylistFormatError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(PlaylistFormatError::Parse("missing <smil> root".to_string()));
    }
    Ok(items)
}

/// Serializes items as a WPL document.
pub fn to_wpl(title: &str, items: &[MediaItem]) -> String {
    let mut out = String::from("<?wpl version=\"1.0\"?>\n<smil>\n  <head>\n");
    out.push_str(&format!("    <title>{}</title>\n", escape(title)));
    out.push_str("  </head>\n  <body>\n    <seq>\n");
    for item in items {
        out.push_str(&format!("      <media src=\"{}\"/>\n", escape(item.path.as_str())));
    }
    out.push_str("    </seq>\n  </body>\n</smil>\n");
    out
}

/// Serializes items as an extended M3U document.
pub fn to_m3u(items: &[MediaItem]) -> String {
    let mut out = String::from("#EXTM3U\n");
    for item in items {
        let secs = item.duration_ms.map_or(-1, |ms| (ms / 1000) as i64);
        out.push_str(&format!("#EXTINF:{},{}\n{}\n", secs, item.label, item.path));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn m3u_labels_and_resolves_relative_entries() {
        let content = "#EXTM3U\n#EXTINF:215,Artist - Song\nsong.mp3\n\n# comment\nhttp://radio.example/live\n";
        let items = parse_m3u(content, Some(Path::new("/music/lists")));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path, "/music/lists/song.mp3");
        assert_eq!(items[0].label, "Artist - Song");
        assert_eq!(items[0].duration_ms, Some(215_000));
        assert_eq!(items[1].path, "http://radio.example/live");
        assert_eq!(items[1].duration_ms, None);
    }

    #[test]
    fn wpl_reads_media_sources() {
        let content = r#"<?wpl version="1.0"?>
            <smil><head><title>Mix</title></head>
            <body><seq>
              <media src="/music/a.mp3"/>
              <media src="b &amp; c.flac"/>
            </seq></body></smil>"#;
        let items = parse_wpl(content, Some(Path::new("/lists"))).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path, "/music/a.mp3");
        assert_eq!(items[1].path, "/lists/b & c.flac");
    }

    #[test]
    fn wpl_without_root_is_rejected() {
        assert!(matches!(
            parse_wpl("<playlist/>", None),
            Err(PlaylistFormatError::Parse(_))
        ));
    }

    #[test]
    fn written_wpl_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mix.wpl");
        let items = vec![MediaItem::new("/music/R&B.mp3")];
        std::fs::write(&path, to_wpl("Mix", &items)).unwrap();

        let loaded = load_playlist(&path).unwrap();
        assert_eq!(loaded[0].path, "/music/R&B.mp3");
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.pls");
        std::fs::write(&path, "[playlist]").unwrap();
        assert!(matches!(
            load_playlist(&path),
            Err(PlaylistFormatError::Unsupported(_))
        ));
    }
}
