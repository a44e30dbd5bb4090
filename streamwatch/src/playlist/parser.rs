//! Extended M3U parser.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::domain::StreamDescriptor;

/// Line prefix announcing an entry.
pub const DIRECTIVE_PREFIX: &str = "#EXTINF";

static TVG_LOGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"tvg-logo="([^"]+)""#).expect("tvg-logo pattern is valid"));

/// Parse playlist text into descriptors, in playlist order.
///
/// Each `#EXTINF` line must be followed by its media URL. When that line is
/// missing, blank, or another `#` line, the entry is skipped with a warning.
pub fn parse_playlist(content: Option<&str>) -> Vec<StreamDescriptor> {
    let Some(content) = content else {
        return Vec::new();
    };

    let lines: Vec<&str> = content.trim().lines().collect();
    let mut streams = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !line.starts_with(DIRECTIVE_PREFIX) {
            continue;
        }

        let url = match lines.get(i + 1).map(|l| l.trim()) {
            Some(url) if !url.is_empty() && !url.starts_with('#') => url,
            Some(next) => {
                warn!(directive = %line, next = %next, "Skipping playlist entry without a media URL");
                continue;
            }
            None => {
                warn!(directive = %line, "Skipping playlist entry at end of input");
                continue;
            }
        };

        streams.push(StreamDescriptor {
            name: display_name(line),
            url: url.to_string(),
            logo_url: logo_url(line),
        });
    }

    streams
}

/// Text after the last comma, trimmed. The whole line when there is no comma.
fn display_name(directive: &str) -> String {
    directive
        .rsplit(',')
        .next()
        .unwrap_or(directive)
        .trim()
        .to_string()
}

fn logo_url(directive: &str) -> Option<String> {
    TVG_LOGO
        .captures(directive)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_entry_with_logo() {
        let text = "#EXTM3U\n#EXTINF:-1 tvg-logo=\"http://x/logo.png\",Channel One\nhttp://example.com/c1.m3u8\n";
        let streams = parse_playlist(Some(text));

        assert_eq!(
            streams,
            vec![StreamDescriptor {
                name: "Channel One".to_string(),
                url: "http://example.com/c1.m3u8".to_string(),
                logo_url: Some("http://x/logo.png".to_string()),
            }]
        );
    }

    #[test]
    fn test_absent_and_empty_input() {
        assert!(parse_playlist(None).is_empty());
        assert!(parse_playlist(Some("")).is_empty());
        assert!(parse_playlist(Some("   \n\n")).is_empty());
    }

    #[test]
    fn test_directive_followed_by_directive_is_skipped() {
        let text = "#EXTINF:-1,Broken\n#EXTINF:-1,Working\nhttp://example.com/w.m3u8";
        let streams = parse_playlist(Some(text));
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "Working");
    }

    #[test]
    fn test_trailing_directive_without_url() {
        let text = "#EXTINF:-1,First\nhttp://example.com/1.m3u8\n#EXTINF:-1,Dangling";
        let streams = parse_playlist(Some(text));
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "First");
    }

    #[test]
    fn test_blank_line_after_directive_is_skipped() {
        let text = "#EXTINF:-1,Gap\n\nhttp://example.com/orphan.m3u8\n#EXTINF:-1,Ok\nhttp://example.com/ok.m3u8";
        let streams = parse_playlist(Some(text));
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "Ok");
    }

    #[test]
    fn test_name_is_text_after_last_comma() {
        let text = "#EXTINF:-1 group-title=\"News, World\",  BBC World News \nhttp://example.com/bbc";
        let streams = parse_playlist(Some(text));
        assert_eq!(streams[0].name, "BBC World News");
        assert_eq!(streams[0].logo_url, None);
    }

    #[test]
    fn test_malformed_logo_is_absent() {
        let text = "#EXTINF:-1 tvg-logo=\"http://x/broken.png,Name\nhttp://example.com/a\n#EXTINF:-1 tvg-logo=\"\",Empty\nhttp://example.com/b";
        let streams = parse_playlist(Some(text));
        assert_eq!(streams.len(), 2);
        assert!(streams.iter().all(|s| s.logo_url.is_none()));
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "#EXTM3U\r\n#EXTINF:-1,Windows\r\nhttp://example.com/win.m3u8\r\n";
        let streams = parse_playlist(Some(text));
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name, "Windows");
        assert_eq!(streams[0].url, "http://example.com/win.m3u8");
    }

    #[test]
    fn test_order_and_count_follow_valid_directives() {
        let text = "\
#EXTM3U
#EXTINF:-1,A
http://example.com/a
#EXTINF:-1,B
#EXTINF:-1,C
http://example.com/c
# comment
#EXTINF:-1,D
http://example.com/d
";
        let names: Vec<_> = parse_playlist(Some(text))
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["A", "C", "D"]);
    }
}
