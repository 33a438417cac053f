//! Remote video ids
//!
//! Users paste whatever the browser shows them: a watch page, a short link,
//! an embed URL or just the id. All of them reduce to the 11-character id
//! the widget loads.

use cadenza_core::{CadenzaError, Result};
use url::Url;

const VIDEO_ID_LEN: usize = 11;

const PATH_PREFIXES: [&str; 4] = ["embed", "shorts", "live", "v"];

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extract a remote video id from a URL or bare id
///
/// # Errors
/// Returns `InvalidInput` if no id can be found
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();
    if is_video_id(input) {
        return Ok(input.to_string());
    }

    let parsed = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .map_err(|_| CadenzaError::invalid_input(format!("not a video link: {input}")))?;

    let host = parsed.host_str().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    let host = host.strip_prefix("m.").unwrap_or(host);
    let mut segments = parsed.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" | "music.youtube.com" => {
            match parsed.query_pairs().find(|(key, _)| key == "v") {
                Some((_, id)) => Some(id.into_owned()),
                None => match (segments.next(), segments.next()) {
                    (Some(prefix), Some(id)) if PATH_PREFIXES.contains(&prefix) => {
                        Some(id.to_string())
                    }
                    _ => None,
                },
            }
        }
        _ => None,
    };

    candidate
        .filter(|id| is_video_id(id))
        .ok_or_else(|| CadenzaError::invalid_input(format!("no video id in {input}")))
}
