//! Parsing of raw upstream JSON into normalized result types
//!
//! This is the only place that knows the upstream response shapes. Optional
//! and loosely-typed fields become explicit `Option`s here; anything absent
//! stays `None` rather than defaulting to a fake value.

use crate::storage::Availability;
use crate::youtube::types::{
    ChannelInfo, PlaylistEntry, PlaylistPage, SearchCandidate, VideoDetails,
};
use crate::youtube::{ApiError, ApiResult};
use serde_json::Value;

/// Extracts a string at a nested path
fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str()
}

/// Extracts a count at a nested path
///
/// The upstream encodes statistics as decimal strings; plain numbers are
/// accepted too.
fn count_at(value: &Value, path: &[&str]) -> Option<u64> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    match current {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn items(value: &Value) -> &[Value] {
    value
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Parses a channel search response into ranked candidates
pub fn parse_search_response(value: &Value) -> ApiResult<Vec<SearchCandidate>> {
    let mut candidates = Vec::new();
    for item in items(value) {
        // Search can interleave non-channel results; only channel hits carry
        // an id.channelId
        let channel_id = match str_at(item, &["id", "channelId"]) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => continue,
        };
        candidates.push(SearchCandidate {
            channel_id,
            title: str_at(item, &["snippet", "title"]).unwrap_or("").to_string(),
            description: str_at(item, &["snippet", "description"])
                .unwrap_or("")
                .to_string(),
        });
    }
    Ok(candidates)
}

/// Parses a channel list response into full channel details
pub fn parse_channel_list(value: &Value) -> ApiResult<Vec<ChannelInfo>> {
    let mut channels = Vec::new();
    for item in items(value) {
        let channel_id = match item.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(ApiError::Parse {
                    operation: "channels".to_string(),
                    message: "channel item without an id".to_string(),
                })
            }
        };

        channels.push(ChannelInfo {
            channel_id,
            title: str_at(item, &["snippet", "title"]).unwrap_or("").to_string(),
            description: str_at(item, &["snippet", "description"])
                .unwrap_or("")
                .to_string(),
            handle: str_at(item, &["snippet", "customUrl"]).map(str::to_string),
            uploads_playlist_id: str_at(
                item,
                &["contentDetails", "relatedPlaylists", "uploads"],
            )
            .map(str::to_string),
            subscriber_count: count_at(item, &["statistics", "subscriberCount"]),
            video_count: count_at(item, &["statistics", "videoCount"]),
            view_count: count_at(item, &["statistics", "viewCount"]),
            verified: item
                .get("status")
                .and_then(|s| s.get("isLinked"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
            available: true,
        });
    }
    Ok(channels)
}

/// Parses one playlist items page
pub fn parse_playlist_page(value: &Value) -> ApiResult<PlaylistPage> {
    let entries = items(value)
        .iter()
        .map(|item| PlaylistEntry {
            video_id: str_at(item, &["contentDetails", "videoId"])
                .unwrap_or("")
                .to_string(),
            title: str_at(item, &["snippet", "title"]).unwrap_or("").to_string(),
            published_at: str_at(item, &["contentDetails", "videoPublishedAt"])
                .or_else(|| str_at(item, &["snippet", "publishedAt"]))
                .map(str::to_string),
        })
        .collect();

    Ok(PlaylistPage {
        entries,
        next_page_token: value
            .get("nextPageToken")
            .and_then(Value::as_str)
            .map(str::to_string),
        total_results: value
            .get("pageInfo")
            .and_then(|p| p.get("totalResults"))
            .and_then(Value::as_u64)
            .map(|t| t as u32),
    })
}

/// Parses a video list response into full video details
pub fn parse_video_list(value: &Value) -> ApiResult<Vec<VideoDetails>> {
    let mut videos = Vec::new();
    for item in items(value) {
        let video_id = match item.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(ApiError::Parse {
                    operation: "videos".to_string(),
                    message: "video item without an id".to_string(),
                })
            }
        };

        let duration_raw = str_at(item, &["contentDetails", "duration"]).map(str::to_string);
        let duration_seconds = duration_raw.as_deref().and_then(duration_to_seconds);

        let tags = item
            .get("snippet")
            .and_then(|s| s.get("tags"))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        videos.push(VideoDetails {
            video_id,
            title: str_at(item, &["snippet", "title"]).unwrap_or("").to_string(),
            published_at: str_at(item, &["snippet", "publishedAt"]).map(str::to_string),
            duration_raw,
            duration_seconds,
            view_count: count_at(item, &["statistics", "viewCount"]),
            like_count: count_at(item, &["statistics", "likeCount"]),
            comment_count: count_at(item, &["statistics", "commentCount"]),
            tags,
            availability: availability_of(item),
        });
    }
    Ok(videos)
}

/// Derives availability from the status and region-restriction fields
fn availability_of(item: &Value) -> Availability {
    if let Some("private") = str_at(item, &["status", "privacyStatus"]) {
        return Availability::Private;
    }

    let blocked_somewhere = item
        .get("contentDetails")
        .and_then(|c| c.get("regionRestriction"))
        .and_then(|r| r.get("blocked"))
        .and_then(Value::as_array)
        .map(|b| !b.is_empty())
        .unwrap_or(false);
    if blocked_somewhere {
        return Availability::Blocked;
    }

    Availability::Active
}

/// Converts an ISO-8601 duration such as `PT1H2M3S` to whole seconds
pub fn duration_to_seconds(raw: &str) -> Option<u32> {
    let rest = raw.strip_prefix('P')?;
    let mut seconds: u64 = 0;
    let mut digits = String::new();
    let mut in_time = false;

    for c in rest.chars() {
        match c {
            'T' => {
                in_time = true;
                digits.clear();
            }
            '0'..='9' => digits.push(c),
            'W' if !in_time => {
                seconds += digits.parse::<u64>().ok()? * 604_800;
                digits.clear();
            }
            'D' if !in_time => {
                seconds += digits.parse::<u64>().ok()? * 86_400;
                digits.clear();
            }
            'H' if in_time => {
                seconds += digits.parse::<u64>().ok()? * 3_600;
                digits.clear();
            }
            'M' if in_time => {
                seconds += digits.parse::<u64>().ok()? * 60;
                digits.clear();
            }
            'S' if in_time => {
                seconds += digits.parse::<u64>().ok()?;
                digits.clear();
            }
            _ => return None,
        }
    }

    u32::try_from(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(duration_to_seconds("PT3M30S"), Some(210));
        assert_eq!(duration_to_seconds("PT1H2M3S"), Some(3723));
        assert_eq!(duration_to_seconds("PT45S"), Some(45));
        assert_eq!(duration_to_seconds("PT0S"), Some(0));
        assert_eq!(duration_to_seconds("P1DT1S"), Some(86_401));
        assert_eq!(duration_to_seconds("PT2H"), Some(7200));
        assert_eq!(duration_to_seconds("garbage"), None);
        assert_eq!(duration_to_seconds(""), None);
    }

    #[test]
    fn test_parse_search_skips_non_channel_hits() {
        let value = json!({
            "items": [
                {"id": {"videoId": "v1"}, "snippet": {"title": "a video"}},
                {"id": {"channelId": "UC1"}, "snippet": {"title": "Artist", "description": "music"}},
            ]
        });

        let candidates = parse_search_response(&value).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].channel_id, "UC1");
        assert_eq!(candidates[0].title, "Artist");
    }

    #[test]
    fn test_parse_search_empty_response() {
        let value = json!({});
        assert!(parse_search_response(&value).unwrap().is_empty());
    }

    #[test]
    fn test_parse_channel_list_full() {
        let value = json!({
            "items": [{
                "id": "UC1",
                "snippet": {"title": "Artist", "description": "desc", "customUrl": "@artist"},
                "contentDetails": {"relatedPlaylists": {"uploads": "UU1"}},
                "statistics": {"subscriberCount": "12000000", "videoCount": "250", "viewCount": "900000000"},
                "status": {"isLinked": true}
            }]
        });

        let channels = parse_channel_list(&value).unwrap();
        assert_eq!(channels.len(), 1);
        let ch = &channels[0];
        assert_eq!(ch.channel_id, "UC1");
        assert_eq!(ch.handle.as_deref(), Some("@artist"));
        assert_eq!(ch.uploads_playlist_id.as_deref(), Some("UU1"));
        assert_eq!(ch.subscriber_count, Some(12_000_000));
        assert!(ch.verified);
        assert!(ch.available);
    }

    #[test]
    fn test_parse_channel_without_id_is_an_error() {
        let value = json!({"items": [{"snippet": {"title": "nameless"}}]});
        assert!(matches!(
            parse_channel_list(&value),
            Err(ApiError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_playlist_page_with_token() {
        let value = json!({
            "nextPageToken": "tok2",
            "pageInfo": {"totalResults": 120},
            "items": [
                {"contentDetails": {"videoId": "v1", "videoPublishedAt": "2024-01-01T00:00:00Z"},
                 "snippet": {"title": "Song"}},
                {"contentDetails": {}, "snippet": {"title": "broken row"}}
            ]
        });

        let page = parse_playlist_page(&value).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("tok2"));
        assert_eq!(page.total_results, Some(120));
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].video_id, "v1");
        assert!(page.entries[1].video_id.is_empty());
    }

    #[test]
    fn test_parse_final_playlist_page_has_no_token() {
        let value = json!({"items": []});
        let page = parse_playlist_page(&value).unwrap();
        assert!(page.next_page_token.is_none());
        assert!(page.entries.is_empty());
    }

    #[test]
    fn test_parse_video_list_availability() {
        let value = json!({
            "items": [
                {"id": "v1", "snippet": {"title": "Song"},
                 "contentDetails": {"duration": "PT3M30S"},
                 "statistics": {"viewCount": "1000"}},
                {"id": "v2", "snippet": {"title": "Hidden"},
                 "status": {"privacyStatus": "private"}},
                {"id": "v3", "snippet": {"title": "Region locked"},
                 "contentDetails": {"regionRestriction": {"blocked": ["US"]}}}
            ]
        });

        let videos = parse_video_list(&value).unwrap();
        assert_eq!(videos.len(), 3);
        assert_eq!(videos[0].availability, Availability::Active);
        assert_eq!(videos[0].duration_seconds, Some(210));
        assert_eq!(videos[1].availability, Availability::Private);
        assert_eq!(videos[2].availability, Availability::Blocked);
    }

    #[test]
    fn test_parse_video_tags() {
        let value = json!({
            "items": [{"id": "v1", "snippet": {"title": "Song", "tags": ["music", "tamil"]}}]
        });

        let videos = parse_video_list(&value).unwrap();
        assert_eq!(videos[0].tags, vec!["music", "tamil"]);
    }
}
