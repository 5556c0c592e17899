//! Frame-source selection: scores candidate video surfaces and picks the one
//! most likely to be the user's own camera tile. Pure functions over candidate
//! snapshots, no state, so identical inputs always select identically.

/// Candidates below this score are unusable; callers treat the absence of a
/// usable source as "stop capturing", not as an error.
pub const MINIMUM_USABLE_SCORE: i32 = 4;

/// Tiles at least this large (96x54) earn the preferred-size point.
const MINIMUM_PREFERRED_AREA: f64 = 96.0 * 54.0;

/// Untagged, non-camera tiles larger than this (640x360) are penalized as
/// likely shared-screen content.
const LIKELY_SCREEN_AREA: f64 = 640.0 * 360.0;

const CAMERA_LABEL_KEYWORDS: [&str; 4] = ["camera", "webcam", "facetime", "front"];
const SCREEN_LABEL_KEYWORDS: [&str; 3] = ["screen", "display", "window"];

/// Snapshot of one media track attached to a candidate surface.
#[derive(Debug, Clone)]
pub struct TrackInfo {
    pub label: String,
    pub ended: bool,
    pub enabled: bool,
    pub muted: bool,
}

impl Default for TrackInfo {
    fn default() -> Self {
        Self {
            label: String::new(),
            ended: false,
            enabled: true,
            muted: false,
        }
    }
}

impl TrackInfo {
    pub fn live(&self) -> bool {
        !self.ended && self.enabled && !self.muted
    }
}

/// Snapshot of one candidate video surface, captured by a frame source from
/// whatever discovery mechanism it uses (DOM observer, platform API, ...).
#[derive(Debug, Clone, Default)]
pub struct VideoCandidate {
    /// Decoder has enough data to paint a frame.
    pub decode_ready: bool,
    /// Playback position has advanced past zero.
    pub playback_advanced: bool,
    /// A media stream is attached, live or not.
    pub has_stream: bool,
    pub tracks: Vec<TrackInfo>,
    pub width: f64,
    pub height: f64,
    /// The surface sits inside a region tagged as the self/local view.
    pub self_view: bool,
    /// The visual transform flips horizontally (front-camera style).
    pub mirrored: bool,
}

impl VideoCandidate {
    fn area(&self) -> f64 {
        (self.width * self.height).max(0.0)
    }

    fn label_matches(&self, keywords: &[&str]) -> bool {
        self.tracks.iter().any(|track| {
            let label = track.label.to_lowercase();
            keywords.iter().any(|keyword| label.contains(keyword))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceScore {
    pub score: i32,
    pub area: f64,
}

pub fn score_candidate(candidate: &VideoCandidate) -> SourceScore {
    let area = candidate.area();
    let has_live_track = candidate.tracks.iter().any(TrackInfo::live);
    let camera_labeled = candidate.label_matches(&CAMERA_LABEL_KEYWORDS);

    let mut score = 0;
    if candidate.decode_ready {
        score += 2;
    }
    if has_live_track {
        score += 4;
    } else if candidate.has_stream {
        score += 3;
    }
    if candidate.playback_advanced {
        score += 2;
    }
    if area > 0.0 {
        score += 1;
    }
    if area >= MINIMUM_PREFERRED_AREA {
        score += 1;
    }
    if candidate.self_view {
        score += 5;
    }
    if camera_labeled {
        score += 4;
    }
    if candidate.mirrored {
        score += 2;
    }
    if candidate.label_matches(&SCREEN_LABEL_KEYWORDS) {
        score -= 8;
    }
    if !candidate.self_view && !camera_labeled && area > LIKELY_SCREEN_AREA {
        score -= 2;
    }
    if candidate.height > 0.0 {
        let aspect = candidate.width / candidate.height;
        if aspect > 2.2 || aspect < 0.5 {
            score -= 1;
        }
    }

    SourceScore { score, area }
}

/// Picks the highest-scoring candidate, breaking ties toward the larger
/// visible area. Returns the winning index, or `None` when no candidate
/// clears [`MINIMUM_USABLE_SCORE`].
pub fn pick_best(candidates: &[VideoCandidate]) -> Option<usize> {
    let mut best = None;
    let mut best_score = -1;
    let mut best_area = -1.0;

    for (index, candidate) in candidates.iter().enumerate() {
        let SourceScore { score, area } = score_candidate(candidate);
        if score > best_score || (score == best_score && area > best_area) {
            best = Some(index);
            best_score = score;
            best_area = area;
        }
    }

    if best_score < MINIMUM_USABLE_SCORE {
        return None;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_track(label: &str) -> TrackInfo {
        TrackInfo {
            label: label.to_string(),
            ..TrackInfo::default()
        }
    }

    fn live_candidate(width: f64, height: f64, label: &str) -> VideoCandidate {
        VideoCandidate {
            decode_ready: true,
            has_stream: true,
            tracks: vec![live_track(label)],
            width,
            height,
            ..VideoCandidate::default()
        }
    }

    #[test]
    fn empty_candidate_set_yields_none() {
        assert_eq!(pick_best(&[]), None);
    }

    #[test]
    fn single_unusable_candidate_yields_none() {
        // Not decode-ready, no stream: a decorative element.
        let decorative = VideoCandidate {
            width: 300.0,
            height: 200.0,
            ..VideoCandidate::default()
        };
        assert!(score_candidate(&decorative).score < MINIMUM_USABLE_SCORE);
        assert_eq!(pick_best(&[decorative]), None);
    }

    #[test]
    fn small_self_camera_beats_large_screen_share() {
        let screen_share = live_candidate(1280.0, 720.0, "Screen 1");
        let mut self_camera = live_candidate(160.0, 90.0, "Integrated Camera");
        self_camera.self_view = true;

        assert_eq!(pick_best(&[screen_share, self_camera]), Some(1));
    }

    #[test]
    fn live_stream_beats_playback_only_video() {
        let playback_only = VideoCandidate {
            decode_ready: true,
            playback_advanced: true,
            width: 640.0,
            height: 360.0,
            ..VideoCandidate::default()
        };
        let live_camera = live_candidate(140.0, 80.0, "");

        assert_eq!(pick_best(&[playback_only, live_camera]), Some(1));
    }

    #[test]
    fn area_breaks_score_ties() {
        let small = live_candidate(160.0, 90.0, "");
        let large = live_candidate(320.0, 180.0, "");
        assert_eq!(pick_best(&[small, large]), Some(1));
    }

    #[test]
    fn mirrored_feed_and_extreme_aspect_adjust_the_score() {
        let mut mirrored = live_candidate(160.0, 90.0, "");
        mirrored.mirrored = true;
        assert_eq!(
            score_candidate(&mirrored).score,
            score_candidate(&live_candidate(160.0, 90.0, "")).score + 2
        );

        let banner = live_candidate(960.0, 90.0, "");
        assert_eq!(
            score_candidate(&banner).score,
            // Same points as the preferred-size tile, minus the aspect penalty.
            score_candidate(&live_candidate(160.0, 90.0, "")).score - 1
        );
    }

    #[test]
    fn muted_or_disabled_tracks_do_not_count_as_live() {
        let mut muted = live_candidate(160.0, 90.0, "");
        muted.tracks[0].muted = true;
        // Falls back to the attached-stream points.
        let base = score_candidate(&live_candidate(160.0, 90.0, "")).score;
        assert_eq!(score_candidate(&muted).score, base - 1);
    }
}
