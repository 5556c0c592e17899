//! Meeting-platform registry: maps a host name to the markers a frame source
//! uses to tag the self/local video region on that platform.

/// Markers identifying the self-view region on one meeting platform. The
/// marker strings are matched by frame-source implementations against their
/// discovery mechanism (DOM selectors, element attributes, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformDescriptor {
    pub name: &'static str,
    pub self_view_markers: &'static [&'static str],
}

const GOOGLE_MEET: PlatformDescriptor = PlatformDescriptor {
    name: "Google Meet",
    self_view_markers: &[
        "div[data-self-video=\"true\"] video",
        "video[data-self-video=\"true\"]",
        "[data-is-self=\"true\"] video",
        "[data-local-participant=\"true\"] video",
        "[data-self-name] video",
    ],
};

const ZOOM: PlatformDescriptor = PlatformDescriptor {
    name: "Zoom",
    self_view_markers: &[
        "[class*=\"self-view\"] video",
        "[data-type=\"self\"] video",
        "video[class*=\"self-video\"]",
    ],
};

const TEAMS: PlatformDescriptor = PlatformDescriptor {
    name: "Microsoft Teams",
    self_view_markers: &[
        "[data-tid=\"self-video\"] video",
        "#self-video video",
        "[data-cid=\"calling-self-video\"] video",
    ],
};

const SLACK: PlatformDescriptor = PlatformDescriptor {
    name: "Slack",
    self_view_markers: &[
        "[data-qa=\"self_video\"] video",
        "[class*=\"self_view\"] video",
        "[data-qa=\"huddle_self_video\"] video",
    ],
};

const DISCORD: PlatformDescriptor = PlatformDescriptor {
    name: "Discord",
    self_view_markers: &["[class*=\"mirror\"] video", "video[class*=\"video-\"]"],
};

const WEBEX: PlatformDescriptor = PlatformDescriptor {
    name: "Webex",
    self_view_markers: &["[class*=\"self-view\"] video", "video[mediatype=\"local\"]"],
};

/// Fallback for hosts with no dedicated entry: generic self/local tagging.
const GENERIC: PlatformDescriptor = PlatformDescriptor {
    name: "Generic",
    self_view_markers: &["[class*=\"self\"] video", "[class*=\"local\"] video"],
};

/// Resolves a host name to its platform descriptor. Exact entries first,
/// then wildcard suffixes (every Webex tenant lives on its own subdomain).
pub fn platform_for_host(host: &str) -> PlatformDescriptor {
    match host {
        "meet.google.com" => GOOGLE_MEET,
        "app.zoom.us" => ZOOM,
        "teams.microsoft.com" | "teams.live.com" => TEAMS,
        "app.slack.com" => SLACK,
        "discord.com" => DISCORD,
        _ if host.ends_with(".webex.com") => WEBEX,
        _ => GENERIC,
    }
}
