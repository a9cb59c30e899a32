//! Server-rendered pages. Markup is assembled with `format!`; every value
//! that comes from the API or the visitor goes through [`escape`].

use chrono::{DateTime, Utc};
use domain::{VoteOption, VoteResults, embed_url, watch_url};
use live_view::LiveDisplay;
use vote_guard::LocalStorage;
use vote_view::{ViewState, VoteView, avatar_url};

const EMBED_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

const STYLE: &str = r#"
body{margin:0;background:#111827;color:#f9fafb;font-family:system-ui,sans-serif}
nav{background:#000;border-bottom:1px solid #1f2937;padding:12px 16px}
nav .bar,main{max-width:1100px;margin:0 auto}
nav .bar{display:flex;justify-content:space-between;align-items:center}
nav h1{margin:0;font-size:1.5rem;color:#8b5cf6}
a.pill,button.pill{background:#2563eb;color:#fff;padding:8px 24px;border-radius:999px;text-decoration:none;font-weight:600;border:0}
main{padding:16px}
.card{background:#1f2937;border-radius:12px;padding:16px;margin-bottom:24px}
.video{position:relative;padding-top:56.25%}
.video iframe{position:absolute;inset:0;width:100%;height:100%;border:0}
.placeholder{padding:96px 16px;text-align:center;color:#9ca3af}
.badge{background:#ef4444;border-radius:999px;padding:2px 8px;font-size:.85rem}
.muted{color:#9ca3af}
.grid{display:grid;grid-template-columns:1fr 1fr;gap:24px}
.comment{display:flex;gap:12px;margin:12px 0}
.comment img{width:40px;height:40px;border-radius:50%}
.bar-track{background:#374151;border-radius:999px;height:12px}
.bar-fill{background:#3b82f6;border-radius:999px;height:12px}
.votes{display:grid;grid-template-columns:1fr 1fr;gap:16px;margin-top:16px}
.votes button{padding:24px;border-radius:12px;font-size:1.1rem;font-weight:700;border:0;color:#fff;background:#6366f1}
.votes button.chosen{background:#16a34a}
.votes button:disabled:not(.chosen){background:#374151;opacity:.5}
.notice{background:#7f1d1d;border-radius:8px;padding:12px}
.thanks{background:#14532d;border-radius:8px;padding:12px;margin-top:16px;text-align:center}
"#;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// `1234567` -> `1,234,567`
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

fn format_percent(results: &VoteResults, option: VoteOption) -> String {
    if results.total == 0 {
        "0".to_string()
    } else {
        format!("{:.1}", results.percent_for(option))
    }
}

/// Link to the vote page carrying the given toggles
pub fn vote_href(state: ViewState) -> String {
    let mut href = format!("/vote?piece={}", state.current.index());
    if state.show_details {
        href.push_str("&details=true");
    }
    if state.comments_expanded {
        href.push_str("&comments=all");
    }
    href
}

fn layout(title: &str, nav_href: &str, nav_label: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<nav><div class="bar"><h1>{title}</h1><a class="pill" href="{nav_href}">{nav_label}</a></div></nav>
<main>
{body}
</main>
</body>
</html>"#
    )
}

fn embed(video_id: &str) -> String {
    format!(
        r#"<div class="video"><iframe src="{src}" allow="{EMBED_ALLOW}" allowfullscreen></iframe></div>"#,
        src = escape(&embed_url(video_id)),
    )
}

pub fn live_page(display: &LiveDisplay) -> String {
    let stream = match display {
        LiveDisplay::Embed {
            video_id,
            title,
            badge,
            ..
        } => format!(
            r#"<div class="card">{embed}
<p><span class="badge">{badge}</span> <span class="muted">Now Playing</span></p>
<h2>{title}</h2></div>"#,
            embed = embed(video_id),
            title = escape(title),
        ),
        LiveDisplay::Placeholder { headline, hint } => format!(
            r#"<div class="card placeholder"><p><strong>{headline}</strong></p><p>{hint}</p></div>"#
        ),
    };

    let body = format!(
        r#"{stream}
<div class="grid">
<div class="card"><h3>About TezTones</h3><p class="muted">Watch live art battles between talented artists competing head-to-head in our unique sports league format.</p></div>
<div class="card"><h3>How to Vote</h3><p class="muted">After each match, head to the voting page to support your favorite artist and help them advance.</p></div>
</div>"#
    );
    layout("TezTones Live", "/vote", "Vote Now", &body)
}

pub fn loading_page() -> String {
    layout(
        "TezTones Vote",
        "/",
        "Watch Live",
        r#"<div class="card placeholder"><p>Loading videos...</p></div>"#,
    )
}

/// The voting page. `notice` is shown above the vote buttons when set.
pub fn vote_page<S: LocalStorage>(view: &VoteView<S>, notice: Option<&str>) -> String {
    let Some(video) = view.current_video() else {
        return loading_page();
    };
    let state = view.view_state();
    let current = view.current();
    let other = current.other();

    let switch_href = vote_href(ViewState {
        current: other,
        show_details: false,
        ..state
    });
    let details_href = vote_href(ViewState {
        show_details: !state.show_details,
        ..state
    });
    let details = if view.show_details() {
        let likes = video
            .like_count
            .map(|likes| format!(" &middot; {} likes", format_count(likes)))
            .unwrap_or_default();
        format!(
            r#"<h3>{title}</h3>
<p class="muted">{date} &middot; {views} views{likes}</p>
<p>{description}</p>"#,
            title = escape(&video.title),
            date = format_date(&video.published_at),
            views = format_count(video.view_count),
            description = escape(&video.description),
        )
    } else {
        String::new()
    };

    let player = format!(
        r#"<div class="card">{embed}
<p class="muted">Currently Viewing</p>
<h2>Piece {number}</h2>
<p><a class="pill" href="{switch}">Switch to Piece {other_number}</a></p>
<p><a href="{details_href}">Video Details {arrow}</a></p>
{details}</div>"#,
        embed = embed(&video.id),
        number = current.label_number(),
        switch = escape(&switch_href),
        other_number = other.label_number(),
        details_href = escape(&details_href),
        arrow = if view.show_details() { "&#9650;" } else { "&#9660;" },
    );

    let body = format!(
        "{player}\n{comments}\n{vote}",
        comments = comments_card(view, &watch_url(&video.id), state),
        vote = vote_card(view, notice),
    );
    layout("TezTones Vote", "/", "Watch Live", &body)
}

fn comments_card<S: LocalStorage>(view: &VoteView<S>, watch: &str, state: ViewState) -> String {
    let comments = view.comments();
    let list = if view.is_loading_comments() {
        r#"<p class="muted">Loading comments...</p>"#.to_string()
    } else {
        let mut list: String = comments
            .visible()
            .iter()
            .map(|comment| {
                format!(
                    r#"<div class="comment"><img src="{avatar}" alt="{author}">
<div><strong>{author}</strong> <span class="muted">{date}</span><p>{text}</p></div></div>"#,
                    avatar = escape(avatar_url(comment)),
                    author = escape(&comment.author),
                    date = format_date(&comment.published_at),
                    text = escape(&comment.text),
                )
            })
            .collect();

        if comments.has_more() {
            let toggle_href = vote_href(ViewState {
                comments_expanded: !state.comments_expanded,
                ..state
            });
            let label = if comments.is_expanded() {
                "Show Less".to_string()
            } else {
                format!("Show {} More Comments", comments.hidden_count())
            };
            list.push_str(&format!(r#"<p><a href="{}">{label}</a></p>"#, escape(&toggle_href)));
        }
        list
    };

    format!(
        r#"<div class="card">
<p><strong>{count} Comments</strong> &middot; <a href="{watch}" target="_blank" rel="noopener noreferrer">Go to YouTube to Comment</a></p>
{list}</div>"#,
        count = comments.len(),
        watch = escape(watch),
    )
}

fn vote_card<S: LocalStorage>(view: &VoteView<S>, notice: Option<&str>) -> String {
    let results = view.results();
    let bars: String = VoteOption::ALL
        .iter()
        .map(|&option| {
            let percent = format_percent(&results, option);
            format!(
                r#"<div><p>Piece {number} <span class="muted">{votes} votes ({percent}%)</span></p>
<div class="bar-track"><div class="bar-fill" style="width:{percent}%"></div></div></div>"#,
                number = option.label_number(),
                votes = results.votes_for(option),
            )
        })
        .collect();

    let buttons: String = view
        .vote_buttons()
        .into_iter()
        .map(|button| {
            format!(
                r#"<button type="submit" name="option" value="{option}"{class}{disabled}>{label}</button>"#,
                option = button.option,
                class = if button.chosen { r#" class="chosen""# } else { "" },
                disabled = if button.enabled { "" } else { " disabled" },
                label = escape(&button.label),
            )
        })
        .collect();

    let notice = notice
        .map(|text| format!(r#"<p class="notice">{}</p>"#, escape(text)))
        .unwrap_or_default();
    let thanks = view
        .thank_you()
        .map(|text| format!(r#"<p class="thanks">{text}</p>"#))
        .unwrap_or_default();

    format!(
        r#"<div class="card">
<h3>Cast Your Vote</h3>
<h4>Current Results</h4>
{bars}
<p class="muted">Total Votes: {total}</p>
{notice}
<form method="post" action="/vote">
<input type="hidden" name="piece" value="{piece}">
<div class="votes">{buttons}</div>
</form>
{thanks}</div>"#,
        total = results.total,
        piece = view.current().index(),
    )
}
