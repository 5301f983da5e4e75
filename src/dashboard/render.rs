// src/dashboard/render.rs
// Server-side HTML for the dashboard. Each group is a card with its up
// sites first, a divider, then its down sites.
use crate::probe::{ProbeResult, StatusSnapshot};
use crate::sites::{display_domain, SiteGroups};
use chrono::{DateTime, Utc};

/// Everything a page render needs, captured at one instant.
pub struct PageView<'a> {
    pub groups: &'a SiteGroups,
    pub snapshot: Option<&'a StatusSnapshot>,
    pub checking: bool,
    pub now: DateTime<Utc>,
    pub page_refresh_secs: u64,
}

/// Split into (up, down), each in input order.
pub fn partition(results: &[ProbeResult]) -> (Vec<&ProbeResult>, Vec<&ProbeResult>) {
    results.iter().partition(|r| r.is_up())
}

/// "N/M up"
pub fn up_summary(results: &[ProbeResult]) -> String {
    let up = results.iter().filter(|r| r.is_up()).count();
    format!("{}/{} up", up, results.len())
}

pub fn format_elapsed(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s ago", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

/// Elapsed time between two instants; a `then` in the future counts as zero.
pub fn elapsed_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0) as u64;
    format_elapsed(seconds)
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    write_page(&mut out, view);
    out
}

fn write_page(out: &mut String, view: &PageView<'_>) {
    out.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Site Monitor - Status Dashboard</title>
<meta name="description" content="Real-time monitoring of server sites">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta http-equiv="refresh" content="{refresh}">
<style>{css}</style>
</head>
<body>
<main class="container">
<header class="header">
<div class="header-left"><span class="header-icon">🖥️</span><h1 class="header-title">Site Monitor</h1></div>
<div class="header-right">
<form method="post" action="/refresh">
"#,
        refresh = view.page_refresh_secs,
        css = STYLE,
    ));

    if view.checking {
        out.push_str(
            r#"<button type="submit" class="refresh-button spinning" disabled>Checking...</button>"#,
        );
    } else {
        out.push_str(r#"<button type="submit" class="refresh-button">Refresh</button>"#);
    }
    out.push_str("\n</form>\n</div>\n</header>\n");

    let last_checked = match view.snapshot {
        Some(snapshot) => format!("Last checked: {}", elapsed_since(snapshot.timestamp, view.now)),
        None => "Loading...".to_string(),
    };
    out.push_str(&format!(
        "<div class=\"header-footer\"><span class=\"last-checked\">{}</span></div>\n",
        escape_html(&last_checked)
    ));

    match view.snapshot {
        None if view.checking => {
            out.push_str(
                "<div class=\"loading-container\"><div class=\"loading-spinner\"></div><p>Checking site statuses...</p></div>\n",
            );
        }
        None => {}
        Some(snapshot) => {
            out.push_str("<div class=\"servers-grid\">\n");
            write_group(out, view.groups.server1.title, &snapshot.server1);
            write_group(out, view.groups.server2.title, &snapshot.server2);
            out.push_str("</div>\n");
        }
    }

    out.push_str("</main>\n</body>\n</html>\n");
}

fn write_group(out: &mut String, title: &str, results: &[ProbeResult]) {
    out.push_str(&format!(
        r#"<section class="server-card">
<div class="server-header"><span class="server-icon">💻</span><h2 class="server-title">{}</h2><span class="server-stats">✅ {}</span></div>
<div class="sites-container">
"#,
        escape_html(title),
        up_summary(results)
    ));

    let (up, down) = partition(results);
    for site in up {
        write_site(out, site);
    }
    if !down.is_empty() {
        out.push_str("<div class=\"status-divider\"></div>\n");
        for site in down {
            write_site(out, site);
        }
    }

    out.push_str("</div>\n</section>\n");
}

fn write_site(out: &mut String, site: &ProbeResult) {
    let (class, emoji, pill_class, label) = if site.is_up() {
        ("up", "🟢", "pill-up", "UP")
    } else {
        ("down", "🔴", "pill-down", "DOWN")
    };

    out.push_str(&format!(
        r#"<a href="{href}" target="_blank" rel="noopener noreferrer" class="site-row {class}"><div class="site-main"><span class="status-emoji">{emoji}</span><span class="domain-name">{domain}</span></div><div class="site-meta"><span class="status-pill {pill_class}">{label}</span>"#,
        href = escape_html(&site.url),
        domain = escape_html(display_domain(&site.url)),
    ));
    if let Some(code) = site.status_code {
        out.push_str(&format!(r#"<span class="status-code">{}</span>"#, code));
    }
    out.push_str("</div></a>\n");
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const STYLE: &str = r#"
body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; }
.container { min-height: 100vh; background: #f0f2f5; padding: 2rem; max-width: 1600px; margin: 0 auto; }
.header { background: linear-gradient(90deg, #6a11cb 0%, #2575fc 100%); color: white; padding: 20px 30px; border-radius: 12px; display: flex; justify-content: space-between; align-items: center; margin-bottom: 0.5rem; box-shadow: 0 4px 20px rgba(37, 117, 252, 0.3); }
.header-left { display: flex; align-items: center; gap: 1rem; }
.header-icon { font-size: 2rem; }
.header-title { font-size: 1.75rem; font-weight: 700; margin: 0; }
.refresh-button { padding: 0.5rem 1.5rem; background: rgba(255, 255, 255, 0.2); color: white; border: 2px solid rgba(255, 255, 255, 0.3); border-radius: 8px; font-size: 0.95rem; font-weight: 600; cursor: pointer; }
.refresh-button:disabled { opacity: 0.7; cursor: not-allowed; }
.header-footer { padding: 0.75rem 0; margin-bottom: 1.5rem; }
.last-checked { color: #718096; font-size: 0.9rem; font-weight: 500; }
.loading-container { display: flex; flex-direction: column; align-items: center; padding: 4rem; background: white; border-radius: 16px; }
.loading-spinner { width: 3rem; height: 3rem; border: 4px solid #e2e8f0; border-top-color: #2575fc; border-radius: 50%; animation: spin 1s linear infinite; }
@keyframes spin { to { transform: rotate(360deg); } }
.servers-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 2rem; }
.server-card { background: white; box-shadow: 0 2px 10px rgba(0, 0, 0, 0.08); border-radius: 16px; padding: 1.5rem; }
.server-header { display: flex; align-items: center; gap: 0.75rem; margin-bottom: 1.25rem; padding-bottom: 1rem; border-bottom: 2px solid #e2e8f0; }
.server-icon { font-size: 1.5rem; }
.server-title { font-size: 1.35rem; font-weight: 700; color: #1a202c; margin: 0; flex: 1; }
.server-stats { font-size: 0.875rem; font-weight: 600; color: #48bb78; background: #f0f9f5; padding: 0.25rem 0.75rem; border-radius: 20px; }
.sites-container { display: flex; flex-direction: column; gap: 0.75rem; }
.status-divider { height: 2px; background: linear-gradient(90deg, transparent, #e2e8f0, transparent); margin: 1rem 0; }
.site-row { display: flex; align-items: center; justify-content: space-between; padding: 1rem 1.25rem; background: #f7fafc; border-radius: 10px; text-decoration: none; border-left: 4px solid; }
.site-row.up { border-left-color: #48bb78; }
.site-row.down { border-left-color: #f56565; }
.site-row:hover { background: #edf2f7; }
.site-main { display: flex; align-items: center; gap: 0.75rem; flex: 1; }
.domain-name { font-size: 1rem; font-weight: 600; color: #1a202c; }
.site-meta { display: flex; align-items: center; gap: 0.75rem; }
.status-pill { padding: 0.375rem 0.875rem; border-radius: 20px; font-size: 0.75rem; font-weight: 700; letter-spacing: 0.5px; }
.pill-up { background: #d4edda; color: #155724; }
.pill-down { background: #f8d7da; color: #721c24; }
.status-code { font-size: 0.75rem; color: #a0aec0; background: white; padding: 0.25rem 0.5rem; border-radius: 6px; font-weight: 600; }
@media (max-width: 1200px) { .servers-grid { grid-template-columns: 1fr; } }
"#;
