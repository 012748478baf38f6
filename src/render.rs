//! HTML rendering for the dashboard page

use crate::{
    constants::{MAX_REFRESH_SECS, MIN_REFRESH_SECS, REFRESH_STEP_SECS},
    interval::RefreshInterval,
    store::{CycleFailure, DashboardView},
};
use std::fmt::Write;

/// Formats a currency amount as `$1,234.56`; negatives read `$-1,234.56`
pub fn format_usd(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("${}{}.{}", sign, group_thousands(int_part), frac_part)
}

/// Formats a percentage change as `+1.23%`
pub fn format_change(value: f64) -> String {
    format!("{:+.2}%", value)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn opt(value: Option<f64>, f: fn(f64) -> String) -> String {
    value.map(f).unwrap_or_else(|| "&mdash;".to_string())
}

/// Escapes text for inclusion in HTML
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// What the page needs to know besides the data itself
pub struct PageContext<'a> {
    pub view: Option<&'a DashboardView>,
    pub interval: RefreshInterval,
    pub export_path: Option<String>,
    pub last_failure: Option<&'a CycleFailure>,
}

/// Renders the full dashboard page
pub fn render_dashboard(ctx: &PageContext<'_>) -> String {
    let mut body = String::new();

    body.push_str(r#"<main class="content">"#);
    body.push_str("<h1>&#x1F4C8; Live Cryptocurrency Dashboard</h1>");
    body.push_str(
        "<p>Stay updated with live cryptocurrency prices and insights! \
         This dashboard fetches real-time data for the top 50 cryptocurrencies by market capitalization.</p>",
    );

    if let Some(failure) = ctx.last_failure {
        let _ = write!(
            body,
            r#"<div class="alert">Last refresh failed at {}: {}</div>"#,
            failure.at.format("%Y-%m-%d %H:%M:%S UTC"),
            escape_html(&failure.message)
        );
    }

    match ctx.view {
        Some(view) => render_view(&mut body, view),
        None => body.push_str(r#"<p class="waiting">Waiting for the first market snapshot&hellip;</p>"#),
    }
    body.push_str("</main>");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Live Cryptocurrency Dashboard</title>
<style>{style}</style>
</head>
<body>
{sidebar}
{body}
<script>{script}</script>
</body>
</html>"#,
        style = STYLE,
        sidebar = render_sidebar(ctx),
        body = body,
        script = SCRIPT,
    )
}

fn render_sidebar(ctx: &PageContext<'_>) -> String {
    let secs = ctx.interval.as_secs();
    let mut out = String::new();

    out.push_str(r#"<aside class="sidebar"><h2>&#x2699;&#xFE0F; Dashboard Settings</h2>"#);
    let _ = write!(
        out,
        r#"<label for="refresh">Refresh Rate (seconds): <output id="refresh-value">{secs}</output></label>
<input type="range" id="refresh" min="{min}" max="{max}" step="{step}" value="{secs}">"#,
        secs = secs,
        min = MIN_REFRESH_SECS,
        max = MAX_REFRESH_SECS,
        step = REFRESH_STEP_SECS,
    );
    out.push_str(r#"<button id="refresh-now" type="button">Refresh now</button><hr>"#);

    match &ctx.export_path {
        Some(path) => {
            let _ = write!(
                out,
                "<p>&#x1F4BE; <em>Data Export</em>: The latest data is saved to {} on every refresh.</p>",
                escape_html(path)
            );
        }
        None => out.push_str("<p>&#x1F4BE; <em>Data Export</em>: disabled.</p>"),
    }

    if let Some(view) = ctx.view {
        let _ = write!(
            out,
            r#"<p class="success">&#x2705; Data updated {}! Next refresh in {} seconds.</p>"#,
            view.snapshot.fetched_at.format("%H:%M:%S UTC"),
            secs
        );
    }
    out.push_str("</aside>");
    out
}

fn render_view(out: &mut String, view: &DashboardView) {
    out.push_str("<h3>&#x1F504; <em>Live Cryptocurrency Data</em></h3>");
    out.push_str(
        "<table class=\"data\"><thead><tr><th></th><th>name</th><th>symbol</th>\
         <th>current_price</th><th>market_cap</th><th>total_volume</th>\
         <th>price_change_percentage_24h</th></tr></thead><tbody>",
    );
    for (i, row) in view.snapshot.rows.iter().enumerate() {
        let change_class = match row.price_change_percentage_24h {
            Some(c) if c > 0.0 => "up",
            Some(c) if c < 0.0 => "down",
            _ => "",
        };
        let _ = write!(
            out,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="{}">{}</td></tr>"#,
            i,
            escape_html(&row.name),
            escape_html(&row.symbol),
            opt(row.current_price, format_usd),
            opt(row.market_cap, format_usd),
            opt(row.total_volume, format_usd),
            change_class,
            opt(row.price_change_percentage_24h, format_change),
        );
    }
    out.push_str("</tbody></table><hr>");

    let summary = &view.summary;
    out.push_str(r#"<div class="columns">"#);

    out.push_str(r#"<section><h3>&#x1F3C6; Top 5 by Market Cap</h3><table><thead><tr><th>name</th><th>market_cap</th></tr></thead><tbody>"#);
    for entry in &summary.top_by_market_cap {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(&entry.name),
            format_usd(entry.market_cap)
        );
    }
    out.push_str("</tbody></table></section>");

    let _ = write!(
        out,
        r#"<section><h3>&#x1F4B0; Average Price</h3><div class="metric"><span class="label">Average Price (USD)</span><span class="value">{}</span></div></section>"#,
        opt(summary.average_price, format_usd)
    );

    out.push_str("<section><h3>&#x1F4CA; Price Changes (24h)</h3>");
    for (label, entry) in [
        ("Highest Change", &summary.highest_change),
        ("Lowest Change", &summary.lowest_change),
    ] {
        let (value, name) = match entry {
            Some(e) => (
                format!("{:.2}%", e.price_change_percentage_24h),
                escape_html(&e.name),
            ),
            None => ("&mdash;".to_string(), String::new()),
        };
        let _ = write!(
            out,
            r#"<div class="metric" title="{name}"><span class="label">{label}</span><span class="value">{value}</span><span class="help">{name}</span></div>"#,
            name = name,
            label = label,
            value = value,
        );
    }
    out.push_str("</section></div>");
}

const STYLE: &str = r#"
body { margin: 0; display: flex; font-family: system-ui, sans-serif; color: #262730; }
.sidebar { width: 260px; min-height: 100vh; padding: 1.5rem; background: #f0f2f6; box-sizing: border-box; }
.sidebar input[type=range] { width: 100%; }
.content { flex: 1; padding: 1.5rem 3rem; overflow-x: auto; }
table { border-collapse: collapse; font-size: 0.9rem; }
th, td { padding: 0.3rem 0.6rem; border-bottom: 1px solid #e6e9ef; text-align: right; }
th:nth-child(-n+3), td:nth-child(-n+3) { text-align: left; }
.columns { display: grid; grid-template-columns: repeat(3, 1fr); gap: 2rem; }
.metric { margin-bottom: 1rem; }
.metric .label { display: block; font-size: 0.85rem; }
.metric .value { display: block; font-size: 2rem; }
.metric .help { font-size: 0.8rem; color: #808495; }
.up { color: #09ab3b; } .down { color: #ff2b2b; }
.alert { padding: 0.75rem; background: #ffe5e5; border-radius: 0.5rem; }
.success { padding: 0.75rem; background: #dff5e3; border-radius: 0.5rem; }
"#;

const SCRIPT: &str = r#"
(function () {
  const slider = document.getElementById('refresh');
  const shown = document.getElementById('refresh-value');
  slider.addEventListener('input', () => { shown.textContent = slider.value; });
  slider.addEventListener('change', () => {
    fetch('/api/settings/refresh-interval', {
      method: 'PUT',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ seconds: Number(slider.value) }),
    });
  });
  document.getElementById('refresh-now').addEventListener('click', () => {
    fetch('/api/refresh', { method: 'POST' });
  });
  const events = new EventSource('/api/events');
  events.addEventListener('SNAPSHOT_UPDATED', () => window.location.reload());
  events.addEventListener('FETCH_FAILED', () => window.location.reload());
})();
"#;
