#![forbid(unsafe_code)]

use axum::http::StatusCode;
use axum::response::Html;

const STYLE: &str = "body{font-family:sans-serif;max-width:48em;margin:2em auto;padding:0 1em}\
nav a{margin-right:1em}.flash{background:#fff3cd;border:1px solid #e0c36a;padding:.5em 1em}\
form label{display:block;margin-top:.75em}.error{color:#8a1c1c}";

const NAV: &str = r#"<nav><a href="/home">Home</a><a href="/dashboard">Dashboard</a><a href="/report">Report a crime</a><a href="/about">About</a><a href="/logout">Log out</a></nav>"#;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

fn layout(title: &str, flashes: &[String], signed_in: bool, body: &str) -> Html<String> {
    let notices: String = flashes
        .iter()
        .map(|msg| format!(r#"<p class="flash">{}</p>"#, escape_html(msg)))
        .collect();
    let nav = if signed_in { NAV } else { "" };
    Html(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title} | CrimeWatch</title>\
         <style>{STYLE}</style></head>\n<body>{nav}<h1>{title}</h1>{notices}\n{body}\n</body></html>",
        title = escape_html(title),
    ))
}

pub fn register_page(flashes: &[String]) -> Html<String> {
    layout(
        "Register",
        flashes,
        false,
        r#"<form method="post" action="/">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<label>Email <input name="email" type="email" required></label>
<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#,
    )
}

pub fn login_page(flashes: &[String]) -> Html<String> {
    layout(
        "Log in",
        flashes,
        false,
        r#"<form method="post" action="/login">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account yet? <a href="/">Register</a></p>"#,
    )
}

pub fn home_page(username: &str, flashes: &[String]) -> Html<String> {
    let body = format!(
        "<p>Welcome, {}.</p>\n<p>Use the dashboard to estimate crime statistics or file a new report.</p>",
        escape_html(username)
    );
    layout("Home", flashes, true, &body)
}

pub fn about_page(flashes: &[String]) -> Html<String> {
    layout(
        "About",
        flashes,
        true,
        "<p>CrimeWatch collects crime reports from registered users and estimates \
         historical crime counts per state, year and crime type from a fitted \
         regression model.</p>",
    )
}

pub fn dashboard_page(flashes: &[String]) -> Html<String> {
    layout(
        "Dashboard",
        flashes,
        true,
        r#"<h2>Estimate a crime count</h2>
<form method="post" action="/predict">
<label>State <input name="state" required></label>
<label>Year <input name="year" type="number" required></label>
<label>Crime type <input name="crime_type" required></label>
<button type="submit">Predict</button>
</form>"#,
    )
}

pub fn report_page(flashes: &[String]) -> Html<String> {
    layout(
        "Report a crime",
        flashes,
        true,
        r#"<form method="post" action="/report_crime" enctype="multipart/form-data">
<label>Name <input name="name" required></label>
<label>Phone number <input name="phone_number" required></label>
<label>Location <input name="location" required></label>
<label>Crime type <input name="crime_type" required></label>
<label>Description <textarea name="description" required></textarea></label>
<label>Attachment <input name="attachment" type="file"></label>
<button type="submit">Submit report</button>
</form>"#,
    )
}

pub fn prediction_page(state: &str, year: i32, crime_type: &str, prediction: f64) -> Html<String> {
    let body = format!(
        "<p>Estimated <strong>{}</strong> count for <strong>{}</strong> in {year}:</p>\n\
         <p class=\"prediction\">{prediction:.2}</p>\n<p><a href=\"/dashboard\">Back to dashboard</a></p>",
        escape_html(crime_type),
        escape_html(state),
    );
    layout("Prediction", &[], true, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let body = format!(
        "<p class=\"error\">{}</p>\n<p><a href=\"/home\">Back</a></p>",
        escape_html(message)
    );
    let title = status.canonical_reason().unwrap_or("Error");
    layout(title, &[], false, &body)
}
