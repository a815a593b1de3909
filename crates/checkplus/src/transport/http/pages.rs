//! HTML pages served to the browser around the provider hand-off.

/// Where the provider's verification window is opened.
pub const CHECKPLUS_FORM_URL: &str = "https://nice.checkplus.co.kr/CheckPlusSafeModel/checkplus.cb";

/// Page that immediately posts the encrypted request to the provider.
pub fn checkplus_form(action: &str, encode_data: &str) -> String {
    [
        "<!DOCTYPE html>",
        "<html lang=\"ko\">",
        "<head>",
        "<meta charset=\"utf-8\">",
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">",
        "</head>",
        "<body onload=\"document.form_chk.submit()\">",
        &format!(
            "<form name=\"form_chk\" method=\"post\" action=\"{}\">",
            escape(action)
        ),
        "<input type=\"hidden\" name=\"m\" value=\"checkplusService\">",
        &format!(
            "<input type=\"hidden\" name=\"EncodeData\" value=\"{}\">",
            escape(encode_data)
        ),
        "</form>",
        "</body>",
        "</html>",
    ]
    .join("\n")
}

/// Landing page for the provider's return redirect.
///
/// Carries the encrypted result in a hidden input for the embedding app to read.
pub fn landing(encode_data: &str) -> String {
    [
        "<!DOCTYPE html>",
        "<html lang=\"ko\">",
        "<head>",
        "<meta charset=\"utf-8\">",
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">",
        "</head>",
        "<body>",
        "<p>Success</p>",
        &format!(
            "<input type=\"hidden\" name=\"EncodeData\" value=\"{}\">",
            escape(encode_data)
        ),
        "</body>",
        "</html>",
    ]
    .join("\n")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
