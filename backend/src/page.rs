use shared::models::VoteOption;
use crate::config::Config;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn button(config: &Config, option: VoteOption, voted: Option<VoteOption>) -> String {
    let check = if voted == Some(option) { " &#10004;" } else { "" };
    format!(
        r#"<button id="{key}" type="submit" name="vote" value="{key}">{label}{check}</button>"#,
        key = option.key(),
        label = escape(config.label(option)),
    )
}

/// Voting page: both choices, the serving host, and a mark on the recorded vote.
pub fn render(config: &Config, voted: Option<VoteOption>) -> String {
    let a = escape(&config.option_a);
    let b = escape(&config.option_b);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{a} vs {b}! | Voting App</title>
</head>
<body>
<div id="content-container">
<h3>{a} vs {b}!</h3>
<form id="choice" method="POST" action="/">
{button_a}
{button_b}
</form>
<div id="tip">(Tip: you can change your vote)</div>
<div id="hostname">Processed by container ID {host}</div>
</div>
</body>
</html>
"#,
        button_a = button(config, VoteOption::A, voted),
        button_b = button(config, VoteOption::B, voted),
        host = escape(&config.hostname),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_labels_and_escapes_them() {
        let mut config = Config::from_lookup(|_| None);
        config.option_a = "<Cats>".into();
        config.hostname = "vote-7".into();
        let html = render(&config, Some(VoteOption::B));
        assert!(html.contains("Voting App"));
        assert!(html.contains("&lt;Cats&gt;"));
        assert!(!html.contains("<Cats>"));
        assert!(html.contains("vote-7"));
        assert!(html.contains(r#"value="b">Dogs &#10004;</button>"#));
    }
}
