//! Small text helpers for Slack message handling.

/// What the bot infers a free-text message is asking for, when the person has
/// no pending question to answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    PromptIntroUpdate,
}

/// Extract the user id from the first `<@U...>` mention token in `text`, if
/// any. Tokens may carry a legacy display-name suffix (`<@U123|ada>`).
pub fn first_mention(text: &str) -> Option<&str> {
    let start = text.find("<@")? + 2;
    let rest = &text[start..];
    let end = rest.find('>')?;
    let id = rest[..end].split('|').next().unwrap_or("");
    let valid = id.len() > 1
        && (id.starts_with('U') || id.starts_with('W'))
        && id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    valid.then_some(&rest[..id.len()])
}

/// Remove the first mention token from `text`, returning the trimmed rest.
pub fn strip_first_mention(text: &str) -> String {
    let Some(start) = text.find("<@") else {
        return text.trim().to_owned();
    };
    let Some(end) = text[start..].find('>') else {
        return text.trim().to_owned();
    };
    let mut stripped = String::with_capacity(text.len());
    stripped.push_str(&text[..start]);
    stripped.push_str(&text[start + end + 1..]);
    stripped.trim().to_owned()
}

/// Render `text` as a Slack blockquote, one `>` per line.
pub fn blockquote(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    text.lines().map(|line| format!("> {line}")).collect::<Vec<_>>().join("\n")
}

/// The first whitespace-separated part of a full name. A single-word name is
/// returned whole. Used only as a default for `casual_name`; the heuristic
/// does not hold for surname-first naming orders, which is why the field
/// stays editable.
pub fn first_name(full_name: &str) -> &str {
    full_name.trim().split_whitespace().next().unwrap_or("")
}

/// Infer what the user wants from a free-text message.
pub fn infer_intent(message: &str) -> Option<Intent> {
    let message = message.to_lowercase();
    let wants_change = message.contains("update") || message.contains("change");
    let about_intro = message.contains("bio") || message.contains("intro");
    (wants_change && about_intro).then_some(Intent::PromptIntroUpdate)
}

#[cfg(test)]
mod tests {
    use super::{blockquote, first_mention, first_name, infer_intent, strip_first_mention, Intent};

    #[test]
    fn extracts_the_first_mention() {
        assert_eq!(first_mention("<@U987654321> hello"), Some("U987654321"));
        assert_eq!(first_mention("ping <@W123|ada> and <@U456>"), Some("W123"));
        assert_eq!(first_mention("<@U_TARGET> hello"), Some("U_TARGET"));
    }

    #[test]
    fn ignores_text_without_a_valid_mention() {
        assert_eq!(first_mention("hello there"), None);
        assert_eq!(first_mention("<@> empty"), None);
        assert_eq!(first_mention("<#C123> channel link"), None);
        assert_eq!(first_mention("<@not a user>"), None);
    }

    #[test]
    fn stripping_removes_only_the_first_mention() {
        assert_eq!(strip_first_mention("<@U987654321> hello"), "hello");
        assert_eq!(strip_first_mention("say <@U1> hi to <@U2>"), "say  hi to <@U2>".trim());
        assert_eq!(strip_first_mention("no mention here"), "no mention here");
    }

    #[test]
    fn blockquote_prefixes_every_line() {
        assert_eq!(blockquote("one\ntwo"), "> one\n> two");
        assert_eq!(blockquote(""), "");
    }

    #[test]
    fn first_name_takes_the_leading_token() {
        assert_eq!(first_name("Ada Lovelace"), "Ada");
        assert_eq!(first_name("  Cher "), "Cher");
        assert_eq!(first_name(""), "");
    }

    #[test]
    fn intent_inference_requires_both_verb_and_subject() {
        assert_eq!(infer_intent("update intro"), Some(Intent::PromptIntroUpdate));
        assert_eq!(infer_intent("Please CHANGE my bio"), Some(Intent::PromptIntroUpdate));
        assert_eq!(infer_intent("update my availability"), None);
        assert_eq!(infer_intent("nice intro!"), None);
    }
}
