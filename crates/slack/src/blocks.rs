use serde::Serialize;
use serde_json::{json, Value};

use matchbot_core::{Match, Person, Pool};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    #[serde(rename = "type")]
    element_type: &'static str,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    pub value: String,
}

impl ButtonElement {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            element_type: "button",
            text: TextObject::plain(label),
            style: None,
            value: value.into(),
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: TextObject },
    Actions { block_id: String, elements: Vec<ButtonElement> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

/// Two-block question template: a text section followed by yes/no buttons.
/// The object id the answer applies to travels in the `block_id`, so no
/// per-person conversation state is needed for block answers.
fn yes_no_question(
    fallback_text: String,
    question: String,
    block_id: String,
    yes_label: &str,
    no_label: &str,
) -> MessageTemplate {
    MessageTemplate {
        fallback_text,
        blocks: vec![
            Block::Section { text: TextObject::mrkdwn(question) },
            Block::Actions {
                block_id,
                elements: vec![
                    ButtonElement::new(yes_label, "yes").style(ButtonStyle::Primary),
                    ButtonElement::new(no_label, "no"),
                ],
            },
        ],
    }
}

pub fn ask_if_available(person: &Person, pool: &Pool) -> MessageTemplate {
    yes_no_question(
        format!("Want to be paired to meet someone new in {}?", pool.channel_name),
        format!(
            "Hey {}, want to be paired to meet someone new in <#{}|{}> this week?",
            person.casual_name, pool.channel_id, pool.channel_name
        ),
        format!("availability-{}", pool.id.0),
        "Yes, I want to be paired",
        "Not this time",
    )
}

pub fn ask_if_met(pool: &Pool, other_person: &Person, matchup: &Match) -> MessageTemplate {
    yes_no_question(
        format!("Did you have a chance to meet with {}?", other_person.casual_name),
        format!(
            "Last time in <#{}|{}>, you paired with {} (<@{}>). Did you have a chance to meet \
             with {}?",
            pool.channel_id,
            pool.channel_name,
            other_person.full_name,
            other_person.user_id,
            other_person.casual_name
        ),
        format!("met-{}", matchup.id.0),
        "Yes, we met",
        "No, we didn’t meet",
    )
}

/// Rewrite the blocks of an already-posted question so the button the user
/// pressed is shown as a static "👉" line instead of live buttons. Blocks
/// arrive as raw JSON from the interactive payload; anything unrecognized is
/// passed through untouched.
pub fn highlight_selected(blocks: &[Value], selected_value: &str) -> Vec<Value> {
    let mut rewritten: Vec<Value> = blocks.to_vec();

    for block in rewritten.iter_mut() {
        let Some(elements) = block.get("elements").and_then(Value::as_array) else {
            continue;
        };
        let selected_label = elements.iter().find_map(|element| {
            let value = element.get("value").and_then(Value::as_str)?;
            (value == selected_value)
                .then(|| element.pointer("/text/text").and_then(Value::as_str))
                .flatten()
        });
        if let Some(label) = selected_label {
            *block = json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("> 👉 *{label}*") },
            });
            break;
        }
    }

    rewritten
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use matchbot_core::{Match, MatchId, Person, PersonId, Pool, PoolId, RoundId};

    use super::{ask_if_available, ask_if_met, highlight_selected, Block};

    fn pool() -> Pool {
        Pool {
            id: PoolId(12),
            name: "2026 interns".to_owned(),
            channel_id: "C1".to_owned(),
            channel_name: "#interns-2026".to_owned(),
        }
    }

    fn person(user_id: &str, full_name: &str) -> Person {
        Person::new(user_id, user_id.to_ascii_lowercase(), full_name)
    }

    #[test]
    fn availability_question_carries_the_pool_id_in_its_block_id() {
        let template = ask_if_available(&person("U1", "Ada Lovelace"), &pool());

        assert_eq!(template.blocks.len(), 2);
        let Block::Actions { block_id, elements } = &template.blocks[1] else {
            panic!("second block should be the answer buttons");
        };
        assert_eq!(block_id, "availability-12");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].value, "yes");
        assert_eq!(elements[1].value, "no");
    }

    #[test]
    fn met_question_carries_the_match_id_and_names_the_other_person() {
        let matchup = Match {
            id: MatchId(44),
            round_id: RoundId(1),
            person_1: PersonId(1),
            person_2: PersonId(2),
            conversation_id: None,
            met: None,
        };

        let template = ask_if_met(&pool(), &person("U2", "Grace Hopper"), &matchup);

        let Block::Actions { block_id, .. } = &template.blocks[1] else {
            panic!("second block should be the answer buttons");
        };
        assert_eq!(block_id, "met-44");
        let Block::Section { text } = &template.blocks[0] else {
            panic!("first block should be the question text");
        };
        let super::TextObject::Mrkdwn { text } = text else {
            panic!("question should be mrkdwn");
        };
        assert!(text.contains("Grace Hopper"));
        assert!(text.contains("<@U2>"));
    }

    #[test]
    fn buttons_serialize_with_the_slack_button_type() {
        let template = ask_if_available(&person("U1", "Ada Lovelace"), &pool());
        let value = serde_json::to_value(&template.blocks).expect("serialize blocks");

        assert_eq!(value[1]["type"], "actions");
        assert_eq!(value[1]["elements"][0]["type"], "button");
        assert_eq!(value[1]["elements"][0]["style"], "primary");
        assert_eq!(value[0]["type"], "section");
    }

    fn posted_question() -> Vec<Value> {
        vec![
            json!({ "type": "section", "text": { "type": "mrkdwn", "text": "Want to meet?" } }),
            json!({
                "type": "actions",
                "block_id": "availability-12",
                "elements": [
                    { "type": "button", "text": { "type": "plain_text", "text": "Yes, I want to be paired" }, "value": "yes" },
                    { "type": "button", "text": { "type": "plain_text", "text": "Not this time" }, "value": "no" },
                ],
            }),
        ]
    }

    #[test]
    fn highlighting_replaces_the_buttons_with_the_chosen_label() {
        let rewritten = highlight_selected(&posted_question(), "no");

        assert_eq!(rewritten.len(), 2);
        assert_eq!(rewritten[0], posted_question()[0]);
        assert_eq!(rewritten[1]["type"], "section");
        assert_eq!(rewritten[1]["text"]["text"], "> 👉 *Not this time*");
    }

    #[test]
    fn highlighting_an_unknown_value_leaves_blocks_untouched() {
        let rewritten = highlight_selected(&posted_question(), "maybe");
        assert_eq!(rewritten, posted_question());
    }
}
