//! User-facing copy. Templates are small functions so call sites stay typed;
//! Slack mrkdwn formatting reference: https://api.slack.com/docs/message-formatting

use matchbot_core::text::blockquote;
use matchbot_core::{Person, Pool};

pub const PERSON_MISSING_NAME: &str = "Sorry, you must have a name set on your Slack profile to \
     participate. Please add your name to your Slack profile.";

pub const UPDATED_AVAILABLE: &str =
    "Sounds good! I’ll pair you with someone at the start of the next round.";

pub const UPDATED_UNAVAILABLE: &str =
    "Okay, thanks for letting me know. I’ll ask again next time!";

pub const DID_NOT_MEET: &str =
    "Thanks for the feedback! Hope you have a chance to meet next time 🙂";

pub const UNKNOWN_MESSAGE_NO_ADMIN: &str = "Sorry, I don’t know how to respond to most messages! \
     😬 If you have a question or feedback, you can contact my admin.";

pub const INTRO_RECEIVED_QUESTIONS: &str =
    "If you have any questions in the meantime, feel free to ask.";

pub fn welcome_intro(person: &Person, pool: &Pool) -> String {
    format!(
        "Welcome, {casual_name}! Thanks for joining <#{channel_id}|{channel_name}>. 🎉\n\n\
         Please *introduce yourself* by replying with a short description. This will be sent to \
         people you pair with.\n\n\
         After I have your introduction, you’ll get your first pairing!",
        casual_name = person.casual_name,
        channel_id = pool.channel_id,
        channel_name = pool.channel_name,
    )
}

pub fn match_intro(person_1: &Person, person_2: &Person, pool: &Pool) -> String {
    format!(
        "*{casual_1}*, meet your {pool_name} pairing, {full_2}! Here’s a little about \
         {casual_2} in their own words:\n\n{intro_2}\n\n\n\
         *{casual_2}*, meet your {pool_name} pairing, {full_1}! Here’s a little about \
         {casual_1} in their own words:\n\n{intro_1}\n\n\n\
         Message each other below to *pick a time to meet* this week!",
        casual_1 = person_1.casual_name,
        casual_2 = person_2.casual_name,
        full_1 = person_1.full_name,
        full_2 = person_2.full_name,
        intro_1 = blockquote(&person_1.intro),
        intro_2 = blockquote(&person_2.intro),
        pool_name = pool.name,
    )
}

pub fn met(other_person: &Person) -> String {
    format!("Great! Hope you enjoyed meeting {} 🙂", other_person.casual_name)
}

pub fn unknown_message_admin(user_id: &str, message: &str) -> String {
    format!(
        "_Message from <@{user_id}>:_\n\n{quoted}\n\n\
         _Respond as the bot by typing_ “<@{user_id}> <your reply>”",
        quoted = blockquote(message),
    )
}

pub fn intro_received(person: &Person) -> String {
    format!(
        "Thanks for the intro, {}! You’ll receive your first pairing at the start of the next \
         round.\n\nYou can always update your intro later by messaging me with \"update intro\".",
        person.casual_name
    )
}

pub fn update_intro_instructions(person: &Person) -> String {
    format!(
        "Sure {casual_name}, I can update your intro. Here’s what I have now:\n\n{intro}\n\n\
         Please reply with what you would like to change it to.",
        casual_name = person.casual_name,
        intro = blockquote(&person.intro),
    )
}

pub fn intro_updated(person: &Person) -> String {
    format!(
        "I’ve updated your intro to:\n\n{intro}\n\n\
         This will be sent to people you pair with going forward!\n\n\
         You can always update your intro later by messaging me with \"update intro\".",
        intro = blockquote(&person.intro),
    )
}

#[cfg(test)]
mod tests {
    use matchbot_core::{Person, Pool, PoolId};

    use super::{match_intro, unknown_message_admin, welcome_intro};

    fn pool() -> Pool {
        Pool {
            id: PoolId(1),
            name: "2026 interns".to_owned(),
            channel_id: "C1".to_owned(),
            channel_name: "#interns-2026".to_owned(),
        }
    }

    #[test]
    fn welcome_addresses_the_person_casually() {
        let person = Person::new("U1", "ada", "Ada Lovelace");
        let message = welcome_intro(&person, &pool());
        assert!(message.starts_with("Welcome, Ada!"));
        assert!(message.contains("<#C1|#interns-2026>"));
    }

    #[test]
    fn match_intro_quotes_both_intros() {
        let mut ada = Person::new("U1", "ada", "Ada Lovelace");
        ada.intro = "I like difference engines.".to_owned();
        let mut grace = Person::new("U2", "grace", "Grace Hopper");
        grace.intro = "I collect nanoseconds.".to_owned();

        let message = match_intro(&ada, &grace, &pool());

        assert!(message.contains("> I like difference engines."));
        assert!(message.contains("> I collect nanoseconds."));
        assert!(message.contains("*Ada*, meet your 2026 interns pairing, Grace Hopper!"));
    }

    #[test]
    fn unknown_message_relay_includes_a_reply_recipe() {
        let message = unknown_message_admin("U9", "who are you?");
        assert!(message.contains("<@U9>"));
        assert!(message.contains("> who are you?"));
    }
}
