//! Prompt assembly for the event-planning assistant.
//!
//! A single prompt string is rebuilt per turn from the system prompt, the
//! requesting user's profile (when known), today's date and the full
//! conversation history. The model is expected to complete from the trailing
//! `Assistant:` cue.

use chrono::Utc;

use crate::models::{Message, MessageRole, UserProfileContext};

/// System prompt sent on every turn. Instructs the model to emit the two
/// marker blocks that [`crate::ai::parse::parse_response`] recognises.
pub const SYSTEM_PROMPT: &str = r#"You are the Pair Up Events assistant. You help duos (pairs of friends who attend together) plan social meetup events: picking an activity, a vibe, a time and a place, and writing an inviting description.

Be concise, warm and practical. Ask at most one clarifying question per reply.

When you are ready to suggest a name for the event, include exactly one block of the form:
TITLE_HEADLINE_START{"title": "<short event title>", "headline": "<one-sentence tagline>"}TITLE_HEADLINE_END

When you have enough detail to propose a concrete event, include exactly one block of the form:
EVENT_DATA_START{"title": "<event title>", "activity": "<main activity>", "description": "<2-3 sentence description>", "location": "<suggested area or venue>", "date": "<YYYY-MM-DD or empty>"}EVENT_DATA_END

The marker blocks are machine-read and stripped before display, so never mention them and keep the rest of your reply readable on its own."#;

/// Builds the full prompt for one chat turn.
///
/// Pure except for the wall-clock date line. The profile block is omitted
/// entirely when `profile` is `None` or has no public part; within the block
/// each line is omitted individually when its source field is absent.
pub fn build_prompt(
    profile: Option<&UserProfileContext>,
    history: &[Message],
    current_user_text: &str,
) -> String {
    let mut out = String::with_capacity(SYSTEM_PROMPT.len() + 256);
    out.push_str(SYSTEM_PROMPT);
    out.push_str("\n\n");

    if let Some(public) = profile.and_then(|p| p.public.as_ref()) {
        out.push_str("User Information:\n");
        out.push_str("Name: ");
        out.push_str(&public.first_name);
        out.push('\n');
        if let Some(age) = public.age {
            out.push_str("Age: ");
            out.push_str(&age.to_string());
            out.push('\n');
        }
        let private = profile.and_then(|p| p.private.as_ref());
        if let Some(hobbies) = private.and_then(|p| p.hobbies.as_deref()) {
            out.push_str("Hobbies: ");
            out.push_str(hobbies);
            out.push('\n');
        }
        if let Some(vibes) = private
            .and_then(|p| p.preferences.as_ref())
            .and_then(|p| p.preferred_vibes.as_deref())
            .filter(|v| !v.is_empty())
        {
            out.push_str("Preferred vibes: ");
            out.push_str(&vibes.join(", "));
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str("Today is ");
    out.push_str(&Utc::now().format("%Y-%m-%d").to_string());
    out.push_str("\n\n");

    out.push_str("Conversation History:\n");
    for message in history {
        out.push_str(role_label(&message.role));
        out.push_str(": ");
        out.push_str(&message.content);
        out.push('\n');
    }
    out.push_str("User: ");
    out.push_str(current_user_text);
    out.push('\n');
    out.push_str("Assistant:");

    out
}

fn role_label(role: &MessageRole) -> &'static str {
    match role {
        MessageRole::User => "User",
        MessageRole::Assistant => "Assistant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrivateProfile, ProfilePreferences, PublicProfile};

    fn message(role: MessageRole, content: &str) -> Message {
        Message::new("conv-1".to_string(), role, content.to_string())
    }

    fn full_profile() -> UserProfileContext {
        UserProfileContext {
            public: Some(PublicProfile {
                first_name: "Ada".to_string(),
                age: Some(29),
                gender: Some("female".to_string()),
            }),
            private: Some(PrivateProfile {
                hobbies: Some("bouldering, board games".to_string()),
                preferences: Some(ProfilePreferences {
                    preferred_vibes: Some(vec!["chill".to_string(), "outdoorsy".to_string()]),
                }),
            }),
        }
    }

    #[test]
    fn no_profile_has_date_and_user_line_but_no_info_block() {
        let prompt = build_prompt(None, &[], "hi");
        assert!(prompt.contains("User: hi\n"));
        assert!(!prompt.contains("User Information:"));
        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert!(prompt.contains(&format!("Today is {today}")));
    }

    #[test]
    fn ends_with_assistant_cue() {
        let prompt = build_prompt(None, &[], "hi");
        assert!(prompt.ends_with("Assistant:"));
    }

    #[test]
    fn full_profile_renders_every_line() {
        let prompt = build_prompt(Some(&full_profile()), &[], "hi");
        assert!(prompt.contains("User Information:\nName: Ada\nAge: 29\n"));
        assert!(prompt.contains("Hobbies: bouldering, board games\n"));
        assert!(prompt.contains("Preferred vibes: chill, outdoorsy\n"));
    }

    #[test]
    fn profile_without_private_part_omits_hobby_lines() {
        let profile = UserProfileContext {
            public: Some(PublicProfile {
                first_name: "Ada".to_string(),
                age: None,
                gender: None,
            }),
            private: None,
        };
        let prompt = build_prompt(Some(&profile), &[], "hi");
        assert!(prompt.contains("Name: Ada\n"));
        assert!(!prompt.contains("Age:"));
        assert!(!prompt.contains("Hobbies:"));
        assert!(!prompt.contains("Preferred vibes:"));
    }

    #[test]
    fn profile_without_public_part_omits_block_entirely() {
        let profile = UserProfileContext {
            public: None,
            private: full_profile().private,
        };
        let prompt = build_prompt(Some(&profile), &[], "hi");
        assert!(!prompt.contains("User Information:"));
        assert!(!prompt.contains("Hobbies:"));
    }

    #[test]
    fn empty_vibes_list_is_omitted() {
        let mut profile = full_profile();
        profile.private.as_mut().unwrap().preferences = Some(ProfilePreferences {
            preferred_vibes: Some(vec![]),
        });
        let prompt = build_prompt(Some(&profile), &[], "hi");
        assert!(!prompt.contains("Preferred vibes:"));
    }

    #[test]
    fn history_is_serialized_in_order_with_role_labels() {
        let history = vec![
            message(MessageRole::User, "let's plan something"),
            message(MessageRole::Assistant, "sure, what kind of activity?"),
        ];
        let prompt = build_prompt(None, &history, "hiking maybe");
        let block = "Conversation History:\nUser: let's plan something\nAssistant: sure, what kind of activity?\nUser: hiking maybe\nAssistant:";
        assert!(prompt.ends_with(block));
    }
}
