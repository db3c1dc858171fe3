//! Slack integration for matchbot.
//!
//! - **Events** (`events`) - inbound Events API payload routing: the
//!   verification challenge, bot-message filtering, admin broadcast
//!   mentions, and user free-text dispatch
//! - **Actions** (`actions`) - interactive button answers (availability,
//!   did-you-meet)
//! - **Block Kit** (`blocks`) - message builders and the question templates
//! - **Messages** (`messages`) - user-facing copy
//! - **Client** (`client`) - Web API calls behind the `ChatApi` trait
//! - **Delivery** (`delivery`) - `send_msg` with retries and
//!   partial-failure isolation

pub mod actions;
pub mod blocks;
pub mod client;
pub mod delivery;
pub mod events;
pub mod messages;
