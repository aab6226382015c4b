//! Known dispatch event names
//!
//! Dispatches are forwarded by their raw `t` name whether or not it appears
//! here; this enum only makes subscribing to the common ones typo-proof.

use std::fmt;

macro_rules! event_types {
    ($($(#[$doc:meta])* $variant:ident => $name:literal,)+) => {
        /// Gateway dispatch event types (the `t` field)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum GatewayEventType {
            $($(#[$doc])* $variant,)+
        }

        impl GatewayEventType {
            /// Every known event type
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Parse an event type from its wire name
            #[must_use]
            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

event_types! {
    /// Sent after a successful Identify
    Ready => "READY",
    /// Sent after a successful Resume
    Resumed => "RESUMED",

    MessageCreate => "MESSAGE_CREATE",
    MessageDelete => "MESSAGE_DELETE",
    MessageUpdate => "MESSAGE_UPDATE",
    MessageDeleteBulk => "MESSAGE_DELETE_BULK",
    MessageReactionAdd => "MESSAGE_REACTION_ADD",
    MessageReactionRemove => "MESSAGE_REACTION_REMOVE",
    MessageReactionRemoveAll => "MESSAGE_REACTION_REMOVE_ALL",
    MessageReactionRemoveEmoji => "MESSAGE_REACTION_REMOVE_EMOJI",
    TypingStart => "TYPING_START",

    GuildCreate => "GUILD_CREATE",
    GuildUpdate => "GUILD_UPDATE",
    GuildDelete => "GUILD_DELETE",
    GuildRoleCreate => "GUILD_ROLE_CREATE",
    GuildRoleUpdate => "GUILD_ROLE_UPDATE",
    GuildRoleDelete => "GUILD_ROLE_DELETE",

    ChannelCreate => "CHANNEL_CREATE",
    ChannelUpdate => "CHANNEL_UPDATE",
    ChannelDelete => "CHANNEL_DELETE",
    ChannelPinsUpdate => "CHANNEL_PINS_UPDATE",

    ThreadCreate => "THREAD_CREATE",
    ThreadUpdate => "THREAD_UPDATE",
    ThreadDelete => "THREAD_DELETE",
    ThreadListSync => "THREAD_LIST_SYNC",
    ThreadMemberUpdate => "THREAD_MEMBER_UPDATE",
    ThreadMembersUpdate => "THREAD_MEMBERS_UPDATE",

    StageInstanceCreate => "STAGE_INSTANCE_CREATE",
    StageInstanceUpdate => "STAGE_INSTANCE_UPDATE",
    StageInstanceDelete => "STAGE_INSTANCE_DELETE",

    GuildMemberAdd => "GUILD_MEMBER_ADD",
    GuildMemberUpdate => "GUILD_MEMBER_UPDATE",
    GuildMemberRemove => "GUILD_MEMBER_REMOVE",
    GuildBanAdd => "GUILD_BAN_ADD",
    GuildBanRemove => "GUILD_BAN_REMOVE",
    GuildAuditLogEntryCreate => "GUILD_AUDIT_LOG_ENTRY_CREATE",
    GuildEmojisUpdate => "GUILD_EMOJIS_UPDATE",
    GuildStickersUpdate => "GUILD_STICKERS_UPDATE",
    GuildIntegrationsUpdate => "GUILD_INTEGRATIONS_UPDATE",

    IntegrationCreate => "INTEGRATION_CREATE",
    IntegrationUpdate => "INTEGRATION_UPDATE",
    IntegrationDelete => "INTEGRATION_DELETE",
    InteractionCreate => "INTERACTION_CREATE",
    WebhooksUpdate => "WEBHOOKS_UPDATE",
    InviteCreate => "INVITE_CREATE",
    InviteDelete => "INVITE_DELETE",

    VoiceStateUpdate => "VOICE_STATE_UPDATE",
    PresenceUpdate => "PRESENCE_UPDATE",
    UserUpdate => "USER_UPDATE",

    GuildScheduledEventCreate => "GUILD_SCHEDULED_EVENT_CREATE",
    GuildScheduledEventUpdate => "GUILD_SCHEDULED_EVENT_UPDATE",
    GuildScheduledEventDelete => "GUILD_SCHEDULED_EVENT_DELETE",
    GuildScheduledEventUserAdd => "GUILD_SCHEDULED_EVENT_USER_ADD",
    GuildScheduledEventUserRemove => "GUILD_SCHEDULED_EVENT_USER_REMOVE",

    AutoModerationRuleCreate => "AUTO_MODERATION_RULE_CREATE",
    AutoModerationRuleUpdate => "AUTO_MODERATION_RULE_UPDATE",
    AutoModerationRuleDelete => "AUTO_MODERATION_RULE_DELETE",
    AutoModerationActionExecution => "AUTO_MODERATION_ACTION_EXECUTION",
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<GatewayEventType> for String {
    fn from(event: GatewayEventType) -> Self {
        event.as_str().to_string()
    }
}
