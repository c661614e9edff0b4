/// Fixed conversation id of the always-open broadcast room
pub const BROADCAST_ROOM_ID: &str = "BROADCAST_ROOM";

/// Display label of the broadcast room
pub const BROADCAST_ROOM_NAME: &str = "Study Motivation Broadcast Room";

/// Sender name used for messages produced by the application itself
pub const SYSTEM_SENDER: &str = "system";

/// Prefix of every personal (two-party) conversation id
pub const PERSONAL_CHAT_PREFIX: &str = "PM_";

/// Separator between the two usernames inside a personal conversation id
pub const PERSONAL_CHAT_SEPARATOR: char = '_';

/// Minimum username length accepted at registration
pub const MIN_USERNAME_CHARS: usize = 3;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_CHARS: usize = 4;
