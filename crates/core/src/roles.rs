//! Well-known role name constants carried in viewer tokens.

pub const ROLE_MODERATOR: &str = "moderator";
pub const ROLE_CREATOR: &str = "creator";
