pub mod session {

    /// Session key holding the [`crate::api::auth::SessionState`] of a logged-in household.
    pub const STATE_KEY: &str = "auth";

    /// Signed cookies need at least this much key material.
    pub const MIN_SECRET_LEN: usize = 64;
}

pub mod metrics {

    pub const WATCH_TRANSITIONS: &str = "watch_transitions_total";
}

pub mod limits {

    pub const MAX_NAME_LEN: usize = 200;

    pub const MAX_TOTAL_SEASONS: i32 = 500;
}
