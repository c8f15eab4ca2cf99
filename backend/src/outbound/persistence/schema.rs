//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes a table, update the matching `table!` block by hand or
//! regenerate it with `diesel print-schema`.

diesel::table! {
    /// Registered users, owned by the account service and read here.
    users (id) {
        id -> Uuid,
        phone -> Varchar,
        nickname -> Nullable<Varchar>,
        avatar_url -> Nullable<Text>,
        /// IANA timezone identifier.
        timezone -> Varchar,
        last_checkin_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// One row per user and local calendar date with a check-in.
    checkins (user_id, local_date) {
        user_id -> Uuid,
        local_date -> Date,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Canonical relationship row per unordered user pair.
    friendships (id) {
        id -> Int8,
        requester_id -> Uuid,
        recipient_id -> Uuid,
        status -> Varchar,
        blocked_by -> Nullable<Uuid>,
        message -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed permissions `owner_id` grants about `target_id`.
    friend_settings (owner_id, target_id) {
        owner_id -> Uuid,
        target_id -> Uuid,
        can_view_detail -> Bool,
        can_remind -> Bool,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Reminder facts, unique per sender, recipient and recipient-local date.
    reminders (id) {
        id -> Int8,
        from_user -> Uuid,
        to_user -> Uuid,
        local_date -> Date,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    encouragements (id) {
        id -> Int8,
        from_user -> Uuid,
        to_user -> Uuid,
        emoji -> Varchar,
        message -> Nullable<Varchar>,
        local_date -> Date,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Groups; `join_code` is unique across all groups.
    groups (id) {
        id -> Int8,
        name -> Varchar,
        privacy -> Varchar,
        requires_approval -> Bool,
        join_code -> Varchar,
        owner_id -> Uuid,
        announcement -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// At most one membership row per group and user.
    group_members (group_id, user_id) {
        group_id -> Int8,
        user_id -> Uuid,
        role -> Varchar,
        status -> Varchar,
        requested_at -> Timestamptz,
        approved_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    group_encouragements (id) {
        id -> Int8,
        group_id -> Int8,
        author_id -> Uuid,
        emoji -> Varchar,
        message -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    group_reminders (id) {
        id -> Int8,
        group_id -> Int8,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-recipient notification log.
    notifications (id) {
        id -> Int8,
        recipient_id -> Uuid,
        actor_id -> Nullable<Uuid>,
        related_group_id -> Nullable<Int8>,
        related_user_id -> Nullable<Uuid>,
        kind -> Varchar,
        message -> Text,
        created_at -> Timestamptz,
        read_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(checkins -> users (user_id));
diesel::joinable!(group_members -> groups (group_id));
diesel::joinable!(group_encouragements -> groups (group_id));
diesel::joinable!(group_reminders -> groups (group_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    checkins,
    friendships,
    friend_settings,
    reminders,
    encouragements,
    groups,
    group_members,
    group_encouragements,
    group_reminders,
    notifications,
);
