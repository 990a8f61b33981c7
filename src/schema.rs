table! {
    standups (id) {
        id -> Integer,
        team_id -> Integer,
        user_name -> Text,
        yesterday -> Text,
        today -> Text,
        blockers -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

table! {
    teams (id) {
        id -> Integer,
        name -> Text,
        lead_name -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

joinable!(standups -> teams (team_id));

allow_tables_to_appear_in_same_query!(
    standups,
    teams,
);
