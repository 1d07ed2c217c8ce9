diesel::table! {
    thread (id) {
        id -> Int4,
        time_stamp -> Int8,
        title -> Text,
        comment -> Text,
        board_id -> Int4,
    }
}

diesel::table! {
    reply (id) {
        id -> Int4,
        time_stamp -> Int8,
        comment -> Text,
        thread_id -> Int4,
    }
}

diesel::joinable!(reply -> thread (thread_id));

diesel::allow_tables_to_appear_in_same_query!(reply, thread,);
