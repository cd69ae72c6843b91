// Diesel table definitions. Kept in sync by hand with `CREATE_TABLES` in `db.rs`.

diesel::table! {
    author (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    category (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    keyword (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    news (id) {
        id -> Integer,
        news_time -> Timestamp,
        news_title -> Text,
        news_content -> Nullable<Text>,
        image_url -> Nullable<Text>,
        news_url -> Text,
        source_website -> Integer,
        author_id -> Nullable<Integer>,
        query_state -> Integer,
        claimed_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    news_keyword (news_id, keyword_id) {
        news_id -> Integer,
        keyword_id -> Integer,
    }
}

diesel::table! {
    news_category (news_id, category_id) {
        news_id -> Integer,
        category_id -> Integer,
    }
}

diesel::table! {
    ai_news (id) {
        id -> Integer,
        news_id -> Integer,
        ai_title -> Text,
        sentiment -> Integer,
        ai_model -> Integer,
        created_at -> Timestamp,
    }
}

diesel::table! {
    ai_news_keyword (ai_news_id, keyword_id) {
        ai_news_id -> Integer,
        keyword_id -> Integer,
    }
}

diesel::table! {
    ai_news_category (ai_news_id, category_id) {
        ai_news_id -> Integer,
        category_id -> Integer,
    }
}

diesel::joinable!(news -> author (author_id));
diesel::joinable!(news_keyword -> news (news_id));
diesel::joinable!(news_keyword -> keyword (keyword_id));
diesel::joinable!(news_category -> news (news_id));
diesel::joinable!(news_category -> category (category_id));
diesel::joinable!(ai_news -> news (news_id));
diesel::joinable!(ai_news_keyword -> ai_news (ai_news_id));
diesel::joinable!(ai_news_keyword -> keyword (keyword_id));
diesel::joinable!(ai_news_category -> ai_news (ai_news_id));
diesel::joinable!(ai_news_category -> category (category_id));

diesel::allow_tables_to_appear_in_same_query!(
    author,
    category,
    keyword,
    news,
    news_keyword,
    news_category,
    ai_news,
    ai_news_keyword,
    ai_news_category,
);
