//! Get-or-create for the name tables (author, keyword, category) and the join-table writes that use them.
//!
//! Names are unique in the schema, so creation is `INSERT OR IGNORE` followed by a select:
//! two writers racing on the same new name both end up with the same id.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use data_model_twn::db::AsyncSqliteConnection;
use data_model_twn::schema::{ai_news_category, ai_news_keyword, author, category, keyword, news_category, news_keyword};

macro_rules! get_or_create_names {
    ($fn_name:ident, $table:ident) => {
        /// Ids for `names`, inserting any that don't exist yet. Order follows `names`.
        pub async fn $fn_name(
            conn: &mut AsyncSqliteConnection,
            names: &[String],
        ) -> Result<Vec<i32>, diesel::result::Error> {
            let mut ids = Vec::with_capacity(names.len());
            for name in names {
                diesel::insert_or_ignore_into($table::table)
                    .values($table::name.eq(name))
                    .execute(conn)
                    .await?;
                let id = $table::table
                    .filter($table::name.eq(name))
                    .select($table::id)
                    .first::<i32>(conn)
                    .await?;
                ids.push(id);
            }
            Ok(ids)
        }
    };
}

get_or_create_names!(author_ids, author);
get_or_create_names!(keyword_ids, keyword);
get_or_create_names!(category_ids, category);

pub async fn author_id(conn: &mut AsyncSqliteConnection, name: &str) -> Result<i32, diesel::result::Error> {
    let ids = author_ids(conn, &[name.to_string()]).await?;
    ids.into_iter().next().ok_or(diesel::result::Error::NotFound)
}

/// Makes `names` the complete keyword set of a news row.
pub async fn replace_news_keywords(
    conn: &mut AsyncSqliteConnection,
    news_id: i32,
    names: &[String],
) -> Result<(), diesel::result::Error> {
    let ids = keyword_ids(conn, names).await?;
    diesel::delete(news_keyword::table.filter(news_keyword::news_id.eq(news_id)))
        .execute(conn)
        .await?;
    for keyword_id in ids {
        diesel::insert_or_ignore_into(news_keyword::table)
            .values((news_keyword::news_id.eq(news_id), news_keyword::keyword_id.eq(keyword_id)))
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// Makes `names` the complete category set of a news row.
pub async fn replace_news_categories(
    conn: &mut AsyncSqliteConnection,
    news_id: i32,
    names: &[String],
) -> Result<(), diesel::result::Error> {
    let ids = category_ids(conn, names).await?;
    diesel::delete(news_category::table.filter(news_category::news_id.eq(news_id)))
        .execute(conn)
        .await?;
    for category_id in ids {
        diesel::insert_or_ignore_into(news_category::table)
            .values((news_category::news_id.eq(news_id), news_category::category_id.eq(category_id)))
            .execute(conn)
            .await?;
    }
    Ok(())
}

pub async fn link_ai_news_keywords(
    conn: &mut AsyncSqliteConnection,
    ai_news_id: i32,
    names: &[String],
) -> Result<(), diesel::result::Error> {
    for keyword_id in keyword_ids(conn, names).await? {
        diesel::insert_or_ignore_into(ai_news_keyword::table)
            .values((
                ai_news_keyword::ai_news_id.eq(ai_news_id),
                ai_news_keyword::keyword_id.eq(keyword_id),
            ))
            .execute(conn)
            .await?;
    }
    Ok(())
}

pub async fn link_ai_news_categories(
    conn: &mut AsyncSqliteConnection,
    ai_news_id: i32,
    names: &[String],
) -> Result<(), diesel::result::Error> {
    for category_id in category_ids(conn, names).await? {
        diesel::insert_or_ignore_into(ai_news_category::table)
            .values((
                ai_news_category::ai_news_id.eq(ai_news_id),
                ai_news_category::category_id.eq(category_id),
            ))
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// Keyword names of a news row, alphabetical.
pub async fn news_keyword_names(
    conn: &mut AsyncSqliteConnection,
    news_id: i32,
) -> Result<Vec<String>, diesel::result::Error> {
    news_keyword::table
        .inner_join(keyword::table)
        .filter(news_keyword::news_id.eq(news_id))
        .select(keyword::name)
        .order(keyword::name.asc())
        .load(conn)
        .await
}

/// Category names of a news row, alphabetical.
pub async fn news_category_names(
    conn: &mut AsyncSqliteConnection,
    news_id: i32,
) -> Result<Vec<String>, diesel::result::Error> {
    news_category::table
        .inner_join(category::table)
        .filter(news_category::news_id.eq(news_id))
        .select(category::name)
        .order(category::name.asc())
        .load(conn)
        .await
}

pub async fn ai_news_keyword_names(
    conn: &mut AsyncSqliteConnection,
    ai_news_id: i32,
) -> Result<Vec<String>, diesel::result::Error> {
    ai_news_keyword::table
        .inner_join(keyword::table)
        .filter(ai_news_keyword::ai_news_id.eq(ai_news_id))
        .select(keyword::name)
        .order(keyword::name.asc())
        .load(conn)
        .await
}

pub async fn ai_news_category_names(
    conn: &mut AsyncSqliteConnection,
    ai_news_id: i32,
) -> Result<Vec<String>, diesel::result::Error> {
    ai_news_category::table
        .inner_join(category::table)
        .filter(ai_news_category::ai_news_id.eq(ai_news_id))
        .select(category::name)
        .order(category::name.asc())
        .load(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_model_twn::models::SourceWebsite;
    use data_model_twn::test_helpers::{TestDb, count_keywords, create_test_news, news_keywords};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_existing_names() {
        let db = TestDb::new().await;
        let mut conn = db.pool.get().await.unwrap();

        let first = keyword_ids(&mut conn, &names(&["立法院", "預算"])).await.unwrap();
        let second = keyword_ids(&mut conn, &names(&["預算", "立法院", "颱風"])).await.unwrap();

        assert_eq!(second[0], first[1]);
        assert_eq!(second[1], first[0]);
        drop(conn);
        assert_eq!(count_keywords(&db.pool).await, 3);
    }

    #[tokio::test]
    async fn test_author_id_is_stable() {
        let db = TestDb::new().await;
        let mut conn = db.pool.get().await.unwrap();
        let a = author_id(&mut conn, "王小明").await.unwrap();
        let b = author_id(&mut conn, "王小明").await.unwrap();
        let c = author_id(&mut conn, "陳大文").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_replace_news_keywords_replaces_the_set() {
        let db = TestDb::new().await;
        let news = create_test_news(&db.pool, SourceWebsite::Ttv, "http://x/1", "A").await;
        let mut conn = db.pool.get().await.unwrap();

        replace_news_keywords(&mut conn, news.id, &names(&["a", "b"])).await.unwrap();
        replace_news_keywords(&mut conn, news.id, &names(&["b", "c"])).await.unwrap();
        drop(conn);

        assert_eq!(news_keywords(&db.pool, news.id).await, vec!["b", "c"]);
    }
}
