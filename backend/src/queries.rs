use sqlx::PgPool;

const COUNT_VOTES_BY_OPTION: &str = "SELECT vote, COUNT(*) AS count FROM votes GROUP BY vote";
const PING: &str = "SELECT 1";

pub struct Queries;

impl Queries {
    /// Grouped row count per stored vote value.
    pub async fn count_votes_by_option(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(COUNT_VOTES_BY_OPTION)
            .fetch_all(pool)
            .await
    }

    pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query_scalar::<_, i32>(PING)
            .fetch_one(pool)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_row_per_vote() {
        assert!(COUNT_VOTES_BY_OPTION.contains("COUNT(*)"));
        assert!(!COUNT_VOTES_BY_OPTION.contains("COUNT(id)"));
        assert!(COUNT_VOTES_BY_OPTION.ends_with("GROUP BY vote"));
    }
}
