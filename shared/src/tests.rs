#[cfg(test)]
mod tests {
    use crate::models::*;
    use crate::validation::*;
    use time::OffsetDateTime;

    fn stats(rows: &[(&str, i64)]) -> AggregateStats {
        AggregateStats::from_rows(rows.iter().cloned(), OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!(parse_vote_option(Some("a")), Ok(VoteOption::A));
        assert_eq!(parse_vote_option(Some(" B ")), Ok(VoteOption::B));
        assert_eq!(parse_vote_option(None), Err(ValidationError::MissingOption));
        assert_eq!(parse_vote_option(Some("   ")), Err(ValidationError::MissingOption));
        assert_eq!(
            parse_vote_option(Some("Cats")),
            Err(ValidationError::UnrecognizedOption("cats".into()))
        );
    }

    #[test]
    fn test_token_shape() {
        assert!(is_well_formed_token("3f9a0c1d2e4b5a67"));
        assert!(is_well_formed_token("abc_DEF-123"));
        assert!(!is_well_formed_token(""));
        assert!(!is_well_formed_token("has space"));
        assert!(!is_well_formed_token("semi;colon"));
        assert!(!is_well_formed_token(&"x".repeat(MAX_TOKEN_LENGTH + 1)));
    }

    #[test]
    fn test_stats_reduction() {
        let s = stats(&[("a", 3), ("b", 5)]);
        assert_eq!(s.total_votes, 8);
        assert_eq!(s.count(VoteOption::A), 3);
        assert_eq!(s.count(VoteOption::B), 5);
        assert_eq!(s.total_votes, s.attributed_votes());
    }

    #[test]
    fn test_stats_edge_cases() {
        let empty = stats(&[]);
        assert_eq!(empty.total_votes, 0);
        assert_eq!(empty.count(VoteOption::A), 0);
        assert_eq!(empty.count(VoteOption::B), 0);

        let s = stats(&[("a", 2), ("zebra", 4), ("b", -1)]);
        assert_eq!(s.total_votes, 6);
        assert_eq!(s.count(VoteOption::A), 2);
        assert_eq!(s.count(VoteOption::B), 0);
        assert!(s.total_votes >= s.attributed_votes());
    }

    #[test]
    fn test_wire_formats() {
        let event = VoteEvent { voter_id: "abc".into(), vote: VoteOption::A };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"voter_id":"abc","vote":"a"}"#
        );

        let response = StatsResponse::new(
            &stats(&[("a", 1), ("b", 2)]),
            CurrentOptions { option_a: "Cats".into(), option_b: "Dogs".into() },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_votes"], 3);
        assert_eq!(json["cats_votes"], 1);
        assert_eq!(json["dogs_votes"], 2);
        assert_eq!(json["current_options"]["option_a"], "Cats");
        assert_eq!(json["current_options"]["option_b"], "Dogs");
    }

    #[test]
    fn test_health_is_always_ok() {
        let down = |dependency| DependencyStatus { dependency, up: false };
        let health = HealthResponse::new("vote-service", "host-1", down(Dependency::Queue), down(Dependency::Store));
        assert_eq!(health.status, "OK");
        assert_eq!(health.redis, "FAILED");
        assert_eq!(health.database, "FAILED");
    }
}
