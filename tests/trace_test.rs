//! End-to-end tests of the facade: trace parsing, grouping, evaluation.
//!
//! Run with: `cargo test --test trace_test`

use sql_speculator::{BuilderConfig, ModelBuilder};

fn workload(transactions: usize) -> String {
    let mut lines = Vec::new();
    for i in 0..transactions {
        let uid = 100 + i;
        lines.push(r#"{"sql": "BEGIN"}"#.to_string());
        lines.push(format!(
            r#"{{"sql": "SELECT * FROM users WHERE login = 'user{i}'", "results": [[{uid}]]}}"#
        ));
        lines.push(format!(
            r#"{{"sql": "SELECT * FROM settings WHERE user_id = {uid}", "results": [[{uid}, "dark"]]}}"#
        ));
        lines.push(format!(
            r#"{{"sql": "UPDATE users SET last_seen = {i} WHERE id = {uid}"}}"#
        ));
        lines.push(format!(
            r#"{{"sql": "SELECT COUNT(*) FROM messages WHERE recipient_user_id = {uid} AND has_been_read = 0 AND deleted_by_recipient = 0", "results": [[0]]}}"#
        ));
        lines.push(r#"{"sql": "COMMIT"}"#.to_string());
    }
    lines.join("\n")
}

#[test]
fn test_trace_is_grouped_into_one_cluster() {
    let builder = ModelBuilder::from_trace_str(&workload(12));
    assert_eq!(builder.transactions().len(), 12);
    assert_eq!(builder.clusters().len(), 1);
    assert_eq!(builder.clusters()[0].len(), 12);
    // BEGIN, COMMIT and the four statement shapes.
    assert_eq!(builder.registry().len(), 6);
    assert_eq!(builder.skipped_lines(), 0);
}

#[test]
fn test_malformed_lines_are_skipped_not_fatal() {
    let trace = format!("{}\nthis is not json\n{}", workload(1), r#"{"no_sql": 1}"#);
    let builder = ModelBuilder::from_trace_str(&trace);
    assert_eq!(builder.skipped_lines(), 2);
    assert_eq!(builder.transactions().len(), 1);
}

#[test]
fn test_rendered_statements_round_trip_through_the_registry() {
    let builder = ModelBuilder::from_trace_str(&workload(2));
    for transaction in builder.transactions() {
        for statement in transaction {
            let sql = statement.render(builder.registry());
            // Re-normalising rendered SQL lands on the same template.
            let parser = sql_speculator::StatementParser::new();
            let template = parser.to_template(&sql);
            assert_eq!(
                builder.registry().lookup(&template),
                Some(statement.template_id)
            );
        }
    }
}

#[test]
fn test_evaluation_replays_held_out_transactions() {
    let config = BuilderConfig {
        min_transaction_len: 4,
        training_fraction: 0.5,
        ..BuilderConfig::default()
    };
    let builder = ModelBuilder::from_trace_str(&workload(12)).with_config(config);
    let report = builder.evaluate_tree_model();

    assert_eq!(report.clusters_evaluated, 1);
    assert_eq!(report.transactions, 6);
    assert_eq!(report.total_statements, 24);
    // Three SELECTs per transaction.
    assert_eq!(report.total_selects, 18);
    // Settings lookup and unread count are derivable; the UPDATE is never
    // speculated upon.
    assert_eq!(report.hits, 12);
    assert_eq!(report.unpredictable, 6);
    assert_eq!(report.wrong_predictions, 0);
    assert!((report.hit_rate() - 12.0 / 18.0).abs() < 1e-9);
}

#[test]
fn test_short_clusters_are_not_evaluated() {
    let builder = ModelBuilder::from_trace_str(&workload(12));
    // Default minimum transaction length is 10; these have 4 statements.
    let report = builder.evaluate_tree_model();
    assert_eq!(report.clusters_evaluated, 0);
    assert_eq!(report.total_statements, 0);
}
