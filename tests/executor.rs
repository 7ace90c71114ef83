mod common;

use common::*;
use relaygraph::executor::{Executor, RunError};
use relaygraph::graph::{GraphBuilder, Schedule};
use relaygraph::reducers::MergePolicy;
use relaygraph::state::StateSchema;
use serde_json::json;

fn two_node_chain() -> Schedule {
    GraphBuilder::new(chain_schema())
        .add_node("a", AppendNode::one("a1"))
        .unwrap()
        .add_node("b", AppendNode::one("b1"))
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .compile()
        .unwrap()
}

#[tokio::test]
async fn chain_accumulates_in_execution_order() {
    let executor = Executor::new(two_node_chain());
    let state = executor
        .run(executor.schedule().initial_state())
        .await
        .unwrap();

    assert_eq!(state.get("transcript"), Some(&json!(["a1", "b1"])));
    assert_eq!(state.get("calls"), Some(&json!(2)));
}

#[tokio::test]
async fn sum_policy_totals_each_contribution() {
    let mut builder = GraphBuilder::new(chain_schema());
    for i in 0..5 {
        builder = builder
            .add_node(format!("n{i}"), AppendNode::one("x"))
            .unwrap();
    }
    for i in 0..4 {
        builder = builder
            .add_edge(format!("n{i}"), format!("n{}", i + 1))
            .unwrap();
    }
    let executor = Executor::new(builder.compile().unwrap());
    let state = executor
        .run(executor.schedule().initial_state())
        .await
        .unwrap();

    assert_eq!(state.get("calls"), Some(&json!(5)));
}

#[tokio::test]
async fn accumulating_length_matches_total_items() {
    let schedule = GraphBuilder::new(chain_schema())
        .add_node("a", AppendNode::new(vec!["1", "2"]))
        .unwrap()
        .add_node("b", AppendNode::new(vec!["3"]))
        .unwrap()
        .add_node("c", AppendNode::new(vec!["4", "5", "6"]))
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_edge("b", "c")
        .unwrap()
        .compile()
        .unwrap();

    let executor = Executor::new(schedule);
    let state = executor
        .run(executor.schedule().initial_state())
        .await
        .unwrap();

    assert_eq!(
        state.get("transcript"),
        Some(&json!(["1", "2", "3", "4", "5", "6"]))
    );
}

#[tokio::test]
async fn replace_and_max_policies_apply_per_field() {
    use async_trait::async_trait;
    use relaygraph::node::{Node, NodeContext, NodeError};
    use relaygraph::state::{State, StatePartial};

    struct Writer {
        latest: &'static str,
        score: i64,
    }

    #[async_trait]
    impl Node for Writer {
        async fn run(&self, _: &State, _: NodeContext) -> Result<StatePartial, NodeError> {
            Ok(StatePartial::new()
                .with_field("latest", json!(self.latest))
                .with_field("best", json!(self.score)))
        }

        fn writes(&self) -> Vec<String> {
            vec!["latest".into(), "best".into()]
        }
    }

    let schema = StateSchema::builder()
        .scalar("latest", MergePolicy::Replace)
        .unwrap()
        .scalar("best", MergePolicy::Max)
        .unwrap()
        .build();

    let schedule = GraphBuilder::new(schema)
        .add_node(
            "first",
            Writer {
                latest: "one",
                score: 7,
            },
        )
        .unwrap()
        .add_node(
            "second",
            Writer {
                latest: "two",
                score: 3,
            },
        )
        .unwrap()
        .add_edge("first", "second")
        .unwrap()
        .compile()
        .unwrap();

    let executor = Executor::new(schedule);
    let state = executor
        .run(executor.schedule().initial_state())
        .await
        .unwrap();

    assert_eq!(state.get("latest"), Some(&json!("two")));
    assert_eq!(state.get("best"), Some(&json!(7)));
}

#[tokio::test]
async fn failure_halts_with_the_failing_node_named() {
    let schedule = GraphBuilder::new(chain_schema())
        .add_node("node1", AppendNode::one("first"))
        .unwrap()
        .add_node("node2", FailingNode)
        .unwrap()
        .add_node("node3", AppendNode::one("third"))
        .unwrap()
        .add_edge("node1", "node2")
        .unwrap()
        .add_edge("node2", "node3")
        .unwrap()
        .compile()
        .unwrap();

    let executor = Executor::new(schedule);
    let err = executor
        .run(executor.schedule().initial_state())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Node { .. }));
    assert_eq!(err.node_name(), "node2");
}

#[tokio::test]
async fn schedule_survives_a_failed_run() {
    let schedule = GraphBuilder::new(chain_schema())
        .add_node("ok", AppendNode::one("fine"))
        .unwrap()
        .compile()
        .unwrap();
    let failing = GraphBuilder::new(chain_schema())
        .add_node("bad", FailingNode)
        .unwrap()
        .compile()
        .unwrap();

    let executor = Executor::new(failing);
    assert!(
        executor
            .run(executor.schedule().initial_state())
            .await
            .is_err()
    );

    // A fresh run over an unrelated, healthy schedule is unaffected.
    let executor = Executor::new(schedule);
    let state = executor
        .run(executor.schedule().initial_state())
        .await
        .unwrap();
    assert_eq!(state.get("transcript"), Some(&json!(["fine"])));
}

#[tokio::test]
async fn reruns_over_the_same_schedule_are_identical() {
    let executor = Executor::new(two_node_chain());
    let first = executor
        .run(executor.schedule().initial_state())
        .await
        .unwrap();
    let second = executor
        .run(executor.schedule().initial_state())
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_runs_do_not_interfere() {
    let executor = Executor::new(two_node_chain());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let executor = executor.clone();
        handles.push(tokio::spawn(async move {
            executor.run(executor.schedule().initial_state()).await
        }));
    }

    for handle in handles {
        let state = handle.await.unwrap().unwrap();
        assert_eq!(state.get("transcript"), Some(&json!(["a1", "b1"])));
        assert_eq!(state.get("calls"), Some(&json!(2)));
    }
}

#[tokio::test]
async fn undeclared_field_written_at_runtime_fails_the_merge() {
    let schedule = GraphBuilder::new(chain_schema())
        .add_node("sneaky", SilentUndeclaredWriter)
        .unwrap()
        .compile()
        .unwrap();

    let executor = Executor::new(schedule);
    let err = executor
        .run(executor.schedule().initial_state())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Merge { .. }));
    assert_eq!(err.node_name(), "sneaky");
}

#[tokio::test]
async fn seeded_initial_state_feeds_the_first_node() {
    let executor = Executor::new(two_node_chain());
    let initial = executor
        .schedule()
        .initial_state()
        .with_value("transcript", json!(["seed"]))
        .unwrap();
    let state = executor.run(initial).await.unwrap();

    assert_eq!(state.get("transcript"), Some(&json!(["seed", "a1", "b1"])));
}
