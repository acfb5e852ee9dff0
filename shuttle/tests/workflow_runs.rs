//! Workflow combinators over real agents, including the convergence loop.

use std::sync::Arc;

use serde_json::json;

use shuttle::agent::{Agent, FnAgent, LlmAgent};
use shuttle::provider::MockProvider;
use shuttle::run_context::RunContext;
use shuttle::state::State;
use shuttle::workflow::{
    loop_keys, LoopWorkflow, MergeStrategy, ParallelWorkflow, SequentialWorkflow, WorkflowStep,
};

/// **Scenario**: A while-loop body decays `error_rate` by 30% per iteration
/// from 0.15; the loop stops once the rate is at or below 0.01 (or at the
/// 10-iteration cap), and the reported count matches the executed
/// iterations.
#[tokio::test]
async fn error_rate_convergence() {
    let body = WorkflowStep::func("improve", |mut state: State| {
        let rate = state
            .get("error_rate")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.15);
        state.set("error_rate", json!(rate * 0.7));
        Ok(state)
    });
    let workflow = LoopWorkflow::while_loop("converge", body, |state, iteration| {
        let rate = state
            .get("error_rate")
            .and_then(|v| v.as_f64())
            .unwrap_or(1.0);
        rate > 0.01 && iteration < 10
    })
    .with_max_iterations(10);

    let mut state = State::new();
    state.set("error_rate", json!(0.15));
    let out = workflow.run(&RunContext::new(), state).await.unwrap();

    let final_rate = out.get("error_rate").and_then(|v| v.as_f64()).unwrap();
    assert!(final_rate <= 0.01, "converged below threshold: {final_rate}");

    // The loop must stop exactly when 0.15 * 0.7^i first crosses 0.01.
    let mut expected_iterations = 0u32;
    let mut rate = 0.15f64;
    while rate > 0.01 && expected_iterations < 10 {
        rate *= 0.7;
        expected_iterations += 1;
    }
    assert_eq!(
        out.get(loop_keys::ITERATIONS),
        Some(&json!(expected_iterations)),
        "reported iteration count matches the executed iterations"
    );
}

/// **Scenario**: Workflows compose — a sequential pipeline containing a
/// parallel fan-out and an LLM agent, all over one state.
#[tokio::test]
async fn nested_composition() {
    let annotate = |key: &'static str| {
        WorkflowStep::agent(Arc::new(FnAgent::new(key, move |_ctx, mut state: State| {
            async move {
                state.set(key, json!(true));
                Ok(state)
            }
        })))
    };

    let fanout = ParallelWorkflow::new("fanout")
        .merge_strategy(MergeStrategy::Merge)
        .step(annotate("left"))
        .step(annotate("right"));

    let summarizer = LlmAgent::builder("summarizer")
        .provider(Arc::new(MockProvider::new().reply_text("all branches ran")))
        .build()
        .unwrap();

    let pipeline = SequentialWorkflow::new("pipeline")
        .step(WorkflowStep::agent(Arc::new(fanout)))
        .step(WorkflowStep::agent(Arc::new(summarizer)));

    let out = pipeline.run(&RunContext::new(), State::new()).await.unwrap();
    assert_eq!(out.get("left"), Some(&json!(true)));
    assert_eq!(out.get("right"), Some(&json!(true)));
    assert_eq!(out.get_str("result"), Some("all branches ran"));
}

/// **Scenario**: Parallel merge output is a function of declaration order,
/// not scheduling: repeated runs give identical states.
#[tokio::test]
async fn parallel_merge_deterministic() {
    for _ in 0..10 {
        let jittery = |key: &'static str, value: i64| {
            WorkflowStep::agent(Arc::new(FnAgent::new(key, move |_ctx, mut state: State| {
                async move {
                    // Scheduling jitter; declaration order must still win.
                    tokio::time::sleep(std::time::Duration::from_micros(
                        (value as u64 * 37) % 200,
                    ))
                    .await;
                    state.set("winner", json!(value));
                    state.set(key, json!(value));
                    Ok(state)
                }
            })))
        };
        let wf = ParallelWorkflow::new("det")
            .step(jittery("a", 1))
            .step(jittery("b", 2))
            .step(jittery("c", 3));
        let out = wf.run(&RunContext::new(), State::new()).await.unwrap();
        assert_eq!(out.get("winner"), Some(&json!(3)), "last declared wins");
        assert_eq!(out.get("a"), Some(&json!(1)));
        assert_eq!(out.get("b"), Some(&json!(2)));
    }
}

/// **Scenario**: Loop with per-iteration delay observes cancellation.
#[tokio::test]
async fn loop_cancellation_mid_run() {
    let body = WorkflowStep::func("spin", |state: State| Ok(state));
    let wf = LoopWorkflow::count("slow-loop", body, 1000)
        .with_delay(std::time::Duration::from_millis(20));

    let ctx = RunContext::new();
    let token = ctx.cancellation().clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = wf.run(&ctx, State::new()).await.unwrap_err();
    assert!(matches!(err, shuttle::error::AgentError::Cancelled));
}
