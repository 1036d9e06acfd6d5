//! 工作流引擎
//!
//! 单线程顺序执行：一个阶段跑完才进入下一个，没有并发也没有取消。
//! 步数守卫保证任何转移图都会终止：超过 max_steps 时写入错误并交给 RecoveryAgent。

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{StageError, WorkflowState};
use crate::workflow::graph::WorkflowGraph;
use crate::workflow::types::*;

/// 工作流引擎：转移图 + 各阶段处理器
pub struct WorkflowEngine {
    graph: WorkflowGraph,
    nodes: HashMap<Stage, Arc<dyn StageNode>>,
    max_steps: usize,
}

impl WorkflowEngine {
    pub fn new(graph: WorkflowGraph, max_steps: usize) -> Self {
        Self {
            graph,
            nodes: HashMap::new(),
            max_steps,
        }
    }

    /// 注册阶段处理器；同一阶段重复注册时后者覆盖前者
    pub fn register(&mut self, node: Arc<dyn StageNode>) {
        self.nodes.insert(node.stage(), node);
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn has_stage(&self, stage: Stage) -> bool {
        self.nodes.contains_key(&stage)
    }

    /// 从入口阶段跑到终点，返回最终状态与经过的阶段序列
    pub async fn run(&self, mut state: WorkflowState) -> WorkflowRun {
        let mut path = Vec::new();
        let mut current = Transition::To(self.graph.entry());

        while let Transition::To(stage) = current {
            if path.len() >= self.max_steps && stage != Stage::Recovery {
                if state.error.is_none() {
                    state.fail(StageError::StepLimit(self.max_steps).to_string());
                }
                current = Transition::To(Stage::Recovery);
                continue;
            }

            let Some(node) = self.nodes.get(&stage) else {
                state.fail(WorkflowError::MissingStage(stage).to_string());
                break;
            };

            tracing::debug!(stage = %stage, step = path.len() + 1, "running stage");
            state = node.run(state).await;
            path.push(stage);

            current = self.graph.next(stage, &mut state);
            tracing::debug!(from = %stage, to = ?current, "transition");
        }

        tracing::info!(
            steps = path.len(),
            failed = state.has_error(),
            requires_human_review = state.requires_human_review,
            "workflow finished"
        );
        WorkflowRun { state, path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecoveryAgent;
    use async_trait::async_trait;

    /// 什么都不做、只占位的阶段
    struct Passthrough(Stage);

    #[async_trait]
    impl StageNode for Passthrough {
        fn stage(&self) -> Stage {
            self.0
        }

        async fn run(&self, state: WorkflowState) -> WorkflowState {
            state
        }
    }

    fn engine_with(stages: &[Stage], variant: Variant, max_steps: usize) -> WorkflowEngine {
        let mut engine = WorkflowEngine::new(WorkflowGraph::new(variant, 3), max_steps);
        for stage in stages {
            engine.register(Arc::new(Passthrough(*stage)));
        }
        engine.register(Arc::new(RecoveryAgent::new()));
        engine
    }

    #[tokio::test]
    async fn test_linear_path_without_posts_ends_after_x_generator() {
        let engine = engine_with(
            &[
                Stage::Scraper,
                Stage::NotesIntegration,
                Stage::Summarizer,
                Stage::LinkedInGenerator,
                Stage::XGenerator,
            ],
            Variant::BlogOnly,
            64,
        );
        let run = engine.run(WorkflowState::default()).await;
        assert_eq!(
            run.path,
            vec![
                Stage::Scraper,
                Stage::NotesIntegration,
                Stage::Summarizer,
                Stage::LinkedInGenerator,
                Stage::XGenerator,
            ]
        );
        assert!(run.state.error.is_none());
    }

    #[tokio::test]
    async fn test_step_limit_routes_to_recovery() {
        // 阶段为 idea 且 Planner 不推进时会自环
        let engine = engine_with(&[Stage::CaptureIdea, Stage::Planner], Variant::IdeaToPublish, 5);
        let run = engine.run(WorkflowState::default()).await;
        assert_eq!(run.path.len(), 6);
        assert_eq!(run.path.last(), Some(&Stage::Recovery));
        assert_eq!(
            run.state.error.as_deref(),
            Some("Workflow exceeded 5 stage executions")
        );
        assert!(run.state.requires_human_review);
    }

    #[tokio::test]
    async fn test_missing_stage_fails_run() {
        let engine = engine_with(&[], Variant::BlogOnly, 64);
        let run = engine.run(WorkflowState::default()).await;
        assert!(run.path.is_empty());
        assert_eq!(
            run.state.error.as_deref(),
            Some("No handler registered for stage scraper")
        );
    }
}
