use crate::client::PendingTx;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// What a step invocation yields: a pending operation the loop must wait on,
/// or `None` when the step confirmed internally (e.g. through `deploy`).
pub type StepOutcome = anyhow::Result<Option<PendingTx>>;

type StepFn<C> = Box<dyn Fn(C) -> BoxFuture<'static, StepOutcome> + Send + Sync>;

/// One concrete, ordered, state-changing network operation.
///
/// Stateless from the orchestrator's point of view: everything a step needs
/// arrives through the context it is handed, regenerated fresh before each
/// execution.
pub struct Step<C> {
    name: String,
    run: StepFn<C>,
}

impl<C: Send + 'static> Step<C> {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepOutcome> + Send + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(move |ctx| Box::pin(f(ctx))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn execute(&self, ctx: C) -> StepOutcome {
        (self.run)(ctx).await
    }
}

impl<C> std::fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

// ---------------------------------------------------------------------------
// ExpandableStep / SequenceEntry
// ---------------------------------------------------------------------------

type ExpandFn<C> = Box<dyn Fn(&C) -> Vec<Step<C>> + Send + Sync>;

/// A declared entry that fans out into zero or more concrete steps at
/// preprocessing time, from dynamic runtime data (e.g. a contributor list).
pub struct ExpandableStep<C> {
    name: String,
    expand: ExpandFn<C>,
}

impl<C> ExpandableStep<C> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A declared sequence entry, discriminated explicitly rather than by
/// structural inspection.
pub enum SequenceEntry<C> {
    Direct(Step<C>),
    Expandable(ExpandableStep<C>),
}

pub type Sequence<C> = Vec<SequenceEntry<C>>;

/// The flattened, ordered list of concrete steps, built once per run.
pub type ProcessedSequence<C> = Vec<Step<C>>;

/// Declare a direct step.
pub fn step<C, F, Fut>(name: impl Into<String>, f: F) -> SequenceEntry<C>
where
    C: Send + 'static,
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StepOutcome> + Send + 'static,
{
    SequenceEntry::Direct(Step::new(name, f))
}

/// Declare an expandable step.
///
/// Expansion must be deterministic given identical dynamic inputs: the
/// declared-position to processed-index mapping, and with it resumability,
/// depends on it.
pub fn expandable<C, F>(name: impl Into<String>, f: F) -> SequenceEntry<C>
where
    F: Fn(&C) -> Vec<Step<C>> + Send + Sync + 'static,
{
    SequenceEntry::Expandable(ExpandableStep {
        name: name.into(),
        expand: Box::new(f),
    })
}

/// Reduce one declared entry to its concrete steps using a preprocessing
/// context snapshot.
pub fn preprocess_entry<C>(ctx: &C, entry: SequenceEntry<C>) -> Vec<Step<C>> {
    match entry {
        SequenceEntry::Direct(step) => vec![step],
        SequenceEntry::Expandable(exp) => (exp.expand)(ctx),
    }
}

// ---------------------------------------------------------------------------
// ContextProvider
// ---------------------------------------------------------------------------

/// Regenerates the context bag before each step execution (and once per
/// declared entry during preprocessing), so that step `i` observes the
/// effects of steps `< i` in this run or a prior one.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    type Ctx: Send + 'static;

    async fn generate(&self, orchestrator: &Orchestrator) -> Result<Self::Ctx>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        items: Vec<String>,
    }

    fn fanout_entry() -> SequenceEntry<Ctx> {
        expandable("per-item op", |c: &Ctx| {
            c.items
                .iter()
                .map(|item| Step::new(format!("op {item}"), |_ctx: Ctx| async { Ok(None) }))
                .collect()
        })
    }

    #[test]
    fn direct_entry_passes_through() {
        let ctx = Ctx { items: vec![] };
        let entry = step("single", |_ctx: Ctx| async { Ok(None) });
        let steps = preprocess_entry(&ctx, entry);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name(), "single");
    }

    #[test]
    fn expandable_entry_fans_out_in_order() {
        let ctx = Ctx {
            items: vec!["a".into(), "b".into(), "c".into()],
        };
        let steps = preprocess_entry(&ctx, fanout_entry());
        let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["op a", "op b", "op c"]);
    }

    #[test]
    fn expansion_is_deterministic_for_identical_input() {
        let ctx = Ctx {
            items: vec!["x".into(), "y".into()],
        };
        let first: Vec<String> = preprocess_entry(&ctx, fanout_entry())
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        let second: Vec<String> = preprocess_entry(&ctx, fanout_entry())
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn expansion_over_empty_input_yields_nothing() {
        let ctx = Ctx { items: vec![] };
        assert!(preprocess_entry(&ctx, fanout_entry()).is_empty());
    }

    #[tokio::test]
    async fn step_consumes_a_fresh_context() {
        let step = Step::new("count", |ctx: Ctx| async move {
            anyhow::ensure!(ctx.items.len() == 2, "stale context");
            Ok(None)
        });
        let out = step
            .execute(Ctx {
                items: vec!["a".into(), "b".into()],
            })
            .await;
        assert!(out.unwrap().is_none());
    }
}
