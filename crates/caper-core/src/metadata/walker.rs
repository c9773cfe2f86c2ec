//! Call tree walker — flattens nested sub-workflow metadata into one
//! depth-first sequence of real (non-delegating) call attempts.
//!
//! Each visited attempt carries its lineage: the names of the calls that
//! delegated into the sub-workflow it belongs to, outermost first.

use super::document::{CallAttempt, MetadataDocument, WorkflowMetadata};

/// A call attempt together with its position in the run's call tree.
#[derive(Debug, Clone)]
pub struct FlattenedCall<'a> {
    pub call_name: &'a str,
    pub attempt: &'a CallAttempt,
    /// Enclosing call names, outermost first. Empty for top-level calls.
    pub lineage: Vec<String>,
}

impl FlattenedCall<'_> {
    pub fn parent_names(&self, separator: &str) -> String {
        self.lineage.join(separator)
    }
}

/// Visit every non-delegating call attempt of `doc`.
///
/// Calls are visited in the engine's order, attempts in shard/retry order.
/// Attempts that embed a sub-workflow are expanded instead of visited.
pub fn walk<'a, F>(doc: &'a MetadataDocument, mut visit: F)
where
    F: FnMut(&'a str, &'a CallAttempt, &[String]),
{
    walk_tree(doc.tree(), Vec::new(), &mut visit);
}

fn walk_tree<'a, F>(tree: &'a WorkflowMetadata, lineage: Vec<String>, visit: &mut F)
where
    F: FnMut(&'a str, &'a CallAttempt, &[String]),
{
    let Some(calls) = tree.calls.as_deref() else {
        return;
    };

    for group in calls {
        for attempt in &group.attempts {
            match attempt.sub_workflow_metadata.as_deref() {
                Some(sub) => {
                    let mut child = lineage.clone();
                    child.push(group.name.clone());
                    walk_tree(sub, child, visit);
                }
                None => visit(group.name.as_str(), attempt, &lineage),
            }
        }
    }
}

/// Collect the walk into a vector.
pub fn flatten(doc: &MetadataDocument) -> Vec<FlattenedCall<'_>> {
    let mut out = Vec::new();
    walk(doc, |call_name, attempt, lineage| {
        out.push(FlattenedCall {
            call_name,
            attempt,
            lineage: lineage.to_vec(),
        });
    });
    out
}
