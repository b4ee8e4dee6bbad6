//! Ready-made flow definitions

use rivulet_core::{FlowDefinition, ParamBinding, TaskSpec};

use crate::components::builtin::ECHO;
use crate::components::todo::{NOTIFY_COMPLETION, PROCESS_TODO, STORE_TODO, VALIDATE_INPUT};

/// Todo pipeline: receptionist, processor, storage, notifier
///
/// Needs the initial value `input` (`{"text": ..}`) and the resolvers from
/// [`crate::register_todo_resolvers`]. Its single result is `processingResult`.
pub fn todo_processing_flow() -> FlowDefinition {
    FlowDefinition::new()
        .task(
            "receptionist",
            TaskSpec::new(VALIDATE_INPUT)
                .requires(["input"])
                .provides(["validation"]),
        )
        .task(
            "processor",
            TaskSpec::new(PROCESS_TODO)
                .requires(["validation"])
                .provides(["todo"]),
        )
        .task(
            "storage",
            TaskSpec::new(STORE_TODO)
                .requires(["todo"])
                .provides(["savedTodo"]),
        )
        .task(
            "notifier",
            TaskSpec::new(NOTIFY_COMPLETION)
                .requires(["savedTodo"])
                .provides(["result"]),
        )
        .result("processingResult", "result")
}

/// Two independent tasks joined by a third
///
/// Uses only built-in resolvers and needs no initial values. Its single
/// result is `parallelResult`.
pub fn parallel_processing_flow() -> FlowDefinition {
    fn constant(value: &str, provides: &str, requires: &[&str]) -> TaskSpec {
        TaskSpec::new(ECHO)
            .requires(requires.iter().copied())
            .provides([provides])
            .param("value", ParamBinding::literal(value))
            .result(provides, "value")
    }

    FlowDefinition::new()
        .task("taskA", constant("TaskA completed", "resultA", &[]))
        .task("taskB", constant("TaskB completed", "resultB", &[]))
        .task(
            "taskC",
            constant("All tasks completed", "finalResult", &["resultA", "resultB"]),
        )
        .result("parallelResult", "finalResult")
}
